//! Command-line front end.
//!
//! Every command works against one storage origin, picked by `--home` and
//! `--origin` (or `AUTOAPPROVE_HOME` / `AUTOAPPROVE_ORIGIN`).

pub mod check;
pub mod config;
pub mod eval;
pub mod init;
pub mod log;
pub mod replay;

use crate::audit::AuditLog;
use crate::policy::ConfigStore;
use crate::storage::{FileStorage, Storage};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Default storage origin.
pub const DEFAULT_ORIGIN: &str = "www.perplexity.ai";

/// Runtime settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    pub home: PathBuf,
    pub origin: String,
    /// Approval button labels to look for
    pub labels: Vec<String>,
}

impl Context {
    /// Resolve settings, falling back to `~/.autoapprove` for the home.
    pub fn new(home: Option<PathBuf>, origin: String, labels: Vec<String>) -> Result<Self> {
        let home = match home {
            Some(home) => home,
            None => FileStorage::default_home()?,
        };
        Ok(Self {
            home,
            origin,
            labels,
        })
    }

    pub fn storage(&self) -> Arc<FileStorage> {
        Arc::new(FileStorage::new(&self.home, &self.origin))
    }

    /// A config store with the persisted config loaded.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::open(self.storage() as Arc<dyn Storage>)
    }

    pub fn audit_log(&self) -> AuditLog {
        AuditLog::new(self.storage() as Arc<dyn Storage>)
    }
}
