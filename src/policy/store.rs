//! Config store — owns the live root config and its persisted copy.
//!
//! The live config is held as an `Arc` snapshot: readers get a cheap clone of
//! the pointer and every update swaps in a new snapshot, so a call evaluated
//! mid-update sees either the old or the new config, never a mix. Each
//! snapshot carries its rule patterns already compiled.

use crate::error::ConfigError;
use crate::policy::defaults::{default_config, CONFIG_KEY};
use crate::policy::engine::CompiledConfig;
use crate::policy::types::{ApprovalDecision, CallDescriptor, RootConfig};
use crate::policy::validate::{parse_config, validate_config};
use crate::storage::{self, Storage};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ConfigStore {
    storage: Arc<dyn Storage>,
    config: RwLock<Arc<CompiledConfig>>,
}

impl ConfigStore {
    /// A store holding the built-in defaults. Nothing is read or written
    /// until `load` is called.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            config: RwLock::new(Arc::new(CompiledConfig::new(Arc::new(default_config())))),
        }
    }

    /// Create a store and immediately load the persisted config.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(storage);
        store.load();
        store
    }

    /// Load the persisted config.
    ///
    /// - absent: the defaults are written and adopted
    /// - unreadable or invalid: the defaults are adopted and a warning is
    ///   logged; the stored value is left as-is so it can be inspected
    ///
    /// Never fails.
    pub fn load(&self) {
        let loaded = match self.storage.get(CONFIG_KEY) {
            Ok(Some(text)) => match parse_config(&text) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Stored config rejected, using defaults: {}", e);
                    default_config()
                }
            },
            Ok(None) => {
                let defaults = default_config();
                if let Err(e) = storage::store_json(self.storage.as_ref(), CONFIG_KEY, &defaults) {
                    tracing::warn!("Failed to persist default config: {}", e);
                }
                tracing::info!("No stored config, adopted defaults");
                defaults
            }
            Err(e) => {
                tracing::warn!("Failed to read stored config, using defaults: {}", e);
                default_config()
            }
        };

        self.adopt(loaded);
    }

    fn adopt(&self, config: RootConfig) {
        let compiled = CompiledConfig::new(Arc::new(config));
        *self.config.write() = Arc::new(compiled);
    }

    /// The live config. Mutations must go through `update_config`.
    pub fn get_config(&self) -> Arc<RootConfig> {
        self.config.read().config().clone()
    }

    /// Validate, persist, then adopt a new config. On any failure the
    /// previously active config stays in place.
    pub fn update_config(&self, new_config: RootConfig) -> Result<(), ConfigError> {
        validate_config(&new_config).map_err(ConfigError::Validation)?;
        storage::store_json(self.storage.as_ref(), CONFIG_KEY, &new_config)?;
        self.adopt(new_config);
        tracing::info!("Config updated");
        Ok(())
    }

    /// Evaluate a call against the live config.
    pub fn evaluate_approval_rules(&self, call: &CallDescriptor) -> ApprovalDecision {
        let snapshot = self.config.read().clone();
        snapshot.evaluate(call)
    }

    /// Pretty-printed JSON of the full config, in the persisted shape.
    pub fn export_config(&self) -> String {
        let config = self.get_config();
        match serde_json::to_string_pretty(config.as_ref()) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize config: {}", e);
                String::new()
            }
        }
    }

    /// Parse a previously exported config and adopt it.
    pub fn import_config(&self, text: &str) -> Result<(), ConfigError> {
        let config = parse_config(text)?;
        self.update_config(config)
    }

    /// Flip the global on/off switch.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), ConfigError> {
        let mut config = (*self.get_config()).clone();
        config.enabled = enabled;
        self.update_config(config)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.read().config().enabled
    }
}
