//! File-backed storage — one JSON file per key.
//!
//! Layout: `<home>/<origin>/<key>.json`. Writes go to a sibling temp file
//! first and are renamed into place, so a reader never sees a half-written
//! value. Two processes writing the same key still race (last rename wins).

use crate::error::StorageError;
use crate::storage::Storage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage for `origin` under `home`. The directory is created lazily on
    /// first write.
    pub fn new(home: impl AsRef<Path>, origin: &str) -> Self {
        Self {
            dir: home.as_ref().join(sanitize(origin)),
        }
    }

    /// The default storage home (~/.autoapprove/).
    pub fn default_home() -> Result<PathBuf, StorageError> {
        let home = dirs::home_dir().ok_or(StorageError::NoHome)?;
        Ok(home.join(".autoapprove"))
    }

    /// Directory holding this origin's keys.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Keep keys and origins to a filesystem-safe alphabet.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path(), "example.com");
        assert_eq!(storage.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path(), "www.perplexity.ai");

        storage.set("config", "{\"a\":1}").unwrap();
        assert_eq!(storage.get("config").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(tmp.path().join("www.perplexity.ai/config.json").exists());

        storage.set("config", "{}").unwrap();
        assert_eq!(storage.get("config").unwrap().as_deref(), Some("{}"));

        storage.remove("config").unwrap();
        assert_eq!(storage.get("config").unwrap(), None);
        storage.remove("config").unwrap();
    }

    #[test]
    fn test_origins_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let a = FileStorage::new(tmp.path(), "a.example");
        let b = FileStorage::new(tmp.path(), "b.example");
        a.set("k", "1").unwrap();
        assert_eq!(b.get("k").unwrap(), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("https://x.y:80"), "https___x.y_80");
        assert_eq!(sanitize("mcp-auto-approve-config"), "mcp-auto-approve-config");
    }
}
