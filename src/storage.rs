//! Storage adapters for page record lists
//!
//! A page's highlights are stored as one ordered list of records under a
//! key derived from its normalized URL. Adapters never retry; failures go
//! straight back to the caller.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Result, StorageError};
use crate::highlight::HighlightRecord;

/// Key-value storage collaborator
#[async_trait(?Send)]
pub trait HighlightStorage {
    /// Records stored under `key`; a missing key is an empty list
    async fn load(&self, key: &str) -> Result<Vec<HighlightRecord>>;

    async fn save(&self, key: &str, records: &[HighlightRecord]) -> Result<()>;

    async fn clear(&self, key: &str) -> Result<()>;
}

fn decode(key: &str, raw: &str) -> Result<Vec<HighlightRecord>> {
    serde_json::from_str(raw).map_err(|source| {
        StorageError::Corrupt {
            key: key.to_string(),
            source,
        }
        .into()
    })
}

/// In-memory storage holding serialized record lists
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `save`/`clear` fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Store raw JSON under `key`, bypassing validation
    pub fn insert_raw(&self, key: &str, json: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), json.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(StorageError::WriteRejected(key.to_string()).into());
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl HighlightStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Vec<HighlightRecord>> {
        match self.entries.borrow().get(key) {
            Some(raw) => decode(key, raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, key: &str, records: &[HighlightRecord]) -> Result<()> {
        self.check_writable(key)?;
        let raw = serde_json::to_string(records)?;
        self.entries.borrow_mut().insert(key.to_string(), raw);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;
    use serde_json::Value;
    use tracing::debug;

    use super::{decode, HighlightStorage};
    use crate::error::{Result, StorageError};
    use crate::highlight::HighlightRecord;

    /// One JSON document on disk mapping keys to record lists
    #[derive(Debug, Clone)]
    pub struct JsonFileStorage {
        path: PathBuf,
    }

    impl JsonFileStorage {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        async fn read_all(&self) -> Result<BTreeMap<String, Value>> {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
                Ok(raw) => serde_json::from_str(&raw).map_err(|source| {
                    StorageError::Corrupt {
                        key: self.path.display().to_string(),
                        source,
                    }
                    .into()
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(StorageError::Io(e).into()),
            }
        }

        async fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
            let raw = serde_json::to_string_pretty(entries)?;
            tokio::fs::write(&self.path, raw)
                .await
                .map_err(StorageError::Io)?;
            debug!(path = %self.path.display(), keys = entries.len(), "storage written");
            Ok(())
        }
    }

    #[async_trait(?Send)]
    impl HighlightStorage for JsonFileStorage {
        async fn load(&self, key: &str) -> Result<Vec<HighlightRecord>> {
            let entries = self.read_all().await?;
            match entries.get(key) {
                Some(value) => decode(key, &value.to_string()),
                None => Ok(Vec::new()),
            }
        }

        async fn save(&self, key: &str, records: &[HighlightRecord]) -> Result<()> {
            let mut entries = self.read_all().await?;
            entries.insert(key.to_string(), serde_json::to_value(records)?);
            self.write_all(&entries).await
        }

        async fn clear(&self, key: &str) -> Result<()> {
            let mut entries = self.read_all().await?;
            if entries.remove(key).is_some() {
                self.write_all(&entries).await?;
            }
            Ok(())
        }
    }
}
