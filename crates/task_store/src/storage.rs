//! Key-value document storage used by [`LocalTaskStore`](crate::LocalTaskStore).

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::TaskStoreResult;

/// String key-value storage holding whole documents.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Returns the document stored under `key`, if any.
    async fn get_item(&self, key: &str) -> TaskStoreResult<Option<String>>;

    /// Replaces the document stored under `key`.
    async fn set_item(&self, key: &str, value: &str) -> TaskStoreResult<()>;
}

/// In-process document storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage holding a single document.
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            items: RwLock::new(HashMap::from([(key.into(), value.into())])),
        }
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> TaskStoreResult<Option<String>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> TaskStoreResult<()> {
        let mut items = self.items.write().await;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Document storage keeping each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl DocumentStorage for FileStorage {
    async fn get_item(&self, key: &str) -> TaskStoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> TaskStoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Readers only ever see a complete document.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
