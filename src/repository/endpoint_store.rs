//! Persistence of resolved write endpoints between sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::repository::WriteKind;

/// Remembers which write endpoint last worked for each [`WriteKind`].
#[async_trait]
pub trait EndpointStore: Send + Sync {
    fn get(&self, kind: WriteKind) -> Option<String>;
    async fn set(&self, kind: WriteKind, url: &str);
    async fn clear(&self, kind: WriteKind);
}

/// Endpoint cache living only for the current process.
#[derive(Debug, Default)]
pub struct MemoryEndpointStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl MemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<&'static str, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EndpointStore for MemoryEndpointStore {
    fn get(&self, kind: WriteKind) -> Option<String> {
        self.entries().get(kind.as_str()).cloned()
    }

    async fn set(&self, kind: WriteKind, url: &str) {
        self.entries().insert(kind.as_str(), url.to_string());
    }

    async fn clear(&self, kind: WriteKind) {
        self.entries().remove(kind.as_str());
    }
}

/// Endpoint cache stored as a small JSON object on disk.
///
/// I/O failures are logged and never fail the write that triggered them; the
/// in-memory view stays authoritative for the running session.
#[derive(Debug)]
pub struct FileEndpointStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
    /// Held across each file write so the last update lands last.
    writer: tokio::sync::Mutex<()>,
}

impl FileEndpointStore {
    /// Opens the cache at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Ignoring corrupt endpoint cache {}: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log::warn!("Cannot read endpoint cache {}: {e}", path.display());
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    async fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>) + Send) {
        let _writing = self.writer.lock().await;
        let json = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut entries);
            serde_json::to_string_pretty(&*entries)
        };
        let result = match json {
            Ok(json) => self.persist(json).await,
            Err(e) => Err(std::io::Error::other(e)),
        };
        if let Err(e) = result {
            log::warn!("Failed to persist endpoint cache {}: {e}", self.path.display());
        }
    }

    async fn persist(&self, json: String) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await
    }
}

#[async_trait]
impl EndpointStore for FileEndpointStore {
    fn get(&self, kind: WriteKind) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind.as_str())
            .cloned()
    }

    async fn set(&self, kind: WriteKind, url: &str) {
        self.update(|entries| {
            entries.insert(kind.as_str().to_string(), url.to_string());
        })
        .await;
    }

    async fn clear(&self, kind: WriteKind) {
        self.update(|entries| {
            entries.remove(kind.as_str());
        })
        .await;
    }
}
