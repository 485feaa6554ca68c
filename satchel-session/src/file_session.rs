//! File-backed session storage implementation.
//!
//! Each session lives in `{storage_directory}/{session_key}` as a JSON
//! object. The directory is created on demand every time a session path is
//! computed, so removing it while the process runs is harmless.

use crate::error::{SessionError, SessionResult};
use crate::key::SessionKey;
use crate::store::{SessionData, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// File-backed session store.
///
/// Records survive restarts. Orphaned files stay on disk until purged;
/// nothing sweeps them.
///
/// Operations on one key are serialized within the process by a per-key
/// lock, and records are replaced by writing a temporary file and renaming
/// it over the old one. There is no cross-process locking.
///
/// # Examples
///
/// ```no_run
/// use satchel_session::{FileSessionStore, SessionKey, SessionStore};
///
/// # async fn example() -> satchel_session::SessionResult<()> {
/// let store = FileSessionStore::new("./sessions");
/// let key = SessionKey::generate();
///
/// // Writes ./sessions/<key> containing `{}`
/// let data = store.load(&key).await?;
/// assert!(data.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileSessionStore {
    directory: PathBuf,
    locks: Arc<Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>>,
}

impl FileSessionStore {
    /// Create a store rooted at `directory`.
    ///
    /// Performs no I/O; the directory is created on first use.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        info!(path = ?directory, "Initialized file session store");

        Self {
            directory,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The storage directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the record for `key`, creating the storage directory if missing.
    pub async fn session_path(&self, key: &SessionKey) -> SessionResult<PathBuf> {
        fs::create_dir_all(&self.directory).await?;
        Ok(self.directory.join(key.as_str()))
    }

    async fn key_lock(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    async fn release(&self, key: &SessionKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Only the table and this handle remain: nobody is waiting on it
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
        drop(lock);
    }

    async fn write_record(&self, path: &Path, data: &SessionData) -> SessionResult<()> {
        let json =
            serde_json::to_vec(data).map_err(|e| SessionError::Serialization(e.to_string()))?;

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, &json).await?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn load_locked(&self, key: &SessionKey) -> SessionResult<SessionData> {
        let path = self.session_path(key).await?;

        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SessionError::Deserialization(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let data = SessionData::new();
                self.write_record(&path, &data).await?;
                debug!(key = %key, path = ?path, "Created empty session record");
                Ok(data)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_locked(&self, key: &SessionKey, data: &SessionData) -> SessionResult<()> {
        let path = self.session_path(key).await?;
        self.write_record(&path, data).await?;
        debug!(key = %key, fields = data.len(), "Saved session");
        Ok(())
    }

    async fn purge_locked(&self, key: &SessionKey) -> SessionResult<()> {
        let path = self.session_path(key).await?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Purged session");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    /// Read the record for `key`.
    ///
    /// When no record exists this writes one containing an empty mapping, so
    /// a loaded session always has a file on disk.
    async fn load(&self, key: &SessionKey) -> SessionResult<SessionData> {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.load_locked(key).await
        };
        self.release(key, lock).await;
        result
    }

    async fn save(&self, key: &SessionKey, data: &SessionData) -> SessionResult<()> {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.save_locked(key, data).await
        };
        self.release(key, lock).await;
        result
    }

    async fn purge(&self, key: &SessionKey) -> SessionResult<()> {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.purge_locked(key).await
        };
        self.release(key, lock).await;
        result
    }

    async fn exists(&self, key: &SessionKey) -> SessionResult<bool> {
        let path = self.session_path(key).await?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn count(&self) -> SessionResult<usize> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_record = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SessionKey::parse(name).is_ok());
            if is_record {
                count += 1;
            }
        }

        Ok(count)
    }
}
