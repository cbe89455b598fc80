//! Session persistence.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

use crate::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no configuration directory available for the session file")]
    NoConfigDir,
}

/// Where the client keeps its tokens between calls (and between runs).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Process-local store (tests, short-lived tools).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// JSON file store, readable only by the current user on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/bizdesk/session.json`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(dir.join("bizdesk").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(session)?;
        std::fs::write(&self.path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::from_tokens("token".into(), Some("refresh".into()), None)
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("bizdesk-test-{}", uuid::Uuid::now_v7()))
            .join("session.json")
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_persists_and_clears() {
        let path = temp_path();
        let store = FileTokenStore::new(&path);

        assert!(store.load().unwrap().is_none());
        store.save(&session()).unwrap();
        assert_eq!(FileTokenStore::new(&path).load().unwrap(), Some(session()));

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
