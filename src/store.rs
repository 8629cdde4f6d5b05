//! Persisted token artifact storage.

use crate::credential::Credential;
use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed storage for the serialized [`Credential`].
///
/// The artifact is a single JSON document overwritten wholesale on every
/// save. No locking: concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted credential, if any.
    ///
    /// A missing file is the absent state, not an error. An artifact that
    /// exists but no longer parses is also treated as absent (with a
    /// warning), so the caller re-authorizes instead of getting stuck on a
    /// corrupt file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<Credential>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted token artifact");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(credential) => {
                debug!(path = %self.path.display(), "loaded persisted credential");
                Ok(Some(credential))
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "persisted token artifact is unreadable, ignoring it: {e}"
                );
                Ok(None)
            }
        }
    }

    /// Persists the credential, overwriting any previous artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "persisted credential");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scope::ScopeSet;
    use chrono::{Duration, Utc};
    use std::env;

    fn temp_token_path() -> PathBuf {
        env::temp_dir().join(format!(
            "gmail-auth-store-test-{}-{:08x}",
            std::process::id(),
            rand::random::<u32>()
        ))
    }

    #[test]
    fn test_load_absent_artifact() {
        let store = TokenStore::new(temp_token_path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_token_path();
        let store = TokenStore::new(&path);

        let credential = Credential::new("access123", ScopeSet::gmail())
            .with_refresh_token("refresh456")
            .with_expires_at(Utc::now() + Duration::seconds(3600));
        store.save(&credential).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access123");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh456"));
        assert!(loaded.authorized_for(&ScopeSet::gmail()));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let path = temp_token_path();
        let store = TokenStore::new(&path);

        let first = Credential::new("first", ScopeSet::gmail()).with_refresh_token("keepme");
        store.save(&first).unwrap();

        let second = Credential::new("second", ScopeSet::gmail());
        store.save(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
        // No partial update: the old refresh token does not leak through.
        assert!(loaded.refresh_token.is_none());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_corrupt_artifact_treated_as_absent() {
        let path = temp_token_path();
        fs::write(&path, "not json at all").unwrap();

        let store = TokenStore::new(&path);
        assert!(store.load().unwrap().is_none());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = temp_token_path();
        let path = dir.join("nested").join("token.json");
        let store = TokenStore::new(&path);

        store
            .save(&Credential::new("access123", ScopeSet::gmail()))
            .unwrap();
        assert!(path.exists());

        fs::remove_dir_all(dir).unwrap();
    }
}
