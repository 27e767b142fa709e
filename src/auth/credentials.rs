//! Saved session on disk, so the board opens signed in

use super::{AuthError, AuthSession};
use crate::persistence::{atomic_write, read_optional, remove_if_exists};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write the session and restrict the file to its owner
    pub fn store(&self, session: &AuthSession) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| AuthError::TokenStore(e.to_string()))?;
        atomic_write(&self.path, &json)
            .map_err(|e| AuthError::TokenStore(format!("write {}: {}", self.path.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStore(format!("chmod {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }

    /// Saved session, if any. A corrupt file counts as signed out.
    pub fn load(&self) -> Option<AuthSession> {
        let content = match read_optional(&self.path) {
            Ok(content) => content?,
            Err(error) => {
                warn!(%error, "could not read saved session");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(%error, path = %self.path.display(), "ignoring unreadable saved session");
                None
            }
        }
    }

    pub fn delete(&self) -> Result<(), AuthError> {
        remove_if_exists(&self.path)
            .map_err(|e| AuthError::TokenStore(format!("delete {}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_store_load_delete() {
        let temp_dir = tempdir().unwrap();
        let file = CredentialFile::new(temp_dir.path().join("session.json"));
        assert!(file.load().is_none());

        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let session = AuthSession::new("u1", "ada@example.com", "id", "refresh", expires);
        file.store(&session).unwrap();
        assert_eq!(file.load(), Some(session));

        file.delete().unwrap();
        assert!(file.load().is_none());
        file.delete().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let file = CredentialFile::new(temp_dir.path().join("session.json"));
        file.store(&AuthSession::local()).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_signed_out() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(CredentialFile::new(path).load().is_none());
    }
}
