use crate::models::User;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The explicit session context: bearer token plus the logged-in user,
/// persisted to a small JSON file between invocations. `clear` is the single
/// teardown that removes both deterministically (logout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    /// Read the stored session, if any. A corrupt file is treated the same
    /// as no session; the user just has to log in again.
    pub fn load(path: &Path) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).context(format!("Failed to read session file {}", path.display()))
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding unreadable session file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        fs::write(path, raw)
            .context(format!("Failed to write session file {}", path.display()))?;
        Ok(())
    }

    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).context(format!("Failed to remove session file {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn session() -> Session {
        Session {
            token: "token-abc".to_string(),
            user: User {
                id: 9,
                name: "Siti".to_string(),
                email: "siti@example.sch.id".to_string(),
                nisn: Some("0061234567".to_string()),
                role: Some(Role {
                    name: "siswa".to_string(),
                }),
            },
        }
    }

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        assert!(Session::load(&path).unwrap().is_none());

        session().save(&path).unwrap();
        let loaded = Session::load(&path).unwrap().unwrap();
        assert_eq!(loaded.token, "token-abc");
        assert_eq!(loaded.user.name, "Siti");

        Session::clear(&path).unwrap();
        assert!(Session::load(&path).unwrap().is_none());
        // Clearing twice is fine.
        Session::clear(&path).unwrap();
    }

    #[test]
    fn corrupt_session_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(Session::load(&path).unwrap().is_none());
    }
}
