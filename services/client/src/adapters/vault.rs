//! services/client/src/adapters/vault.rs
//!
//! File-backed implementation of the `TokenVault` port. The two token
//! strings are the only state this client ever persists; they live in a
//! small JSON file under the platform data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use askdoc_core::domain::TokenPair;
use askdoc_core::ports::{PortError, PortResult, TokenVault};

//=========================================================================================
// On-Disk Record
//=========================================================================================

/// The persisted shape. Key names match what the backend's web client
/// historically used, which keeps the file greppable against API docs.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VaultFile {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

//=========================================================================================
// The Adapter
//=========================================================================================

/// A token vault that persists the pair as JSON at a fixed path.
pub struct FileTokenVault {
    path: PathBuf,
}

impl FileTokenVault {
    /// Creates a new `FileTokenVault`. The file (and its parent
    /// directory) is created lazily on the first `store`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenVault for FileTokenVault {
    fn load(&self) -> PortResult<Option<TokenPair>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortError::Unexpected(format!(
                    "could not read token file: {}",
                    e
                )))
            }
        };

        let record: VaultFile = serde_json::from_slice(&bytes)
            .map_err(|e| PortError::Unexpected(format!("token file is corrupt: {}", e)))?;

        // A partial pair is treated as no session at all.
        Ok(match (record.access_token, record.refresh_token) {
            (Some(access), Some(refresh)) => Some(TokenPair { access, refresh }),
            _ => None,
        })
    }

    fn store(&self, tokens: &TokenPair) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PortError::Unexpected(format!("could not create token directory: {}", e))
            })?;
        }

        let record = VaultFile {
            access_token: Some(tokens.access.clone()),
            refresh_token: Some(tokens.refresh.clone()),
        };
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| PortError::Unexpected(format!("could not encode tokens: {}", e)))?;

        fs::write(&self.path, bytes)
            .map_err(|e| PortError::Unexpected(format!("could not write token file: {}", e)))
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!(
                "could not remove token file: {}",
                e
            ))),
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access: "access-token".to_string(),
            refresh: "refresh-token".to_string(),
        }
    }

    #[test]
    fn load_returns_none_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileTokenVault::new(dir.path().join("tokens.json"));
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn store_then_load_round_trips_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileTokenVault::new(dir.path().join("nested/tokens.json"));

        vault.store(&pair()).unwrap();
        assert_eq!(vault.load().unwrap(), Some(pair()));
    }

    #[test]
    fn clear_removes_the_pair_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileTokenVault::new(dir.path().join("tokens.json"));

        vault.store(&pair()).unwrap();
        vault.clear().unwrap();
        assert!(vault.load().unwrap().is_none());

        // Clearing an already-empty vault must not error.
        vault.clear().unwrap();
    }

    #[test]
    fn partial_record_is_treated_as_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, r#"{"accessToken":"only-one"}"#).unwrap();

        let vault = FileTokenVault::new(path);
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn uses_the_historical_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let vault = FileTokenVault::new(path.clone());

        vault.store(&pair()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("accessToken"));
        assert!(raw.contains("refreshToken"));
    }
}
