//! Session Store
//!
//! Holds the bearer token and persists it under the fixed `jwt_token` key
//! (a file of that name inside the token directory). Token presence is the
//! only authentication signal on the client side; the backend stays the
//! authority on whether the token is still accepted.

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ClientError;

/// Storage key of the persisted token.
pub const TOKEN_KEY: &str = "jwt_token";

/// Which affordances the UI shows for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthGate {
    pub show_profile: bool,
    pub show_login: bool,
}

impl AuthGate {
    pub fn for_token_present(present: bool) -> Self {
        Self {
            show_profile: present,
            show_login: !present,
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
    /// None for an in-memory store
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// Open the store in `dir`, loading a previously persisted token if any.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = dir.as_ref().join(TOKEN_KEY);

        let token = match fs::read_to_string(&path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        debug!("Opened session store at {} (token present: {})", path.display(), token.is_some());

        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::for_token_present(self.is_authenticated())
    }

    pub fn set_token(&self, token: &str) -> Result<(), ClientError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, token)?;
        }
        *self.token.write() = Some(token.to_string());
        info!("Session token stored");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        *self.token.write() = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("Session token cleared");
        Ok(())
    }
}
