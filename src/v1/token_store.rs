/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::TokenStoreError;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Holds the single bearer token of the session.
///
/// There is never more than one token; `set` replaces it and `clear` removes it.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token store that lives only as long as the process
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write() = None;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

// On-disk layout of the token file
#[derive(Serialize, Deserialize)]
struct TokenFile {
    access_token: String,
}

/// Token store persisted as a small JSON file so the session survives restarts.
///
/// The token is loaded once when opened and kept in memory; every change is
/// written through to disk before the in-memory value is updated.
pub struct FileTokenStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileTokenStore {
    /// Opens the store at `path`. A missing file means no token.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let token = match fs::read(&path) {
            Ok(data) => Some(serde_json::from_slice::<TokenFile>(&data)?.access_token),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        debug!("Opened token store at {}, has token: {}", path.display(), token.is_some());
        Ok(Self {
            path,
            token: RwLock::new(token),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut current = self.token.write();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(&TokenFile {
            access_token: token.to_string(),
        })?;
        // Write then rename so a crash never leaves a half-written token behind
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        *current = Some(token.to_string());
        debug!("Stored token at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut current = self.token.write();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *current = None;
        debug!("Cleared token at {}", self.path.display());
        Ok(())
    }
}

impl std::fmt::Debug for FileTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTokenStore")
            .field("path", &self.path)
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

/// Clears `store` when `marker` does not exist yet, then creates the marker.
///
/// Storage can outlive an uninstall, so the first launch of a fresh install must
/// not pick up a token left by a previous one. Returns `true` if this was the
/// first launch.
pub fn clear_on_first_launch(store: &dyn TokenStore, marker: &Path) -> Result<bool, TokenStoreError> {
    if marker.exists() {
        return Ok(false);
    }
    info!("First launch detected, clearing stored token");
    if let Err(err) = store.clear() {
        warn!("Failed to clear token on first launch: {}", err);
        return Err(err);
    }
    if let Some(parent) = marker.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(marker, b"")?;
    Ok(true)
}
