// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairing key persistence.
//!
//! The television hands out a client key the first time the user accepts
//! the pairing prompt. Presenting it on later connections skips the prompt.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::DeviceError;

/// Stores the pairing key for one television in a plain text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Creates a store backed by an explicit file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for `host` inside `dir`, named `keyfile-<host>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lgtv_bridge::device::KeyStore;
    /// use std::path::Path;
    ///
    /// let store = KeyStore::for_host("/var/lib/lgkey", "192.168.1.20");
    /// assert_eq!(store.path(), Path::new("/var/lib/lgkey/keyfile-192.168.1.20"));
    /// ```
    #[must_use]
    pub fn for_host(dir: impl AsRef<Path>, host: &str) -> Self {
        Self::new(dir.as_ref().join(format!("keyfile-{host}")))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored key.
    ///
    /// A missing or empty file means "not paired yet".
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::KeyStore`] if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<String>, DeviceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let key = content.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DeviceError::KeyStore(e)),
        }
    }

    /// Writes a key, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::KeyStore`] if the directory or file cannot be written.
    pub async fn save(&self, key: &str) -> Result<(), DeviceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, key).await?;
        tracing::info!(path = %self.path.display(), "Pairing key saved");
        Ok(())
    }
}
