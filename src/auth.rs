//! Password checks for the two gated realms.
//!
//! Passwords are never stored. The config holds, per realm, an allow-list of
//! hex digests of `sha256(salt ‖ 0x00 ‖ password)`, produced with
//! `exposures hash-password`. A candidate is trimmed, hashed the same way and
//! compared against the list.

use crate::config::AuthConfig;
use crate::storage::keys;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter a password")]
    Empty,
    #[error("Invalid {0} password. Please try again.")]
    Invalid(Realm),
}

/// A gated area with its own credentials and session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Realm {
    /// Content and metadata editing.
    Admin,
    /// Image uploads.
    Uploader,
}

impl Realm {
    /// Store key holding this realm's session record.
    pub fn storage_key(self) -> &'static str {
        match self {
            Realm::Admin => keys::ADMIN_SESSION,
            Realm::Uploader => keys::UPLOADER_SESSION,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Realm::Admin => "admin",
            Realm::Uploader => "uploader",
        }
    }

    fn allow_list(self, config: &AuthConfig) -> &[String] {
        match self {
            Realm::Admin => &config.admin,
            Realm::Uploader => &config.uploader,
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hex digest of a password under `salt`. The password is used as given.
pub fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a candidate password against a realm's allow-list.
pub fn verify(config: &AuthConfig, realm: Realm, candidate: &str) -> Result<(), AuthError> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(AuthError::Empty);
    }
    let hashed = digest(&config.salt, candidate);
    if realm
        .allow_list(config)
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&hashed))
    {
        Ok(())
    } else {
        Err(AuthError::Invalid(realm))
    }
}
