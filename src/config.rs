//! Portfolio configuration.
//!
//! Handles loading, validating, and merging `portfolio.toml`. Stock defaults
//! are serialized to a TOML table, the user's file is merged on top of it
//! key by key, and the result is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Exposures"
//! tagline = "Photography portfolio"
//!
//! [gallery]
//! asset_dir = "img"            # Folder holding the images, relative to the site root
//! url_prefix = "img"           # Prefix of display URLs (relative or absolute)
//! known_images = []            # Candidate filenames; empty = every image in asset_dir
//! default_category = "photography"
//!
//! [tags]
//! max_len = 32                 # Longest tag accepted by the editor
//!
//! [session]
//! duration_hours = 24          # Session lifetime after login or activity
//! idle_window_minutes = 5      # Minimum gap between activity extensions
//!
//! [auth]
//! salt = "exposures"
//! admin = []                   # sha256 hex digests, see `exposures hash-password`
//! uploader = []
//!
//! [upload]
//! max_file_bytes = 10485760           # 10 MiB per uploaded image
//! max_content_image_bytes = 5242880   # 5 MiB for logo / portrait
//!
//! [storage]
//! path = ".exposures/state.json"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the site root.
pub const CONFIG_FILENAME: &str = "portfolio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Portfolio configuration loaded from `portfolio.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Site identity shown in page titles and the hero fallback.
    pub site: SiteConfig,
    /// Where gallery images come from.
    pub gallery: GalleryConfig,
    /// Tag editing limits.
    pub tags: TagsConfig,
    /// Admin session timing.
    pub session: SessionConfig,
    /// Credential allow-lists.
    pub auth: AuthConfig,
    /// Upload size limits.
    pub upload: UploadConfig,
    /// Key/value store location.
    pub storage: StorageConfig,
}

impl PortfolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gallery.asset_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "gallery.asset_dir must not be empty".into(),
            ));
        }
        if self.tags.max_len == 0 {
            return Err(ConfigError::Validation(
                "tags.max_len must be greater than 0".into(),
            ));
        }
        if self.session.duration_hours == 0 {
            return Err(ConfigError::Validation(
                "session.duration_hours must be greater than 0".into(),
            ));
        }
        if self.session.idle_window_minutes == 0
            || u64::from(self.session.idle_window_minutes)
                >= u64::from(self.session.duration_hours) * 60
        {
            return Err(ConfigError::Validation(
                "session.idle_window_minutes must be between 1 and the session duration".into(),
            ));
        }
        if self.upload.max_file_bytes == 0 || self.upload.max_content_image_bytes == 0 {
            return Err(ConfigError::Validation(
                "upload limits must be greater than 0".into(),
            ));
        }
        for digest in self.auth.admin.iter().chain(&self.auth.uploader) {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Validation(format!(
                    "auth digest '{digest}' is not a 64-character hex sha256"
                )));
            }
        }
        if self.storage.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Exposures".to_string(),
            tagline: "Photography portfolio".to_string(),
        }
    }
}

/// Gallery source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Image folder, relative to the site root.
    pub asset_dir: String,
    /// Display URL prefix. A relative folder, or an absolute base URL such as
    /// a raw-content host. Only the URL changes; existence is always checked
    /// against `asset_dir`.
    pub url_prefix: String,
    /// Candidate filenames in display order. Empty means "discover".
    pub known_images: Vec<String>,
    /// Category used when no default tag applies.
    pub default_category: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            asset_dir: "img".to_string(),
            url_prefix: "img".to_string(),
            known_images: Vec::new(),
            default_category: "photography".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagsConfig {
    /// Longest accepted tag, in characters.
    pub max_len: usize,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self { max_len: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub duration_hours: u32,
    pub idle_window_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_hours: 24,
            idle_window_minutes: 5,
        }
    }
}

/// Credential allow-lists, one per realm.
///
/// Entries are hex `sha256(salt ‖ 0x00 ‖ password)` digests, never passwords.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub salt: String,
    pub admin: Vec<String>,
    pub uploader: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: "exposures".to_string(),
            admin: Vec::new(),
            uploader: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub max_file_bytes: u64,
    pub max_content_image_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_content_image_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Store file, relative to the site root.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ".exposures/state.json".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PortfolioConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `portfolio.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if there is no config file.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PortfolioConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PortfolioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `portfolio.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<PortfolioConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `portfolio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Exposures Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
title = "Exposures"
tagline = "Photography portfolio"

# ---------------------------------------------------------------------------
# Gallery source
# ---------------------------------------------------------------------------
[gallery]
# Folder holding the images, relative to the site root. Every candidate
# is checked for existence here; missing files are skipped silently.
asset_dir = "img"

# Prefix for display URLs. Use a relative folder for a self-contained site,
# or an absolute base URL to serve the files from elsewhere.
url_prefix = "img"

# Candidate filenames in display order. Leave empty to show every image
# found in asset_dir, sorted by name.
known_images = []

# Category used when a filename suggests no tag.
default_category = "photography"

# ---------------------------------------------------------------------------
# Tag editing
# ---------------------------------------------------------------------------
[tags]
# Longest tag, in characters, accepted by `exposures edit --tags`.
max_len = 32

# ---------------------------------------------------------------------------
# Sessions
# ---------------------------------------------------------------------------
[session]
# How long a login lasts, and how long activity extends it.
duration_hours = 24

# Activity extends a session at most once per window.
idle_window_minutes = 5

# ---------------------------------------------------------------------------
# Credentials
# ---------------------------------------------------------------------------
[auth]
# Salt mixed into every password digest. Changing it invalidates all
# digests below.
salt = "exposures"

# Allowed password digests per realm. Generate one with:
#   exposures hash-password --password '<password>'
admin = []
uploader = []

# ---------------------------------------------------------------------------
# Upload limits
# ---------------------------------------------------------------------------
[upload]
max_file_bytes = 10485760
max_content_image_bytes = 5242880

# ---------------------------------------------------------------------------
# State storage
# ---------------------------------------------------------------------------
[storage]
# JSON key/value store, relative to the site root.
path = ".exposures/state.json"
"##
}
