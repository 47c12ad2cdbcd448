//! Upload ledger for the uploader realm.
//!
//! Uploading copies image files into the gallery's asset folder, where the
//! next resolution picks them up, and records their metadata under the
//! `portfolioImages` key. The ledger never stores image bytes.
//!
//! Each file in a batch is validated on its own: a wrong type or an oversized
//! file is reported and skipped, the rest of the batch goes ahead. The ledger
//! is written once per batch. If that write fails, the files the batch
//! created are removed again.
//!
//! A record remembers whether the upload put its file into the asset folder.
//! Deleting or clearing only removes files the ledger copied there; a file
//! that was already in the gallery is left alone. An upload whose name clashes
//! with a gallery file the ledger does not own is rejected.

use crate::naming;
use crate::scan;
use crate::storage::{self, KeyValueStore, StoreError, keys};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{0}: Invalid file type. Please upload images only.")]
    InvalidType(String),
    #[error("{name}: File too large. Maximum size is {limit}.")]
    TooLarge { name: String, limit: String },
    #[error("{0}: Not a plain file name")]
    BadName(String),
    #[error("{0}: An image with this name is already in the gallery.")]
    Exists(String),
    #[error("No uploaded image with id '{0}'")]
    NotFound(String),
    #[error("Id prefix '{0}' matches more than one upload")]
    Ambiguous(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save upload list: {0}")]
    Save(#[from] StoreError),
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: String,
    pub name: String,
    pub upload_date: DateTime<Utc>,
    pub size: u64,
    #[serde(rename = "type")]
    pub media_type: String,
    /// The upload copied this file into the asset folder.
    #[serde(default)]
    pub copied: bool,
}

/// Result of one upload batch.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub accepted: Vec<UploadRecord>,
    pub rejected: Vec<UploadError>,
}

/// Human-readable size in binary units, two decimals at most.
///
/// ```text
/// 0        → "0 Bytes"
/// 1536     → "1.5 KB"
/// 10485760 → "10 MB"
/// ```
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Stable id for a file: sha256 over name, size and modification time.
pub fn file_id(name: &str, size: u64, modified: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(size.to_le_bytes());
    hasher.update(modified.timestamp_millis().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check type and size, returning the media type.
pub fn validate(name: &str, size: u64, max_bytes: u64) -> Result<&'static str, UploadError> {
    let Some(media_type) = naming::media_type(name) else {
        return Err(UploadError::InvalidType(name.to_string()));
    };
    if size > max_bytes {
        return Err(UploadError::TooLarge {
            name: name.to_string(),
            limit: format_file_size(max_bytes),
        });
    }
    Ok(media_type)
}

#[derive(Debug, Clone, Default)]
pub struct UploadLedger {
    records: Vec<UploadRecord>,
}

impl UploadLedger {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            records: storage::load_json(store, keys::UPLOADS).unwrap_or_default(),
        }
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    /// Uploaded filenames, in upload order.
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        storage::save_json(store, keys::UPLOADS, &self.records)
    }

    /// Validate and copy `files` into `asset_dir`, then record them.
    pub fn upload_files<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        files: &[PathBuf],
        asset_dir: &Path,
        max_bytes: u64,
        now: DateTime<Utc>,
    ) -> Result<UploadOutcome, UploadError> {
        let mut outcome = UploadOutcome::default();
        let mut created = Vec::new();
        let previous = self.records.clone();

        for file in files {
            match self.accept(file, asset_dir, max_bytes, now) {
                Ok((record, dest)) => {
                    debug!(name = %record.name, "upload accepted");
                    created.extend(dest);
                    self.records.retain(|r| r.name != record.name);
                    self.records.push(record.clone());
                    outcome.accepted.push(record);
                }
                Err(e) => {
                    debug!(file = %file.display(), error = %e, "upload rejected");
                    outcome.rejected.push(e);
                }
            }
        }

        if outcome.accepted.is_empty() {
            return Ok(outcome);
        }
        if let Err(e) = self.save(store) {
            self.records = previous;
            for dest in created {
                if let Err(e) = fs::remove_file(&dest) {
                    warn!(path = %dest.display(), error = %e, "failed to roll back upload");
                }
            }
            return Err(e.into());
        }
        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "upload batch recorded"
        );
        Ok(outcome)
    }

    /// Copy one file, returning its record and the path it created, if any.
    fn accept(
        &self,
        file: &Path,
        asset_dir: &Path,
        max_bytes: u64,
        now: DateTime<Utc>,
    ) -> Result<(UploadRecord, Option<PathBuf>), UploadError> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| UploadError::BadName(file.display().to_string()))?;
        if !scan::is_safe_filename(&name) {
            return Err(UploadError::BadName(name));
        }
        let meta = fs::metadata(file)?;
        let media_type = validate(&name, meta.len(), max_bytes)?;
        let modified: DateTime<Utc> = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();

        fs::create_dir_all(asset_dir)?;
        let dest = asset_dir.join(&name);
        let owned = self.records.iter().any(|r| r.name == name && r.copied);
        let (copied, created) = if scan::is_same_file(file, &dest) {
            // Already in the asset folder: record it, ownership unchanged.
            (owned, None)
        } else if dest.exists() && !owned {
            return Err(UploadError::Exists(name));
        } else {
            let created = (!dest.exists()).then(|| dest.clone());
            fs::copy(file, &dest)?;
            (true, created)
        };
        Ok((
            UploadRecord {
                id: file_id(&name, meta.len(), modified),
                name,
                upload_date: now,
                size: meta.len(),
                media_type: media_type.to_string(),
                copied,
            },
            created,
        ))
    }

    /// Position of the single record whose id starts with `id`.
    fn find(&self, id: &str) -> Result<usize, UploadError> {
        let mut hits = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| !id.is_empty() && r.id.starts_with(id));
        match (hits.next(), hits.next()) {
            (Some((position, _)), None) => Ok(position),
            (Some(_), Some(_)) => Err(UploadError::Ambiguous(id.to_string())),
            (None, _) => Err(UploadError::NotFound(id.to_string())),
        }
    }

    /// Remove one record, and its file if the upload copied it. `id` may be a
    /// unique prefix.
    pub fn delete<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: &str,
        asset_dir: &Path,
    ) -> Result<UploadRecord, UploadError> {
        let position = self.find(id)?;
        let mut remaining = self.records.clone();
        let removed = remaining.remove(position);
        storage::save_json(store, keys::UPLOADS, &remaining)?;
        self.records = remaining;
        if removed.copied {
            remove_copy(asset_dir, &removed.name);
        }
        info!(name = %removed.name, "upload deleted");
        Ok(removed)
    }

    /// Remove every record, every copied file and the store key.
    pub fn clear<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        asset_dir: &Path,
    ) -> Result<usize, UploadError> {
        store.remove(keys::UPLOADS)?;
        let removed = std::mem::take(&mut self.records);
        for record in removed.iter().filter(|r| r.copied) {
            remove_copy(asset_dir, &record.name);
        }
        info!(count = removed.len(), "uploads cleared");
        Ok(removed.len())
    }
}

fn remove_copy(asset_dir: &Path, name: &str) {
    if !scan::is_safe_filename(name) {
        return;
    }
    let path = asset_dir.join(name);
    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove uploaded file"),
    }
}
