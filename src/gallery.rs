//! Gallery state: resolved images, their effective metadata and the tag index.
//!
//! The pipeline is resolver → metadata merge → tag index. [`Gallery`] owns the
//! result of each stage and rebuilds the later stages whenever an earlier one
//! changes, so `images`, `overlay` and `index` never disagree.
//!
//! Metadata updates write the whole overlay snapshot to the store before the
//! in-memory state changes. A failed write leaves the gallery exactly as it
//! was.

use crate::metadata::{self, DeriveContext};
use crate::scan::Resolution;
use crate::storage::{self, KeyValueStore, StoreError, keys};
use crate::tags::{self, TagFilter, TagIndex};
use crate::types::{ImageRecord, MetadataOverlay, MetadataPatch};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("No image named '{0}' in the gallery")]
    UnknownImage(String),
    #[error("Failed to save metadata: {0}")]
    Save(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct Gallery {
    images: Vec<ImageRecord>,
    overlay: MetadataOverlay,
    index: TagIndex,
    generation: u64,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay(overlay: MetadataOverlay) -> Self {
        Self {
            overlay,
            ..Self::default()
        }
    }

    /// Read the persisted overlay. Anything unreadable counts as no overlay.
    pub fn load_overlay<S: KeyValueStore + ?Sized>(store: &S) -> MetadataOverlay {
        storage::load_json::<serde_json::Value, _>(store, keys::GALLERY_METADATA)
            .map(metadata::parse_overlay)
            .unwrap_or_default()
    }

    /// Start a new resolution and return its generation.
    ///
    /// Any resolution started earlier becomes stale.
    pub fn begin_resolution(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a finished resolution. Returns `false` and changes nothing if a
    /// newer resolution has been started since.
    pub fn apply_resolution(&mut self, resolution: Resolution, ctx: &DeriveContext) -> bool {
        if resolution.generation != self.generation {
            debug!(
                stale = resolution.generation,
                current = self.generation,
                "discarding stale resolution"
            );
            return false;
        }
        self.images = resolution
            .images
            .iter()
            .map(|img| {
                let defaults = metadata::derive_defaults(&img.filename, &img.url, ctx);
                metadata::merge(defaults, self.overlay.get(&img.filename))
            })
            .collect();
        self.index = TagIndex::build(&self.images);
        true
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn image(&self, filename: &str) -> Option<&ImageRecord> {
        self.images.iter().find(|img| img.filename == filename)
    }

    pub fn tags(&self) -> &TagIndex {
        &self.index
    }

    pub fn overlay(&self) -> &MetadataOverlay {
        &self.overlay
    }

    pub fn filter(&self, filter: &TagFilter) -> Vec<&ImageRecord> {
        tags::filter_images(&self.images, filter)
    }

    /// Merge `patch` into one image and persist the full metadata snapshot.
    pub fn update_metadata<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        filename: &str,
        patch: &MetadataPatch,
    ) -> Result<&ImageRecord, GalleryError> {
        let position = self
            .images
            .iter()
            .position(|img| img.filename == filename)
            .ok_or_else(|| GalleryError::UnknownImage(filename.to_string()))?;

        let mut updated = self.images.clone();
        metadata::apply_patch(&mut updated[position], patch);
        let snapshot = metadata::snapshot(&updated);
        storage::save_json(store, keys::GALLERY_METADATA, &snapshot)?;

        info!(%filename, "saved image metadata");
        self.images = updated;
        self.overlay = snapshot;
        self.index = TagIndex::build(&self.images);
        Ok(&self.images[position])
    }
}
