//! Image metadata derivation and overlay merging.
//!
//! Each image's metadata comes from two independent sources:
//!
//! - **Derived defaults**, computed from the filename at resolution time
//!   (see [`crate::naming`]): a title, alt text, a default tag list and a
//!   category.
//! - **The overlay**, persisted under the `gallery-metadata` key and written
//!   by the metadata editor.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title**: overlay title → derived title
//! - **Category**: overlay category → derived category
//! - **Tags**: overlay tags (even an empty list) → derived tags
//!
//! Tags are the odd one out: clearing every tag in the editor is a deliberate
//! choice, so an empty overlay list is kept instead of falling back.
//!
//! ## Persistence
//!
//! The overlay is never edited in place. [`snapshot`] rebuilds it from the
//! complete in-memory image list after every update, so what is stored is
//! always a function of the last known state.

use crate::naming;
use crate::tags::normalize_tags;
use crate::types::{ImageRecord, MetadataOverlay, MetadataPatch};
use chrono::NaiveDate;
use tracing::debug;

/// Inputs for deriving defaults that do not come from the filename itself.
#[derive(Debug, Clone)]
pub struct DeriveContext {
    /// Upper bound for years recognised in filenames.
    pub today: NaiveDate,
    /// Category used when no default tag is available.
    pub default_category: String,
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
///
/// ```text
/// title:    resolve(&[overlay_title,    derived_title])
/// category: resolve(&[overlay_category, derived_category])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Build the default record for a resolved image.
pub fn derive_defaults(filename: &str, url: &str, ctx: &DeriveContext) -> ImageRecord {
    let capture_date = naming::capture_date_from_filename(filename, ctx.today);
    let title = match capture_date {
        Some(date) => naming::format_date_title(date),
        None => naming::title_from_filename(filename),
    };
    let tags = naming::default_tags(filename);
    let category = tags
        .first()
        .cloned()
        .unwrap_or_else(|| ctx.default_category.clone());
    ImageRecord {
        filename: filename.to_string(),
        url: url.to_string(),
        alt: format!("{title} photograph"),
        title,
        category,
        tags,
        capture_date,
    }
}

/// Merge an overlay entry onto derived defaults.
pub fn merge(defaults: ImageRecord, overlay: Option<&MetadataPatch>) -> ImageRecord {
    match overlay {
        Some(patch) => {
            let mut record = defaults;
            apply_patch(&mut record, patch);
            record
        }
        None => defaults,
    }
}

/// Apply the fields present in `patch` to `record`.
///
/// Idempotent: applying the same patch twice gives the same record.
pub fn apply_patch(record: &mut ImageRecord, patch: &MetadataPatch) {
    if let Some(title) = resolve(&[patch.title.as_deref(), Some(record.title.as_str())]) {
        record.title = title;
    }
    if let Some(category) = resolve(&[patch.category.as_deref(), Some(record.category.as_str())]) {
        record.category = category;
    }
    if let Some(tags) = &patch.tags {
        record.tags = normalize_tags(tags);
    }
}

/// Full overlay for the current image list, keyed by filename.
pub fn snapshot(images: &[ImageRecord]) -> MetadataOverlay {
    images
        .iter()
        .map(|img| {
            (
                img.filename.clone(),
                MetadataPatch {
                    title: Some(img.title.clone()),
                    tags: Some(img.tags.clone()),
                    category: Some(img.category.clone()),
                },
            )
        })
        .collect()
}

/// Decode a stored overlay document entry by entry.
///
/// A malformed entry is skipped on its own; it does not take the other
/// entries down with it. A document that is not an object is empty.
pub fn parse_overlay(value: serde_json::Value) -> MetadataOverlay {
    let serde_json::Value::Object(entries) = value else {
        debug!("metadata overlay is not an object, ignoring it");
        return MetadataOverlay::new();
    };
    entries
        .into_iter()
        .filter_map(
            |(filename, entry)| match serde_json::from_value::<MetadataPatch>(entry) {
                Ok(patch) => Some((filename, patch)),
                Err(e) => {
                    debug!(%filename, error = %e, "skipping malformed overlay entry");
                    None
                }
            },
        )
        .collect()
}

/// Lower-case, URL-safe slug for a tag, used for tag page paths.
///
/// Runs of anything outside `[a-z0-9]` collapse to one dash; leading and
/// trailing dashes are stripped. A tag with no usable characters maps to
/// `"tag"` so it still gets a page.
pub fn tag_slug(tag: &str) -> String {
    let mut slug = String::with_capacity(tag.len());
    for c in tag.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "tag".to_string()
    } else {
        trimmed.to_string()
    }
}
