//! Tag index and tag filtering.
//!
//! Tags are compared case-insensitively everywhere. The index is the sorted,
//! deduplicated, lower-cased set of every tag on every image; the filter is a
//! single stable pass that keeps images carrying the requested tag.
//!
//! The string `"all"` (any casing) is the sentinel for "no filter". It always
//! wins over a real tag spelled the same way.

use crate::types::ImageRecord;
use std::collections::BTreeSet;
use std::collections::HashSet;
use thiserror::Error;

/// Sentinel filter value meaning "every image".
pub const ALL: &str = "all";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TagError {
    #[error("Duplicate tag: {0}")]
    Duplicate(String),
    #[error("Tag '{tag}' is longer than {max} characters")]
    TooLong { tag: String, max: usize },
}

/// A filter selection: everything, or one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    All,
    Tag(String),
}

impl TagFilter {
    /// Parse user input. `"all"` and blank input select everything.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
            TagFilter::All
        } else {
            TagFilter::Tag(trimmed.to_lowercase())
        }
    }

    pub fn matches(&self, image: &ImageRecord) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Tag(wanted) => {
                let wanted = wanted.to_lowercase();
                image.tags.iter().any(|t| t.to_lowercase() == wanted)
            }
        }
    }
}

/// Sorted, deduplicated, lower-cased tags across all images.
pub fn enumerate_tags(images: &[ImageRecord]) -> Vec<String> {
    images
        .iter()
        .flat_map(|img| img.tags.iter())
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Images matching `filter`, in input order.
pub fn filter_images<'a>(images: &'a [ImageRecord], filter: &TagFilter) -> Vec<&'a ImageRecord> {
    images.iter().filter(|img| filter.matches(img)).collect()
}

/// The derived tag set of a gallery. Rebuilt whenever metadata changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: Vec<String>,
}

impl TagIndex {
    pub fn build(images: &[ImageRecord]) -> Self {
        Self {
            tags: enumerate_tags(images),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search(&tag.to_lowercase()).is_ok()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Lower-case, trim and deduplicate tags, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Parse comma-separated tag input from an editor.
///
/// Blank entries are dropped. Unlike [`normalize_tags`], a repeated tag is
/// an error here, as is a tag longer than `max_len` characters.
pub fn parse_tag_input(input: &str, max_len: usize) -> Result<Vec<String>, TagError> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > max_len {
            return Err(TagError::TooLong { tag, max: max_len });
        }
        if tags.contains(&tag) {
            return Err(TagError::Duplicate(tag));
        }
        tags.push(tag);
    }
    Ok(tags)
}
