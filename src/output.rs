//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity is shown by its identity first (positional index and title),
//! with the details that trace it back to disk or the store on indented
//! context lines:
//!
//! ```text
//! Images (2)
//! 001 Ocean View
//!     Source: ocean-view.jpg
//!     Tags: seascape, ocean
//!     Category: seascape
//! 002 March 5, 2021
//!     Source: IMG_20210305.jpg
//!     Tags: photography
//!     Category: photography
//!     Captured: 2021-03-05
//! ```
//!
//! ## Uploads
//!
//! ```text
//! Uploads (1)
//! 001 dune.jpg (1.5 KB)
//!     Id: 3f1c9a0be2d4
//!     Type: image/jpeg
//!     Uploaded: 2026-10-16 09:12 UTC
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! 001 Ocean → tag/ocean/index.html
//!
//! Generated 1 home page, 1 tag page, copied 2 images → dist
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no clock.

use crate::auth::Realm;
use crate::content::SiteContent;
use crate::generate::{GenerateSummary, capitalize};
use crate::session::GateState;
use crate::tags::TagFilter;
use crate::types::ImageRecord;
use crate::upload::{UploadOutcome, UploadRecord, format_file_size};
use chrono::{DateTime, TimeDelta, Utc};

/// Characters of an id shown in listings. Enough to pass to `uploads delete`.
const SHORT_ID: usize = 12;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 dune.jpg (1.5 KB)
/// 001 Ocean View
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `"23h 59m"`, `"4m"`, `"0m"`
fn format_remaining(remaining: TimeDelta) -> String {
    let minutes = remaining.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Inventory of gallery images with their effective metadata.
pub fn format_gallery(images: &[&ImageRecord]) -> Vec<String> {
    let mut lines = vec![format!("Images ({})", images.len())];
    for (i, image) in images.iter().enumerate() {
        lines.push(entity_header(i + 1, &image.title, None));
        lines.push(format!("{}Source: {}", indent(1), image.filename));
        if image.tags.is_empty() {
            lines.push(format!("{}Tags: (none)", indent(1)));
        } else {
            lines.push(format!("{}Tags: {}", indent(1), image.tags.join(", ")));
        }
        lines.push(format!("{}Category: {}", indent(1), image.category));
        if let Some(date) = image.capture_date {
            lines.push(format!("{}Captured: {}", indent(1), date));
        }
    }
    lines
}

pub fn print_gallery(images: &[&ImageRecord]) {
    for line in format_gallery(images) {
        println!("{}", line);
    }
}

/// The tag index, with how many images carry each tag.
///
/// ```text
/// Tags (2)
/// 001 ocean (1 image)
/// 002 seascape (3 images)
/// ```
pub fn format_tags(tags: &[String], images: &[ImageRecord]) -> Vec<String> {
    let mut lines = vec![format!("Tags ({})", tags.len())];
    for (i, tag) in tags.iter().enumerate() {
        let filter = TagFilter::Tag(tag.clone());
        let count = images.iter().filter(|img| filter.matches(img)).count();
        lines.push(entity_header(i + 1, tag, Some(&plural(count, "image", "images"))));
    }
    lines
}

pub fn print_tags(tags: &[String], images: &[ImageRecord]) {
    for line in format_tags(tags, images) {
        println!("{}", line);
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// One-line session state for a realm.
///
/// ```text
/// admin: unlocked, expires in 23h 55m (2026-10-17 09:12 UTC)
/// uploader: locked
/// ```
pub fn format_session_status(realm: Realm, state: &GateState, now: DateTime<Utc>) -> Vec<String> {
    match state {
        GateState::Locked => vec![format!("{realm}: locked")],
        GateState::Unlocked(record) => vec![format!(
            "{realm}: unlocked, expires in {} ({})",
            format_remaining(record.remaining(now)),
            format_timestamp(record.expiry)
        )],
    }
}

pub fn print_session_status(realm: Realm, state: &GateState, now: DateTime<Utc>) {
    for line in format_session_status(realm, state, now) {
        println!("{}", line);
    }
}

// ============================================================================
// Content
// ============================================================================

pub fn format_content(content: &SiteContent) -> Vec<String> {
    let image_state = |slot: &Option<String>| match slot {
        Some(data) => format!("set ({} characters)", data.len()),
        None => "not set".to_string(),
    };
    vec![
        "Hero".to_string(),
        format!("{}Title: {}", indent(1), content.hero.title),
        format!("{}Subtitle: {}", indent(1), truncate_desc(&content.hero.subtitle, 60)),
        "About".to_string(),
        format!("{}Paragraph 1: {}", indent(1), truncate_desc(&content.about.paragraph1, 60)),
        format!("{}Paragraph 2: {}", indent(1), truncate_desc(&content.about.paragraph2, 60)),
        "Contact".to_string(),
        format!("{}Instagram: {}", indent(1), content.contact.instagram),
        format!("{}Status: {}", indent(1), content.contact.status),
        "Images".to_string(),
        format!("{}Logo: {}", indent(1), image_state(&content.images.logo)),
        format!("{}Portrait: {}", indent(1), image_state(&content.images.portrait)),
    ]
}

pub fn print_content(content: &SiteContent) {
    for line in format_content(content) {
        println!("{}", line);
    }
}

// ============================================================================
// Uploads
// ============================================================================

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

pub fn format_uploads(records: &[UploadRecord]) -> Vec<String> {
    let mut lines = vec![format!("Uploads ({})", records.len())];
    for (i, record) in records.iter().enumerate() {
        lines.push(entity_header(
            i + 1,
            &record.name,
            Some(&format_file_size(record.size)),
        ));
        lines.push(format!("{}Id: {}", indent(1), short_id(&record.id)));
        lines.push(format!("{}Type: {}", indent(1), record.media_type));
        lines.push(format!(
            "{}Uploaded: {}",
            indent(1),
            format_timestamp(record.upload_date)
        ));
    }
    lines
}

pub fn print_uploads(records: &[UploadRecord]) {
    for line in format_uploads(records) {
        println!("{}", line);
    }
}

/// Per-file results of an upload batch.
///
/// ```text
/// ✓ dune.jpg (1.5 KB)
/// ✗ notes.txt: Invalid file type. Please upload images only.
/// Uploaded 1 of 2 files
/// ```
pub fn format_upload_outcome(outcome: &UploadOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    for record in &outcome.accepted {
        lines.push(format!("✓ {} ({})", record.name, format_file_size(record.size)));
    }
    for error in &outcome.rejected {
        lines.push(format!("✗ {}", error));
    }
    let total = outcome.accepted.len() + outcome.rejected.len();
    lines.push(format!(
        "Uploaded {} of {}",
        outcome.accepted.len(),
        plural(total, "file", "files")
    ));
    lines
}

pub fn print_upload_outcome(outcome: &UploadOutcome) {
    for line in format_upload_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let mut tag_pages = 0;
    for page in &summary.pages {
        match page
            .strip_prefix("tag/")
            .and_then(|p| p.strip_suffix("/index.html"))
        {
            Some(slug) => {
                tag_pages += 1;
                lines.push(format!("{} {} → {}", format_index(tag_pages), capitalize(slug), page));
            }
            None => lines.push(format!("Home → {}", page)),
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, copied {} → {}",
        plural(summary.pages.len() - tag_pages, "home page", "home pages"),
        plural(tag_pages, "tag page", "tag pages"),
        plural(summary.copied_images, "image", "images"),
        summary.output_dir.display()
    ));
    lines
}

pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
