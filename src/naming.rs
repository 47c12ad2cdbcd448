//! Filename conventions for gallery images.
//!
//! The image filename is the only thing the resolver knows about a photo, so
//! every default a record starts with is derived from it here:
//!
//! - **Title**: a capture date embedded in the name (`20210305`, `2021-03-05`,
//!   `2021_03_05`, `IMG_20210305`, `DSC20210305`) renders as `"March 5, 2021"`.
//!   Without a date the stem is used, dashes and underscores become spaces and
//!   each word is capitalized: `misty-forest_walk.jpg` → "Misty Forest Walk".
//! - **Tags**: the first keyword from [`TAG_KEYWORDS`] found in the lower-cased
//!   stem decides the default tag list, `["photography"]` otherwise.
//! - **Media type**: decided by extension alone. Files are never sniffed.

use chrono::{Datelike, NaiveDate};

/// Extensions accepted as gallery images, with their media types.
pub const IMAGE_MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Keyword table for default tags. Order matters: the first match wins.
pub const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("mountain", &["landscape", "mountain"]),
    ("forest", &["nature", "forest"]),
    ("ocean", &["seascape", "ocean"]),
    ("beach", &["seascape", "beach"]),
    ("sunset", &["landscape", "sunset"]),
    ("sunrise", &["landscape", "sunrise"]),
    ("nature", &["nature"]),
    ("landscape", &["landscape"]),
    ("portrait", &["portrait"]),
    ("photography", &["photography"]),
];

const FALLBACK_TAG: &str = "photography";

/// Split `name.ext` into stem and extension. Dotfiles keep their full name as stem.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < filename.len() => {
            (&filename[..pos], Some(&filename[pos + 1..]))
        }
        _ => (filename, None),
    }
}

/// Media type for an image filename, or `None` if the extension is not supported.
pub fn media_type(filename: &str) -> Option<&'static str> {
    let ext = split_extension(filename).1?.to_ascii_lowercase();
    IMAGE_MEDIA_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

pub fn is_image_filename(filename: &str) -> bool {
    media_type(filename).is_some()
}

/// Human-readable title from the filename stem.
///
/// - `"misty-forest_walk.jpg"` → `"Misty Forest Walk"`
/// - `"DSC_0696-2.jpg"` → `"DSC 0696 2"`
pub fn title_from_filename(filename: &str) -> String {
    let (stem, _) = split_extension(filename);
    let spaced = stem.replace(['-', '_'], " ");
    let mut title = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start && c.is_alphanumeric() {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    title
}

/// Find a capture date embedded in the filename.
///
/// Each pattern is tried in turn against its leftmost match; a match that
/// is not a real calendar date, or whose year is outside `1900..=today`,
/// moves on to the next pattern rather than the next position.
pub fn capture_date_from_filename(filename: &str, today: NaiveDate) -> Option<NaiveDate> {
    let bytes = filename.as_bytes();
    [None, Some(b'-'), Some(b'_')]
        .into_iter()
        .filter_map(|sep| find_date_run(bytes, sep))
        .find_map(|(y, m, d)| {
            if !(1900..=today.year()).contains(&y) {
                return None;
            }
            NaiveDate::from_ymd_opt(y, m, d)
        })
}

/// Leftmost `YYYY[sep]MM[sep]DD` in `bytes`, as raw numbers.
fn find_date_run(bytes: &[u8], sep: Option<u8>) -> Option<(i32, u32, u32)> {
    let sep_len = usize::from(sep.is_some());
    let run_len = 8 + 2 * sep_len;
    if bytes.len() < run_len {
        return None;
    }
    (0..=bytes.len() - run_len).find_map(|start| {
        let run = &bytes[start..start + run_len];
        let year = &run[0..4];
        let month = &run[4 + sep_len..6 + sep_len];
        let day = &run[6 + 2 * sep_len..8 + 2 * sep_len];
        if let Some(s) = sep
            && (run[4] != s || run[6 + sep_len] != s)
        {
            return None;
        }
        Some((
            parse_digits(year)? as i32,
            parse_digits(month)?,
            parse_digits(day)?,
        ))
    })
}

fn parse_digits(digits: &[u8]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

/// `"March 5, 2021"`.
pub fn format_date_title(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Default tags from keywords in the filename.
pub fn default_tags(filename: &str) -> Vec<String> {
    let stem = split_extension(filename).0.to_lowercase();
    TAG_KEYWORDS
        .iter()
        .find(|(keyword, _)| stem.contains(keyword))
        .map(|(_, tags)| tags.iter().map(|t| t.to_string()).collect())
        .unwrap_or_else(|| vec![FALLBACK_TAG.to_string()])
}
