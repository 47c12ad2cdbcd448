//! Image source resolution.
//!
//! Turns the configured candidate list into the set of images that actually
//! exist. The candidate list is a superset of what is on disk, so a missing
//! file is the normal case, not an error.
//!
//! ## Candidates
//!
//! ```text
//! site/
//! ├── portfolio.toml        # [gallery] known_images = [...]
//! └── img/                  # asset_dir
//!     ├── ocean-view.jpg
//!     ├── peak.jpg
//!     └── notes.txt         # never a candidate: not an image extension
//! ```
//!
//! - With `known_images` set, those names are the candidates, in order.
//! - With `known_images` empty, every image file directly inside `asset_dir`
//!   is a candidate, sorted by name.
//! - Uploaded filenames are appended after either list, skipping repeats.
//!
//! Names containing a path separator or `..` are dropped with a debug log.
//!
//! ## Probing
//!
//! Each candidate is checked independently and in parallel. Probes may finish
//! in any order; results are keyed by candidate position, so the output order
//! is always the candidate order.
//!
//! ## Generations
//!
//! A [`Resolution`] carries the generation number it was started under. The
//! gallery only applies a resolution whose generation is still current, so a
//! slow resolution finishing after a newer one cannot overwrite it.

use crate::config::GalleryConfig;
use crate::naming;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset folder is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to list asset folder: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A candidate confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub filename: String,
    /// Display URL built from the configured prefix.
    pub url: String,
    /// Location on disk.
    pub path: PathBuf,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub generation: u64,
    pub images: Vec<ResolvedImage>,
}

/// Absolute asset folder for a site root.
pub fn asset_dir(root: &Path, config: &GalleryConfig) -> PathBuf {
    root.join(&config.asset_dir)
}

/// Display URL for a filename under `prefix`.
///
/// ```text
/// display_url("img", "a.jpg")                       → "img/a.jpg"
/// display_url("https://cdn.example.com/p/", "a.jpg") → "https://cdn.example.com/p/a.jpg"
/// display_url("", "a.jpg")                          → "a.jpg"
/// ```
pub fn display_url(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{prefix}/{filename}")
    }
}

/// Whether two paths name the same existing file.
///
/// A path that does not exist is never the same as anything.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A bare filename: no separators, no parent references, not empty.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

/// Candidate filenames in display order.
///
/// `extra` holds names known from elsewhere (the upload ledger) and is
/// appended after the configured or discovered names.
pub fn candidates(
    root: &Path,
    config: &GalleryConfig,
    extra: &[String],
) -> Result<Vec<String>, ScanError> {
    let base = if config.known_images.is_empty() {
        discover(&asset_dir(root, config))?
    } else {
        config.known_images.clone()
    };

    let mut seen = HashSet::new();
    Ok(base
        .into_iter()
        .chain(extra.iter().cloned())
        .filter(|name| {
            if is_safe_filename(name) {
                true
            } else {
                debug!(%name, "skipping candidate with path components");
                false
            }
        })
        .filter(|name| seen.insert(name.clone()))
        .collect())
}

/// Image files directly inside `dir`, sorted by name.
///
/// A missing folder is an empty gallery. A path that exists but is not a
/// directory is an error.
fn discover(dir: &Path) -> Result<Vec<String>, ScanError> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "asset folder does not exist");
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && naming::is_image_filename(name)
        {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Check each candidate for existence under `dir`.
///
/// Probes run in parallel. Failed probes are dropped silently; the result
/// keeps candidate order.
pub fn probe(dir: &Path, url_prefix: &str, candidates: &[String]) -> Vec<ResolvedImage> {
    let mut found: Vec<(usize, ResolvedImage)> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(position, filename)| {
            let path = dir.join(filename);
            if path.is_file() {
                Some((
                    position,
                    ResolvedImage {
                        filename: filename.clone(),
                        url: display_url(url_prefix, filename),
                        path,
                    },
                ))
            } else {
                debug!(%filename, "candidate not found, excluding");
                None
            }
        })
        .collect();
    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, image)| image).collect()
}

/// Resolve the gallery for a site root under the given generation.
pub fn resolve(
    root: &Path,
    config: &GalleryConfig,
    generation: u64,
    extra: &[String],
) -> Result<Resolution, ScanError> {
    let names = candidates(root, config, extra)?;
    let images = probe(&asset_dir(root, config), &config.url_prefix, &names);
    debug!(
        generation,
        candidates = names.len(),
        found = images.len(),
        "resolved gallery"
    );
    Ok(Resolution { generation, images })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::site_with_images as site;
    use std::fs;
    use tempfile::TempDir;

    fn names(images: &[ResolvedImage]) -> Vec<&str> {
        images.iter().map(|i| i.filename.as_str()).collect()
    }

    // =========================================================================
    // display_url() tests
    // =========================================================================

    #[test]
    fn display_url_joins_prefix() {
        assert_eq!(display_url("img", "a.jpg"), "img/a.jpg");
        assert_eq!(display_url("img/", "a.jpg"), "img/a.jpg");
        assert_eq!(
            display_url("https://raw.example.com/u/r/main/img", "a.jpg"),
            "https://raw.example.com/u/r/main/img/a.jpg"
        );
        assert_eq!(display_url("", "a.jpg"), "a.jpg");
    }

    #[test]
    fn safe_filename_rejects_paths() {
        assert!(is_safe_filename("a.jpg"));
        assert!(!is_safe_filename("../a.jpg"));
        assert!(!is_safe_filename("sub/a.jpg"));
        assert!(!is_safe_filename("sub\\a.jpg"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn same_file_follows_paths_not_names() {
        let tmp = site(&["a.jpg"]);
        let direct = tmp.path().join("img/a.jpg");
        let roundabout = tmp.path().join("img/../img/a.jpg");
        assert!(is_same_file(&direct, &roundabout));
        assert!(!is_same_file(&direct, &tmp.path().join("a.jpg")));
        assert!(!is_same_file(&tmp.path().join("x.jpg"), &tmp.path().join("x.jpg")));
    }

    // =========================================================================
    // candidates() tests
    // =========================================================================

    #[test]
    fn known_images_keep_configured_order() {
        let tmp = site(&[]);
        let config = GalleryConfig {
            known_images: vec!["z.jpg".into(), "a.jpg".into()],
            ..Default::default()
        };
        assert_eq!(
            candidates(tmp.path(), &config, &[]).unwrap(),
            vec!["z.jpg", "a.jpg"]
        );
    }

    #[test]
    fn empty_known_images_discovers_folder() {
        let tmp = site(&["peak.jpg", "notes.txt", "ocean.PNG"]);
        fs::create_dir_all(tmp.path().join("img/nested")).unwrap();
        let config = GalleryConfig::default();
        assert_eq!(
            candidates(tmp.path(), &config, &[]).unwrap(),
            vec!["ocean.PNG", "peak.jpg"]
        );
    }

    #[test]
    fn extra_names_are_appended_once() {
        let tmp = site(&["a.jpg"]);
        let config = GalleryConfig::default();
        let extra = vec!["b.jpg".to_string(), "a.jpg".to_string()];
        assert_eq!(
            candidates(tmp.path(), &config, &extra).unwrap(),
            vec!["a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn missing_asset_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        let config = GalleryConfig::default();
        assert!(candidates(tmp.path(), &config, &[]).unwrap().is_empty());
    }

    #[test]
    fn asset_path_that_is_a_file_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img"), b"oops").unwrap();
        let result = candidates(tmp.path(), &GalleryConfig::default(), &[]);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    // =========================================================================
    // probe() / resolve() tests
    // =========================================================================

    #[test]
    fn probe_excludes_missing_and_keeps_order() {
        let tmp = site(&["c.jpg", "a.jpg"]);
        let wanted: Vec<String> = ["c.jpg", "missing.jpg", "a.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let found = probe(&tmp.path().join("img"), "img", &wanted);
        assert_eq!(names(&found), vec!["c.jpg", "a.jpg"]);
        assert_eq!(found[0].url, "img/c.jpg");
    }

    #[test]
    fn probe_order_holds_for_many_candidates() {
        let files: Vec<String> = (0..64).map(|i| format!("{:03}.jpg", 63 - i)).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let tmp = site(&refs);
        let found = probe(&tmp.path().join("img"), "img", &files);
        assert_eq!(names(&found), refs);
    }

    #[test]
    fn resolve_carries_generation() {
        let tmp = site(&["ocean.jpg"]);
        let resolution = resolve(tmp.path(), &GalleryConfig::default(), 7, &[]).unwrap();
        assert_eq!(resolution.generation, 7);
        assert_eq!(names(&resolution.images), vec!["ocean.jpg"]);
        assert_eq!(resolution.images[0].path, tmp.path().join("img/ocean.jpg"));
    }

    #[test]
    fn resolve_uses_absolute_url_prefix() {
        let tmp = site(&["ocean.jpg"]);
        let config = GalleryConfig {
            url_prefix: "https://raw.example.com/gabe/portfolio/main/img".into(),
            ..Default::default()
        };
        let resolution = resolve(tmp.path(), &config, 1, &[]).unwrap();
        assert_eq!(
            resolution.images[0].url,
            "https://raw.example.com/gabe/portfolio/main/img/ocean.jpg"
        );
    }
}
