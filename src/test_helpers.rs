//! Shared test utilities for the exposures test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let images = vec![image("ocean.jpg", &["seascape", "ocean"])];
//! assert_eq!(images[0].url, "img/ocean.jpg");
//! assert_eq!(images[0].category, "seascape");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::naming;
use crate::types::ImageRecord;

// =========================================================================
// Records
// =========================================================================

/// An image record served from `img/`, titled from its filename.
///
/// The category is the first tag, or `photography` when there are none.
pub fn image(filename: &str, tags: &[&str]) -> ImageRecord {
    let title = naming::title_from_filename(filename);
    ImageRecord {
        filename: filename.to_string(),
        url: format!("img/{filename}"),
        alt: format!("{title} photograph"),
        title,
        category: tags.first().copied().unwrap_or("photography").to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        capture_date: None,
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// A site root with an `img/` folder holding placeholder files.
pub fn site_with_images(files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_images(tmp.path(), files);
    tmp
}

/// Write placeholder files into `<root>/img`.
pub fn write_images(root: &Path, files: &[&str]) {
    let dir = root.join("img");
    fs::create_dir_all(&dir).unwrap();
    for file in files {
        fs::write(dir.join(file), b"not really a jpeg").unwrap();
    }
}
