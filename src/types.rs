//! Records shared by the gallery, the key/value store and the site generator.
//!
//! These types are what gets persisted, so their serialized shape is the only
//! "protocol" the portfolio has. Field names stay stable across releases.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A resolved gallery image with its effective metadata.
///
/// Identity is `filename`. Tags are lower-cased and unique, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    /// Display URL: relative to the site root, or absolute.
    pub url: String,
    pub alt: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<NaiveDate>,
}

/// Partial metadata for one image.
///
/// Used both as an overlay entry (what is persisted under the
/// `gallery-metadata` key) and as an update request. `None` means "not set
/// here, fall back to whatever is underneath".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_tags"
    )]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_none() && self.category.is_none()
    }
}

/// Persisted overlay: filename → partial metadata.
pub type MetadataOverlay = BTreeMap<String, MetadataPatch>;

/// Accept any JSON for `tags`. `null` is "not set"; an array keeps its string
/// elements; anything else counts as "no tags".
fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => Some(Vec::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_tags_accept_arrays() {
        let patch: MetadataPatch =
            serde_json::from_str(r#"{"tags": ["Ocean", 7, "sea"]}"#).unwrap();
        assert_eq!(
            patch.tags,
            Some(vec!["Ocean".to_string(), "sea".to_string()])
        );
    }

    #[test]
    fn patch_malformed_tags_mean_no_tags() {
        let patch: MetadataPatch = serde_json::from_str(r#"{"tags": "ocean"}"#).unwrap();
        assert_eq!(patch.tags, Some(vec![]));
    }

    #[test]
    fn patch_null_tags_are_unset() {
        let patch: MetadataPatch = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert_eq!(patch.tags, None);
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = MetadataPatch {
            title: Some("Dawn".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"title":"Dawn"}"#);
    }

    #[test]
    fn image_record_omits_missing_date() {
        let record = ImageRecord {
            filename: "a.jpg".into(),
            url: "img/a.jpg".into(),
            alt: "A photograph".into(),
            title: "A".into(),
            category: "photography".into(),
            tags: vec!["photography".into()],
            capture_date: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("capture_date"));
        let back: ImageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
