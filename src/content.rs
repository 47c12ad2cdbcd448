//! Editable site content: hero, about, contact and two optional images.
//!
//! The stored document is an overlay. Each of the four sections is either
//! present, replacing the default section whole, or absent. Reading merges
//! the overlay onto [`SiteContent::default`]:
//!
//! ```text
//! stored:  { "hero": { "title": "Light", "subtitle": "Studies" } }
//! read:    hero = stored hero, about/contact/images = defaults
//! ```
//!
//! Sections are decoded one by one, so a damaged `about` entry falls back to
//! the default about text without losing a good `hero`.
//!
//! Text updates validate that every field of the section is non-empty after
//! trimming. A rejected update writes nothing.

use crate::naming;
use crate::storage::{self, KeyValueStore, StoreError, keys};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Please fill in all {0} fields")]
    Incomplete(Section),
    #[error("Please select an image file for the {slot}: {path}")]
    NotAnImage { slot: ImageSlot, path: String },
    #[error("{slot} file too large. Please use an image under {limit}")]
    TooLarge { slot: ImageSlot, limit: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save content changes: {0}")]
    Save(#[from] StoreError),
}

/// Text sections validated as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hero,
    About,
    Contact,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Hero => "hero",
            Section::About => "about",
            Section::Contact => "contact",
        })
    }
}

/// The two image slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Portrait,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageSlot::Logo => "logo",
            ImageSlot::Portrait => "portrait",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub paragraph1: String,
    pub paragraph2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub instagram: String,
    pub status: String,
}

/// Data URLs for the logo and portrait. `None` shows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentImages {
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub portrait: Option<String>,
}

impl ContentImages {
    fn slot_mut(&mut self, slot: ImageSlot) -> &mut Option<String> {
        match slot {
            ImageSlot::Logo => &mut self.logo,
            ImageSlot::Portrait => &mut self.portrait,
        }
    }
}

/// Effective site content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContent {
    pub hero: Hero,
    pub about: About,
    pub contact: Contact,
    pub images: ContentImages,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            hero: Hero {
                title: "Capturing Moments".into(),
                subtitle: "A curated collection of photography that tells stories through light and composition".into(),
            },
            about: About {
                paragraph1: "Welcome to my photography portfolio. I'm passionate about capturing the beauty of the natural world and sharing moments that inspire and move people. Each photograph tells a story, whether it's the serene tranquility of a mountain landscape or the dynamic energy of ocean waves.".into(),
                paragraph2: "My work focuses on landscape and nature photography, always seeking to find the extraordinary in the ordinary and to showcase the incredible diversity and beauty of our planet.".into(),
            },
            contact: Contact {
                instagram: "@gabe_corr".into(),
                status: "Available for commissions".into(),
            },
            images: ContentImages::default(),
        }
    }
}

/// Persisted overlay: only the sections that were ever saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<About>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ContentImages>,
}

impl ContentOverlay {
    /// Apply onto defaults. Present sections replace the default whole.
    pub fn apply(&self, base: SiteContent) -> SiteContent {
        SiteContent {
            hero: self.hero.clone().unwrap_or(base.hero),
            about: self.about.clone().unwrap_or(base.about),
            contact: self.contact.clone().unwrap_or(base.contact),
            images: self.images.clone().unwrap_or(base.images),
        }
    }
}

fn section<T: serde::de::DeserializeOwned>(
    doc: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Option<T> {
    let value = doc.get(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(section = name, error = %e, "stored content section does not parse, using default");
            None
        }
    }
}

/// Read the stored overlay, section by section.
pub fn load_overlay<S: KeyValueStore + ?Sized>(store: &S) -> ContentOverlay {
    let Some(serde_json::Value::Object(doc)) =
        storage::load_json::<serde_json::Value, _>(store, keys::SITE_CONTENT)
    else {
        return ContentOverlay::default();
    };
    ContentOverlay {
        hero: section(&doc, "hero"),
        about: section(&doc, "about"),
        contact: section(&doc, "contact"),
        images: section(&doc, "images"),
    }
}

/// Effective content: stored overlay on top of the defaults.
pub fn read_content<S: KeyValueStore + ?Sized>(store: &S) -> SiteContent {
    load_overlay(store).apply(SiteContent::default())
}

/// Both fields trimmed, or `Incomplete` if either is blank.
fn require_filled(section: Section, a: &str, b: &str) -> Result<(String, String), ContentError> {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return Err(ContentError::Incomplete(section));
    }
    Ok((a.to_string(), b.to_string()))
}

fn save_overlay<S: KeyValueStore + ?Sized>(
    store: &mut S,
    overlay: &ContentOverlay,
) -> Result<SiteContent, ContentError> {
    storage::save_json(store, keys::SITE_CONTENT, overlay)?;
    Ok(overlay.apply(SiteContent::default()))
}

pub fn update_hero<S: KeyValueStore + ?Sized>(
    store: &mut S,
    title: &str,
    subtitle: &str,
) -> Result<SiteContent, ContentError> {
    let (title, subtitle) = require_filled(Section::Hero, title, subtitle)?;
    let mut overlay = load_overlay(store);
    overlay.hero = Some(Hero { title, subtitle });
    let content = save_overlay(store, &overlay)?;
    info!("hero section updated");
    Ok(content)
}

pub fn update_about<S: KeyValueStore + ?Sized>(
    store: &mut S,
    paragraph1: &str,
    paragraph2: &str,
) -> Result<SiteContent, ContentError> {
    let (paragraph1, paragraph2) = require_filled(Section::About, paragraph1, paragraph2)?;
    let mut overlay = load_overlay(store);
    overlay.about = Some(About {
        paragraph1,
        paragraph2,
    });
    let content = save_overlay(store, &overlay)?;
    info!("about section updated");
    Ok(content)
}

pub fn update_contact<S: KeyValueStore + ?Sized>(
    store: &mut S,
    instagram: &str,
    status: &str,
) -> Result<SiteContent, ContentError> {
    let (instagram, status) = require_filled(Section::Contact, instagram, status)?;
    let mut overlay = load_overlay(store);
    overlay.contact = Some(Contact { instagram, status });
    let content = save_overlay(store, &overlay)?;
    info!("contact section updated");
    Ok(content)
}

/// Encode an image file as a `data:` URL after checking type and size.
pub fn encode_data_url(path: &Path, slot: ImageSlot, max_bytes: u64) -> Result<String, ContentError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let Some(mime) = naming::media_type(name) else {
        return Err(ContentError::NotAnImage {
            slot,
            path: path.display().to_string(),
        });
    };
    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(ContentError::TooLarge {
            slot,
            limit: crate::upload::format_file_size(max_bytes),
        });
    }
    let bytes = fs::read(path)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Store an image file in one slot, keeping the other slot as it was.
pub fn set_image<S: KeyValueStore + ?Sized>(
    store: &mut S,
    slot: ImageSlot,
    path: &Path,
    max_bytes: u64,
) -> Result<SiteContent, ContentError> {
    let data_url = encode_data_url(path, slot, max_bytes)?;
    let mut overlay = load_overlay(store);
    let mut images = overlay
        .images
        .take()
        .unwrap_or_else(|| SiteContent::default().images);
    *images.slot_mut(slot) = Some(data_url);
    overlay.images = Some(images);
    let content = save_overlay(store, &overlay)?;
    info!(%slot, "content image updated");
    Ok(content)
}
