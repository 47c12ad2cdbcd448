//! Static site generation.
//!
//! Renders the public portfolio from the current gallery state and site
//! content. The browser-side tag filter becomes one static page per tag.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Hero, full gallery, about, contact
//! ├── img/                       # Copied gallery images (relative URL prefix only)
//! │   ├── ocean-view.jpg
//! │   └── peak.jpg
//! └── tag/
//!     ├── ocean/index.html       # Gallery filtered to "ocean"
//!     └── seascape/index.html
//! ```
//!
//! Images with an absolute display URL are referenced in place and not
//! copied.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating, so
//! every title, tag and caption is escaped. The about paragraphs are markdown;
//! raw HTML inside them is rendered as text.

use crate::config::SiteConfig;
use crate::content::SiteContent;
use crate::metadata::tag_slug;
use crate::scan::{self, ResolvedImage};
use crate::tags::{self, TagFilter};
use crate::types::ImageRecord;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Parser, html as md_html};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS: &str = include_str!("../static/style.css");

/// Everything a build renders from.
#[derive(Debug, Clone, Copy)]
pub struct SiteInput<'a> {
    pub site: &'a SiteConfig,
    pub content: &'a SiteContent,
    pub images: &'a [ImageRecord],
    pub tags: &'a [String],
}

/// What a build wrote, relative to the output directory.
#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub output_dir: PathBuf,
    pub pages: Vec<String>,
    pub copied_images: usize,
}

/// A tag and the slug of its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPage {
    pub tag: String,
    pub slug: String,
}

/// Slugs for every tag, made unique with a numeric suffix.
pub fn tag_pages(tags: &[String]) -> Vec<TagPage> {
    let mut used = HashSet::new();
    tags.iter()
        .map(|tag| {
            let base = tag_slug(tag);
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{base}-{n}");
                n += 1;
            }
            TagPage {
                tag: tag.clone(),
                slug,
            }
        })
        .collect()
}

pub fn generate(
    input: &SiteInput<'_>,
    resolved: &[ResolvedImage],
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    fs::create_dir_all(output_dir)?;
    let mut summary = GenerateSummary {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };

    // Copy images served from a relative URL
    for image in resolved {
        if is_external(&image.url) {
            continue;
        }
        let dest = output_dir.join(&image.url);
        // Building into the site root puts the destination on the source.
        if scan::is_same_file(&image.path, &dest) {
            debug!(filename = %image.filename, "image already in place");
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&image.path, &dest)?;
        summary.copied_images += 1;
    }

    let pages = tag_pages(input.tags);

    let index = render_index(input, &pages);
    fs::write(output_dir.join("index.html"), index.into_string())?;
    summary.pages.push("index.html".to_string());

    for page in &pages {
        let dir = output_dir.join("tag").join(&page.slug);
        fs::create_dir_all(&dir)?;
        let html = render_tag_page(input, &pages, page);
        fs::write(dir.join("index.html"), html.into_string())?;
        summary.pages.push(format!("tag/{}/index.html", page.slug));
    }

    debug!(
        pages = summary.pages.len(),
        images = summary.copied_images,
        "site generated"
    );
    Ok(summary)
}

/// Absolute URLs, root-relative paths and data URLs are used as is.
fn is_external(url: &str) -> bool {
    url.contains("://") || url.starts_with('/') || url.starts_with("data:")
}

/// `url` as seen from a page `depth` directories below the output root.
fn href(url: &str, depth: usize) -> String {
    if is_external(url) {
        url.to_string()
    } else {
        format!("{}{url}", "../".repeat(depth))
    }
}

/// `url` with its last path segment percent-encoded.
///
/// ```text
/// "img/a#1.jpg"                         → "img/a%231.jpg"
/// "https://cdn.example.com/p/b c.jpg"   → "https://cdn.example.com/p/b%20c.jpg"
/// ```
fn encode_filename(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{}", urlencoding::encode(file)),
        None => urlencoding::encode(url).into_owned(),
    }
}

/// `"seascape"` → `"Seascape"`
pub fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Markdown to HTML with embedded HTML demoted to text.
fn render_markdown(source: &str) -> String {
    let parser = Parser::new(source).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

fn site_header(input: &SiteInput<'_>, depth: usize) -> Markup {
    html! {
        header.site-header {
            a.brand href=(href("index.html", depth)) {
                @if let Some(logo) = &input.content.images.logo {
                    img.logo src=(logo) alt="Logo";
                } @else {
                    (input.site.title)
                }
            }
            nav.site-nav {
                a href={ (href("index.html", depth)) "#gallery" } { "Gallery" }
                a href={ (href("index.html", depth)) "#about" } { "About" }
                a href={ (href("index.html", depth)) "#contact" } { "Contact" }
            }
        }
    }
}

/// "All" plus one button per tag. `current` is `None` on the index page.
fn filter_bar(pages: &[TagPage], current: Option<&TagPage>, depth: usize) -> Markup {
    html! {
        nav.filter-bar {
            a.filter-btn.active[current.is_none()] href=(href("index.html", depth)) { "All" }
            @for page in pages {
                @let active = current.is_some_and(|c| c.slug == page.slug);
                a.filter-btn.active[active]
                    href=(href(&format!("tag/{}/index.html", page.slug), depth)) {
                    (capitalize(&page.tag))
                }
            }
        }
    }
}

fn gallery_item(image: &ImageRecord, depth: usize) -> Markup {
    html! {
        figure.gallery-item data-filename=(image.filename) data-tags=(image.tags.join(",")) {
            @if !image.tags.is_empty() {
                div.item-tags {
                    @for tag in &image.tags {
                        span.tag-badge { (tag) }
                    }
                }
            }
            img src=(href(&encode_filename(&image.url), depth)) alt=(image.alt) loading="lazy";
            figcaption.gallery-info {
                h3 { (image.title) }
                p { (image.category) }
            }
        }
    }
}

pub fn render_gallery(images: &[&ImageRecord], depth: usize) -> Markup {
    html! {
        div.gallery-grid {
            @if images.is_empty() {
                div.empty-gallery {
                    h3 { "No Images Found" }
                    p { "Supported formats: JPG, PNG, GIF, WebP" }
                }
            }
            @for image in images {
                (gallery_item(image, depth))
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_index(input: &SiteInput<'_>, pages: &[TagPage]) -> Markup {
    let content = input.content;
    let all: Vec<&ImageRecord> = input.images.iter().collect();
    let body = html! {
        (site_header(input, 0))
        main.index-page {
            section.hero id="home" {
                h1 { (content.hero.title) }
                p.subtitle { (content.hero.subtitle) }
            }
            section.gallery id="gallery" {
                h2 { "Gallery" }
                (filter_bar(pages, None, 0))
                (render_gallery(&all, 0))
            }
            section.about id="about" {
                h2 { "About" }
                div.about-body {
                    @if let Some(portrait) = &content.images.portrait {
                        img.portrait src=(portrait) alt="Portrait";
                    }
                    div.about-text {
                        (PreEscaped(render_markdown(&content.about.paragraph1)))
                        (PreEscaped(render_markdown(&content.about.paragraph2)))
                    }
                }
            }
            section.contact id="contact" {
                h2 { "Contact" }
                p.instagram { (content.contact.instagram) }
                p.status { (content.contact.status) }
            }
        }
        footer.site-footer {
            p { (input.site.title) " · " (input.site.tagline) }
        }
    };
    base_document(&input.site.title, Some("index"), body)
}

fn render_tag_page(input: &SiteInput<'_>, pages: &[TagPage], page: &TagPage) -> Markup {
    let depth = 2;
    let matching = tags::filter_images(input.images, &TagFilter::Tag(page.tag.clone()));
    let title = format!("{} · {}", capitalize(&page.tag), input.site.title);
    let body = html! {
        (site_header(input, depth))
        main.tag-page {
            section.gallery id="gallery" {
                h1 { (capitalize(&page.tag)) }
                p.count { (matching.len()) " of " (input.images.len()) " images" }
                (filter_bar(pages, Some(page), depth))
                (render_gallery(&matching, depth))
            }
        }
    };
    base_document(&title, Some("tag"), body)
}

// ============================================================================
// Tests
// ============================================================================
