//! The portfolio controller.
//!
//! [`Portfolio`] owns every piece of state a session of the tool works with:
//! the loaded configuration, the key/value store, and the gallery built from
//! the current resolution. Operations read and update that state explicitly;
//! nothing lives in globals.
//!
//! Guarded operations name their realm. They check the realm's session gate
//! first, which also records activity, and only then touch any state:
//!
//! | Operation                         | Realm    |
//! |-----------------------------------|----------|
//! | `edit_image`, content updates     | admin    |
//! | `uploads`, `upload`, `delete_upload`, `clear_uploads` | uploader |
//! | everything else                   | public   |

use crate::auth::Realm;
use crate::config::{self, ConfigError, PortfolioConfig};
use crate::content::{self, ContentError, ImageSlot, SiteContent};
use crate::gallery::{Gallery, GalleryError};
use crate::generate::{self, GenerateError, GenerateSummary, SiteInput};
use crate::metadata::DeriveContext;
use crate::scan::{self, ResolvedImage, ScanError};
use crate::session::{GateState, SessionError, SessionGate, SessionPolicy, SessionRecord};
use crate::storage::{FileStore, KeyValueStore};
use crate::tags::{self, TagError, TagFilter};
use crate::types::{ImageRecord, MetadataPatch};
use crate::upload::{UploadError, UploadLedger, UploadOutcome, UploadRecord};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Category given to an image whose edit clears the category field.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Session(SessionError),
    #[error("The {0} area is locked. Run `exposures login {0}` first.")]
    Locked(Realm),
}

impl From<SessionError> for PortfolioError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Locked(realm) => PortfolioError::Locked(realm),
            other => PortfolioError::Session(other),
        }
    }
}

/// Raw metadata editor input. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
}

impl EditRequest {
    /// Validate editor input into a patch.
    ///
    /// A blank title keeps the current one. A blank category becomes
    /// [`UNCATEGORIZED`]. Tags go through [`tags::parse_tag_input`].
    pub fn into_patch(self, max_tag_len: usize) -> Result<MetadataPatch, TagError> {
        let tags = self
            .tags
            .map(|input| tags::parse_tag_input(&input, max_tag_len))
            .transpose()?;
        Ok(MetadataPatch {
            title: self.title.filter(|t| !t.trim().is_empty()),
            category: self.category.map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    UNCATEGORIZED.to_string()
                } else {
                    c.to_string()
                }
            }),
            tags,
        })
    }
}

pub struct Portfolio<S: KeyValueStore> {
    root: PathBuf,
    config: PortfolioConfig,
    store: S,
    gallery: Gallery,
    resolved: Vec<ResolvedImage>,
}

impl Portfolio<FileStore> {
    /// Open the site at `root`: load `portfolio.toml`, open the store it
    /// names and resolve the gallery as of `now`.
    pub fn open(root: &Path, now: DateTime<Utc>) -> Result<Self, PortfolioError> {
        let config = config::load_config(root)?;
        let store = FileStore::open(&root.join(&config.storage.path));
        Self::with_store(root, config, store, now)
    }
}

impl<S: KeyValueStore> Portfolio<S> {
    pub fn with_store(
        root: &Path,
        config: PortfolioConfig,
        store: S,
        now: DateTime<Utc>,
    ) -> Result<Self, PortfolioError> {
        let gallery = Gallery::with_overlay(Gallery::load_overlay(&store));
        let mut portfolio = Self {
            root: root.to_path_buf(),
            config,
            store,
            gallery,
            resolved: Vec::new(),
        };
        portfolio.refresh(now)?;
        Ok(portfolio)
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    fn asset_dir(&self) -> PathBuf {
        scan::asset_dir(&self.root, &self.config.gallery)
    }

    fn derive_context(&self, now: DateTime<Utc>) -> DeriveContext {
        DeriveContext {
            today: now.date_naive(),
            default_category: self.config.gallery.default_category.clone(),
        }
    }

    fn gate(&self, realm: Realm) -> SessionGate {
        SessionGate::new(realm, SessionPolicy::from_config(&self.config.session))
    }

    fn require(&mut self, realm: Realm, now: DateTime<Utc>) -> Result<SessionRecord, PortfolioError> {
        let gate = self.gate(realm);
        Ok(gate.require(&mut self.store, now)?)
    }

    /// Re-resolve the gallery from disk and the upload ledger.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<(), PortfolioError> {
        let generation = self.gallery.begin_resolution();
        let uploaded = UploadLedger::load(&self.store).names();
        let resolution = scan::resolve(&self.root, &self.config.gallery, generation, &uploaded)?;
        let ctx = self.derive_context(now);
        let images = resolution.images.clone();
        if self.gallery.apply_resolution(resolution, &ctx) {
            self.resolved = images;
        }
        Ok(())
    }

    pub fn images(&self) -> &[ImageRecord] {
        self.gallery.images()
    }

    pub fn tags(&self) -> &[String] {
        self.gallery.tags().tags()
    }

    pub fn filter(&self, filter: &TagFilter) -> Vec<&ImageRecord> {
        self.gallery.filter(filter)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn login(
        &mut self,
        realm: Realm,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, PortfolioError> {
        let gate = self.gate(realm);
        Ok(gate.login(&mut self.store, &self.config.auth, password, now)?)
    }

    pub fn logout(&mut self, realm: Realm) -> Result<(), PortfolioError> {
        let gate = self.gate(realm);
        Ok(gate.logout(&mut self.store)?)
    }

    /// Current state of a realm, extending an active session.
    pub fn status(&mut self, realm: Realm, now: DateTime<Utc>) -> Result<GateState, PortfolioError> {
        let gate = self.gate(realm);
        Ok(gate.touch(&mut self.store, now)?)
    }

    // ------------------------------------------------------------------
    // Admin: metadata and content
    // ------------------------------------------------------------------

    pub fn edit_image(
        &mut self,
        filename: &str,
        request: EditRequest,
        now: DateTime<Utc>,
    ) -> Result<ImageRecord, PortfolioError> {
        self.require(Realm::Admin, now)?;
        let patch = request.into_patch(self.config.tags.max_len)?;
        let updated = self
            .gallery
            .update_metadata(&mut self.store, filename, &patch)?
            .clone();
        Ok(updated)
    }

    pub fn content(&self) -> SiteContent {
        content::read_content(&self.store)
    }

    pub fn update_hero(
        &mut self,
        title: &str,
        subtitle: &str,
        now: DateTime<Utc>,
    ) -> Result<SiteContent, PortfolioError> {
        self.require(Realm::Admin, now)?;
        Ok(content::update_hero(&mut self.store, title, subtitle)?)
    }

    pub fn update_about(
        &mut self,
        paragraph1: &str,
        paragraph2: &str,
        now: DateTime<Utc>,
    ) -> Result<SiteContent, PortfolioError> {
        self.require(Realm::Admin, now)?;
        Ok(content::update_about(&mut self.store, paragraph1, paragraph2)?)
    }

    pub fn update_contact(
        &mut self,
        instagram: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<SiteContent, PortfolioError> {
        self.require(Realm::Admin, now)?;
        Ok(content::update_contact(&mut self.store, instagram, status)?)
    }

    pub fn set_content_image(
        &mut self,
        slot: ImageSlot,
        path: &Path,
        now: DateTime<Utc>,
    ) -> Result<SiteContent, PortfolioError> {
        self.require(Realm::Admin, now)?;
        let limit = self.config.upload.max_content_image_bytes;
        Ok(content::set_image(&mut self.store, slot, path, limit)?)
    }

    // ------------------------------------------------------------------
    // Uploader
    // ------------------------------------------------------------------

    pub fn uploads(&mut self, now: DateTime<Utc>) -> Result<Vec<UploadRecord>, PortfolioError> {
        self.require(Realm::Uploader, now)?;
        Ok(UploadLedger::load(&self.store).records().to_vec())
    }

    pub fn upload(
        &mut self,
        files: &[PathBuf],
        now: DateTime<Utc>,
    ) -> Result<UploadOutcome, PortfolioError> {
        self.require(Realm::Uploader, now)?;
        let mut ledger = UploadLedger::load(&self.store);
        let asset_dir = self.asset_dir();
        let outcome = ledger.upload_files(
            &mut self.store,
            files,
            &asset_dir,
            self.config.upload.max_file_bytes,
            now,
        )?;
        if !outcome.accepted.is_empty() {
            self.refresh(now)?;
        }
        Ok(outcome)
    }

    pub fn delete_upload(&mut self, id: &str, now: DateTime<Utc>) -> Result<UploadRecord, PortfolioError> {
        self.require(Realm::Uploader, now)?;
        let mut ledger = UploadLedger::load(&self.store);
        let asset_dir = self.asset_dir();
        let removed = ledger.delete(&mut self.store, id, &asset_dir)?;
        self.refresh(now)?;
        Ok(removed)
    }

    pub fn clear_uploads(&mut self, now: DateTime<Utc>) -> Result<usize, PortfolioError> {
        self.require(Realm::Uploader, now)?;
        let mut ledger = UploadLedger::load(&self.store);
        let asset_dir = self.asset_dir();
        let removed = ledger.clear(&mut self.store, &asset_dir)?;
        self.refresh(now)?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------

    pub fn build(&self, output_dir: &Path) -> Result<GenerateSummary, PortfolioError> {
        let content = self.content();
        let input = SiteInput {
            site: &self.config.site,
            content: &content,
            images: self.gallery.images(),
            tags: self.gallery.tags().tags(),
        };
        let summary = generate::generate(&input, &self.resolved, output_dir)?;
        info!(output = %output_dir.display(), pages = summary.pages.len(), "site built");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::storage::{MemoryStore, keys};
    use crate::test_helpers::site_with_images as site;
    use std::fs;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_760_000_000_000).unwrap()
    }

    fn config() -> PortfolioConfig {
        let mut config = PortfolioConfig::default();
        config.auth.admin = vec![auth::digest(&config.auth.salt, "admin123")];
        config.auth.uploader = vec![auth::digest(&config.auth.salt, "upload123")];
        config
    }

    fn portfolio(tmp: &TempDir) -> Portfolio<MemoryStore> {
        Portfolio::with_store(tmp.path(), config(), MemoryStore::new(), now()).unwrap()
    }

    #[test]
    fn edit_request_rules() {
        let patch = EditRequest {
            title: Some("  ".into()),
            category: Some(" ".into()),
            tags: Some("Ocean, sea".into()),
        }
        .into_patch(32)
        .unwrap();
        assert_eq!(patch.title, None);
        assert_eq!(patch.category.as_deref(), Some(UNCATEGORIZED));
        assert_eq!(patch.tags, Some(vec!["ocean".to_string(), "sea".to_string()]));

        let err = EditRequest {
            tags: Some("a, A".into()),
            ..Default::default()
        }
        .into_patch(32)
        .unwrap_err();
        assert_eq!(err, TagError::Duplicate("a".into()));
    }

    #[test]
    fn open_resolves_gallery() {
        let tmp = site(&["ocean.jpg", "peak-mountain.jpg"]);
        let p = portfolio(&tmp);
        assert_eq!(p.images().len(), 2);
        assert!(p.tags().contains(&"ocean".to_string()));
    }

    #[test]
    fn open_derives_dates_from_given_time() {
        let tmp = site(&["IMG_20300101.jpg"]);
        let capture = |p: &Portfolio<MemoryStore>| p.images()[0].capture_date;

        // A date after today is not a capture date.
        assert_eq!(capture(&portfolio(&tmp)), None);

        let later = DateTime::parse_from_rfc3339("2031-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let p = Portfolio::with_store(tmp.path(), config(), MemoryStore::new(), later).unwrap();
        assert_eq!(capture(&p), chrono::NaiveDate::from_ymd_opt(2030, 1, 1));
    }

    #[test]
    fn admin_operations_require_login() {
        let tmp = site(&["ocean.jpg"]);
        let mut p = portfolio(&tmp);
        let err = p
            .edit_image("ocean.jpg", EditRequest::default(), now())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Locked(Realm::Admin)));
        assert!(matches!(
            p.update_hero("A", "B", now()),
            Err(PortfolioError::Locked(Realm::Admin))
        ));
    }

    #[test]
    fn edit_after_login_persists() {
        let tmp = site(&["ocean.jpg"]);
        let mut p = portfolio(&tmp);
        p.login(Realm::Admin, "admin123", now()).unwrap();
        let updated = p
            .edit_image(
                "ocean.jpg",
                EditRequest {
                    title: Some("Low Tide".into()),
                    tags: Some("coast".into()),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(updated.title, "Low Tide");
        assert_eq!(p.tags(), ["coast"]);
        assert!(p.store().get(keys::GALLERY_METADATA).is_some());
    }

    #[test]
    fn invalid_tags_commit_nothing() {
        let tmp = site(&["ocean.jpg"]);
        let mut p = portfolio(&tmp);
        p.login(Realm::Admin, "admin123", now()).unwrap();
        let result = p.edit_image(
            "ocean.jpg",
            EditRequest {
                tags: Some("x, x".into()),
                ..Default::default()
            },
            now(),
        );
        assert!(matches!(result, Err(PortfolioError::Tag(_))));
        assert!(p.store().get(keys::GALLERY_METADATA).is_none());
    }

    #[test]
    fn uploader_session_does_not_unlock_admin() {
        let tmp = site(&[]);
        let mut p = portfolio(&tmp);
        p.login(Realm::Uploader, "upload123", now()).unwrap();
        assert!(p.status(Realm::Uploader, now()).unwrap().is_unlocked());
        assert_eq!(p.status(Realm::Admin, now()).unwrap(), GateState::Locked);
    }

    #[test]
    fn upload_adds_image_to_gallery() {
        let tmp = site(&[]);
        let incoming = tmp.path().join("dune.jpg");
        fs::write(&incoming, b"jpg").unwrap();

        let mut p = portfolio(&tmp);
        p.login(Realm::Uploader, "upload123", now()).unwrap();
        let outcome = p.upload(&[incoming], now()).unwrap();
        assert_eq!(outcome.accepted.len(), 1);
        assert!(p.gallery().image("dune.jpg").is_some());

        let id = p.uploads(now()).unwrap()[0].id.clone();
        p.delete_upload(&id, now()).unwrap();
        assert!(p.gallery().image("dune.jpg").is_none());
    }

    #[test]
    fn build_renders_site() {
        let tmp = site(&["ocean.jpg"]);
        let p = portfolio(&tmp);
        let out = tmp.path().join("dist");
        let summary = p.build(&out).unwrap();
        assert!(out.join("index.html").is_file());
        assert!(out.join("img/ocean.jpg").is_file());
        assert_eq!(summary.pages.len(), 3);
    }

    #[test]
    fn build_into_site_root_keeps_sources() {
        let tmp = site(&["ocean.jpg"]);
        let source = tmp.path().join("img/ocean.jpg");
        fs::write(&source, b"REAL PHOTO BYTES").unwrap();
        let p = portfolio(&tmp);

        let summary = p.build(tmp.path()).unwrap();

        assert_eq!(summary.copied_images, 0);
        assert_eq!(fs::read(&source).unwrap(), b"REAL PHOTO BYTES");
        assert!(tmp.path().join("index.html").is_file());
    }
}
