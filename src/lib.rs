//! # Exposures
//!
//! A photography portfolio engine. The asset folder is the data source: every
//! image in it becomes a gallery entry whose title, tags and category are
//! derived from the filename and can be overridden by an editor. The public
//! side renders to a static site; the private side is two password-gated
//! areas whose state lives in a small key/value store.
//!
//! # Architecture: Two Pipelines
//!
//! ```text
//! Public   asset folder → resolve → merge overlay → tag index → filter / build
//! Private  session gate → content overlay on defaults → CLI argument binder
//! ```
//!
//! The public pipeline is read-mostly. Resolution probes candidate files in
//! parallel, tags each result with a generation number and only the newest
//! generation is ever applied. The merge step lays the stored metadata
//! overlay on top of defaults derived from filenames; overlay fields always
//! win until they are overwritten.
//!
//! The private pipeline never touches the gallery without a session. Every
//! guarded operation checks its realm's gate first, which also records
//! activity, and either commits fully or not at all.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`app`] | The [`app::Portfolio`] controller that owns all state |
//! | [`scan`] | Candidate discovery and parallel existence probing |
//! | [`metadata`] | Default derivation and the overlay merge model |
//! | [`gallery`] | Resolved images, overlay and tag index kept in step |
//! | [`tags`] | Tag enumeration, filtering and editor input parsing |
//! | [`content`] | Hero, about and contact document overlaid on defaults |
//! | [`auth`] | Realms and salted password digests |
//! | [`session`] | Session records, expiry and the activity window |
//! | [`upload`] | Upload validation and the upload ledger |
//! | [`generate`] | Static HTML rendering with Maud |
//! | [`storage`] | The key/value store and its JSON helpers |
//! | [`config`] | `portfolio.toml` loading, merging and validation |
//! | [`types`] | Image records and metadata patches |
//! | [`naming`] | Filename conventions: titles, dates, keyword tags |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Overlays, Not Copies
//!
//! Neither the gallery metadata nor the site content is stored as a complete
//! document. Each is an overlay of `Option` fields merged onto defaults at
//! read time, so changing a default changes every entry nobody has edited.
//!
//! ## Explicit Time
//!
//! Every session-aware operation takes `now` as an argument. Expiry, the idle
//! window and the one-millisecond boundary are all testable without a clock.
//!
//! ## Digests, Not Passwords
//!
//! `portfolio.toml` holds salted SHA-256 digests per realm. `exposures
//! hash-password` prints the digest for a password; nothing reversible is
//! ever written.

pub mod app;
pub mod auth;
pub mod config;
pub mod content;
pub mod gallery;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod scan;
pub mod session;
pub mod storage;
pub mod tags;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
