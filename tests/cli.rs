//! End-to-end tests that drive the compiled `exposures` binary against a
//! temporary site root.
//!
//! Run with: cargo test --test cli

use exposures::auth;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ADMIN_PASSWORD: &str = "darkroom";
const UPLOADER_PASSWORD: &str = "contact-sheet";

fn exposures(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_exposures"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "command failed: {}\n{}",
        stderr(out),
        stdout(out)
    );
}

/// A site with two images and credentials for both realms.
fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let img = tmp.path().join("img");
    fs::create_dir_all(&img).unwrap();
    fs::write(img.join("ocean.jpg"), b"jpg").unwrap();
    fs::write(img.join("peak-mountain.jpg"), b"jpg").unwrap();

    let salt = "test-salt";
    let config = format!(
        "[site]\ntitle = \"Field Notes\"\n\n[auth]\nsalt = \"{salt}\"\nadmin = [\"{}\"]\nuploader = [\"{}\"]\n",
        auth::digest(salt, ADMIN_PASSWORD),
        auth::digest(salt, UPLOADER_PASSWORD),
    );
    fs::write(tmp.path().join("portfolio.toml"), config).unwrap();
    tmp
}

#[test]
fn scan_lists_discovered_images() {
    let site = setup_site();
    let out = exposures(site.path(), &["scan"]);
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.starts_with("Images (2)"), "{text}");
    assert!(text.contains("Source: ocean.jpg"));
    assert!(text.contains("Tags: seascape, ocean"));
    assert!(text.contains("Tags: landscape, mountain"));
}

#[test]
fn filter_is_case_insensitive() {
    let site = setup_site();
    let out = exposures(site.path(), &["filter", "OCEAN"]);
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.starts_with("Images (1)"), "{text}");
    assert!(text.contains("ocean.jpg"));

    let out = exposures(site.path(), &["filter", "forest"]);
    assert_success(&out);
    assert!(stdout(&out).starts_with("Images (0)"));
}

#[test]
fn tags_prints_sorted_index() {
    let site = setup_site();
    let out = exposures(site.path(), &["tags"]);
    assert_success(&out);
    let text = stdout(&out);
    let landscape = text.find("landscape").unwrap();
    let seascape = text.find("seascape").unwrap();
    assert!(text.starts_with("Tags (4)"), "{text}");
    assert!(landscape < seascape);
}

#[test]
fn edit_requires_admin_login() {
    let site = setup_site();
    let out = exposures(site.path(), &["edit", "ocean.jpg", "--title", "Low Tide"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("locked"), "{}", stderr(&out));
}

#[test]
fn wrong_password_is_rejected() {
    let site = setup_site();
    let out = exposures(site.path(), &["login", "admin", "--password", "nope"]);
    assert!(!out.status.success());

    let out = exposures(site.path(), &["status", "admin"]);
    assert_success(&out);
    assert_eq!(stdout(&out).trim(), "admin: locked");
}

#[test]
fn admin_edit_persists_across_invocations() {
    let site = setup_site();
    assert_success(&exposures(
        site.path(),
        &["login", "admin", "--password", ADMIN_PASSWORD],
    ));
    assert_success(&exposures(
        site.path(),
        &["edit", "ocean.jpg", "--title", "Low Tide", "--tags", "Coast, Blue Hour"],
    ));

    let out = exposures(site.path(), &["filter", "blue hour"]);
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Low Tide"), "{text}");
    assert!(text.contains("Tags: coast, blue hour"));
    assert!(site.path().join(".exposures/state.json").is_file());
}

#[test]
fn duplicate_tags_are_rejected() {
    let site = setup_site();
    assert_success(&exposures(
        site.path(),
        &["login", "admin", "--password", ADMIN_PASSWORD],
    ));
    let out = exposures(site.path(), &["edit", "ocean.jpg", "--tags", "sea, SEA"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Duplicate tag"));
}

#[test]
fn content_update_and_logout() {
    let site = setup_site();
    assert_success(&exposures(
        site.path(),
        &["login", "admin", "--password", ADMIN_PASSWORD],
    ));
    let out = exposures(
        site.path(),
        &["content", "hero", "--title", "Salt & Light", "--subtitle", "Coastal work"],
    );
    assert_success(&out);
    assert!(stdout(&out).contains("Title: Salt & Light"));

    let out = exposures(site.path(), &["content", "about", "--paragraph1", " ", "--paragraph2", "x"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Please fill in all about fields"));

    assert_success(&exposures(site.path(), &["logout", "admin"]));
    let out = exposures(site.path(), &["content", "contact", "--instagram", "@a", "--status", "b"]);
    assert!(!out.status.success());

    let out = exposures(site.path(), &["content", "show"]);
    assert_success(&out);
    assert!(stdout(&out).contains("Title: Salt & Light"));
}

#[test]
fn uploader_cannot_edit_metadata() {
    let site = setup_site();
    assert_success(&exposures(
        site.path(),
        &["login", "uploader", "--password", UPLOADER_PASSWORD],
    ));
    let out = exposures(site.path(), &["edit", "ocean.jpg", "--title", "Nope"]);
    assert!(!out.status.success());
}

#[test]
fn upload_list_and_clear() {
    let site = setup_site();
    let incoming = site.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();
    fs::write(incoming.join("sunset-dune.png"), b"png").unwrap();
    fs::write(incoming.join("notes.txt"), b"text").unwrap();

    assert_success(&exposures(
        site.path(),
        &["login", "uploader", "--password", UPLOADER_PASSWORD],
    ));
    let png = incoming.join("sunset-dune.png");
    let txt = incoming.join("notes.txt");
    let out = exposures(
        site.path(),
        &["upload", png.to_str().unwrap(), txt.to_str().unwrap()],
    );
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("✓ sunset-dune.png"), "{text}");
    assert!(text.contains("✗"));
    assert!(text.contains("Uploaded 1 of 2 files"));
    assert!(site.path().join("img/sunset-dune.png").is_file());

    let out = exposures(site.path(), &["uploads", "list"]);
    assert_success(&out);
    assert!(stdout(&out).starts_with("Uploads (1)"));

    let out = exposures(site.path(), &["filter", "sunset"]);
    assert!(stdout(&out).contains("sunset-dune.png"));

    let out = exposures(site.path(), &["uploads", "clear"]);
    assert_success(&out);
    assert!(!site.path().join("img/sunset-dune.png").exists());
}

#[test]
fn build_writes_index_and_tag_pages() {
    let site = setup_site();
    let dist = site.path().join("dist");
    let out = Command::new(env!("CARGO_BIN_EXE_exposures"))
        .arg("--root")
        .arg(site.path())
        .arg("--output")
        .arg(&dist)
        .arg("build")
        .output()
        .unwrap();
    assert_success(&out);

    let index = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(index.contains("Field Notes"));
    assert!(index.contains("img/ocean.jpg"));
    assert!(dist.join("tag/mountain/index.html").is_file());
    assert!(dist.join("img/peak-mountain.jpg").is_file());
}

#[test]
fn gen_config_round_trips_through_the_loader() {
    let tmp = TempDir::new().unwrap();
    let out = exposures(tmp.path(), &["gen-config"]);
    assert_success(&out);
    fs::write(tmp.path().join("portfolio.toml"), &out.stdout).unwrap();
    assert_success(&exposures(tmp.path(), &["scan"]));
}

#[test]
fn hash_password_uses_configured_salt() {
    let site = setup_site();
    let out = exposures(site.path(), &["hash-password", "--password", " darkroom "]);
    assert_success(&out);
    assert_eq!(stdout(&out).trim(), auth::digest("test-salt", ADMIN_PASSWORD));

    let out = exposures(site.path(), &["hash-password", "--password", "  "]);
    assert!(!out.status.success());
}

#[test]
fn unknown_config_keys_fail() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("portfolio.toml"), "[gallery]\nfolder = \"x\"\n").unwrap();
    let out = exposures(tmp.path(), &["scan"]);
    assert!(!out.status.success());
}
