//! End-to-end behaviour of the catalog over a real directory tree.

use shelf_catalog::error::ErrorKind;
use shelf_catalog::{Catalog, Neighbour};
use shelf_storage::backend::LocalBackend;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn library(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();
    }
    dir
}

fn catalog(root: &Path, ttl: Duration) -> Catalog {
    Catalog::with_ttl(Arc::new(LocalBackend::new("local", root).unwrap()), ttl)
}

fn names(pages: &[shelf_catalog::Page]) -> Vec<(i64, &str)> {
    pages.iter().map(|p| (p.index, p.name.as_str())).collect()
}

#[tokio::test]
async fn test_browse_library() {
    let dir = library(&[
        "one-punch-man/1 - Saitama/1.png",
        "one-punch-man/1 - Saitama/2.png",
        "one-punch-man/10/1.png",
        "one-punch-man/2/10.png",
        "one-punch-man/2/2.png",
        "one-punch-man/2/.DS_Store",
        "berserk/1/1.png",
        ".cache/1/1.png",
        "readme.txt",
    ]);
    let catalog = catalog(dir.path(), Catalog::DEFAULT_TTL);

    assert_eq!(catalog.list_collections().await.unwrap(), ["berserk", "one-punch-man"]);
    assert!(catalog.collection_exists("one-punch-man").await.unwrap());
    assert!(!catalog.collection_exists("readme.txt").await.unwrap());
    assert!(!catalog.collection_exists(".cache").await.unwrap());
    assert!(catalog.chapter_exists("one-punch-man", "1 - Saitama").await.unwrap());
    assert!(!catalog.chapter_exists("one-punch-man", "3").await.unwrap());

    assert_eq!(catalog.list_chapters("one-punch-man").await.unwrap(), ["1 - Saitama", "2", "10"]);
    let pages = catalog.list_pages("one-punch-man", "2").await.unwrap();
    assert_eq!(names(&pages), [(2, "2.png"), (10, "10.png")]);

    let combined = catalog.list_combined("one-punch-man").await.unwrap();
    assert_eq!(
        names(&combined),
        [
            (1, "1_-_Saitama/1.png"),
            (2, "1_-_Saitama/2.png"),
            (3, "2/2.png"),
            (4, "2/10.png"),
            (5, "10/1.png"),
        ]
    );

    assert_eq!(catalog.next_chapter("one-punch-man", "2").await.unwrap(), Neighbour::Chapter("10".to_string()));
    assert_eq!(catalog.previous_chapter("one-punch-man", "1 - Saitama").await.unwrap(), Neighbour::Collection);
}

#[tokio::test]
async fn test_unnumbered_chapter_comes_first_in_combined_view() {
    let dir = library(&["berserk/1/1.png", "berserk/Extra/1.png", "berserk/Extra/2.png", "berserk/2/1.png"]);
    let catalog = catalog(dir.path(), Catalog::DEFAULT_TTL);

    let combined = catalog.list_combined("berserk").await.unwrap();
    assert_eq!(
        names(&combined),
        [(1, "Extra/1.png"), (2, "Extra/2.png"), (3, "1/1.png"), (4, "2/1.png")]
    );
    // The chapter lister is strict about numbering.
    let err = catalog.list_chapters("berserk").await.unwrap_err();
    assert_eq!(*err, ErrorKind::MalformedName("Extra".to_string()));
}

#[tokio::test]
async fn test_missing_and_malformed() {
    let dir = library(&["berserk/1/1.png", "berserk/1/cover.png"]);
    let catalog = catalog(dir.path(), Catalog::DEFAULT_TTL);

    let err = catalog.list_pages("berserk", "1").await.unwrap_err();
    assert_eq!(*err, ErrorKind::MalformedName("cover.png".to_string()));
    let err = catalog.list_chapters("vagabond").await.unwrap_err();
    assert_eq!(*err, ErrorKind::NotFound("vagabond".to_string()));
    let err = catalog.list_pages("berserk", "7").await.unwrap_err();
    assert_eq!(*err, ErrorKind::NotFound("berserk/7".to_string()));
    assert!(catalog.list_combined("vagabond").await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_link_cycle_in_chapter() {
    let dir = library(&["berserk/1/1.png", "berserk/1/2.png"]);
    std::os::unix::fs::symlink("..", dir.path().join("berserk/1/loop")).unwrap();
    let catalog = catalog(dir.path(), Catalog::DEFAULT_TTL);

    let combined = catalog.list_combined("berserk").await.unwrap();
    assert_eq!(names(&combined), [(1, "1/1.png"), (2, "1/2.png")]);
}

#[tokio::test]
async fn test_missing_library_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir.path().join("media"), Catalog::DEFAULT_TTL);
    assert!(catalog.list_collections().await.unwrap().is_empty());
    assert!(!catalog.collection_exists("berserk").await.unwrap());
}

#[tokio::test]
async fn test_changes_on_disk() {
    let dir = library(&["berserk/1/1.png"]);

    let cached = catalog(dir.path(), Catalog::DEFAULT_TTL);
    let uncached = catalog(dir.path(), Duration::ZERO);
    assert_eq!(cached.list_chapters("berserk").await.unwrap(), ["1"]);
    assert_eq!(uncached.list_chapters("berserk").await.unwrap(), ["1"]);

    std::fs::create_dir(dir.path().join("berserk/2")).unwrap();
    assert_eq!(cached.list_chapters("berserk").await.unwrap(), ["1"]);
    assert_eq!(uncached.list_chapters("berserk").await.unwrap(), ["1", "2"]);
}
