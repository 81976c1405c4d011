//! End-to-end flows against the local filesystem inside a temporary root.

use std::path::PathBuf;
use std::sync::Arc;

use pocketfs_core::access::{AccessGuard, CapabilityTier};
use pocketfs_core::backend::{IndexedMediaLibrary, MediaPermission};
use pocketfs_core::fs::{EntryKind, SortKey};
use pocketfs_core::{ErrorCategory, NavError, NavigationManager};
use prefstore::{PrefStore, ViewMode};
use tempfile::TempDir;

struct Fixture {
    temp_dir: TempDir,
    root: PathBuf,
    manager: Arc<NavigationManager>,
}

async fn full_access() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("storage");
    std::fs::create_dir_all(&root).unwrap();

    let manager = NavigationManager::builder(AccessGuard::new(&root), CapabilityTier::FullAccess)
        .settings(Arc::new(PrefStore::new(temp_dir.path().join("prefs"))))
        .build()
        .unwrap();
    manager.init().await.unwrap();

    Fixture {
        temp_dir,
        root,
        manager,
    }
}

fn names(manager: &NavigationManager) -> Vec<String> {
    manager
        .snapshot()
        .entries
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_rename_delete_round() {
    let fx = full_access().await;
    assert!(fx.manager.snapshot().entries.is_empty());

    let created = fx.manager.create_folder("X").await.unwrap();
    assert_eq!(created, fx.root.join("X"));
    assert!(created.is_dir());
    assert_eq!(names(&fx.manager), vec!["X"]);

    let renamed = fx.manager.rename_item(&created, "Y").await.unwrap();
    assert_eq!(renamed, fx.root.join("Y"));
    assert!(!created.exists());
    assert_eq!(names(&fx.manager), vec!["Y"]);

    fx.manager.delete_item(&renamed).await.unwrap();
    assert!(!renamed.exists());

    let state = fx.manager.snapshot();
    assert!(state.entries.is_empty());
    assert!(!state.loading);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_listing_orders_directories_first_and_reports_sizes() {
    let fx = full_access().await;
    std::fs::write(fx.root.join("notes.txt"), b"hello").unwrap();
    std::fs::write(fx.root.join("Song.mp3"), vec![1u8; 2048]).unwrap();
    std::fs::create_dir(fx.root.join("zeta")).unwrap();
    std::fs::create_dir(fx.root.join("Alpha")).unwrap();
    std::fs::write(fx.root.join(".hidden"), b"").unwrap();

    fx.manager.refresh().await.unwrap();
    assert_eq!(names(&fx.manager), vec!["Alpha", "zeta", "notes.txt", "Song.mp3"]);

    let state = fx.manager.snapshot();
    for entry in &state.entries {
        assert_eq!(entry.is_dir(), entry.size().is_none(), "{}", entry.name());
        assert_eq!(entry.is_dir(), entry.kind() == EntryKind::Folder);
    }
    assert_eq!(state.entry("Song.mp3").map(|e| e.kind()), Some(EntryKind::Audio));
    assert_eq!(state.entry("notes.txt").and_then(|e| e.size()), Some(5));

    fx.manager.set_sort(SortKey::Size);
    assert_eq!(names(&fx.manager), vec!["Alpha", "zeta", "Song.mp3", "notes.txt"]);
}

#[tokio::test]
async fn test_navigation_stays_inside_root() {
    let fx = full_access().await;
    let docs = fx.manager.create_folder("Docs").await.unwrap();
    std::fs::write(docs.join("a.md"), b"# a").unwrap();

    fx.manager.navigate_to(&docs).await.unwrap();
    assert_eq!(fx.manager.current_location(), docs);
    assert_eq!(names(&fx.manager), vec!["a.md"]);

    // Traversal that would land back at the root's parent
    let sneaky = docs.join("..").join("..");
    let err = fx.manager.navigate_to(&sneaky).await.unwrap_err();
    assert!(matches!(err, NavError::PermissionDenied { .. }));
    assert_eq!(fx.manager.current_location(), docs);

    fx.manager.navigate_back().await.unwrap();
    assert!(fx.manager.guard().is_root(&fx.manager.current_location()));

    let err = fx.manager.navigate_back().await.unwrap_err();
    assert!(matches!(err, NavError::AlreadyAtRoot { .. }));
    let state = fx.manager.snapshot();
    assert!(fx.manager.guard().is_root(&state.current_location));
    assert_eq!(state.last_error.map(|e| e.category), Some(ErrorCategory::Input));
}

#[tokio::test]
async fn test_mutations_outside_root_never_touch_disk() {
    let fx = full_access().await;
    let outside = fx.temp_dir.path().join("outside.txt");
    std::fs::write(&outside, b"keep").unwrap();

    let err = fx.manager.delete_item(&outside).await.unwrap_err();
    assert!(matches!(err, NavError::PermissionDenied { .. }));
    assert!(outside.exists());

    let inside = fx.root.join("inside.txt");
    std::fs::write(&inside, b"data").unwrap();
    let err = fx.manager.copy_item(&inside, &outside).await.unwrap_err();
    assert!(matches!(err, NavError::PermissionDenied { .. }));
    assert_eq!(std::fs::read(&outside).unwrap(), b"keep");

    let err = fx.manager.rename_item(&inside, "../escape.txt").await.unwrap_err();
    assert!(matches!(err, NavError::InvalidInput { .. }));
    assert!(inside.exists());
}

#[tokio::test]
async fn test_copy_and_move_directories() {
    let fx = full_access().await;
    let album = fx.manager.create_folder("Album").await.unwrap();
    std::fs::create_dir(album.join("2024")).unwrap();
    std::fs::write(album.join("2024").join("beach.png"), b"png").unwrap();

    let copy = fx.root.join("Album copy");
    fx.manager.copy_item(&album, &copy).await.unwrap();
    assert_eq!(std::fs::read(copy.join("2024").join("beach.png")).unwrap(), b"png");
    assert!(album.join("2024").join("beach.png").exists());

    let err = fx.manager.copy_item(&album, &copy).await.unwrap_err();
    assert!(matches!(err, NavError::AlreadyExists { .. }));

    let archive = fx.manager.create_folder("Archive").await.unwrap();
    let moved = fx
        .manager
        .move_item(&copy, archive.join("Album copy"))
        .await
        .unwrap();
    assert!(moved.join("2024").join("beach.png").exists());
    assert!(!copy.exists());
    assert_eq!(names(&fx.manager), vec!["Album", "Archive"]);
}

#[tokio::test]
async fn test_copy_and_move_single_file() {
    let fx = full_access().await;
    let payload: Vec<u8> = (0..=255u8).rev().cycle().take(10_000).collect();
    let original = fx.root.join("report.pdf");
    std::fs::write(&original, &payload).unwrap();

    let copy = fx.root.join("report (1).pdf");
    assert_eq!(fx.manager.copy_item(&original, &copy).await.unwrap(), copy);
    assert_eq!(std::fs::read(&copy).unwrap(), payload);
    assert_eq!(std::fs::read(&original).unwrap(), payload);

    let state = fx.manager.snapshot();
    assert_eq!(state.entry("report (1).pdf").and_then(|e| e.size()), Some(10_000));
    assert_eq!(state.entry("report (1).pdf").map(|e| e.kind()), Some(EntryKind::Document));

    let archive = fx.manager.create_folder("Archive").await.unwrap();
    let moved = fx
        .manager
        .move_item(&copy, archive.join("report.pdf"))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&moved).unwrap(), payload);
    assert!(!copy.exists());
    assert_eq!(names(&fx.manager), vec!["Archive", "report.pdf"]);
}

#[tokio::test]
async fn test_missing_target_is_not_found() {
    let fx = full_access().await;
    let err = fx
        .manager
        .delete_item(fx.root.join("ghost.txt"))
        .await
        .unwrap_err();

    assert!(matches!(err, NavError::NotFound { .. }));
    assert_eq!(
        fx.manager.snapshot().last_error.map(|e| e.category),
        Some(ErrorCategory::NotFound)
    );
}

#[tokio::test]
async fn test_observers_see_published_states() {
    let fx = full_access().await;
    let mut rx = fx.manager.subscribe();
    let _ = rx.borrow_and_update();

    fx.manager.create_folder("Watched").await.unwrap();
    assert!(rx.has_changed().unwrap());

    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.entry("Watched").is_some());
}

#[tokio::test]
async fn test_view_mode_survives_restart() {
    let fx = full_access().await;
    fx.manager.set_view_mode(ViewMode::Grid).await.unwrap();

    let prefs = PrefStore::new(fx.temp_dir.path().join("prefs"));
    let manager = NavigationManager::builder(AccessGuard::new(&fx.root), CapabilityTier::FullAccess)
        .settings(Arc::new(prefs))
        .build()
        .unwrap();
    manager.init().await.unwrap();
    assert_eq!(manager.snapshot().view_mode, ViewMode::Grid);
}

#[tokio::test]
async fn test_restricted_mode_lists_media_only() {
    let temp_dir = TempDir::new().unwrap();
    let docs = temp_dir.path().join("documents");
    let media_root = temp_dir.path().join("shared");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::create_dir_all(media_root.join("DCIM")).unwrap();
    std::fs::write(media_root.join("DCIM").join("IMG_0001.jpg"), b"jpg").unwrap();
    std::fs::write(media_root.join("DCIM").join("notes.txt"), b"txt").unwrap();

    let media = Arc::new(IndexedMediaLibrary::new(&media_root));
    let manager = NavigationManager::builder(AccessGuard::new(&docs), CapabilityTier::RestrictedMedia)
        .media(media)
        .settings(Arc::new(PrefStore::new(temp_dir.path().join("prefs"))))
        .build()
        .unwrap();
    manager.init().await.unwrap();

    let state = manager.snapshot();
    assert_eq!(state.entries.len(), 1);
    assert_eq!(state.entries[0].name(), "IMG_0001.jpg");
    assert_eq!(state.entries[0].kind(), EntryKind::Image);
    assert!(manager.request_permissions().await.unwrap());

    let err = manager.create_folder("New").await.unwrap_err();
    assert!(matches!(err, NavError::CapabilityUnsupported { .. }));
    assert!(!docs.join("New").exists());
}

#[tokio::test]
async fn test_restricted_mode_denied_media_permission() {
    let temp_dir = TempDir::new().unwrap();
    let docs = temp_dir.path().join("documents");
    std::fs::create_dir_all(&docs).unwrap();

    let media = Arc::new(IndexedMediaLibrary::new(temp_dir.path()).with_permission(MediaPermission::Denied));
    let manager = NavigationManager::builder(AccessGuard::new(&docs), CapabilityTier::RestrictedMedia)
        .media(media)
        .settings(Arc::new(PrefStore::new(temp_dir.path().join("prefs"))))
        .build()
        .unwrap();

    let err = manager.refresh().await.unwrap_err();
    assert!(matches!(err, NavError::PermissionDenied { .. }));
    assert!(!manager.request_permissions().await.unwrap());

    let state = manager.snapshot();
    assert!(state.entries.is_empty());
    assert_eq!(state.last_error.map(|e| e.category), Some(ErrorCategory::Permission));
    assert!(manager.guard().is_root(&manager.current_location()));
}
