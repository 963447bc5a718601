use super::*;
use crate::config::TrackDisplayField;
use crate::gateway::fake::{FakeEngine, meta};
use crate::model::{IndexedFolder, TrackRef};
use crate::notice::{Notice, Notices};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn setup() -> (
    Arc<FakeEngine>,
    LibraryViewModel,
    FolderCatalog,
    UnboundedReceiver<Notice>,
) {
    let (fake, engine) = FakeEngine::engine();
    let (notices, rx) = Notices::channel();
    let library = LibraryViewModel::new(engine.clone(), notices.clone());
    let folders = FolderCatalog::new(engine, notices);
    (fake, library, folders, rx)
}

fn paths(state: &LibraryState) -> Vec<&str> {
    state.tracks.iter().map(|t| t.path.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn load_replaces_the_list_wholesale() {
    let (fake, library, _folders, _rx) = setup();
    fake.with_library(&["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);
    assert_eq!(library.load().await, Applied::Committed);
    assert_eq!(paths(&library.snapshot()), ["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);

    fake.with_library(&["/m/z.mp3"]);
    library.load().await;
    let s = library.snapshot();
    assert_eq!(paths(&s), ["/m/z.mp3"]);
    assert_eq!(s.loaded, Some(RefreshToken::default()));
    assert!(!s.loading);
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_previous_list_and_notifies() {
    let (fake, library, _folders, mut rx) = setup();
    fake.with_library(&["/m/a.mp3"]);
    library.load().await;

    fake.fail("list_music", "database locked");
    assert_eq!(library.load().await, Applied::Stale);

    let s = library.snapshot();
    assert_eq!(paths(&s), ["/m/a.mp3"]);
    assert!(!s.loading);
    assert!(rx.try_recv().unwrap().message.contains("database locked"));
}

#[tokio::test(start_paused = true)]
async fn invalidate_bumps_token_and_reloads() {
    let (fake, library, _folders, _rx) = setup();
    let before = library.token();
    fake.with_library(&["/m/a.mp3"]);

    library.invalidate().await;

    let s = library.snapshot();
    assert_eq!(s.token.value(), before.value() + 1);
    assert_eq!(s.loaded, Some(s.token));
    assert_eq!(fake.calls("list_music"), 1);
}

#[tokio::test(start_paused = true)]
async fn load_from_an_older_token_is_discarded() {
    let (fake, library, _folders, _rx) = setup();
    fake.with_library(&["/m/old.mp3"]);
    fake.delay_sequence(
        "list_music",
        &[Duration::from_millis(300), Duration::from_millis(10)],
    );

    let slow = library.clone();
    let first = tokio::spawn(async move { slow.load().await });
    tokio::task::yield_now().await;

    fake.with_library(&["/m/new.mp3"]);
    assert_eq!(library.invalidate().await, Applied::Committed);
    assert_eq!(first.await.unwrap(), Applied::Stale);

    assert_eq!(paths(&library.snapshot()), ["/m/new.mp3"]);
}

#[tokio::test(start_paused = true)]
async fn reload_from_db_invalidates_only_on_success() {
    let (fake, library, _folders, mut rx) = setup();
    fake.fail("load_from_db", "no database");
    assert_eq!(library.reload_from_db().await, Applied::Stale);
    assert_eq!(fake.calls("list_music"), 0);
    assert!(rx.try_recv().is_ok());

    fake.heal("load_from_db");
    fake.with_library(&["/m/a.mp3"]);
    assert_eq!(library.reload_from_db().await, Applied::Committed);
    assert_eq!(fake.calls("list_music"), 1);
    assert_eq!(library.token().value(), 1);
}

#[tokio::test(start_paused = true)]
async fn folder_refresh_and_change_check() {
    let (fake, _library, folders, _rx) = setup();
    fake.set_folders(vec![IndexedFolder {
        id: 1,
        path: "/music".into(),
        last_indexed: "2025-03-01T10:00:00Z".into(),
    }]);
    fake.set_has_changes(true);

    folders.refresh().await;
    folders.check_changes().await;

    let s = folders.snapshot();
    assert_eq!(s.folders.len(), 1);
    assert!(s.has_changes);
    assert!(!s.is_checking);
}

#[tokio::test(start_paused = true)]
async fn failed_change_check_keeps_previous_flag() {
    let (fake, _library, folders, _rx) = setup();
    fake.set_has_changes(true);
    folders.check_changes().await;

    fake.fail("check_for_changes", "indexer busy");
    folders.check_changes().await;
    assert!(folders.snapshot().has_changes);
}

#[test]
fn only_one_folder_task_at_a_time() {
    let (_fake, engine) = FakeEngine::engine();
    let (notices, _rx) = Notices::channel();
    let folders = FolderCatalog::new(engine, notices);

    assert!(folders.begin_task(FolderTask::Index("/a".into())));
    assert!(!folders.begin_task(FolderTask::Remove(1)));
    assert!(folders.snapshot().is_busy());

    folders.finish_task();
    assert!(folders.begin_task(FolderTask::Remove(1)));
}

#[test]
fn folder_task_describes_itself() {
    assert_eq!(FolderTask::Index("/m".into()).to_string(), "Indexing /m");
    assert_eq!(FolderTask::Remove(4).to_string(), "Removing folder #4");
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let mut m = meta("/tmp/Song.mp3");
    m.title = Some("Song".into());
    m.artist = Some("  Artist  ".into());
    assert_eq!(
        display_from_fields(&m, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Artist - Song"
    );

    m.artist = None;
    assert_eq!(
        display_from_fields(&m, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Song"
    );
}

#[test]
fn display_from_fields_filename_path_and_empty() {
    let mut m = meta("/tmp/dir/Song.mp3");
    m.album = Some("Album".into());
    assert_eq!(
        display_from_fields(
            &m,
            &[TrackDisplayField::Filename, TrackDisplayField::Album],
            "::"
        ),
        "Song::Album"
    );
    assert_eq!(
        display_from_fields(&m, &[TrackDisplayField::Path], ""),
        "/tmp/dir/Song.mp3"
    );
    assert_eq!(display_from_fields(&m, &[], " - "), "Title of Song");
    assert_eq!(
        display_from_fields(&m, &[TrackDisplayField::Artist], " - "),
        "Title of Song"
    );
    assert_eq!(m.path, TrackRef::new("/tmp/dir/Song.mp3"));
}
