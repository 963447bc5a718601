use tracing::{debug, info};

use crate::library::{FolderCatalog, LibraryViewModel};
use crate::mirror::{Applied, PlaybackMirror};

/// Pull the engine's state into a fresh session: what is playing, the
/// volume, the indexed folders and the library. Each part reports its own
/// failures, so one unreachable read does not hold up the others.
pub async fn sync_from_engine(
    mirror: &PlaybackMirror,
    library: &LibraryViewModel,
    folders: &FolderCatalog,
) {
    let (current, _, _, library_loaded) = tokio::join!(
        mirror.refresh_current_track(),
        mirror.refresh_volume(),
        async {
            folders.refresh().await;
            folders.check_changes().await;
        },
        library.reload_from_db(),
    );

    if current == Applied::Committed {
        debug!(track = ?mirror.current_track(), "current track restored");
    }
    info!(
        library_loaded = library_loaded == Applied::Committed,
        "startup sync finished"
    );
}
