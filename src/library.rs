//! Library view-model: the track list shown by the library view, plus the
//! indexed folder catalog managed from the settings view.

mod display;
mod folders;

pub use display::display_from_fields;
pub use folders::{FolderCatalog, FolderState, FolderTask};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::gateway::Engine;
use crate::mirror::Applied;
use crate::model::TrackMetadata;
use crate::notice::Notices;

#[cfg(test)]
mod tests;

/// Generation counter of the library list. Bumped on every invalidation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshToken(u64);

impl RefreshToken {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    /// Current generation. Loads dispatched under an older token are dropped.
    pub token: RefreshToken,
    /// Tracks in engine order.
    pub tracks: Vec<TrackMetadata>,
    /// Generation `tracks` came from; `None` until the first successful load.
    pub loaded: Option<RefreshToken>,
    pub loading: bool,
}

/// Shared handle to the library list. Cheap to clone.
#[derive(Clone)]
pub struct LibraryViewModel {
    state: Arc<watch::Sender<LibraryState>>,
    engine: Engine,
    notices: Notices,
}

impl LibraryViewModel {
    pub fn new(engine: Engine, notices: Notices) -> Self {
        let (tx, _rx) = watch::channel(LibraryState::default());
        Self {
            state: Arc::new(tx),
            engine,
            notices,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LibraryState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> RefreshToken {
        self.state.borrow().token
    }

    /// Fetch the full track list and replace the current one. A failed fetch
    /// keeps the previous list.
    pub async fn load(&self) -> Applied {
        let mut token = RefreshToken::default();
        self.state.send_modify(|s| {
            token = s.token;
            s.loading = true;
        });

        let result = self.engine.list_music().await;

        let mut current = false;
        self.state.send_if_modified(|s| {
            if s.token != token {
                return false;
            }
            current = true;
            s.loading = false;
            if let Ok(tracks) = &result {
                s.tracks = tracks.clone();
                s.loaded = Some(token);
            }
            true
        });

        match result {
            Ok(tracks) if current => {
                info!(count = tracks.len(), token = token.value(), "library loaded");
                Applied::Committed
            }
            Ok(_) => {
                debug!(token = token.value(), "discarding stale library load");
                Applied::Stale
            }
            Err(e) if current => {
                self.notices
                    .error(format!("Could not load library: {}", e.reason()));
                Applied::Stale
            }
            Err(e) => {
                warn!(token = token.value(), "stale library load failed: {e}");
                Applied::Stale
            }
        }
    }

    /// Move to a new generation and reload.
    pub async fn invalidate(&self) -> Applied {
        self.state.send_modify(|s| s.token = s.token.next());
        self.load().await
    }

    /// Ask the engine to reload its track set from the index database, then
    /// reload the list.
    pub async fn reload_from_db(&self) -> Applied {
        match self.engine.load_from_db().await {
            Ok(()) => self.invalidate().await,
            Err(e) => {
                self.notices
                    .error(format!("Could not read music database: {}", e.reason()));
                Applied::Stale
            }
        }
    }
}
