//! Intent dispatcher: turns user intents into optimistic mirror updates and
//! engine commands.
//!
//! Transport commands (play, pause, resume, stop) go through one FIFO lane so
//! the engine sees them in the order the user issued them. Confirmations and
//! rollbacks are matched against the mirror by the value captured at
//! dispatch, so a newer intent always wins over an older one's late result.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::Engine;
use crate::library::{FolderCatalog, FolderTask, LibraryViewModel};
use crate::mirror::{Applied, MirrorState, PlayTicket, PlaybackMirror};
use crate::model::TrackRef;
use crate::notice::Notices;


/// Coarse user-facing playback state, derived from the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Loading,
    Playing,
    Paused,
}

impl TransportState {
    pub fn of(state: &MirrorState) -> Self {
        if state.is_loading() {
            TransportState::Loading
        } else if state.current_track.is_none() {
            TransportState::Idle
        } else if state.is_playing {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportState::Idle => "Idle",
            TransportState::Loading => "Loading",
            TransportState::Playing => "Playing",
            TransportState::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Pause,
    Resume,
    Stop,
}

/// What selecting a track did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The track was already current: show it instead of restarting it.
    Focus,
    /// A switch to the track has started.
    Started,
}

/// How a [`IntentDispatcher::play`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Focus,
    Playing,
    /// The engine refused the track; the previous playback was restored.
    Failed,
    /// A newer selection replaced this one before it completed.
    Superseded,
}

#[derive(Clone)]
pub struct IntentDispatcher {
    mirror: PlaybackMirror,
    library: LibraryViewModel,
    folders: FolderCatalog,
    engine: Engine,
    notices: Notices,
    lane: Arc<Mutex<()>>,
}

impl IntentDispatcher {
    pub fn new(
        mirror: PlaybackMirror,
        library: LibraryViewModel,
        folders: FolderCatalog,
        engine: Engine,
        notices: Notices,
    ) -> Self {
        Self {
            mirror,
            library,
            folders,
            engine,
            notices,
            lane: Arc::new(Mutex::new(())),
        }
    }

    pub fn transport_state(&self) -> TransportState {
        TransportState::of(&self.mirror.snapshot())
    }

    /// Play `track` and wait for the outcome. Re-selecting the current (or
    /// loading) track is a focus, not a restart.
    pub async fn play(&self, track: TrackRef) -> PlayOutcome {
        if self.mirror.snapshot().is_active(&track) {
            return PlayOutcome::Focus;
        }
        let ticket = self.mirror.begin_track_switch(track);
        self.finish_play(ticket).await
    }

    /// Fire-and-forget [`Self::play`] for the UI. The optimistic switch is
    /// applied before this returns.
    pub fn select(&self, track: TrackRef) -> Selection {
        if self.mirror.snapshot().is_active(&track) {
            return Selection::Focus;
        }
        let ticket = self.mirror.begin_track_switch(track);
        let this = self.clone();
        tokio::spawn(async move {
            this.finish_play(ticket).await;
        });
        Selection::Started
    }

    async fn finish_play(&self, ticket: PlayTicket) -> PlayOutcome {
        let result = {
            let _lane = self.lane.lock().await;
            if !self.mirror.is_latest_switch(&ticket) {
                debug!(track = %ticket.track, "skipping superseded play");
                return PlayOutcome::Superseded;
            }
            self.engine.play(&ticket.track).await
        };

        match result {
            Ok(()) => match self.mirror.confirm_track_switch(&ticket) {
                Applied::Committed => {
                    info!(track = %ticket.track, "playing");
                    PlayOutcome::Playing
                }
                Applied::Stale => PlayOutcome::Superseded,
            },
            Err(e) => match self.mirror.rollback_track_switch(&ticket) {
                Applied::Committed => {
                    self.notices.error(format!(
                        "Could not play {}: {}",
                        ticket.track.file_name(),
                        e.reason()
                    ));
                    PlayOutcome::Failed
                }
                Applied::Stale => {
                    debug!(track = %ticket.track, "superseded play failed: {e}");
                    PlayOutcome::Superseded
                }
            },
        }
    }

    /// Pause when playing, resume when paused. Ignored while idle or loading.
    pub async fn toggle(&self) {
        match self.transport_state() {
            TransportState::Playing => self.pause().await,
            TransportState::Paused => self.resume().await,
            state => debug!(?state, "toggle ignored"),
        }
    }

    pub async fn pause(&self) {
        self.transport(Transport::Pause).await;
    }

    pub async fn resume(&self) {
        self.transport(Transport::Resume).await;
    }

    pub async fn stop(&self) {
        self.transport(Transport::Stop).await;
    }

    async fn transport(&self, action: Transport) {
        let playing = action == Transport::Resume;
        let Some(prior) = self.mirror.set_playing_optimistic(playing) else {
            debug!(?action, "no current track");
            return;
        };

        let result = {
            let _lane = self.lane.lock().await;
            match action {
                Transport::Pause => self.engine.pause().await,
                Transport::Resume => self.engine.resume().await,
                Transport::Stop => self.engine.stop().await,
            }
        };

        match result {
            Ok(()) => self.mirror.confirm_playing(),
            Err(e) => {
                if self.mirror.revert_playing(playing, prior) == Applied::Stale {
                    debug!(?action, "playing flag already changed by a newer intent");
                }
                self.notices
                    .error(format!("{action:?} failed: {}", e.reason()));
            }
        }
    }

    /// Next track. The engine has no queue yet, so this does nothing.
    pub async fn skip_forward(&self) {
        debug!("skip forward is not supported by the engine");
    }

    /// Previous track. The engine has no queue yet, so this does nothing.
    pub async fn skip_back(&self) {
        debug!("skip back is not supported by the engine");
    }

    pub fn begin_scrub(&self) {
        if self.mirror.snapshot().current_track.is_some() {
            self.mirror.begin_scrub();
        }
    }

    /// Move an active scrub by `delta_secs`.
    pub fn scrub_by(&self, delta_secs: i64) {
        let state = self.mirror.snapshot();
        if state.is_scrubbing {
            self.mirror.scrub_to(offset(state.elapsed, delta_secs));
        }
    }

    /// Seek to the scrub indicator.
    pub async fn commit_scrub(&self) {
        let state = self.mirror.snapshot();
        if state.is_scrubbing {
            self.mirror.commit_scrub(state.elapsed).await;
        }
    }

    pub fn cancel_scrub(&self) {
        self.mirror.cancel_scrub();
    }

    /// One-shot seek relative to the current position, clamped to the track.
    pub async fn seek_by(&self, delta_secs: i64) {
        let state = self.mirror.snapshot();
        if state.current_track.is_none() || state.is_loading() {
            return;
        }
        self.mirror.begin_scrub();
        let target = offset(state.elapsed, delta_secs);
        self.mirror.scrub_to(target);
        self.mirror.commit_scrub(target).await;
    }

    pub async fn set_volume(&self, volume: f32) {
        self.mirror.set_volume(volume).await;
    }

    pub async fn adjust_volume(&self, delta: f32) {
        let volume = self.mirror.snapshot().volume;
        self.mirror.set_volume(volume + delta).await;
    }

    /// Index a new folder. Returns whether the indexer confirmed it.
    pub async fn index_folder(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            self.notices.error("Folder path is empty");
            return false;
        }
        self.folder_task(FolderTask::Index(path.to_string())).await
    }

    pub async fn reindex_folder(&self, path: &str) -> bool {
        self.folder_task(FolderTask::Reindex(path.to_string())).await
    }

    pub async fn remove_folder(&self, folder_id: i64) -> bool {
        self.folder_task(FolderTask::Remove(folder_id)).await
    }

    /// Run one indexer mutation. On success the folder list, the change flag
    /// and the library are refreshed; the library is invalidated exactly once.
    async fn folder_task(&self, task: FolderTask) -> bool {
        if !self.folders.begin_task(task.clone()) {
            self.notices
                .error("Another folder operation is still running");
            return false;
        }
        info!(%task, "folder task started");

        let result = match &task {
            FolderTask::Index(path) | FolderTask::Reindex(path) => {
                self.engine.index_folder(path).await
            }
            FolderTask::Remove(id) => self.engine.remove_folder(*id).await,
        };

        let confirmed = match result {
            Ok(()) => {
                self.folders.refresh().await;
                self.folders.check_changes().await;
                if let Err(e) = self.engine.load_from_db().await {
                    warn!("engine did not reload its database: {e}");
                }
                self.library.invalidate().await;
                info!(%task, "folder task done");
                true
            }
            Err(e) => {
                self.notices.error(format!("{task} failed: {}", e.reason()));
                false
            }
        };
        self.folders.finish_task();
        confirmed
    }

    /// Re-check the indexed folders for changes on disk.
    pub async fn check_changes(&self) {
        self.folders.check_changes().await;
    }
}

fn offset(pos: Duration, delta_secs: i64) -> Duration {
    let delta = Duration::from_secs(delta_secs.unsigned_abs());
    if delta_secs >= 0 {
        pos.saturating_add(delta)
    } else {
        pos.saturating_sub(delta)
    }
}
