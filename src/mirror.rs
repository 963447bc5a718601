//! Playback mirror: the single local copy of the engine's playback state.
//!
//! All mutation goes through [`PlaybackMirror`]; views observe through
//! [`PlaybackMirror::subscribe`]. Asynchronous results are committed only when
//! the value captured at dispatch still matches the mirror, otherwise they are
//! dropped as [`Applied::Stale`].

mod state;

pub use state::{Applied, MirrorState};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::gateway::Engine;
use crate::model::{PlaybackSnapshot, TrackRef};
use crate::notice::Notices;

use state::{PriorPlayback, clamp_volume};


/// Identifies one optimistic track switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    pub track: TrackRef,
    seq: u64,
}

/// Mirror version a poll was issued against. See [`PlaybackMirror::poll_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTag {
    position: u64,
    transport: u64,
}

/// Shared handle to the mirror. Cheap to clone.
#[derive(Clone)]
pub struct PlaybackMirror {
    state: Arc<watch::Sender<MirrorState>>,
    engine: Engine,
    notices: Notices,
}

impl PlaybackMirror {
    pub fn new(engine: Engine, notices: Notices) -> Self {
        let (tx, _rx) = watch::channel(MirrorState::default());
        Self {
            state: Arc::new(tx),
            engine,
            notices,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MirrorState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> MirrorState {
        self.state.borrow().clone()
    }

    pub fn current_track(&self) -> Option<TrackRef> {
        self.state.borrow().current_track.clone()
    }

    /// Replace the current track. On an actual change the metadata, elapsed
    /// time and length are cleared and a metadata fetch for the new track is
    /// started.
    pub fn set_current_track(&self, track: Option<TrackRef>) {
        let changed = self.state.send_if_modified(|s| {
            if s.current_track == track {
                return false;
            }
            s.reset_track(track.clone());
            true
        });
        if changed {
            debug!(track = ?track, "current track changed");
            self.ensure_metadata();
        }
    }

    /// Start a metadata fetch when the current track has none and no fetch is
    /// already running for it.
    pub fn ensure_metadata(&self) {
        let mut target = None;
        self.state.send_if_modified(|s| {
            let Some(track) = &s.current_track else {
                return false;
            };
            let loading = s.pending_play.as_ref() == Some(track);
            if s.track_metadata.is_none() && !loading && s.metadata_pending.as_ref() != Some(track)
            {
                s.metadata_pending = Some(track.clone());
                target = Some(track.clone());
            }
            false
        });

        if let Some(target) = target {
            let mirror = self.clone();
            tokio::spawn(async move {
                mirror.fetch_metadata(target).await;
            });
        }
    }

    async fn fetch_metadata(&self, target: TrackRef) -> Applied {
        let result = self.engine.current_track_info().await;

        let mut applied = Applied::Stale;
        self.state.send_if_modified(|s| {
            if s.metadata_pending.as_ref() == Some(&target) {
                s.metadata_pending = None;
            }
            if s.current_track.as_ref() != Some(&target) {
                return false;
            }
            match &result {
                Ok(Some(info)) if info.path == target => {
                    s.track_metadata = Some(info.clone());
                    applied = Applied::Committed;
                    true
                }
                _ => false,
            }
        });

        match &result {
            Err(e) => warn!(track = %target, "metadata fetch failed: {e}"),
            Ok(_) if applied == Applied::Stale => {
                debug!(track = %target, "discarding stale metadata")
            }
            Ok(_) => {}
        }
        applied
    }

    /// Apply a polled snapshot taken under `tag`. Each half is checked on its
    /// own; the returned value reports the position.
    pub fn apply_snapshot(&self, tag: PollTag, snapshot: PlaybackSnapshot) -> Applied {
        self.apply_playing(tag, snapshot.playing);
        self.apply_position(tag, snapshot.elapsed, snapshot.total)
    }

    /// Apply a polled playing flag. Ignored while a pause, resume or stop is
    /// in flight, or if one was issued or answered since the read began.
    pub fn apply_playing(&self, tag: PollTag, playing: bool) -> Applied {
        let mut applied = Applied::Stale;
        self.state.send_if_modified(|s| {
            if s.transport_pending > 0 || s.transport_epoch != tag.transport {
                return false;
            }
            applied = Applied::Committed;
            if s.is_playing == playing {
                return false;
            }
            s.is_playing = playing;
            true
        });
        applied
    }

    /// Tag identifying the playback a poll belongs to. Position reads go stale
    /// on every track change, track switch and seek; playing reads on every
    /// transport command.
    pub fn poll_tag(&self) -> PollTag {
        let s = self.state.borrow();
        PollTag {
            position: s.position_epoch,
            transport: s.transport_epoch,
        }
    }

    /// Apply a position read taken under `tag`. A missing total keeps the
    /// known one.
    pub fn apply_position(
        &self,
        tag: PollTag,
        elapsed: Duration,
        total: Option<Duration>,
    ) -> Applied {
        let mut applied = Applied::Stale;
        self.state.send_if_modified(|s| {
            if s.is_scrubbing || s.is_loading() || s.position_epoch != tag.position {
                return false;
            }
            applied = Applied::Committed;
            let total = total.or(s.total_duration);
            if s.elapsed == elapsed && s.total_duration == total {
                return false;
            }
            s.elapsed = elapsed;
            s.total_duration = total;
            true
        });
        applied
    }

    /// Start a scrub. Polled positions are ignored until it is committed or
    /// cancelled.
    pub fn begin_scrub(&self) {
        self.state.send_modify(|s| {
            if !s.is_scrubbing {
                s.is_scrubbing = true;
                s.scrub_origin = Some(s.elapsed);
            }
            s.scrub_epoch += 1;
        });
    }

    /// Move the scrub indicator. Ignored when no scrub is active.
    pub fn scrub_to(&self, pos: Duration) {
        self.state.send_if_modified(|s| {
            if !s.is_scrubbing {
                return false;
            }
            s.elapsed = s.clamp_position(pos);
            true
        });
    }

    /// Seek to `pos`. The position is shown immediately and kept even if the
    /// engine refuses the seek; the next poll brings the engine's truth back.
    pub async fn commit_scrub(&self, pos: Duration) {
        let mut epoch = 0;
        let mut target = pos;
        self.state.send_modify(|s| {
            target = s.clamp_position(pos);
            s.is_scrubbing = true;
            s.scrub_origin = None;
            s.elapsed = target;
            s.scrub_epoch += 1;
            s.position_epoch += 1;
            epoch = s.scrub_epoch;
        });

        let result = self.engine.seek(target).await;

        self.state.send_if_modified(|s| {
            if s.scrub_epoch != epoch {
                return false;
            }
            s.is_scrubbing = false;
            s.position_epoch += 1;
            true
        });

        if let Err(e) = result {
            self.notices.error(format!("Seek failed: {}", e.reason()));
        }
    }

    /// Abandon a scrub and put the indicator back where it started.
    pub fn cancel_scrub(&self) {
        self.state.send_if_modified(|s| {
            if !s.is_scrubbing {
                return false;
            }
            if let Some(origin) = s.scrub_origin.take() {
                s.elapsed = origin;
            }
            s.is_scrubbing = false;
            s.scrub_epoch += 1;
            true
        });
    }

    /// Set the volume, clamped to `[0, 1]`. The new value stays in the mirror
    /// even if the engine refuses it.
    pub async fn set_volume(&self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            debug!("ignoring NaN volume");
            return;
        };
        self.state.send_if_modified(|s| {
            if s.volume == volume {
                return false;
            }
            s.volume = volume;
            true
        });

        if let Err(e) = self.engine.set_volume(volume).await {
            self.notices
                .error(format!("Volume change failed: {}", e.reason()));
        }
    }

    /// Read the engine's volume into the mirror.
    pub async fn refresh_volume(&self) {
        match self.engine.volume().await {
            Ok(volume) => {
                if let Some(volume) = clamp_volume(volume) {
                    self.state.send_modify(|s| s.volume = volume);
                }
            }
            Err(e) => warn!("could not read volume: {e}"),
        }
    }

    /// Read the engine's current track into the mirror. Skipped while a track
    /// switch is in flight.
    pub async fn refresh_current_track(&self) -> Applied {
        match self.engine.current_track().await {
            Ok(track) => {
                if self.state.borrow().is_loading() {
                    return Applied::Stale;
                }
                self.set_current_track(track);
                Applied::Committed
            }
            Err(e) => {
                warn!("could not read current track: {e}");
                Applied::Stale
            }
        }
    }

    /// Optimistically make `track` current and mark it loading.
    ///
    /// The playback before the first of a chain of overlapping switches is
    /// kept as the rollback target for all of them.
    pub(crate) fn begin_track_switch(&self, track: TrackRef) -> PlayTicket {
        let mut seq = 0;
        self.state.send_modify(|s| {
            if s.pending_play.is_none() {
                s.switch_origin = Some(PriorPlayback::capture(s));
            }
            s.play_seq += 1;
            seq = s.play_seq;
            s.pending_play = Some(track.clone());
            if s.current_track.as_ref() != Some(&track) {
                s.reset_track(Some(track.clone()));
            } else {
                s.position_epoch += 1;
            }
        });
        PlayTicket { track, seq }
    }

    /// Whether `ticket` is still the newest switch.
    pub(crate) fn is_latest_switch(&self, ticket: &PlayTicket) -> bool {
        self.state.borrow().play_seq == ticket.seq
    }

    /// The engine accepted `ticket`'s track. If a newer switch began, the
    /// mirror stays on it, but a rollback of that switch now lands on this
    /// track since the engine is playing it.
    pub(crate) fn confirm_track_switch(&self, ticket: &PlayTicket) -> Applied {
        let mut applied = Applied::Stale;
        self.state.send_if_modified(|s| {
            if s.play_seq != ticket.seq {
                if s.is_loading() {
                    s.switch_origin = Some(PriorPlayback::playing(ticket.track.clone()));
                }
                return false;
            }
            s.pending_play = None;
            s.switch_origin = None;
            s.is_playing = true;
            s.elapsed = Duration::ZERO;
            s.position_epoch += 1;
            applied = Applied::Committed;
            true
        });
        match applied {
            Applied::Committed => self.ensure_metadata(),
            Applied::Stale => debug!(track = %ticket.track, "play confirmation superseded"),
        }
        applied
    }

    /// The engine refused `ticket`'s track: restore the playback from before
    /// the switch. Dropped if a newer switch began.
    pub(crate) fn rollback_track_switch(&self, ticket: &PlayTicket) -> Applied {
        let restored = self.state.send_if_modified(|s| {
            if s.play_seq != ticket.seq {
                return false;
            }
            s.pending_play = None;
            s.switch_origin.take().unwrap_or_default().restore(s);
            true
        });
        if restored {
            self.ensure_metadata();
            Applied::Committed
        } else {
            Applied::Stale
        }
    }

    /// Optimistically set the playing flag for a transport command about to be
    /// sent. Returns the previous value, or `None` when there is no current
    /// track to act on. Every `Some` must be closed by [`Self::confirm_playing`]
    /// or [`Self::revert_playing`].
    pub(crate) fn set_playing_optimistic(&self, playing: bool) -> Option<bool> {
        let mut prior = None;
        self.state.send_if_modified(|s| {
            if s.current_track.is_none() {
                return false;
            }
            prior = Some(s.is_playing);
            s.transport_pending += 1;
            s.transport_epoch += 1;
            let changed = s.is_playing != playing;
            s.is_playing = playing;
            changed
        });
        prior
    }

    /// The engine accepted a transport command.
    pub(crate) fn confirm_playing(&self) {
        self.state.send_if_modified(|s| {
            s.end_transport();
            false
        });
    }

    /// The engine refused a transport command: undo its optimistic flag,
    /// unless a newer command changed it since.
    pub(crate) fn revert_playing(&self, optimistic: bool, prior: bool) -> Applied {
        let reverted = self.state.send_if_modified(|s| {
            s.end_transport();
            if s.is_playing != optimistic {
                return false;
            }
            s.is_playing = prior;
            true
        });
        if reverted {
            Applied::Committed
        } else {
            Applied::Stale
        }
    }
}
