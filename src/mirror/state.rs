use std::time::Duration;

use crate::model::{TrackMetadata, TrackRef, display_name};

/// Outcome of applying an asynchronous result to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Committed,
    /// The result no longer describes the mirror's state and was dropped.
    Stale,
}

/// Local copy of the engine's playback state.
///
/// Created once at rest and updated in place by [`super::PlaybackMirror`].
/// `track_metadata`, when present, always describes `current_track`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MirrorState {
    pub current_track: Option<TrackRef>,
    pub track_metadata: Option<TrackMetadata>,
    pub is_playing: bool,
    pub elapsed: Duration,
    pub total_duration: Option<Duration>,
    /// Last confirmed or user-set volume in `[0, 1]`.
    pub volume: f32,
    pub is_scrubbing: bool,
    /// Track a `play_music` command is in flight for.
    pub pending_play: Option<TrackRef>,

    pub(crate) metadata_pending: Option<TrackRef>,
    pub(crate) scrub_origin: Option<Duration>,
    pub(crate) scrub_epoch: u64,
    pub(crate) play_seq: u64,
    pub(crate) position_epoch: u64,
    /// Pause/resume/stop commands the engine has not answered yet.
    pub(crate) transport_pending: u32,
    pub(crate) transport_epoch: u64,
    pub(crate) switch_origin: Option<PriorPlayback>,
}

impl MirrorState {
    pub fn is_loading(&self) -> bool {
        self.pending_play.is_some()
    }

    /// True when `track` is the current track or is being switched to.
    pub fn is_active(&self, track: &TrackRef) -> bool {
        self.current_track.as_ref() == Some(track) || self.pending_play.as_ref() == Some(track)
    }

    /// Metadata for the current track, if it has arrived.
    pub fn metadata(&self) -> Option<&TrackMetadata> {
        match (&self.current_track, &self.track_metadata) {
            (Some(track), Some(meta)) if meta.path == *track => Some(meta),
            _ => None,
        }
    }

    /// Display name for the transport bar.
    pub fn track_name(&self) -> Option<String> {
        self.current_track
            .as_ref()
            .map(|t| display_name(t, self.track_metadata.as_ref()))
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.total_duration
            .map(|total| total.saturating_sub(self.elapsed))
    }

    /// Fraction of the track played, in `[0, 1]`. Zero when the length is
    /// unknown.
    pub fn progress(&self) -> f64 {
        match self.total_duration {
            Some(total) if !total.is_zero() => {
                (self.elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Clamp a target position to the known track length.
    pub(crate) fn clamp_position(&self, pos: Duration) -> Duration {
        match self.total_duration {
            Some(total) => pos.min(total),
            None => pos,
        }
    }

    pub(crate) fn end_transport(&mut self) {
        self.transport_pending = self.transport_pending.saturating_sub(1);
        self.transport_epoch += 1;
    }

    pub(crate) fn reset_track(&mut self, track: Option<TrackRef>) {
        self.current_track = track;
        self.track_metadata = None;
        self.metadata_pending = None;
        self.elapsed = Duration::ZERO;
        self.total_duration = None;
        self.position_epoch += 1;
    }
}

/// Playback as it was before an optimistic track switch.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PriorPlayback {
    pub(crate) track: Option<TrackRef>,
    pub(crate) metadata: Option<TrackMetadata>,
    pub(crate) playing: bool,
    pub(crate) elapsed: Duration,
    pub(crate) total: Option<Duration>,
}

impl PriorPlayback {
    pub(crate) fn capture(state: &MirrorState) -> Self {
        Self {
            track: state.current_track.clone(),
            metadata: state.track_metadata.clone(),
            playing: state.is_playing,
            elapsed: state.elapsed,
            total: state.total_duration,
        }
    }

    /// `track` freshly started by the engine.
    pub(crate) fn playing(track: TrackRef) -> Self {
        Self {
            track: Some(track),
            playing: true,
            ..Self::default()
        }
    }

    pub(crate) fn restore(self, state: &mut MirrorState) {
        state.current_track = self.track;
        state.track_metadata = self.metadata;
        state.metadata_pending = None;
        state.is_playing = self.playing;
        state.elapsed = self.elapsed;
        state.total_duration = self.total;
        state.position_epoch += 1;
    }
}

/// Clamp a requested volume into `[0, 1]`. NaN is rejected.
pub(crate) fn clamp_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}
