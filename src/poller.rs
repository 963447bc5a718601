//! Periodic transport poll bound to the view that shows transport controls.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gateway::Engine;
use crate::mirror::PlaybackMirror;
use crate::model::PlaybackSnapshot;

/// Owned polling task. Dropping it cancels the task; [`Poller::stop`] also
/// waits for it to finish, after which no tick can touch the mirror.
pub struct Poller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn(mirror: PlaybackMirror, engine: Engine, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(mirror, engine, interval, token.clone()));
        debug!(?interval, "poller started");
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("poller task ended abnormally: {e}");
            }
        }
        debug!("poller stopped");
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(mirror: PlaybackMirror, engine: Engine, interval: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let tag = mirror.poll_tag();
        let reads = async { tokio::join!(engine.is_playing(), engine.playback_position()) };
        let (playing, position) = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            reads = reads => reads,
        };

        match (playing, position) {
            (Ok(playing), Ok((elapsed, total))) => {
                let snapshot = PlaybackSnapshot {
                    playing,
                    elapsed,
                    total,
                };
                mirror.apply_snapshot(tag, snapshot);
            }
            (playing, position) => {
                match playing {
                    Ok(playing) => {
                        mirror.apply_playing(tag, playing);
                    }
                    Err(e) => warn!("poll is_playing failed: {e}"),
                }
                match position {
                    Ok((elapsed, total)) => {
                        mirror.apply_position(tag, elapsed, total);
                    }
                    Err(e) => warn!("poll playback position failed: {e}"),
                }
            }
        }
        mirror.ensure_metadata();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeEngine;
    use crate::model::TrackRef;
    use crate::notice::Notices;

    const TICK: Duration = Duration::from_millis(500);

    fn setup() -> (std::sync::Arc<FakeEngine>, PlaybackMirror, Engine) {
        let (fake, engine) = FakeEngine::engine();
        let (notices, _rx) = Notices::channel();
        let mirror = PlaybackMirror::new(engine.clone(), notices);
        (fake, mirror, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_apply_playing_and_position() {
        let (fake, mirror, engine) = setup();
        fake.set_playing(true);
        fake.set_position(12.0, Some(120.0));

        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(TICK * 2).await;

        let s = mirror.snapshot();
        assert!(s.is_playing);
        assert_eq!(s.elapsed, Duration::from_secs(12));
        assert_eq!(s.total_duration, Some(Duration::from_secs(120)));
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_half_does_not_block_the_other_or_later_ticks() {
        let (fake, mirror, engine) = setup();
        fake.fail("get_playback_position", "no sink");
        fake.set_playing(true);

        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(TICK * 3).await;
        assert!(mirror.snapshot().is_playing);
        assert_eq!(mirror.snapshot().elapsed, Duration::ZERO);

        fake.heal("get_playback_position");
        fake.set_position(4.0, None);
        tokio::time::sleep(TICK * 2).await;
        assert_eq!(mirror.snapshot().elapsed, Duration::from_secs(4));
        assert!(fake.calls("get_playback_position") >= 4);
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_leave_playing_alone_while_a_pause_is_unanswered() {
        let (fake, mirror, engine) = setup();
        fake.set_playing(true);
        mirror.set_current_track(Some(TrackRef::new("/music/a.mp3")));
        mirror.set_playing_optimistic(false);

        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(TICK * 3).await;
        assert!(!mirror.snapshot().is_playing);

        mirror.confirm_playing();
        tokio::time::sleep(TICK * 2).await;
        assert!(mirror.snapshot().is_playing);
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let (fake, mirror, engine) = setup();
        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(TICK * 2).await;
        poller.stop().await;

        let before = fake.calls("is_playing");
        fake.set_playing(true);
        tokio::time::sleep(TICK * 10).await;

        assert_eq!(fake.calls("is_playing"), before);
        assert!(!mirror.snapshot().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_a_poll_in_flight() {
        let (fake, mirror, engine) = setup();
        fake.delay("is_playing", Duration::from_millis(300));
        fake.set_playing(true);

        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fake.calls("is_playing"), 1);
        poller.stop().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!mirror.snapshot().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_cancels_it() {
        let (fake, mirror, engine) = setup();
        drop(Poller::spawn(mirror, engine, TICK));
        tokio::time::sleep(TICK * 4).await;
        assert!(fake.calls("is_playing") <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_heal_missing_metadata() {
        let (fake, mirror, engine) = setup();
        fake.set_current(Some("/music/other.mp3"));
        mirror.set_current_track(Some(TrackRef::new("/music/a.mp3")));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(mirror.snapshot().track_metadata.is_none());

        fake.set_current(Some("/music/a.mp3"));
        let poller = Poller::spawn(mirror.clone(), engine, TICK);
        tokio::time::sleep(TICK * 2).await;
        assert!(mirror.snapshot().metadata().is_some());
        poller.stop().await;
    }
}
