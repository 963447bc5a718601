use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::Services;
use super::keys::{self, Action, KeyState};
use crate::app::{App, View};
use crate::dispatcher::{IntentDispatcher, Selection};
use crate::error::AppError;
use crate::model::TrackRef;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::notice::Notice;
use crate::poller::Poller;
use crate::ui;

const REDRAW_EVERY: Duration = Duration::from_millis(250);

/// Main terminal event loop: draws from the latest mirrored state and turns
/// input into intents. Returns `Ok(())` when shutdown is requested.
pub async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    services: &Services,
    app: &mut App,
    mut notices: UnboundedReceiver<Notice>,
    mut controls: UnboundedReceiver<ControlCmd>,
    mpris: &MprisHandle,
) -> Result<(), AppError> {
    let mut events = EventStream::new();
    let mut mirror_rx = services.mirror.subscribe();
    let mut library_rx = services.library.subscribe();
    let mut folders_rx = services.folders.subscribe();
    let mut redraw = tokio::time::interval(REDRAW_EVERY);
    let mut keys = KeyState::default();
    let mut poller: Option<Poller> = None;
    let mut last_track: Option<TrackRef> = None;
    let ttl = services.settings.ui.notice_ttl();

    sync_poller(&mut poller, app.view, services).await;

    let result = loop {
        let playback = mirror_rx.borrow_and_update().clone();
        app.sync_library(&library_rx.borrow_and_update());
        let folders = folders_rx.borrow_and_update().clone();
        app.clamp_folder_selection(folders.folders.len());

        if playback.current_track != last_track {
            app.up_next_selected = 0;
            app.follow(playback.current_track.as_ref());
            last_track = playback.current_track.clone();
        }
        mpris.sync(&playback);

        let now = Instant::now();
        let screen = ui::Screen {
            app: &*app,
            playback: &playback,
            folders: &folders,
            settings: &services.settings,
            notice: app.active_notice(now, ttl),
        };
        if let Err(e) = terminal.draw(|f| ui::draw(f, &screen)) {
            break Err(e.into());
        }

        let action = tokio::select! {
            maybe = events.next() => match maybe {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    keys::handle_key(key, app, &mut keys, &services.settings, &playback, &folders)
                }
                Some(Ok(_)) => None,
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            },
            Some(cmd) = controls.recv() => {
                debug!(?cmd, "media key");
                Some(Action::from(cmd))
            }
            Some(notice) = notices.recv() => {
                app.set_notice(notice.message, Instant::now());
                None
            }
            _ = mirror_rx.changed() => None,
            _ = library_rx.changed() => None,
            _ = folders_rx.changed() => None,
            _ = redraw.tick() => None,
        };

        if let Some(action) = action {
            if action == Action::Quit {
                info!("quit requested");
                break Ok(());
            }
            perform(action, app, services);
        }
        sync_poller(&mut poller, app.view, services).await;
    };

    if let Some(p) = poller.take() {
        p.stop().await;
    }
    result
}

/// Run the poller only while the view shows transport state.
async fn sync_poller(poller: &mut Option<Poller>, view: View, services: &Services) {
    match (view.renders_transport(), poller.is_some()) {
        (true, false) => {
            *poller = Some(Poller::spawn(
                services.mirror.clone(),
                services.engine.clone(),
                services.settings.polling.interval(),
            ));
            // The track may have changed while nobody was looking.
            let mirror = services.mirror.clone();
            tokio::spawn(async move {
                mirror.refresh_current_track().await;
            });
        }
        (false, true) => {
            if let Some(p) = poller.take() {
                p.stop().await;
            }
        }
        _ => {}
    }
}

/// Hand an intent to the dispatcher without blocking the UI.
fn spawn_intent<F, Fut>(services: &Services, intent: F)
where
    F: FnOnce(IntentDispatcher) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(intent(services.dispatcher.clone()));
}

fn perform(action: Action, app: &mut App, services: &Services) {
    let dispatcher = &services.dispatcher;
    match action {
        Action::Quit => {}
        Action::Select(track) => {
            if dispatcher.select(track) == Selection::Focus {
                app.view = View::NowPlaying;
            }
        }
        Action::Toggle => spawn_intent(services, |d| async move { d.toggle().await }),
        Action::Play => spawn_intent(services, |d| async move { d.resume().await }),
        Action::Pause => spawn_intent(services, |d| async move { d.pause().await }),
        Action::Stop => spawn_intent(services, |d| async move { d.stop().await }),
        Action::Next => spawn_intent(services, |d| async move { d.skip_forward().await }),
        Action::Prev => spawn_intent(services, |d| async move { d.skip_back().await }),
        Action::SeekBy(delta) => spawn_intent(services, move |d| async move { d.seek_by(delta).await }),
        Action::ScrubBy(delta) => {
            dispatcher.begin_scrub();
            dispatcher.scrub_by(delta);
        }
        Action::CommitScrub => spawn_intent(services, |d| async move { d.commit_scrub().await }),
        Action::CancelScrub => dispatcher.cancel_scrub(),
        Action::AdjustVolume(delta) => {
            spawn_intent(services, move |d| async move { d.adjust_volume(delta).await })
        }
        Action::IndexFolder(path) => spawn_intent(services, |d| async move {
            d.index_folder(&path).await;
        }),
        Action::ReindexFolder(path) => spawn_intent(services, |d| async move {
            d.reindex_folder(&path).await;
        }),
        Action::RemoveFolder(id) => spawn_intent(services, move |d| async move {
            d.remove_folder(id).await;
        }),
        Action::CheckChanges => spawn_intent(services, |d| async move { d.check_changes().await }),
    }
}
