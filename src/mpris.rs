//! MPRIS (D-Bus) surface so media keys and `playerctl` can see and drive
//! playback.
//!
//! The exported state is a read-only copy of the playback mirror; method
//! calls are forwarded as [`ControlCmd`]s to the event loop, which routes
//! them into the intent dispatcher.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_io::block_on;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::dispatcher::TransportState;
use crate::mirror::MirrorState;


const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.yamp";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Status {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl Status {
    fn of(state: &MirrorState) -> Self {
        match TransportState::of(state) {
            TransportState::Idle => Status::Stopped,
            TransportState::Loading | TransportState::Playing => Status::Playing,
            TransportState::Paused => Status::Paused,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Status::Stopped => "Stopped",
            Status::Playing => "Playing",
            Status::Paused => "Paused",
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct SharedState {
    status: Status,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
}

impl SharedState {
    fn from_mirror(state: &MirrorState) -> Self {
        let Some(track) = &state.current_track else {
            return Self::default();
        };
        let meta = state.metadata();

        Self {
            status: Status::of(state),
            title: state.track_name().map(|name| {
                meta.map(|m| m.title_or_name().to_string()).unwrap_or(name)
            }),
            artist: meta
                .and_then(|m| m.artist())
                .map(|a| vec![a.to_string()])
                .unwrap_or_default(),
            album: meta.and_then(|m| m.album()).map(str::to_string),
            url: Some(format!("file://{track}")),
            length_micros: state
                .total_duration
                .and_then(|d| i64::try_from(d.as_micros()).ok()),
            track_id: track_id(track.as_str()),
        }
    }
}

/// MPRIS wants an object path per track; derive a stable one from the path.
fn track_id(path: &str) -> Option<OwnedObjectPath> {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    OwnedObjectPath::try_from(format!("/org/yamp/track/t{:016x}", hasher.finish())).ok()
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: UnboundedSender<()>,
}

impl MprisHandle {
    /// Copy the mirror into the exported state. Clients are only told about
    /// it when something they can see changed.
    pub fn sync(&self, mirror: &MirrorState) {
        let next = SharedState::from_mirror(mirror);
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if *s != next {
            *s = next;
            // The bus thread may be gone (no session bus); nothing to tell then.
            let _ = self.notify.send(());
        }
    }
}

struct RootIface {
    tx: UnboundedSender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "yamp"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: UnboundedSender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| s.status.as_str())
            .unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    /// The engine has no queue, so next/previous do nothing.
    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            insert(&mut map, "mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            insert(&mut map, "xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            insert(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            insert(&mut map, "xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &s.url {
            insert(&mut map, "xesam:url", Value::from(url.clone()));
        }
        if let Some(len) = s.length_micros {
            insert(&mut map, "mpris:length", Value::from(len));
        }
        map
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => debug!("MPRIS: dropping {key}: {e}"),
    }
}

/// Export the MPRIS service on the session bus from a background thread.
///
/// Failing to reach the bus is logged and otherwise ignored; the returned
/// handle keeps working either way.
pub fn spawn_mpris(tx: UnboundedSender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::unbounded_channel();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                warn!("MPRIS unavailable: {e}");
            }
        });
    });

    MprisHandle { state, notify }
}

async fn serve(
    tx: UnboundedSender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    mut notify: UnboundedReceiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!("MPRIS service registered as {BUS_NAME}");

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    // Runs until the handle is dropped.
    while notify.recv().await.is_some() {
        let emitter = player.signal_emitter();
        let iface = player.get().await;
        if let Err(e) = iface.playback_status_changed(emitter).await {
            debug!("MPRIS: PlaybackStatus signal failed: {e}");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            debug!("MPRIS: Metadata signal failed: {e}");
        }
    }
    Ok(())
}
