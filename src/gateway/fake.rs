//! Scripted in-memory engine used by tests.
//!
//! Holds a tiny engine state (current track, transport, volume, library,
//! folders), records every command it receives, and can delay or fail
//! individual commands. Delays use `tokio::time`, so tests running with a
//! paused clock stay deterministic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::EngineError;
use crate::model::{IndexedFolder, TrackMetadata, TrackRef};

use super::{Command, CommandGateway, Engine};

#[derive(Default)]
struct FakeState {
    current: Option<TrackRef>,
    playing: bool,
    elapsed: f64,
    total: Option<f64>,
    volume: f32,
    library: Vec<TrackMetadata>,
    folders: Vec<IndexedFolder>,
    has_changes: bool,
    calls: Vec<Command>,
    fail_always: HashMap<&'static str, String>,
    fail_next: HashMap<&'static str, usize>,
    delays: HashMap<&'static str, Duration>,
    delay_queue: HashMap<&'static str, VecDeque<Duration>>,
}

pub struct FakeEngine {
    state: Mutex<FakeState>,
}

pub fn meta(path: &str) -> TrackMetadata {
    let track = TrackRef::new(path);
    TrackMetadata {
        name: track.file_name().to_string(),
        title: Some(format!("Title of {}", track.file_stem())),
        path: track,
        artist: None,
        album: None,
        thumbnail: None,
    }
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                volume: 0.5,
                ..FakeState::default()
            }),
        })
    }

    /// Build a fake together with an [`Engine`] that talks to it.
    pub fn engine() -> (Arc<Self>, Engine) {
        let fake = Self::new();
        let engine = Engine::new(fake.clone());
        (fake, engine)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_library(&self, paths: &[&str]) {
        self.lock().library = paths.iter().map(|p| meta(p)).collect();
    }

    pub fn set_current(&self, path: Option<&str>) {
        self.lock().current = path.map(TrackRef::new);
    }

    pub fn set_playing(&self, playing: bool) {
        self.lock().playing = playing;
    }

    pub fn set_position(&self, elapsed: f64, total: Option<f64>) {
        let mut s = self.lock();
        s.elapsed = elapsed;
        s.total = total;
    }

    pub fn set_volume(&self, volume: f32) {
        self.lock().volume = volume;
    }

    pub fn set_folders(&self, folders: Vec<IndexedFolder>) {
        self.lock().folders = folders;
    }

    pub fn set_has_changes(&self, changes: bool) {
        self.lock().has_changes = changes;
    }

    pub fn current(&self) -> Option<TrackRef> {
        self.lock().current.clone()
    }

    /// Make every subsequent call of `command` fail with `message`.
    pub fn fail(&self, command: &'static str, message: &str) {
        self.lock().fail_always.insert(command, message.to_string());
    }

    /// Stop failing `command`.
    pub fn heal(&self, command: &'static str) {
        let mut s = self.lock();
        s.fail_always.remove(command);
        s.fail_next.remove(command);
    }

    /// Make the next `n` calls of `command` fail.
    pub fn fail_next(&self, command: &'static str, n: usize) {
        self.lock().fail_next.insert(command, n);
    }

    /// Delay every call of `command`.
    pub fn delay(&self, command: &'static str, delay: Duration) {
        self.lock().delays.insert(command, delay);
    }

    /// Delay successive calls of `command` by the given durations, in order.
    pub fn delay_sequence(&self, command: &'static str, delays: &[Duration]) {
        self.lock()
            .delay_queue
            .insert(command, delays.iter().copied().collect());
    }

    /// Number of calls received for `command`.
    pub fn calls(&self, command: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.name() == command)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    fn metadata_for(s: &FakeState, track: &TrackRef) -> TrackMetadata {
        s.library
            .iter()
            .find(|m| m.path == *track)
            .cloned()
            .unwrap_or_else(|| meta(track.as_str()))
    }

    /// Record the call and decide its delay and whether it fails.
    fn admit(&self, command: &Command) -> (Duration, Option<String>) {
        let mut s = self.lock();
        s.calls.push(command.clone());
        let name = command.name();

        let delay = s
            .delay_queue
            .get_mut(name)
            .and_then(VecDeque::pop_front)
            .or_else(|| s.delays.get(name).copied())
            .unwrap_or(Duration::ZERO);

        let mut failure = s.fail_always.get(name).cloned();
        if failure.is_none() {
            if let Some(n) = s.fail_next.get_mut(name) {
                if *n > 0 {
                    *n -= 1;
                    failure = Some(format!("{name} failed"));
                }
            }
        }
        (delay, failure)
    }

    /// Answer a read at call time; writes land when the call completes.
    fn read(&self, command: &Command) -> Option<Value> {
        let s = self.lock();
        let value = match command {
            Command::GetCurrentTrack => json!(s.current.as_ref().map(TrackRef::as_str)),
            Command::GetCurrentTrackInfo => {
                json!(s.current.as_ref().map(|t| Self::metadata_for(&s, t)))
            }
            Command::IsPlaying => json!(s.playing),
            Command::GetPlaybackPosition => json!([s.elapsed, s.total]),
            Command::GetVolume => json!(s.volume),
            Command::ListMusic => json!(s.library),
            Command::GetIndexedFolders => json!(s.folders),
            Command::CheckForChanges => json!(s.has_changes),
            _ => return None,
        };
        Some(value)
    }

    fn write(&self, command: &Command) -> Value {
        let mut s = self.lock();
        match command {
            Command::PlayMusic { path } => {
                s.current = Some(path.clone());
                s.playing = true;
                s.elapsed = 0.0;
            }
            Command::PauseMusic | Command::StopMusic => s.playing = false,
            Command::ResumeMusic => s.playing = s.current.is_some(),
            Command::Seek { position_secs } => s.elapsed = *position_secs,
            Command::SetVolume { volume } => s.volume = *volume,
            Command::IndexFolder { path } => {
                let id = s.folders.iter().map(|f| f.id).max().unwrap_or(0) + 1;
                if !s.folders.iter().any(|f| f.path == *path) {
                    s.folders.push(IndexedFolder {
                        id,
                        path: path.clone(),
                        last_indexed: "2025-01-01T00:00:00+00:00".to_string(),
                    });
                }
            }
            Command::RemoveFolder { folder_id } => s.folders.retain(|f| f.id != *folder_id),
            _ => {}
        }
        Value::Null
    }
}

#[async_trait]
impl CommandGateway for FakeEngine {
    async fn invoke(&self, command: Command) -> Result<Value, EngineError> {
        let (delay, failure) = self.admit(&command);
        let early = self.read(&command);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = failure {
            return Err(EngineError::Rejected {
                command: command.name(),
                message,
            });
        }

        Ok(match early {
            Some(value) => value,
            None => self.write(&command),
        })
    }
}
