use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::EngineError;
use crate::model::{IndexedFolder, TrackMetadata, TrackRef, secs_to_duration};

use super::{Command, CommandGateway};

/// Typed client over a [`CommandGateway`].
///
/// Cheap to clone; all clones share the same gateway.
#[derive(Clone)]
pub struct Engine {
    gateway: Arc<dyn CommandGateway>,
}

impl Engine {
    pub fn new(gateway: Arc<dyn CommandGateway>) -> Self {
        Self { gateway }
    }

    async fn call<T: DeserializeOwned>(&self, command: Command) -> Result<T, EngineError> {
        let name = command.name();
        trace!(command = name, "invoke");
        let value = self.gateway.invoke(command).await?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::Unavailable(format!("{name}: unexpected response: {e}")))
    }

    /// Invoke a command whose response carries no information we use.
    async fn ack(&self, command: Command) -> Result<(), EngineError> {
        trace!(command = command.name(), "invoke");
        self.gateway.invoke(command).await.map(|_| ())
    }

    pub async fn current_track(&self) -> Result<Option<TrackRef>, EngineError> {
        self.call(Command::GetCurrentTrack).await
    }

    pub async fn current_track_info(&self) -> Result<Option<TrackMetadata>, EngineError> {
        self.call(Command::GetCurrentTrackInfo).await
    }

    pub async fn play(&self, track: &TrackRef) -> Result<(), EngineError> {
        self.ack(Command::PlayMusic {
            path: track.clone(),
        })
        .await
    }

    pub async fn pause(&self) -> Result<(), EngineError> {
        self.ack(Command::PauseMusic).await
    }

    pub async fn resume(&self) -> Result<(), EngineError> {
        self.ack(Command::ResumeMusic).await
    }

    pub async fn stop(&self) -> Result<(), EngineError> {
        self.ack(Command::StopMusic).await
    }

    pub async fn is_playing(&self) -> Result<bool, EngineError> {
        self.call(Command::IsPlaying).await
    }

    /// Elapsed time and, when known, the total length of the current track.
    pub async fn playback_position(&self) -> Result<(Duration, Option<Duration>), EngineError> {
        let (elapsed, total): (f64, Option<f64>) = self.call(Command::GetPlaybackPosition).await?;
        Ok((secs_to_duration(elapsed), total.map(secs_to_duration)))
    }

    pub async fn seek(&self, position: Duration) -> Result<(), EngineError> {
        self.ack(Command::Seek {
            position_secs: position.as_secs_f64(),
        })
        .await
    }

    pub async fn volume(&self) -> Result<f32, EngineError> {
        self.call(Command::GetVolume).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<(), EngineError> {
        self.ack(Command::SetVolume { volume }).await
    }

    pub async fn list_music(&self) -> Result<Vec<TrackMetadata>, EngineError> {
        self.call(Command::ListMusic).await
    }

    /// Ask the engine to reload its track set from the index database.
    pub async fn load_from_db(&self) -> Result<(), EngineError> {
        self.ack(Command::LoadFromDb).await
    }

    pub async fn index_folder(&self, path: &str) -> Result<(), EngineError> {
        self.ack(Command::IndexFolder {
            path: path.to_string(),
        })
        .await
    }

    pub async fn indexed_folders(&self) -> Result<Vec<IndexedFolder>, EngineError> {
        self.call(Command::GetIndexedFolders).await
    }

    pub async fn check_for_changes(&self) -> Result<bool, EngineError> {
        self.call(Command::CheckForChanges).await
    }

    pub async fn remove_folder(&self, folder_id: i64) -> Result<(), EngineError> {
        self.ack(Command::RemoveFolder { folder_id }).await
    }
}
