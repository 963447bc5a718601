use serde_json::{Value, json};

use crate::model::TrackRef;

/// Every command the client issues, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetCurrentTrack,
    GetCurrentTrackInfo,
    PlayMusic { path: TrackRef },
    PauseMusic,
    ResumeMusic,
    StopMusic,
    IsPlaying,
    GetPlaybackPosition,
    Seek { position_secs: f64 },
    GetVolume,
    SetVolume { volume: f32 },
    ListMusic,
    LoadFromDb,
    IndexFolder { path: String },
    GetIndexedFolders,
    CheckForChanges,
    RemoveFolder { folder_id: i64 },
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetCurrentTrack => "get_current_track",
            Command::GetCurrentTrackInfo => "get_current_track_info",
            Command::PlayMusic { .. } => "play_music",
            Command::PauseMusic => "pause_music",
            Command::ResumeMusic => "resume_music",
            Command::StopMusic => "stop_music",
            Command::IsPlaying => "is_playing",
            Command::GetPlaybackPosition => "get_playback_position",
            Command::Seek { .. } => "seek",
            Command::GetVolume => "get_volume",
            Command::SetVolume { .. } => "set_volume",
            Command::ListMusic => "list_music",
            Command::LoadFromDb => "load_from_db",
            Command::IndexFolder { .. } => "index_folder",
            Command::GetIndexedFolders => "get_indexed_folders",
            Command::CheckForChanges => "check_for_changes",
            Command::RemoveFolder { .. } => "remove_folder",
        }
    }

    /// JSON arguments object (camelCase keys, empty object when there are none).
    pub fn args(&self) -> Value {
        match self {
            Command::PlayMusic { path } => json!({ "path": path.as_str() }),
            Command::Seek { position_secs } => json!({ "positionSecs": position_secs }),
            Command::SetVolume { volume } => json!({ "volume": volume }),
            Command::IndexFolder { path } => json!({ "path": path }),
            Command::RemoveFolder { folder_id } => json!({ "folderId": folder_id }),
            _ => json!({}),
        }
    }
}
