//! Data shared between the engine gateway, the playback mirror and the views.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stable identifier of a playable item: the file path the engine knows it by.
///
/// Cloning is cheap; two refs are equal exactly when their paths are equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackRef(Arc<str>);

impl TrackRef {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component (`/music/a.mp3` -> `a.mp3`).
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(&self.0)
    }

    /// File name without its extension (`/music/a.mp3` -> `a`).
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

impl fmt::Debug for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackRef({:?})", &*self.0)
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackRef {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Descriptive attributes the indexer resolved for a track.
///
/// Also the shape of every `list_music` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub path: TrackRef,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Image reference for album art (usually a data URL).
    #[serde(default)]
    pub thumbnail: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl TrackMetadata {
    pub fn artist(&self) -> Option<&str> {
        non_empty(self.artist.as_deref())
    }

    pub fn album(&self) -> Option<&str> {
        non_empty(self.album.as_deref())
    }

    /// Tag title, else the indexed file name, else the path's file stem.
    pub fn title_or_name(&self) -> &str {
        non_empty(self.title.as_deref())
            .or_else(|| non_empty(Some(self.name.as_str())))
            .unwrap_or_else(|| self.path.file_stem())
    }

    /// `Artist - Title` when both tags exist, otherwise [`Self::title_or_name`].
    pub fn display_title(&self) -> String {
        match (self.artist(), non_empty(self.title.as_deref())) {
            (Some(artist), Some(title)) => format!("{artist} - {title}"),
            _ => self.title_or_name().to_string(),
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        non_empty(self.thumbnail.as_deref()).is_some()
    }
}

/// Name to show for `track`, preferring resolved metadata and falling back to
/// the file name when none is available yet.
pub fn display_name(track: &TrackRef, metadata: Option<&TrackMetadata>) -> String {
    match metadata {
        Some(meta) if meta.path == *track => meta.display_title(),
        _ => track.file_name().to_string(),
    }
}

/// Point-in-time read of the engine's transport, produced by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub playing: bool,
    pub elapsed: Duration,
    /// `None` when the engine could not determine the length.
    pub total: Option<Duration>,
}

/// A folder the indexer has scanned. Owned by the indexer; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFolder {
    pub id: i64,
    pub path: String,
    /// RFC 3339 timestamp of the last successful scan.
    pub last_indexed: String,
}

/// Convert engine seconds into a `Duration`, treating negative or non-finite
/// values as zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(path: &str) -> TrackMetadata {
        TrackMetadata {
            path: TrackRef::new(path),
            name: String::new(),
            artist: None,
            album: None,
            title: None,
            thumbnail: None,
        }
    }

    #[test]
    fn track_ref_equality_is_by_path() {
        assert_eq!(TrackRef::new("/music/a.mp3"), TrackRef::from("/music/a.mp3"));
        assert_ne!(TrackRef::new("/music/a.mp3"), TrackRef::new("/music/b.mp3"));
    }

    #[test]
    fn track_ref_file_name_and_stem() {
        let t = TrackRef::new("/music/Some Band/01 - Intro.flac");
        assert_eq!(t.file_name(), "01 - Intro.flac");
        assert_eq!(t.file_stem(), "01 - Intro");

        let win = TrackRef::new(r"C:\Music\song.mp3");
        assert_eq!(win.file_name(), "song.mp3");

        let dotfile = TrackRef::new("/music/.hidden");
        assert_eq!(dotfile.file_stem(), ".hidden");
    }

    #[test]
    fn display_title_prefers_artist_dash_title() {
        let mut m = meta("/music/a.mp3");
        m.name = "a.mp3".into();
        assert_eq!(m.display_title(), "a.mp3");

        m.title = Some("Song".into());
        assert_eq!(m.display_title(), "Song");

        m.artist = Some("  Artist ".into());
        assert_eq!(m.display_title(), "Artist - Song");

        m.artist = Some("   ".into());
        assert_eq!(m.display_title(), "Song");
    }

    #[test]
    fn title_or_name_falls_back_to_file_stem() {
        let m = meta("/music/untagged.ogg");
        assert_eq!(m.title_or_name(), "untagged");
    }

    #[test]
    fn display_name_ignores_metadata_for_another_track() {
        let a = TrackRef::new("/music/a.mp3");
        let mut b = meta("/music/b.mp3");
        b.title = Some("B".into());

        assert_eq!(display_name(&a, Some(&b)), "a.mp3");
        assert_eq!(display_name(&b.path.clone(), Some(&b)), "B");
        assert_eq!(display_name(&a, None), "a.mp3");
    }

    #[test]
    fn metadata_deserializes_with_missing_optional_fields() {
        let m: TrackMetadata =
            serde_json::from_str(r#"{"path":"/music/a.mp3","name":"a.mp3"}"#).unwrap();
        assert_eq!(m.path.as_str(), "/music/a.mp3");
        assert!(m.artist.is_none());
        assert!(!m.has_thumbnail());
    }

    #[test]
    fn secs_to_duration_clamps_garbage_to_zero() {
        assert_eq!(secs_to_duration(-3.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }
}
