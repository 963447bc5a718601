//! Text helpers shared by the views. Pure functions, no drawing.

use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::layout::Rect;

use crate::app::View;
use crate::config::{TimeField, UiSettings};
use crate::library::display_from_fields;
use crate::mirror::MirrorState;

/// Format a `Duration` as `MM:SS`.
pub fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Name for the transport bar, following the configured track fields.
pub fn track_text(state: &MirrorState, ui: &UiSettings) -> String {
    match state.metadata() {
        Some(meta) => display_from_fields(
            meta,
            &ui.now_playing_track_fields,
            &ui.now_playing_track_separator,
        ),
        None => state
            .track_name()
            .unwrap_or_else(|| "No track selected".to_string()),
    }
}

/// Elapsed/total/remaining text per `UiSettings`. Fields that need the track
/// length are left out while it is unknown.
pub fn time_text(state: &MirrorState, ui: &UiSettings) -> Option<String> {
    if state.current_track.is_none() {
        return None;
    }

    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(state.elapsed)),
            TimeField::Total => state.total_duration.map(format_mmss),
            TimeField::Remaining => state.remaining().map(|r| format!("-{}", format_mmss(r))),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

pub fn volume_text(volume: f32) -> String {
    format!("Vol {:>3}%", (volume * 100.0).round() as u32)
}

/// Render an RFC 3339 timestamp in local time, or return it untouched when it
/// does not parse.
pub fn format_last_indexed(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Key hints for the footer of `view`.
pub fn controls_text(view: View, scrub_seconds: u64) -> String {
    let view_keys: &[&str] = match view {
        View::Library => &[
            "[j/k] up/down",
            "[gg/G] top/bottom",
            "[enter] play",
            "[/] filter",
            "[f] follow",
        ],
        View::NowPlaying => &["[j/k] up next", "[enter] play", "[h/l] scrub", "[esc] cancel scrub"],
        View::Settings => &[
            "[j/k] folder",
            "[a] add",
            "[r] re-index",
            "[d] remove",
            "[c] check changes",
        ],
    };
    let transport = [
        "[space] play/pause".to_string(),
        "[s] stop".to_string(),
        format!("[H/L] seek -/+{scrub_seconds}s"),
        "[+/-] volume".to_string(),
    ];

    view_keys
        .iter()
        .map(|s| s.to_string())
        .chain(transport)
        .chain(["[tab] view".to_string(), "[q] quit".to_string()])
        .collect::<Vec<String>>()
        .join(" | ")
}

/// The slice of a list that fits in `height` rows, keeping the selection
/// centered when possible. Returns `(start, end, selected_in_window)`.
pub fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

/// Compute a centered rectangle with given size constrained to `r`.
pub fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TrackMetadata, TrackRef};

    fn playing(path: &str, elapsed: u64, total: Option<u64>) -> MirrorState {
        MirrorState {
            current_track: Some(TrackRef::new(path)),
            is_playing: true,
            elapsed: Duration::from_secs(elapsed),
            total_duration: total.map(Duration::from_secs),
            ..MirrorState::default()
        }
    }

    #[test]
    fn mmss_pads_minutes_and_seconds() {
        assert_eq!(format_mmss(Duration::from_secs(0)), "00:00");
        assert_eq!(format_mmss(Duration::from_millis(65_900)), "01:05");
        assert_eq!(format_mmss(Duration::from_secs(3600)), "60:00");
    }

    #[test]
    fn time_text_follows_configured_fields() {
        let ui = UiSettings::default();
        let state = playing("/music/a.mp3", 30, Some(200));
        assert_eq!(time_text(&state, &ui).as_deref(), Some("00:30 / 03:20 / -02:50"));

        let unknown = playing("/music/a.mp3", 30, None);
        assert_eq!(time_text(&unknown, &ui).as_deref(), Some("00:30"));

        let ui = UiSettings {
            now_playing_time_fields: vec![TimeField::Remaining],
            ..UiSettings::default()
        };
        assert_eq!(time_text(&unknown, &ui), None);
        assert_eq!(time_text(&MirrorState::default(), &ui), None);
    }

    #[test]
    fn track_text_falls_back_to_file_name_then_placeholder() {
        let ui = UiSettings::default();
        assert_eq!(track_text(&MirrorState::default(), &ui), "No track selected");

        let mut state = playing("/music/dir/song.flac", 0, None);
        assert_eq!(track_text(&state, &ui), "song.flac");

        state.track_metadata = Some(TrackMetadata {
            path: TrackRef::new("/music/dir/song.flac"),
            name: "song.flac".into(),
            artist: Some("Band".into()),
            album: None,
            title: Some("Song".into()),
            thumbnail: None,
        });
        assert_eq!(track_text(&state, &ui), "Band - Song");
    }

    #[test]
    fn volume_is_shown_as_percent() {
        assert_eq!(volume_text(0.5), "Vol  50%");
        assert_eq!(volume_text(1.0), "Vol 100%");
    }

    #[test]
    fn last_indexed_keeps_unparseable_input() {
        assert_eq!(format_last_indexed("yesterday"), "yesterday");

        let formatted = format_last_indexed("2024-03-01T12:30:00Z");
        assert_ne!(formatted, "2024-03-01T12:30:00Z");
        assert_eq!(formatted.len(), "2024-03-01 12:30".len());
    }

    #[test]
    fn controls_text_includes_scrub_seconds() {
        let text = controls_text(View::Library, 7);
        assert!(text.contains("[H/L] seek -/+7s"));
        assert!(text.contains("[/] filter"));
        assert!(controls_text(View::Settings, 5).contains("[a] add"));
    }

    #[test]
    fn visible_window_centers_selection() {
        assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
        assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
        assert_eq!(visible_window(100, 10, 98), (90, 100, 8));
        assert_eq!(visible_window(100, 10, 2), (0, 10, 2));
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 40, 20);
        let r = centered_rect_sized(72, 9, area);
        assert_eq!(r.width, 38);
        assert_eq!(r.height, 9);
        assert_eq!(r.x, 1);
        assert_eq!(r.y, 5);
    }
}
