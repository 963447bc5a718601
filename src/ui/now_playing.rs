use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use super::Screen;
use super::format::{format_mmss, visible_window};
use crate::dispatcher::TransportState;
use crate::mirror::MirrorState;

pub(super) fn draw(frame: &mut Frame, screen: &Screen, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    draw_metadata(frame, screen.playback, chunks[0]);
    draw_progress(frame, screen.playback, chunks[1]);
    draw_up_next(frame, screen, chunks[2]);
}

fn metadata_lines(state: &MirrorState) -> String {
    let Some(track) = &state.current_track else {
        return "Nothing is playing. Pick a track in the library.".to_string();
    };

    match state.metadata() {
        Some(meta) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nArt: {}\nPath: {}",
            meta.title_or_name(),
            meta.artist().unwrap_or("-"),
            meta.album().unwrap_or("-"),
            if meta.has_thumbnail() { "yes" } else { "none" },
            track
        ),
        None => format!(
            "{}\nLoading details…\nPath: {}",
            state.track_name().unwrap_or_default(),
            track
        ),
    }
}

fn draw_metadata(frame: &mut Frame, state: &MirrorState, area: Rect) {
    let title = match TransportState::of(state) {
        TransportState::Loading => " now playing (loading) ",
        _ => " now playing ",
    };
    let panel = Paragraph::new(metadata_lines(state))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn draw_progress(frame: &mut Frame, state: &MirrorState, area: Rect) {
    let total = state
        .total_duration
        .map(format_mmss)
        .unwrap_or_else(|| "--:--".to_string());
    let (title, color, label) = if state.is_scrubbing {
        (
            " scrub (enter seeks, esc cancels) ",
            Color::Yellow,
            format!("» {} / {}", format_mmss(state.elapsed), total),
        )
    } else {
        (
            " progress ",
            Color::Green,
            format!("{} / {}", format_mmss(state.elapsed), total),
        )
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(color))
        .ratio(state.progress())
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_up_next(frame: &mut Frame, screen: &Screen, area: Rect) {
    let app = screen.app;
    let upcoming = app.up_next(screen.playback.current_track.as_ref());
    let block = Block::default().borders(Borders::ALL).title(" up next ");

    if upcoming.is_empty() {
        frame.render_widget(Paragraph::new("Nothing queued after this track").block(block), area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let selected = app.up_next_selected.min(upcoming.len() - 1);
    let (start, end, sel_in_window) = visible_window(upcoming.len(), height, selected);

    let items: Vec<ListItem> = upcoming[start..end]
        .iter()
        .map(|&i| ListItem::new(app.tracks[i].display_title()))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(sel_in_window));
    frame.render_stateful_widget(list, area, &mut state);
}
