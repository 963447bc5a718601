use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use super::Screen;
use super::format::{time_text, track_text, volume_text};
use crate::dispatcher::TransportState;

/// Transport bar: track, state, time and volume, plus the cursor mode.
pub(super) fn draw(frame: &mut Frame, screen: &Screen, area: Rect) {
    let state = screen.playback;
    let ui = &screen.settings.ui;
    let transport = TransportState::of(state);

    let color = match transport {
        TransportState::Playing => Color::Green,
        TransportState::Loading => Color::Yellow,
        TransportState::Paused | TransportState::Idle => Color::Gray,
    };

    let mut status = vec![
        Span::styled(transport.label(), Style::default().fg(color)),
        Span::raw(" • "),
        Span::raw(track_text(state, ui)),
    ];
    if let Some(time) = time_text(state, ui) {
        status.push(Span::raw(format!(" [{time}]")));
    }

    let cursor = if screen.app.follow_playback {
        "Cursor: follow"
    } else {
        "Cursor: free-roam"
    };
    let extra = Line::from(format!("{} • {}", volume_text(state.volume), cursor));

    let bar = Paragraph::new(vec![Line::from(status), extra])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" status ")
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(bar, area);
}
