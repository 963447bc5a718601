//! UI rendering for the terminal user interface.
//!
//! Everything here is a pure function of the `App` model, the mirrored
//! playback state and the folder catalog; drawing never talks to the engine.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, View};
use crate::config::Settings;
use crate::library::FolderState;
use crate::mirror::MirrorState;

mod format;
mod library;
mod now_playing;
mod settings;
mod transport;

/// Everything one frame is drawn from.
pub struct Screen<'a> {
    pub app: &'a App,
    pub playback: &'a MirrorState,
    pub folders: &'a FolderState,
    pub settings: &'a Settings,
    /// Unexpired notice for the status line.
    pub notice: Option<&'a str>,
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, screen: &Screen) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(20)])
        .split(frame.area());

    draw_sidebar(frame, screen, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(columns[1]);

    match screen.app.view {
        View::Library => library::draw(frame, screen, rows[0]),
        View::NowPlaying => now_playing::draw(frame, screen, rows[0]),
        View::Settings => settings::draw(frame, screen, rows[0]),
    }
    transport::draw(frame, screen, rows[1]);
    draw_footer(frame, screen, rows[2]);
}

fn draw_sidebar(frame: &mut Frame, screen: &Screen, area: Rect) {
    let items: Vec<ListItem> = View::ALL
        .iter()
        .map(|v| ListItem::new(v.title()))
        .collect();
    let selected = View::ALL.iter().position(|v| *v == screen.app.view);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(screen.settings.ui.header_text.as_str())
                .title_alignment(Alignment::Center)
                .padding(Padding::horizontal(1)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

/// The notice while one is active, key hints otherwise.
fn draw_footer(frame: &mut Frame, screen: &Screen, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1));

    let footer = match screen.notice {
        Some(notice) => Paragraph::new(notice)
            .red()
            .block(block.title(" notice ")),
        None => Paragraph::new(format::controls_text(
            screen.app.view,
            screen.settings.controls.scrub_seconds,
        ))
        .block(block.title(" controls ")),
    };
    frame.render_widget(footer.wrap(Wrap { trim: true }), area);
}
