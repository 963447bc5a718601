use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::Screen;
use super::format::visible_window;
use crate::app::App;

pub(super) fn draw(frame: &mut Frame, screen: &Screen, area: Rect) {
    let app = screen.app;
    let query = app.filter_query.trim();

    let title = if app.filter_mode || !query.is_empty() {
        let cursor = if app.filter_mode { "_" } else { "" };
        format!(" library /{query}{cursor} ")
    } else {
        " library ".to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if !app.has_tracks() {
        let text = if app.library_loading {
            "Loading…"
        } else {
            "No music found — index a folder in Settings"
        };
        let empty = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Only build ListItems for the visible window.
    let display = app.display_indices();
    let height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, sel_in_window) = visible_window(display.len(), height, sel_pos);
    let current = screen.playback.current_track.as_ref();
    let width = display.len().max(1).to_string().len();

    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let track = &app.tracks[i];
            let marker = if current == Some(&track.path) { "▶ " } else { "  " };
            let mut spans = vec![Span::raw(format!("{marker}{:>width$}. ", i + 1))];
            spans.extend(title_spans(&track.display_title(), query));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !display.is_empty() {
        state.select(Some(sel_in_window));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Split `title` into spans, emphasising the characters the filter matched.
fn title_spans(title: &str, query: &str) -> Vec<Span<'static>> {
    let Some(positions) = App::fuzzy_match_positions(title, query).filter(|p| !p.is_empty())
    else {
        return vec![Span::raw(title.to_string())];
    };

    let hit = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_hit = false;
    let mut next = positions.into_iter().peekable();

    for (ci, ch) in title.chars().enumerate() {
        let is_hit = next.peek() == Some(&ci);
        if is_hit {
            next.next();
        }
        if is_hit != run_hit && !run.is_empty() {
            let text = std::mem::take(&mut run);
            spans.push(if run_hit { Span::styled(text, hit) } else { Span::raw(text) });
        }
        run_hit = is_hit;
        run.push(ch);
    }
    if !run.is_empty() {
        spans.push(if run_hit { Span::styled(run, hit) } else { Span::raw(run) });
    }
    spans
}
