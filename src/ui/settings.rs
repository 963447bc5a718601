use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use super::Screen;
use super::format::{centered_rect_sized, format_last_indexed, visible_window};
use crate::app::Prompt;
use crate::library::FolderState;

pub(super) fn draw(frame: &mut Frame, screen: &Screen, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let status = Paragraph::new(status_text(screen.folders))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" indexer ")
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[0]);

    draw_folders(frame, screen, chunks[1]);

    match &screen.app.prompt {
        Prompt::None => {}
        Prompt::AddFolder(input) => {
            draw_prompt(frame, area, " add folder ", &format!("Path: {input}_\n\n[enter] index  [esc] cancel"))
        }
        Prompt::ConfirmRemove { path, .. } => draw_prompt(
            frame,
            area,
            " remove folder ",
            &format!("Remove {path} from the library?\n\n[y] yes  [n] no"),
        ),
    }
}

fn status_text(folders: &FolderState) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(task) = &folders.task {
        parts.push(format!("{task}…"));
    } else if folders.is_checking {
        parts.push("Checking for changes…".to_string());
    }
    if folders.has_changes {
        parts.push("Changes detected, re-index to pick them up".to_string());
    }
    if parts.is_empty() {
        parts.push(format!("{} folder(s) indexed", folders.folders.len()));
    }
    parts.join(" • ")
}

fn draw_folders(frame: &mut Frame, screen: &Screen, area: Rect) {
    let folders = &screen.folders.folders;
    let block = Block::default().borders(Borders::ALL).title(" folders ");

    if folders.is_empty() {
        let hint = Paragraph::new("No folders indexed yet. Press [a] to add one.").block(block);
        frame.render_widget(hint, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let selected = screen.app.folder_selected.min(folders.len() - 1);
    let (start, end, sel_in_window) = visible_window(folders.len(), height, selected);

    let items: Vec<ListItem> = folders[start..end]
        .iter()
        .map(|f| {
            ListItem::new(format!(
                "{}  (last indexed {})",
                f.path,
                format_last_indexed(&f.last_indexed)
            ))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(sel_in_window));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_prompt(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let popup = centered_rect_sized(60, 6, area);
    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(text.to_string())
        .bold()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}
