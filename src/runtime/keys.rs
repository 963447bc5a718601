//! Key bindings. Cursor, filter and prompt edits are applied to the `App`
//! directly; anything that talks to the engine comes back as an [`Action`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Prompt, View};
use crate::config::Settings;
use crate::library::FolderState;
use crate::mirror::MirrorState;
use crate::model::TrackRef;
use crate::mpris::ControlCmd;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Select(TrackRef),
    Toggle,
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    SeekBy(i64),
    ScrubBy(i64),
    CommitScrub,
    CancelScrub,
    AdjustVolume(f32),
    IndexFolder(String),
    ReindexFolder(String),
    RemoveFolder(i64),
    CheckChanges,
}

impl From<ControlCmd> for Action {
    fn from(cmd: ControlCmd) -> Self {
        match cmd {
            ControlCmd::Quit => Action::Quit,
            ControlCmd::Play => Action::Play,
            ControlCmd::Pause => Action::Pause,
            ControlCmd::PlayPause => Action::Toggle,
            ControlCmd::Stop => Action::Stop,
            ControlCmd::Next => Action::Next,
            ControlCmd::Prev => Action::Prev,
        }
    }
}

/// State carried between key presses.
#[derive(Debug, Default)]
pub struct KeyState {
    /// Internal two-key prefix state used for `gg` handling.
    pending_gg: bool,
}

pub fn handle_key(
    key: KeyEvent,
    app: &mut App,
    keys: &mut KeyState,
    settings: &Settings,
    playback: &MirrorState,
    folders: &FolderState,
) -> Option<Action> {
    if app.prompt_open() {
        keys.pending_gg = false;
        return handle_prompt_key(key, app);
    }
    if app.filter_mode {
        keys.pending_gg = false;
        return handle_filter_key(key, app);
    }

    let gg = std::mem::take(&mut keys.pending_gg);
    let scrub = settings.controls.scrub_seconds.min(i64::MAX as u64) as i64;
    let step = settings.controls.volume_step;

    // Bindings shared by every view.
    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Tab => {
            app.view = app.view.next();
            return None;
        }
        KeyCode::BackTab => {
            app.view = app.view.prev();
            return None;
        }
        KeyCode::Char(c @ '1'..='3') => {
            let idx = c as usize - '1' as usize;
            app.view = View::ALL[idx];
            return None;
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => return Some(Action::Toggle),
        KeyCode::Char('s') => return Some(Action::Stop),
        KeyCode::Char('H') => return Some(Action::SeekBy(-scrub)),
        KeyCode::Char('L') => return Some(Action::SeekBy(scrub)),
        KeyCode::Char('+') | KeyCode::Char('=') => return Some(Action::AdjustVolume(step)),
        KeyCode::Char('-') => return Some(Action::AdjustVolume(-step)),
        KeyCode::Char('>') => return Some(Action::Next),
        KeyCode::Char('<') => return Some(Action::Prev),
        _ => {}
    }

    match app.view {
        View::Library => handle_library_key(key, app, gg, keys),
        View::NowPlaying => handle_now_playing_key(key, app, playback, scrub),
        View::Settings => handle_settings_key(key, app, folders),
    }
}

fn handle_library_key(key: KeyEvent, app: &mut App, gg: bool, keys: &mut KeyState) -> Option<Action> {
    match key.code {
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Char('g') => {
            if gg {
                app.select_first();
            } else {
                keys.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('f') => app.toggle_follow_playback(),
        KeyCode::Enter => {
            return app.selected_track().map(|t| Action::Select(t.path.clone()));
        }
        _ => {}
    }
    None
}

fn handle_now_playing_key(
    key: KeyEvent,
    app: &mut App,
    playback: &MirrorState,
    scrub: i64,
) -> Option<Action> {
    let current = playback.current_track.as_ref();
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => return Some(Action::ScrubBy(-scrub)),
        KeyCode::Char('l') | KeyCode::Right => return Some(Action::ScrubBy(scrub)),
        KeyCode::Esc if playback.is_scrubbing => return Some(Action::CancelScrub),
        KeyCode::Enter if playback.is_scrubbing => return Some(Action::CommitScrub),
        KeyCode::Enter => {
            return app
                .up_next_track(current)
                .map(|t| Action::Select(t.path.clone()));
        }
        KeyCode::Char('j') | KeyCode::Down => app.up_next_move(current, true),
        KeyCode::Char('k') | KeyCode::Up => app.up_next_move(current, false),
        _ => {}
    }
    None
}

fn handle_settings_key(key: KeyEvent, app: &mut App, folders: &FolderState) -> Option<Action> {
    let selected = folders.folders.get(app.folder_selected);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.folder_move(folders.folders.len(), true),
        KeyCode::Char('k') | KeyCode::Up => app.folder_move(folders.folders.len(), false),
        KeyCode::Char('a') => app.start_add_folder(),
        KeyCode::Char('r') => return selected.map(|f| Action::ReindexFolder(f.path.clone())),
        KeyCode::Char('d') => {
            if let Some(f) = selected {
                app.prompt = Prompt::ConfirmRemove {
                    id: f.id,
                    path: f.path.clone(),
                };
            }
        }
        KeyCode::Char('c') => return Some(Action::CheckChanges),
        _ => {}
    }
    None
}

fn handle_prompt_key(key: KeyEvent, app: &mut App) -> Option<Action> {
    if matches!(app.prompt, Prompt::ConfirmRemove { .. }) {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => match app.take_prompt() {
                Prompt::ConfirmRemove { id, .. } => Some(Action::RemoveFolder(id)),
                _ => None,
            },
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.take_prompt();
                None
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => {
            app.take_prompt();
        }
        KeyCode::Backspace => app.prompt_pop(),
        KeyCode::Enter => {
            if let Prompt::AddFolder(path) = app.take_prompt() {
                return Some(Action::IndexFolder(path));
            }
        }
        KeyCode::Char(c) if !c.is_control() => app.prompt_push(c),
        _ => {}
    }
    None
}

fn handle_filter_key(key: KeyEvent, app: &mut App) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => app.next(),
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.prev(),
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return None;
            }
            app.exit_filter_mode();
            return app.selected_track().map(|t| Action::Select(t.path.clone()));
        }
        _ => {}
    }
    None
}
