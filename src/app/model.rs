//! Application model types: `App`, `View` and `Prompt`.
//!
//! `App` holds what only the terminal UI cares about: which view is shown,
//! the library cursor and filter, the settings cursor, the open prompt and
//! the notice in the status line. Playback state lives in the mirror.

use std::time::{Duration, Instant};

use crate::library::{LibraryState, RefreshToken};
use crate::model::{TrackMetadata, TrackRef};

/// The screens reachable from the sidebar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Library,
    NowPlaying,
    Settings,
}

impl View {
    pub const ALL: [View; 3] = [View::Library, View::NowPlaying, View::Settings];

    pub fn title(self) -> &'static str {
        match self {
            View::Library => "Library",
            View::NowPlaying => "Now Playing",
            View::Settings => "Settings",
        }
    }

    /// Whether the view shows live transport state and needs the poller.
    pub fn renders_transport(self) -> bool {
        matches!(self, View::Library | View::NowPlaying)
    }

    pub fn next(self) -> Self {
        match self {
            View::Library => View::NowPlaying,
            View::NowPlaying => View::Settings,
            View::Settings => View::Library,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Library => View::Settings,
            View::NowPlaying => View::Library,
            View::Settings => View::NowPlaying,
        }
    }
}

/// Modal input on top of the settings view.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Prompt {
    #[default]
    None,
    /// Typing the path of a folder to index.
    AddFolder(String),
    /// Waiting for y/n before removing a folder.
    ConfirmRemove { id: i64, path: String },
}

/// The main application model.
pub struct App {
    pub view: View,

    pub tracks: Vec<TrackMetadata>,
    library_token: Option<RefreshToken>,
    pub library_loading: bool,
    pub selected: usize,
    lower_titles: Option<Vec<String>>,

    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,

    pub up_next_selected: usize,
    pub folder_selected: usize,
    pub prompt: Prompt,

    notice: Option<(String, Instant)>,
}

impl App {
    /// Create a new `App` with an empty library.
    pub fn new(follow_playback: bool) -> Self {
        Self {
            view: View::Library,
            tracks: Vec::new(),
            library_token: None,
            library_loading: true,
            selected: 0,
            lower_titles: None,
            follow_playback,
            filter_mode: false,
            filter_query: String::new(),
            up_next_selected: 0,
            folder_selected: 0,
            prompt: Prompt::None,
            notice: None,
        }
    }

    /// Take the latest library list. The cursor stays on the same track when
    /// it is still present.
    pub fn sync_library(&mut self, state: &LibraryState) {
        self.library_loading = state.loading && state.loaded.is_none();
        if state.loaded == self.library_token && state.tracks == self.tracks {
            return;
        }
        let keep = self.selected_track().map(|t| t.path.clone());
        self.library_token = state.loaded;
        self.tracks = state.tracks.clone();

        // For larger libraries, precompute lowercase titles to speed up fuzzy
        // filtering on every keystroke.
        self.lower_titles = (self.tracks.len() > 100).then(|| {
            self.tracks
                .iter()
                .map(|t| t.display_title().to_lowercase())
                .collect()
        });

        self.selected = keep.and_then(|p| self.index_of(&p)).unwrap_or(0);
        self.ensure_selected_visible();
    }

    pub fn index_of(&self, track: &TrackRef) -> Option<usize> {
        self.tracks.iter().position(|t| t.path == *track)
    }

    pub fn selected_track(&self) -> Option<&TrackMetadata> {
        self.tracks.get(self.selected)
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Move the cursor onto `current` when following playback.
    pub fn follow(&mut self, current: Option<&TrackRef>) {
        if !self.follow_playback || self.filter_mode {
            return;
        }
        if let Some(idx) = current.and_then(|t| self.index_of(t)) {
            if self.display_indices().contains(&idx) {
                self.selected = idx;
            }
        }
    }

    pub fn toggle_follow_playback(&mut self) {
        self.follow_playback = !self.follow_playback;
    }

    /// Library indices after `current`, in library order. Everything when
    /// nothing is playing.
    pub fn up_next(&self, current: Option<&TrackRef>) -> Vec<usize> {
        let start = current
            .and_then(|t| self.index_of(t))
            .map(|i| i + 1)
            .unwrap_or(0);
        (start..self.tracks.len()).collect()
    }

    pub fn up_next_track(&self, current: Option<&TrackRef>) -> Option<&TrackMetadata> {
        self.up_next(current)
            .get(self.up_next_selected)
            .and_then(|&i| self.tracks.get(i))
    }

    pub fn up_next_move(&mut self, current: Option<&TrackRef>, down: bool) {
        let len = self.up_next(current).len();
        self.up_next_selected = step(self.up_next_selected, len, down);
    }

    pub fn folder_move(&mut self, len: usize, down: bool) {
        self.folder_selected = step(self.folder_selected, len, down);
    }

    pub fn clamp_folder_selection(&mut self, len: usize) {
        if self.folder_selected >= len {
            self.folder_selected = len.saturating_sub(1);
        }
    }

    /// Return the display order of track indices, taking into account active
    /// filtering.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = 0..self.tracks.len();

        let query = self.filter_query.trim();
        if query.is_empty() {
            return base.collect();
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_lowercase();
                base.filter(|&i| Self::fuzzy_matches_lower(&lower_titles[i], &query_lower))
                    .collect()
            }
            None => base
                .filter(|&i| {
                    Self::fuzzy_match_positions(&self.tracks[i].display_title(), query).is_some()
                })
                .collect(),
        }
    }

    /// Return true if this `App` uses precomputed lowercase titles.
    pub fn uses_lower_titles(&self) -> bool {
        self.lower_titles.is_some()
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars().flat_map(char::to_lowercase) {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_lowercase().eq(std::iter::once(qc)) => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_matches_lower(title_lower: &str, query_lower: &str) -> bool {
        let mut title_iter = title_lower.chars();
        query_lower
            .chars()
            .all(|qc| title_iter.by_ref().any(|tc| tc == qc))
    }

    /// Enter filter mode: enable filtering and stop following playback.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    /// Leave filter mode, keeping the query applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view, otherwise
    /// move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn set_notice(&mut self, message: String, now: Instant) {
        self.notice = Some((message, now));
    }

    /// The notice to show at `now`, if it has not expired.
    pub fn active_notice(&self, now: Instant, ttl: Duration) -> Option<&str> {
        match &self.notice {
            Some((msg, at)) if now.saturating_duration_since(*at) < ttl => Some(msg),
            _ => None,
        }
    }

    /// Open the add-folder prompt.
    pub fn start_add_folder(&mut self) {
        self.prompt = Prompt::AddFolder(String::new());
    }

    pub fn prompt_push(&mut self, c: char) {
        if let Prompt::AddFolder(input) = &mut self.prompt {
            input.push(c);
        }
    }

    pub fn prompt_pop(&mut self) {
        if let Prompt::AddFolder(input) = &mut self.prompt {
            input.pop();
        }
    }

    /// Close the prompt, returning what it held.
    pub fn take_prompt(&mut self) -> Prompt {
        std::mem::take(&mut self.prompt)
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt != Prompt::None
    }
}

/// Move a wrapping cursor over `len` rows.
fn step(current: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let current = current.min(len - 1);
    if down {
        (current + 1) % len
    } else if current == 0 {
        len - 1
    } else {
        current - 1
    }
}
