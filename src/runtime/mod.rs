//! Process wiring: settings, logging, the engine services, the terminal and
//! the event loop.

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::App;
use crate::config::Settings;
use crate::dispatcher::IntentDispatcher;
use crate::error::AppError;
use crate::gateway::{Engine, HttpGateway};
use crate::library::{FolderCatalog, LibraryViewModel};
use crate::mirror::PlaybackMirror;
use crate::mpris::spawn_mpris;
use crate::notice::Notices;

mod event_loop;
mod keys;
mod logging;
mod settings;
mod startup;

/// The long-lived pieces every part of the loop talks to.
pub struct Services {
    pub settings: Settings,
    pub engine: Engine,
    pub mirror: PlaybackMirror,
    pub library: LibraryViewModel,
    pub folders: FolderCatalog,
    pub dispatcher: IntentDispatcher,
}

/// Command-line arguments: `yamp [--print-config] [ENGINE_URL]`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    print_config: bool,
    base_url: Option<String>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--print-config" => parsed.print_config = true,
                _ if parsed.base_url.is_none() && !arg.starts_with("--") => {
                    parsed.base_url = Some(arg)
                }
                _ => {}
            }
        }
        parsed
    }
}

pub async fn run() -> Result<(), AppError> {
    let args = Args::parse(std::env::args().skip(1));
    let settings::Loaded { settings, fallback } = settings::load_settings(args.base_url.as_deref());

    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let log_path = logging::init(&settings.logging);
    if let Some(reason) = &fallback {
        eprintln!("yamp: {reason}");
        warn!("{reason}");
    }
    info!(engine = %settings.engine.base_url, log = ?log_path, "starting");

    let engine = Engine::new(Arc::new(HttpGateway::new(&settings.engine)?));
    let (notices, notices_rx) = Notices::channel();
    let mirror = PlaybackMirror::new(engine.clone(), notices.clone());
    let library = LibraryViewModel::new(engine.clone(), notices.clone());
    let folders = FolderCatalog::new(engine.clone(), notices.clone());
    let dispatcher = IntentDispatcher::new(
        mirror.clone(),
        library.clone(),
        folders.clone(),
        engine.clone(),
        notices,
    );

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let mpris = spawn_mpris(control_tx);

    // The UI comes up straight away and fills in as the engine answers.
    {
        let (mirror, library, folders) = (mirror.clone(), library.clone(), folders.clone());
        tokio::spawn(async move {
            startup::sync_from_engine(&mirror, &library, &folders).await;
        });
    }

    let mut app = App::new(settings.ui.follow_playback);
    let services = Services {
        settings,
        engine,
        mirror,
        library,
        folders,
        dispatcher,
    };

    let mut session = TerminalSession::enter()?;
    let result = event_loop::run(
        &mut session.terminal,
        &services,
        &mut app,
        notices_rx,
        control_rx,
        &mpris,
    )
    .await;
    session.leave()?;

    info!("bye");
    result
}

/// Raw mode plus alternate screen. Dropping it restores the terminal, so a
/// panic or an early `?` never leaves the shell unusable.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalSession {
    fn enter() -> Result<Self, AppError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(t) => t,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(e.into());
            }
        };
        Ok(Self {
            terminal,
            active: true,
        })
    }

    fn leave(&mut self) -> Result<(), AppError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}
