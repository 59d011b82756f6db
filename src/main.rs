//! FlixTUI - terminal storefront for a Netflix-style streaming backend
//!
//! Browse category rows, search with filters, keep a list, rate titles,
//! simulate downloads and watch in mpv with resume.
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! flixtui
//!
//! # CLI mode (for automation)
//! flixtui login me@example.com --password hunter22
//! flixtui search "blade runner" --json
//! flixtui play 65a1f0c2e4b0a1b2c3d4e5f6
//! ```

use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use flixtui::api::ApiClient;
use flixtui::cli::{Cli, ExitCode, Output};
use flixtui::commands::{self, CliContext};
use flixtui::config::Config;
use flixtui::events::{Action, AppEvent};
use flixtui::session::Session;
use flixtui::worker::Worker;
use flixtui::{App, AppState};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Env var holding the tracing filter
const LOG_ENV: &str = "FLIXTUI_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let api = ApiClient::new(config.api_base_url(cli.api_url.as_deref()), Session::load());

    if cli.is_cli_mode() {
        init_logging(false);
        // CLI mode: execute command and exit
        let exit_code = run_cli(cli, CliContext { api, config }).await;
        std::process::exit(exit_code.into());
    } else {
        init_logging(true);
        // TUI mode: launch interactive interface
        run_tui(api, config).await
    }
}

/// Log to stderr in CLI mode; to a file in TUI mode so the screen stays clean
fn init_logging(tui: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if tui { "flixtui=info" } else { "flixtui=warn" })
    });

    if !tui {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        return;
    }

    let file = Config::log_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("flixtui.log"))
            .ok()
    });
    if let Some(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init();
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, ctx: CliContext) -> ExitCode {
    let output = Output::new(&cli);
    match cli.command {
        Some(command) => commands::run(command, &ctx, &output).await,
        // This shouldn't happen (handled by is_cli_mode check)
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive TUI
async fn run_tui(api: ApiClient, config: Config) -> Result<()> {
    tracing::info!(origin = api.origin(), "starting tui");
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut app = App::new(config.controls_hide_after());
    let mut worker = Worker::new(api, config, tx);

    let mut terminal = init_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app, &mut worker, &mut rx).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;
    worker.shutdown();
    result
}

/// Main event loop
async fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    worker: &mut Worker,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    let user = worker.api().session().user();
    let before = app.state;
    let actions = app.start(user);
    dispatch(app, worker, actions, before);

    while app.running {
        // Render current state
        terminal.draw(|frame| flixtui::ui::render(frame, app))?;

        let before = app.state;

        // Poll for events with timeout so background results keep flowing
        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    let actions = app.handle_key(key);
                    dispatch(app, worker, actions, before);
                }
            }
        }

        // Results from background tasks
        while let Ok(event) = rx.try_recv() {
            let before = app.state;
            let actions = app.apply(event);
            dispatch(app, worker, actions, before);
        }

        if worker.api().session().take_expired() {
            tracing::info!("session expired, returning to login");
            let before = app.state;
            let actions = app.force_login();
            dispatch(app, worker, actions, before);
        }

        app.tick(Instant::now());
    }

    Ok(())
}

/// Cancel the work of a screen that was left, then run new actions
fn dispatch(app: &App, worker: &mut Worker, actions: Vec<Action>, before: AppState) {
    if app.state != before {
        worker.leave(before);
    }
    for action in actions {
        worker.dispatch(action);
    }
}
