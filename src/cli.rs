//! CLI - Command Line Interface for FlixTUI
//!
//! Every TUI action is scriptable. All output is JSON-parseable with
//! `--json` (the default when stdout is not a terminal).
//!
//! # Examples
//!
//! ```bash
//! flixtui login ada@example.com --password hunter22
//! flixtui browse --page movies --json
//! flixtui search "dune" --genre Sci-Fi --sort rating-high
//! flixtui list add 65a1f0c2e4b0a1b2c3d4e5f6
//! flixtui play 65a1f0c2e4b0a1b2c3d4e5f6 --from 120
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::ApiError;
use crate::catalog::Page;
use crate::filters::{RatingBand, SortBy};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Backend unreachable or failing
    NetworkError = 3,
    /// Movie, profile or download not found
    NotFound = 4,
    /// Not signed in, or the backend rejected the token
    SessionExpired = 5,
    /// Backend or a local rule refused the request
    Refused = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

impl From<&ApiError> for ExitCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => ExitCode::SessionExpired,
            ApiError::NotFound => ExitCode::NotFound,
            ApiError::Rejected { .. } => ExitCode::Refused,
            ApiError::InvalidArgument(_) => ExitCode::InvalidArgs,
            ApiError::ServerError(_) | ApiError::RequestFailed(_) => ExitCode::NetworkError,
            ApiError::InvalidResponse(_) => ExitCode::Error,
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// FlixTUI - terminal storefront for a Netflix-style backend
///
/// Run without arguments to launch interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "flixtui",
    version,
    about = "Browse, search and watch from a Netflix-style backend",
    long_about = "A terminal storefront: category rows, search with filters, \
                  my list, ratings, downloads and mpv playback with resume.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  flixtui                               Launch interactive TUI\n\
                  flixtui login me@example.com -p pw    Sign in\n\
                  flixtui search \"blade runner\"         Search the catalog\n\
                  flixtui play <id> --from 90           Watch in mpv"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Backend origin (overrides config and FLIX_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginCmd),

    /// Create an account and sign in
    Register(RegisterCmd),

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Category rows for a page, with the hero pick
    #[command(visible_alias = "b")]
    Browse(BrowseCmd),

    /// Search titles, with optional filters and sort
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Details for one movie, with similar titles and ratings
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Show or change My List
    List(ListCmd),

    /// Rate a movie (1-5 stars)
    Rate(RateCmd),

    /// Aggregate rating for a movie
    Ratings(IdArg),

    /// Record a watch position
    Progress(ProgressCmd),

    /// Titles in progress
    #[command(name = "continue")]
    ContinueWatching,

    /// Show, start or delete downloads
    #[command(visible_alias = "dl")]
    Downloads(DownloadsCmd),

    /// Show or manage profiles
    Profiles(ProfilesCmd),

    /// Watch in mpv with progress reporting
    Play(PlayCmd),
}

// =============================================================================
// Account Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct LoginCmd {
    pub email: String,

    #[arg(long, short = 'p')]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterCmd {
    pub name: String,

    pub email: String,

    /// At least 6 characters
    #[arg(long, short = 'p')]
    pub password: String,
}

// =============================================================================
// Catalog Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct BrowseCmd {
    /// Page whose rows to show
    #[arg(long, short = 'p', value_enum, default_value = "home")]
    pub page: PageArg,

    /// Seed for the hero pick (random otherwise)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum titles per row
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageArg {
    #[default]
    Home,
    Tv,
    Movies,
    New,
    Kids,
}

impl From<PageArg> for Page {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::Home => Page::Home,
            PageArg::Tv => Page::TvShows,
            PageArg::Movies => Page::Movies,
            PageArg::New => Page::NewPopular,
            PageArg::Kids => Page::Kids,
        }
    }
}

/// Search titles by query
#[derive(Args, Debug)]
pub struct SearchCmd {
    #[arg(required = true)]
    pub query: String,

    /// Keep titles with this genre (repeatable)
    #[arg(long, short = 'g')]
    pub genre: Vec<String>,

    /// Keep titles from this year (repeatable)
    #[arg(long, short = 'y')]
    pub year: Vec<u16>,

    /// Keep titles in this rating band (repeatable)
    #[arg(long, short = 'r', value_enum)]
    pub rating: Vec<RatingArg>,

    #[arg(long, value_enum, default_value = "trending")]
    pub sort: SortArg,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingArg {
    #[value(name = "9+")]
    NinePlus,
    #[value(name = "8-9")]
    Eights,
    #[value(name = "7-8")]
    Sevens,
    #[value(name = "6-7")]
    Sixes,
    #[value(name = "below-6")]
    BelowSix,
}

impl From<RatingArg> for RatingBand {
    fn from(arg: RatingArg) -> Self {
        match arg {
            RatingArg::NinePlus => RatingBand::NinePlus,
            RatingArg::Eights => RatingBand::Eights,
            RatingArg::Sevens => RatingBand::Sevens,
            RatingArg::Sixes => RatingBand::Sixes,
            RatingArg::BelowSix => RatingBand::BelowSix,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortArg {
    /// Backend order
    #[default]
    Trending,
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
    #[value(name = "a-z")]
    AZ,
    #[value(name = "z-a")]
    ZA,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Trending => SortBy::Trending,
            SortArg::Newest => SortBy::Newest,
            SortArg::Oldest => SortBy::Oldest,
            SortArg::RatingHigh => SortBy::RatingHigh,
            SortArg::RatingLow => SortBy::RatingLow,
            SortArg::AZ => SortBy::Alphabetical,
            SortArg::ZA => SortBy::AlphabeticalDesc,
        }
    }
}

#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Movie id
    #[arg(required = true)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Movie id
    #[arg(required = true)]
    pub id: String,
}

// =============================================================================
// Library Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct ListCmd {
    #[command(subcommand)]
    pub action: Option<ListAction>,
}

#[derive(Subcommand, Debug)]
pub enum ListAction {
    /// Save a movie
    Add(IdArg),
    /// Remove a saved movie
    Remove(IdArg),
}

#[derive(Args, Debug)]
pub struct RateCmd {
    pub id: String,

    #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
    pub stars: u8,
}

#[derive(Args, Debug)]
pub struct ProgressCmd {
    pub id: String,

    /// Position in seconds
    pub current: f64,

    /// Length in seconds
    pub duration: f64,
}

#[derive(Args, Debug)]
pub struct DownloadsCmd {
    #[command(subcommand)]
    pub action: Option<DownloadsAction>,
}

#[derive(Subcommand, Debug)]
pub enum DownloadsAction {
    /// Run a simulated download and record it
    Start(IdArg),
    /// Delete a download record (by record id)
    Delete(IdArg),
}

#[derive(Args, Debug)]
pub struct ProfilesCmd {
    #[command(subcommand)]
    pub action: Option<ProfilesAction>,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesAction {
    Add {
        name: String,
    },
    Rename {
        id: String,
        name: String,
    },
    Delete {
        id: String,
    },
}

// =============================================================================
// Play Command
// =============================================================================

#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Movie id
    #[arg(required = true)]
    pub id: String,

    /// Start position in seconds (default: last saved position)
    #[arg(long)]
    pub from: Option<f64>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Standard JSON envelope for CLI output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Simple status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for CLI
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print a result: the JSON envelope, or `human` in a terminal
    pub fn print<T: Serialize>(&self, data: T, human: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            let text = human(&data);
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Backend failure with the matching exit code
    pub fn api_error(&self, context: &str, err: &ApiError) -> ExitCode {
        let code = ExitCode::from(err);
        let msg = match code {
            ExitCode::SessionExpired => {
                "Session expired. Run `flixtui login` to sign in again.".to_string()
            }
            _ => format!("{}: {}", context, err),
        };
        self.error(msg, code)
    }

    /// Print info message (only in non-quiet, non-json mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
