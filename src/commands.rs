//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the backend through [`ApiClient`].
//! Each handler takes CLI args, the shared context and Output, returns ExitCode.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::{auth::MIN_PASSWORD_LEN, ApiClient, ApiError};
use crate::catalog::{self, Page, Row};
use crate::cli::{
    BrowseCmd, Command, DownloadsAction, DownloadsCmd, ExitCode, IdArg, InfoCmd, ListAction,
    ListCmd, LoginCmd, Output, PlayCmd, ProfilesAction, ProfilesCmd, ProgressCmd, RateCmd,
    RegisterCmd, SearchCmd, StatusOk,
};
use crate::config::Config;
use crate::downloads::{self, DownloadStatus, DownloadTiming, DownloadUpdate};
use crate::filters::Filters;
use crate::library::{self, ListOp, MyList, StarRating};
use crate::models::{format_time, AuthUser, Movie, RatingSummary, WatchProgress};
use crate::profiles::{ProfileError, Profiles};

/// What every handler needs
#[derive(Debug, Clone)]
pub struct CliContext {
    pub api: ApiClient,
    pub config: Config,
}

/// Run one subcommand
pub async fn run(command: Command, ctx: &CliContext, output: &Output) -> ExitCode {
    match command {
        Command::Login(cmd) => login_cmd(cmd, ctx, output).await,
        Command::Register(cmd) => register_cmd(cmd, ctx, output).await,
        Command::Logout => logout_cmd(ctx, output),
        Command::Whoami => whoami_cmd(ctx, output),
        Command::Browse(cmd) => browse_cmd(cmd, ctx, output).await,
        Command::Search(cmd) => search_cmd(cmd, ctx, output).await,
        Command::Info(cmd) => info_cmd(cmd, ctx, output).await,
        Command::List(cmd) => list_cmd(cmd, ctx, output).await,
        Command::Rate(cmd) => rate_cmd(cmd, ctx, output).await,
        Command::Ratings(cmd) => ratings_cmd(cmd, ctx, output).await,
        Command::Progress(cmd) => progress_cmd(cmd, ctx, output).await,
        Command::ContinueWatching => continue_cmd(ctx, output).await,
        Command::Downloads(cmd) => downloads_cmd(cmd, ctx, output).await,
        Command::Profiles(cmd) => profiles_cmd(cmd, ctx, output).await,
        Command::Play(cmd) => play_cmd(cmd, ctx, output).await,
    }
}

fn emit<T: Serialize>(output: &Output, data: T, human: impl FnOnce(&T) -> String) -> ExitCode {
    if let Err(e) = output.print(data, human) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

/// Commands that only make sense with a stored session
fn require_session(ctx: &CliContext, output: &Output) -> Result<(), ExitCode> {
    if ctx.api.session().is_authenticated() {
        Ok(())
    } else {
        Err(output.error(
            "Not signed in. Run `flixtui login <email> --password <password>` first.",
            ExitCode::SessionExpired,
        ))
    }
}

fn movie_line(movie: &Movie) -> String {
    let mut line = format!("{}  {}", movie.id, movie.title);
    if let Some(year) = movie.year {
        line.push_str(&format!(" ({})", year));
    }
    if movie.rating > 0.0 {
        line.push_str(&format!("  ★ {:.1}", movie.rating));
    }
    line
}

fn movie_lines(movies: &[Movie]) -> String {
    movies.iter().map(movie_line).collect::<Vec<_>>().join("\n")
}

// =============================================================================
// Account Commands
// =============================================================================

fn store_login(
    ctx: &CliContext,
    output: &Output,
    result: Result<crate::models::AuthResponse, ApiError>,
    action: &str,
) -> ExitCode {
    match result {
        Ok(resp) => {
            let user = resp.user.clone();
            if let Err(e) = ctx.api.session().login(resp) {
                return output.error(format!("Could not store session: {}", e), ExitCode::Error);
            }
            emit(output, user, |u| format!("Signed in as {} <{}>", u.name, u.email))
        }
        Err(e) => {
            let msg = crate::api::auth_failure_message(&e, &format!("{} failed", action));
            let code = match ExitCode::from(&e) {
                // A 401 here means bad credentials, not an expired session
                ExitCode::SessionExpired => ExitCode::Refused,
                code => code,
            };
            output.error(msg, code)
        }
    }
}

pub async fn login_cmd(cmd: LoginCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if cmd.email.trim().is_empty() || cmd.password.is_empty() {
        return output.error("Email and password are required", ExitCode::InvalidArgs);
    }
    output.info(format!("Signing in as {}...", cmd.email));
    let result = ctx.api.login(cmd.email.trim(), &cmd.password).await;
    store_login(ctx, output, result, "Login")
}

pub async fn register_cmd(cmd: RegisterCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if cmd.name.trim().is_empty() || cmd.email.trim().is_empty() {
        return output.error("Name and email are required", ExitCode::InvalidArgs);
    }
    if cmd.password.chars().count() < MIN_PASSWORD_LEN {
        return output.error(
            format!("Password must be at least {} characters long", MIN_PASSWORD_LEN),
            ExitCode::InvalidArgs,
        );
    }
    let result = ctx
        .api
        .register(cmd.name.trim(), cmd.email.trim(), &cmd.password)
        .await;
    store_login(ctx, output, result, "Registration")
}

pub fn logout_cmd(ctx: &CliContext, output: &Output) -> ExitCode {
    ctx.api.session().logout();
    emit(output, StatusOk::default(), |_| "Signed out".to_string())
}

pub fn whoami_cmd(ctx: &CliContext, output: &Output) -> ExitCode {
    match ctx.api.session().user() {
        Some(user) => emit(output, user, |u: &AuthUser| format!("{} <{}>", u.name, u.email)),
        None => output.error("Not signed in", ExitCode::SessionExpired),
    }
}

// =============================================================================
// Catalog Commands
// =============================================================================

#[derive(Debug, Serialize)]
struct BrowseOutput {
    page: Page,
    hero: Option<Movie>,
    rows: Vec<Row>,
}

pub async fn browse_cmd(cmd: BrowseCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    let page = Page::from(cmd.page);
    output.info(format!("Loading {}...", page.title()));

    let catalog = match catalog::load(&ctx.api).await {
        Ok(c) => c,
        Err(e) => return output.api_error("Could not load catalog", &e),
    };

    let hero = if page.shows_hero() {
        match cmd.seed {
            Some(seed) => {
                use rand::SeedableRng;
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                catalog.pick_hero(&mut rng).cloned()
            }
            None => catalog.pick_hero(&mut rand::rng()).cloned(),
        }
    } else {
        None
    };

    let mut rows = catalog.rows_for(page);
    for row in &mut rows {
        row.movies.truncate(cmd.limit);
    }

    emit(output, BrowseOutput { page, hero, rows }, |out| {
        let mut text = String::new();
        if let Some(hero) = &out.hero {
            text.push_str(&format!("Featured: {}\n\n", movie_line(hero)));
        }
        for row in &out.rows {
            text.push_str(&format!("{}\n", row.title));
            for movie in &row.movies {
                text.push_str(&format!("  {}\n", movie_line(movie)));
            }
        }
        text.trim_end().to_string()
    })
}

pub async fn search_cmd(cmd: SearchCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    let query = cmd.query.trim();
    if query.is_empty() {
        return output.error("Search query is empty", ExitCode::InvalidArgs);
    }
    output.info(format!("Searching for: {}", query));

    let filters = Filters {
        genres: cmd.genre.into_iter().collect(),
        years: cmd.year.into_iter().collect(),
        ratings: cmd.rating.into_iter().map(Into::into).collect(),
        sort_by: cmd.sort.into(),
    };

    match catalog::search(&ctx.api, query).await {
        Ok(results) => {
            let mut visible = filters.apply(&results);
            visible.truncate(cmd.limit);
            emit(output, visible, |movies| {
                if movies.is_empty() {
                    "No matches".to_string()
                } else {
                    movie_lines(movies)
                }
            })
        }
        Err(e) => output.api_error("Search failed", &e),
    }
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    movie: Movie,
    ratings: Option<RatingSummary>,
    similar: Vec<Movie>,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_list: Option<bool>,
}

pub async fn info_cmd(cmd: InfoCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    let movie = match ctx.api.movie(&cmd.id).await {
        Ok(m) => m,
        Err(ApiError::NotFound) => {
            return output.error(format!("Movie not found: {}", cmd.id), ExitCode::NotFound)
        }
        Err(e) => return output.api_error("Could not load movie", &e),
    };

    let (similar, ratings) = tokio::join!(
        catalog::similar(&ctx.api, &movie),
        ctx.api.ratings(&movie.id)
    );
    let similar = similar.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "similar titles unavailable");
        Vec::new()
    });
    let ratings = ratings.ok().filter(RatingSummary::is_visible);

    let in_list = if ctx.api.session().is_authenticated() {
        ctx.api
            .my_list()
            .await
            .ok()
            .map(|list| list.iter().any(|m| m.id == movie.id))
    } else {
        None
    };

    let data = InfoOutput {
        movie,
        ratings,
        similar,
        in_list,
    };
    emit(output, data, |info| {
        let m = &info.movie;
        let mut text = movie_line(m);
        if !m.duration.is_empty() {
            text.push_str(&format!("  {}", m.duration));
        }
        if !m.genre.is_empty() {
            text.push_str(&format!("\n{}", m.genres_display()));
        }
        if let Some(r) = &info.ratings {
            text.push_str(&format!("\nUser rating: {}", r));
        }
        if info.in_list == Some(true) {
            text.push_str("\n✓ In My List");
        }
        if !m.description.is_empty() {
            text.push_str(&format!("\n\n{}", m.description));
        }
        if let Some(cast) = m.cast.as_ref().filter(|c| !c.is_empty()) {
            text.push_str(&format!("\n\nCast: {}", cast.join(", ")));
        }
        if !info.similar.is_empty() {
            text.push_str(&format!("\n\nMore like this:\n{}", movie_lines(&info.similar)));
        }
        text
    })
}

pub async fn ratings_cmd(cmd: IdArg, ctx: &CliContext, output: &Output) -> ExitCode {
    match ctx.api.ratings(&cmd.id).await {
        Ok(summary) => emit(output, summary, |s| {
            if s.is_visible() {
                s.to_string()
            } else {
                "No ratings yet".to_string()
            }
        }),
        Err(e) => output.api_error("Could not load ratings", &e),
    }
}

// =============================================================================
// Library Commands
// =============================================================================

#[derive(Debug, Serialize)]
struct ListChange {
    movie_id: String,
    in_list: bool,
    changed: bool,
}

pub async fn list_cmd(cmd: ListCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    let movies = match ctx.api.my_list().await {
        Ok(m) => m,
        Err(e) => return output.api_error("Could not load My List", &e),
    };

    let Some(action) = cmd.action else {
        return emit(output, movies, |movies| {
            if movies.is_empty() {
                "Your list is empty".to_string()
            } else {
                movie_lines(movies)
            }
        });
    };

    let mut list = MyList::new(movies);
    let (movie_id, op) = match action {
        ListAction::Add(arg) => {
            let movie = match ctx.api.movie(&arg.id).await {
                Ok(m) => m,
                Err(ApiError::NotFound) => {
                    return output.error(format!("Movie not found: {}", arg.id), ExitCode::NotFound)
                }
                Err(e) => return output.api_error("Could not load movie", &e),
            };
            let op = list.begin_add(&movie);
            (arg.id, op)
        }
        ListAction::Remove(arg) => {
            let op = list.begin_remove(&arg.id);
            (arg.id, op)
        }
    };

    let changed = match op {
        Some(op) => {
            let result = op.commit(&ctx.api, &movie_id).await;
            list.settle(&movie_id, &result);
            if let Err(e) = result {
                let context = match op {
                    ListOp::Add => "Could not add to My List",
                    ListOp::Remove => "Could not remove from My List",
                };
                return output.api_error(context, &e);
            }
            true
        }
        None => false,
    };

    let data = ListChange {
        in_list: list.contains(&movie_id),
        movie_id,
        changed,
    };
    emit(output, data, |c| match (c.in_list, c.changed) {
        (true, true) => "Added to My List".to_string(),
        (false, true) => "Removed from My List".to_string(),
        (true, false) => "Already in My List".to_string(),
        (false, false) => "Not in My List".to_string(),
    })
}

#[derive(Debug, Serialize)]
struct RateOutput {
    movie_id: String,
    stars: u8,
    ratings: Option<RatingSummary>,
}

pub async fn rate_cmd(cmd: RateCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    let mut widget = StarRating::default();
    match library::rate(&ctx.api, &cmd.id, &mut widget, cmd.stars).await {
        Ok(true) => {}
        Ok(false) => {
            return output.error("Rating must be between 1 and 5", ExitCode::InvalidArgs)
        }
        Err(e) => return output.api_error("Could not submit rating", &e),
    }
    let ratings = ctx.api.ratings(&cmd.id).await.ok();
    let data = RateOutput {
        movie_id: cmd.id,
        stars: cmd.stars,
        ratings,
    };
    emit(output, data, |r| {
        let mut text = format!("Rated {}", widget.stars());
        if let Some(summary) = r.ratings.as_ref().filter(|s| s.is_visible()) {
            text.push_str(&format!("  (now {})", summary));
        }
        text
    })
}

pub async fn progress_cmd(cmd: ProgressCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    if !(cmd.current.is_finite() && cmd.duration.is_finite())
        || cmd.current < 0.0
        || cmd.duration <= 0.0
    {
        return output.error(
            "Position must be non-negative and duration positive",
            ExitCode::InvalidArgs,
        );
    }
    let progress = WatchProgress::new(cmd.id, cmd.current, cmd.duration);
    match ctx.api.save_progress(&progress).await {
        Ok(()) => emit(output, progress, |p| {
            format!(
                "Saved {} / {} ({:.0}%)",
                format_time(p.current_time),
                format_time(p.duration),
                p.percent()
            )
        }),
        Err(e) => output.api_error("Could not save progress", &e),
    }
}

pub async fn continue_cmd(ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    match ctx.api.continue_watching().await {
        Ok(items) => emit(output, items, |items| {
            if items.is_empty() {
                return "Nothing in progress".to_string();
            }
            items
                .iter()
                .filter_map(|item| {
                    let movie = item.movie.as_ref()?;
                    Some(format!(
                        "{}  {:.0}% · {}",
                        movie_line(movie),
                        item.percent(),
                        item.time_remaining()
                    ))
                })
                .collect::<Vec<_>>()
                .join("\n")
        }),
        Err(e) => output.api_error("Could not load progress", &e),
    }
}

// =============================================================================
// Downloads Command
// =============================================================================

pub async fn downloads_cmd(cmd: DownloadsCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    match cmd.action {
        None => match ctx.api.downloads().await {
            Ok(records) => emit(output, records, |records| {
                if records.is_empty() {
                    return "No downloads yet".to_string();
                }
                records
                    .iter()
                    .map(|r| {
                        format!(
                            "{}  {}  {}  {}",
                            r.id,
                            r.movie.title,
                            r.display_size(),
                            r.downloaded_on()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
            Err(e) => output.api_error("Could not load downloads", &e),
        },
        Some(DownloadsAction::Start(arg)) => start_download(arg.id, ctx, output).await,
        Some(DownloadsAction::Delete(arg)) => match ctx.api.delete_download(&arg.id).await {
            Ok(()) => emit(output, StatusOk::default(), |_| "Download deleted".to_string()),
            Err(ApiError::NotFound) => output.error(
                format!("Download not found: {}", arg.id),
                ExitCode::NotFound,
            ),
            Err(e) => output.api_error("Could not delete download", &e),
        },
    }
}

async fn start_download(movie_id: String, ctx: &CliContext, output: &Output) -> ExitCode {
    let timing = DownloadTiming {
        clear_after: std::time::Duration::ZERO,
        ..DownloadTiming::from(&ctx.config)
    };
    let cancel = CancellationToken::new();

    let status = tokio::select! {
        status = downloads::simulate(&ctx.api, &movie_id, timing, &cancel, |update| {
            if let DownloadUpdate::Progress { percent, .. } = update {
                output.info(format!("Downloading... {}%", percent));
            }
        }) => status,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            None
        }
    };

    match status {
        Some(DownloadStatus::Completed) => emit(output, StatusOk::default(), |_| {
            "Download complete".to_string()
        }),
        Some(DownloadStatus::Error(msg)) => output.error(
            format!("Download failed: {}", msg),
            ExitCode::NetworkError,
        ),
        _ => output.error("Download cancelled", ExitCode::Error),
    }
}

// =============================================================================
// Profiles Command
// =============================================================================

fn profile_error(output: &Output, err: ProfileError) -> ExitCode {
    match err {
        ProfileError::Api(e) => output.api_error("Profile request failed", &e),
        ProfileError::Unknown(id) => {
            output.error(format!("Profile not found: {}", id), ExitCode::NotFound)
        }
        ProfileError::EmptyName => output.error(err.to_string(), ExitCode::InvalidArgs),
        ProfileError::LimitReached | ProfileError::LastProfile => {
            output.error(err.to_string(), ExitCode::Refused)
        }
    }
}

pub async fn profiles_cmd(cmd: ProfilesCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    if let Err(code) = require_session(ctx, output) {
        return code;
    }
    let mut profiles = match Profiles::load(&ctx.api).await {
        Ok(p) => p,
        Err(e) => return output.api_error("Could not load profiles", &e),
    };

    let result = match cmd.action {
        None => Ok(()),
        Some(ProfilesAction::Add { name }) => {
            profiles.create(&ctx.api, &name).await.map(|p| {
                output.info(format!("Created profile {}", p.name));
            })
        }
        Some(ProfilesAction::Rename { id, name }) => profiles.rename(&ctx.api, &id, &name).await,
        Some(ProfilesAction::Delete { id }) => profiles.delete(&ctx.api, &id).await,
    };
    if let Err(e) = result {
        return profile_error(output, e);
    }

    emit(output, profiles.items().to_vec(), |items| {
        items
            .iter()
            .map(|p| {
                let kids = if p.is_kids { "  (kids)" } else { "" };
                format!("{}  {}{}", p.id, p.name, kids)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// =============================================================================
// Play Command
// =============================================================================

#[derive(Debug, Serialize)]
struct PlayOutput {
    movie_id: String,
    position: f64,
    duration: f64,
    ended: bool,
}

/// Last saved position for a movie, 0 when unknown
async fn saved_position(api: &ApiClient, movie_id: &str) -> f64 {
    match api.watch_progress().await {
        Ok(all) => all
            .into_iter()
            .find(|p| p.movie_id == movie_id)
            .map(|p| p.current_time)
            .unwrap_or(0.0),
        Err(e) => {
            tracing::debug!(error = %e, "no saved progress");
            0.0
        }
    }
}

pub async fn play_cmd(cmd: PlayCmd, ctx: &CliContext, output: &Output) -> ExitCode {
    let movie = match ctx.api.movie(&cmd.id).await {
        Ok(m) => m,
        Err(ApiError::NotFound) => {
            return output.error(format!("Movie not found: {}", cmd.id), ExitCode::NotFound)
        }
        Err(e) => return output.api_error("Could not load movie", &e),
    };

    let resume = match cmd.from {
        Some(secs) => secs,
        None if ctx.api.session().is_authenticated() => saved_position(&ctx.api, &movie.id).await,
        None => 0.0,
    };

    play_in_mpv(movie, resume, ctx, output).await
}

#[cfg(unix)]
async fn play_in_mpv(movie: Movie, resume: f64, ctx: &CliContext, output: &Output) -> ExitCode {
    use crate::player::{self, MediaEvent, MpvElement, PlayerController, ProgressReporter};
    use tokio::sync::mpsc;

    let sources = player::sources_for(
        ctx.api.stream_url(&movie.id),
        &movie,
        &ctx.config.fallback_sources(),
    );
    let program = ctx.config.player_command();
    let (media_tx, mut media_rx) = mpsc::unbounded_channel::<MediaEvent>();

    output.info(format!("Starting {} for {}...", program, movie.title));
    let element = match MpvElement::spawn(&program, media_tx).await {
        Ok(e) => e,
        Err(e) => return output.error(format!("Player failed: {}", e), ExitCode::Error),
    };
    let mut controller = match PlayerController::open(
        movie,
        Box::new(element),
        &sources,
        resume,
        ctx.config.controls_hide_after(),
    ) {
        Ok(c) => c,
        Err(e) => return output.error(format!("Player failed: {}", e), ExitCode::Error),
    };
    controller.toggle_play();

    let reporter = if ctx.api.session().is_authenticated() {
        Some(ProgressReporter::spawn(ctx.api.clone(), CancellationToken::new()))
    } else {
        None
    };

    loop {
        tokio::select! {
            next = media_rx.recv() => match next {
                Some(event) => {
                    let ended = matches!(event, MediaEvent::Ended);
                    if let (Some(progress), Some(reporter)) =
                        (controller.handle_event(event), reporter.as_ref())
                    {
                        reporter.report(progress);
                    }
                    if ended {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let state = controller.state().clone();
    let data = PlayOutput {
        movie_id: controller.movie().id.clone(),
        position: state.current_time,
        duration: state.duration,
        ended: state.ended,
    };
    controller.close();
    if let Some(reporter) = reporter {
        reporter.finish().await;
    }

    emit(output, data, |p| {
        if p.ended {
            "Finished".to_string()
        } else {
            format!(
                "Stopped at {} / {}",
                format_time(p.position),
                format_time(p.duration)
            )
        }
    })
}

#[cfg(not(unix))]
async fn play_in_mpv(movie: Movie, _resume: f64, ctx: &CliContext, output: &Output) -> ExitCode {
    let _ = movie;
    output.error(
        format!(
            "Playback through '{}' is only supported on Unix",
            ctx.config.player_command()
        ),
        ExitCode::Error,
    )
}
