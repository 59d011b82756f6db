//! Terminal UI components
//!
//! Built with ratatui. Each screen has its own module; this one draws the
//! frame around them (header, status bar, error popup).

pub mod auth;
pub mod browser;
pub mod detail;
pub mod library;
pub mod player;
pub mod profiles;
pub mod search;
pub mod theme;
pub mod widgets;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, InputMode};
use crate::catalog::Page;

/// Main render function - dispatches to view-specific renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BACKGROUND)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_content(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Logo, page tabs and the active profile
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12), // Logo
            Constraint::Min(1),     // Tabs
            Constraint::Length(24), // Profile
        ])
        .split(area);

    let logo = Paragraph::new(Line::from(Span::styled("FLIX", Theme::title())))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border()),
        );
    frame.render_widget(logo, chunks[0]);

    let mut tabs: Vec<Span> = Vec::new();
    if matches!(
        app.state,
        AppState::Browse
            | AppState::Detail
            | AppState::Search
            | AppState::MyList
            | AppState::Downloads
    ) {
        for page in Page::ALL {
            let style = if app.state == AppState::Browse && page == app.browse.page {
                Theme::selected()
            } else {
                Theme::dimmed()
            };
            tabs.push(Span::styled(format!(" {} ", page.title()), style));
        }
        tabs.push(Span::styled(" │ ", Theme::dimmed()));
        for (state, label) in [
            (AppState::Search, "Search"),
            (AppState::MyList, "My List"),
            (AppState::Downloads, "Downloads"),
        ] {
            let style = if app.state == state {
                Theme::selected()
            } else {
                Theme::dimmed()
            };
            tabs.push(Span::styled(format!(" {} ", label), style));
        }
    }
    let nav = Paragraph::new(Line::from(tabs)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(nav, chunks[1]);

    let who = match (&app.profile, &app.user) {
        (Some(profile), _) => profile.name.clone(),
        (None, Some(user)) => user.email.clone(),
        (None, None) => "Not signed in".to_string(),
    };
    let profile = Paragraph::new(Line::from(Span::styled(who, Theme::secondary())))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border()),
        );
    frame.render_widget(profile, chunks[2]);
}

/// Render the main content area based on current state
fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    match app.state {
        AppState::Login | AppState::Register => auth::render(frame, area, app),
        AppState::Profiles => profiles::render(frame, area, app),
        AppState::Browse => browser::render(frame, area, app),
        AppState::Search => search::render(frame, area, app),
        AppState::Detail => detail::render(frame, area, app),
        AppState::MyList => library::render_my_list(frame, area, app),
        AppState::Downloads => library::render_downloads(frame, area, app),
        AppState::Player => player::render(frame, area, app),
    }
}

/// Keys that matter on the current screen
pub fn key_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    match app.state {
        AppState::Login => &[("Tab", "next field"), ("Enter", "sign in"), ("^R", "sign up")],
        AppState::Register => &[("Tab", "next field"), ("Enter", "sign up"), ("^L", "sign in")],
        AppState::Profiles => &[
            ("Enter", "watch"),
            ("a", "add"),
            ("r", "rename"),
            ("x", "delete"),
            ("o", "sign out"),
        ],
        AppState::Browse => &[
            ("Enter", "info"),
            ("p", "play"),
            ("+", "my list"),
            ("Tab", "page"),
            ("/", "search"),
            ("m", "my list"),
            ("d", "downloads"),
            ("P", "profiles"),
        ],
        AppState::Search => &[
            ("/", "edit"),
            ("Enter", "info"),
            ("f", "filters"),
            ("c", "clear"),
            ("Esc", "back"),
        ],
        AppState::Detail => &[
            ("p", "play"),
            ("+", "my list"),
            ("1-5", "rate"),
            ("l/d", "like/dislike"),
            ("w", "download"),
            ("o", "open similar"),
        ],
        AppState::MyList => &[("Enter", "info"), ("p", "play"), ("x", "remove")],
        AppState::Downloads => &[("Enter", "play"), ("i", "info"), ("x", "delete")],
        AppState::Player => &[
            ("Space", "play/pause"),
            ("←→", "10s"),
            ("↑↓", "volume"),
            ("m", "mute"),
            ("f", "fullscreen"),
            ("Esc", "close"),
        ],
    }
}

/// Render status bar at bottom
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode_indicator = match app.input_mode {
        InputMode::Normal => Span::styled(
            " NORMAL ",
            Style::default().fg(Theme::HIGHLIGHT).bg(Theme::PRIMARY),
        ),
        InputMode::Editing => Span::styled(
            " INSERT ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::TEXT),
        ),
    };

    let mut spans = vec![mode_indicator, Span::raw(" ")];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(notice.clone(), Theme::warning()));
        spans.push(Span::raw(" │ "));
    }
    let active = app.downloads.active().count();
    if active > 0 {
        spans.push(Span::styled(format!("⇣ {} ", active), Theme::success()));
        spans.push(Span::raw("│ "));
    }
    for (key, desc) in key_hints(app) {
        spans.push(Span::styled(format!("{} ", key), Theme::keybind()));
        spans.push(Span::styled(format!("{}  ", desc), Theme::keybind_desc()));
    }
    spans.push(Span::styled("^C quit", Theme::keybind_desc()));

    let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
    frame.render_widget(status, area);
}

fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_area = widgets::centered_rect(60.min(area.width.saturating_sub(4)), 5, area);
    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(error_block, popup_area);
}
