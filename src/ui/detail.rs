//! Detail view
//!
//! Full info for one movie, the action bar (play, list, rating, download)
//! and a strip of similar titles.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailState};
use crate::downloads::DownloadStatus;
use crate::library::Reaction;
use crate::ui::{widgets, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(detail) = app.detail.as_ref() else {
        let empty = Paragraph::new("No title selected")
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(widgets::panel("Detail", false));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Info
            Constraint::Length(3), // Actions
            Constraint::Length(5), // More like this
        ])
        .split(area);

    render_info(frame, chunks[0], detail);
    render_actions(frame, chunks[1], app, detail);
    render_similar(frame, chunks[2], detail);
}

fn render_info(frame: &mut Frame, area: Rect, detail: &DetailState) {
    let movie = &detail.movie;
    let block = widgets::panel(&movie.title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(widgets::movie_meta(movie))];
    if !movie.genre.is_empty() {
        lines.push(Line::from(Span::styled(movie.genres_display(), Theme::genre())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(movie.description.clone(), Theme::text())));

    if let Some(cast) = movie.cast.as_ref().filter(|c| !c.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Cast: ", Theme::dimmed()),
            Span::styled(cast.join(", "), Theme::secondary()),
        ]));
    }

    if let Some(summary) = detail.ratings.as_ref().filter(|s| s.is_visible()) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Viewers: ", Theme::dimmed()),
            Span::styled(format!("★ {}", summary), Theme::accent()),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_actions(frame: &mut Frame, area: Rect, app: &App, detail: &DetailState) {
    let movie_id = &detail.movie.id;

    let list = if app.my_list.is_pending(movie_id) {
        Span::styled(" … My List ", Theme::dimmed())
    } else if app.my_list.contains(movie_id) {
        Span::styled(" ✓ My List ", Theme::in_list())
    } else {
        Span::styled(" + My List ", Theme::secondary())
    };

    let reaction = match app.reactions.get(movie_id) {
        Some(Reaction::Like) => Span::styled(" 👍 ", Theme::success()),
        Some(Reaction::Dislike) => Span::styled(" 👎 ", Theme::error()),
        None => Span::styled(" 👍 👎 ", Theme::dimmed()),
    };

    let stars = if detail.stars.submitting {
        Span::styled(" rating... ", Theme::loading())
    } else {
        Span::styled(format!(" {} ", detail.stars.stars()), Theme::accent())
    };

    let status = app.downloads.status(movie_id);
    let download = match &status {
        DownloadStatus::Idle => Span::styled(" ⇣ Download ", Theme::secondary()),
        DownloadStatus::Downloading(_) => {
            Span::styled(format!(" ⇣ {} ", status.label()), Theme::success())
        }
        DownloadStatus::Completed => Span::styled(" ✓ Downloaded ", Theme::success()),
        DownloadStatus::Error(_) => Span::styled(format!(" {} ", status.label()), Theme::error()),
    };

    let line = Line::from(vec![
        Span::styled(" ▶ Play ", Theme::highlighted()),
        Span::raw(" "),
        list,
        Span::raw(" "),
        reaction,
        Span::raw(" "),
        stars,
        Span::raw(" "),
        download,
    ]);
    frame.render_widget(
        Paragraph::new(line).block(widgets::panel("", false)),
        area,
    );
}

fn render_similar(frame: &mut Frame, area: Rect, detail: &DetailState) {
    let block = widgets::panel("More Like This", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if detail.similar.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No similar titles", Theme::dimmed())),
            inner,
        );
        return;
    }

    let mut spans = Vec::new();
    for (i, movie) in detail.similar.iter().enumerate() {
        let style = if i == detail.similar_list.selected {
            Theme::list_item_selected()
        } else {
            Theme::list_item()
        };
        spans.push(Span::styled(format!(" {} ", widgets::truncate(&movie.title, 20)), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false }), inner);
}
