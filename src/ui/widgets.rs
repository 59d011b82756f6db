//! Small drawing helpers shared by the screens

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders},
};

use crate::models::Movie;
use crate::ui::Theme;

/// Rect of `width` x `height` centered in `area` (clamped to it)
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Rounded panel with a styled title
pub fn panel(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(format!(" {} ", title), Theme::title()))
}

/// Text bar like `█████░░░░░`
pub fn progress_bar(fraction: f64, width: usize) -> Line<'static> {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * width as f64).round() as usize;
    Line::from(vec![
        Span::styled("█".repeat(filled), Theme::progress_bar()),
        Span::styled("░".repeat(width - filled), Theme::progress_bar_empty()),
    ])
}

/// Truncate to `max` characters, adding an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else if max == 0 {
        String::new()
    } else {
        let mut s: String = text.chars().take(max - 1).collect();
        s.push('…');
        s
    }
}

/// `2019 · ★ 7.8 · 2h 10m` metadata spans for a movie
pub fn movie_meta(movie: &Movie) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if let Some(year) = movie.year {
        spans.push(Span::styled(year.to_string(), Theme::year()));
        spans.push(Span::styled(" · ", Theme::dimmed()));
    }
    spans.push(Span::styled(format!("★ {:.1}", movie.rating), Theme::accent()));
    if !movie.duration.is_empty() {
        spans.push(Span::styled(" · ", Theme::dimmed()));
        spans.push(Span::styled(movie.duration.clone(), Theme::duration()));
    }
    spans
}
