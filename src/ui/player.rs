//! Player screen
//!
//! Video itself plays in the mpv window; this screen mirrors its state and
//! shows the control bar. The bar hides after a few idle seconds while
//! playing and comes back on any key.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::models::format_time;
use crate::player::PlaybackState;
use crate::ui::{widgets, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(view) = app.player.as_ref() else {
        return;
    };
    let block = widgets::panel(&view.movie.title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(ctl) = view.controller.as_ref() else {
        let msg = view.loading.message().unwrap_or("Starting player...");
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(msg.to_string(), Theme::loading())),
                Line::from(""),
                Line::from(Span::styled("Esc to cancel", Theme::dimmed())),
            ])
            .alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let state = ctl.state();
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(status_label(state), Theme::heading())),
        Line::from(""),
    ];

    if state.controls_visible {
        let bar_width = inner.width.saturating_sub(4).min(60) as usize;
        lines.push(widgets::progress_bar(state.fraction(), bar_width));
        lines.push(Line::from(Span::styled(
            format!(
                "{} / {}",
                format_time(state.current_time),
                format_time(state.duration)
            ),
            Theme::secondary(),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(volume_icon(state), Theme::text()),
            Span::styled(
                format!(" {:>3.0}%", state.display_volume() * 100.0),
                Theme::secondary(),
            ),
            Span::styled(
                if state.fullscreen { "   ⛶ fullscreen" } else { "" },
                Theme::dimmed(),
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn status_label(state: &PlaybackState) -> &'static str {
    if state.ended {
        "■ Ended"
    } else if state.playing {
        "▶ Playing"
    } else {
        "❚❚ Paused"
    }
}

fn volume_icon(state: &PlaybackState) -> &'static str {
    let v = state.display_volume();
    if v == 0.0 {
        "🔇"
    } else if v < 0.5 {
        "🔉"
    } else {
        "🔊"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label() {
        let mut state = PlaybackState::default();
        assert_eq!(status_label(&state), "❚❚ Paused");
        state.playing = true;
        assert_eq!(status_label(&state), "▶ Playing");
        state.ended = true;
        assert_eq!(status_label(&state), "■ Ended");
    }

    #[test]
    fn test_volume_icon_follows_mute() {
        let mut state = PlaybackState::default();
        assert_eq!(volume_icon(&state), "🔊");
        state.muted = true;
        assert_eq!(volume_icon(&state), "🔇");
    }
}
