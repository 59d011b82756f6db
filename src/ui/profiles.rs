//! "Who's watching?" picker

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::app::{App, ProfileEdit};
use crate::models::Profile;
use crate::ui::{widgets, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.profiles;
    let block = widgets::panel("Who's watching?", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Min(1),
        ])
        .split(inner);

    if let Some(msg) = state.loading.message().filter(|_| state.profiles.is_empty()) {
        let style = if state.loading.is_error() {
            Theme::error()
        } else {
            Theme::loading()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(msg.to_string(), style)).alignment(Alignment::Center),
            chunks[1],
        );
        return;
    }

    let items = state.profiles.items();
    let count = items.len().max(1) as u32;
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(chunks[1]);

    for (i, profile) in items.iter().enumerate() {
        let selected = i == state.list.selected;
        frame.render_widget(profile_card(profile, selected), cells[i]);
    }

    let mut footer = Vec::new();
    if state.profiles.fallback {
        footer.push(Line::from(Span::styled(
            "Profiles could not be loaded; using a local profile",
            Theme::warning(),
        )));
    }
    if let Some(msg) = &state.message {
        footer.push(Line::from(Span::styled(msg.clone(), Theme::error())));
    }
    footer.push(Line::from(Span::styled(
        format!("{} of {} profiles", items.len(), Profile::MAX_PER_ACCOUNT),
        Theme::dimmed(),
    )));
    frame.render_widget(
        Paragraph::new(footer).alignment(Alignment::Center),
        chunks[2],
    );

    if let Some((edit, input)) = &state.editor {
        let popup = widgets::centered_rect(40, 5, area);
        frame.render_widget(Clear, popup);
        let title = match edit {
            ProfileEdit::New => "Add Profile",
            ProfileEdit::Rename(_) => "Rename Profile",
        };
        let (before, after) = input.split();
        let para = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(before.to_string(), Theme::input()),
                Span::styled("│", Theme::input_cursor()),
                Span::styled(after.to_string(), Theme::input()),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(widgets::panel(title, true));
        frame.render_widget(para, popup);
    }
}

fn profile_card(profile: &Profile, selected: bool) -> Paragraph<'static> {
    let initial = profile
        .name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".into());
    let name_style = if selected {
        Theme::selected()
    } else {
        Theme::secondary()
    };
    Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" {} ", initial),
            if selected {
                Theme::highlighted()
            } else {
                Theme::list_item()
            },
        )),
        Line::from(""),
        Line::from(Span::styled(widgets::truncate(&profile.to_string(), 18), name_style)),
    ])
    .alignment(Alignment::Center)
    .block(widgets::panel("", selected))
}
