//! Sign in / sign up forms

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, AuthField, AuthForm, TextInput};
use crate::ui::{widgets, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let register = app.state == AppState::Register;
    let form = &app.auth;
    let fields = AuthForm::fields(register);

    let height = 8 + fields.len() as u16 * 2;
    let popup = widgets::centered_rect(56, height, area);
    frame.render_widget(Clear, popup);

    let title = if register { "Sign Up" } else { "Sign In" };
    let block = widgets::panel(title, true);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let focused = form.focused(register);
    let mut lines = vec![Line::from("")];
    for field in fields {
        let (label, input, masked) = match field {
            AuthField::Name => ("Name", &form.name, false),
            AuthField::Email => ("Email", &form.email, false),
            AuthField::Password => ("Password", &form.password, true),
        };
        lines.push(field_line(label, input, masked, *field == focused));
        lines.push(Line::from(""));
    }

    if form.submitting {
        lines.push(Line::from(Span::styled(
            if register { "Creating account..." } else { "Signing in..." },
            Theme::loading(),
        )));
    } else if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(err.clone(), Theme::error())));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(if register {
        vec![
            Span::styled("Already have an account? ", Theme::dimmed()),
            Span::styled("Ctrl+L", Theme::keybind()),
        ]
    } else {
        vec![
            Span::styled("New here? ", Theme::dimmed()),
            Span::styled("Ctrl+R", Theme::keybind()),
            Span::styled(" to sign up", Theme::dimmed()),
        ]
    }));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn field_line(label: &str, input: &TextInput, masked: bool, focused: bool) -> Line<'static> {
    let shown = |s: &str| {
        if masked {
            "•".repeat(s.chars().count())
        } else {
            s.to_string()
        }
    };
    let label_style = if focused { Theme::selected() } else { Theme::dimmed() };
    let mut spans = vec![Span::styled(format!("{:>9} ", label), label_style)];
    if focused {
        let (before, after) = input.split();
        spans.push(Span::styled(shown(before), Theme::input()));
        spans.push(Span::styled("│", Theme::input_cursor()));
        spans.push(Span::styled(shown(after), Theme::input()));
    } else {
        spans.push(Span::styled(shown(&input.value), Theme::input()));
    }
    Line::from(spans)
}
