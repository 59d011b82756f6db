//! Browse screen
//!
//! Hero banner on top (home page only), then one line of cards per
//! category row. Rows scroll vertically so the selected one stays visible;
//! cards scroll horizontally the same way.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::{App, BrowseRow, BrowseState};
use crate::models::Movie;
use crate::ui::{widgets, Theme};

/// Card width including the gap
const CARD_WIDTH: u16 = 22;
/// Title line + card
const ROW_HEIGHT: u16 = 5;
const HERO_HEIGHT: u16 = 8;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let browse = &app.browse;

    if browse.rows.is_empty() && browse.hero.is_none() {
        render_empty(frame, area, browse);
        return;
    }

    let show_hero = browse.page.shows_hero() && browse.hero.is_some();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_hero { HERO_HEIGHT } else { 0 }),
            Constraint::Min(1),
        ])
        .split(area);

    if let (true, Some(hero)) = (show_hero, browse.hero.as_ref()) {
        render_hero(frame, chunks[0], app, hero);
    }
    render_rows(frame, chunks[1], app);
}

fn render_empty(frame: &mut Frame, area: Rect, browse: &BrowseState) {
    let block = widgets::panel(browse.page.title(), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match browse.loading.message() {
        Some(msg) if browse.loading.is_loading() => Span::styled(msg.to_string(), Theme::loading()),
        Some(msg) => Span::styled(format!("Could not load titles: {}", msg), Theme::error()),
        None => Span::styled("Nothing to watch here yet", Theme::dimmed()),
    };
    frame.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(line)]).alignment(Alignment::Center),
        inner,
    );
}

fn render_hero(frame: &mut Frame, area: Rect, app: &App, hero: &Movie) {
    let focused = app.browse.hero_focused;
    let block = widgets::panel("Featured", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut meta = widgets::movie_meta(hero);
    if app.my_list.contains(&hero.id) {
        meta.push(Span::styled("  ✓ My List", Theme::in_list()));
    }
    let lines = vec![
        Line::from(Span::styled(hero.title.clone(), Theme::heading())),
        Line::from(meta),
        Line::from(Span::styled(hero.description.clone(), Theme::secondary())),
        Line::from(vec![
            Span::styled(" ▶ Play ", Theme::highlighted()),
            Span::raw("  "),
            Span::styled(" ⓘ More Info ", Theme::status_bar()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_rows(frame: &mut Frame, area: Rect, app: &App) {
    let browse = &app.browse;
    let visible = (area.height / ROW_HEIGHT).max(1) as usize;
    let first = if browse.row >= visible {
        browse.row + 1 - visible
    } else {
        0
    };

    for (slot, (index, row)) in browse
        .rows
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .enumerate()
    {
        let row_area = Rect {
            x: area.x,
            y: area.y + slot as u16 * ROW_HEIGHT,
            width: area.width,
            height: ROW_HEIGHT.min(area.height.saturating_sub(slot as u16 * ROW_HEIGHT)),
        };
        let selected_col = if !browse.hero_focused && index == browse.row {
            browse.cols.get(index).copied()
        } else {
            None
        };
        render_row(frame, row_area, app, row, selected_col);
    }
}

/// One titled row; `selected` is the focused column when this row has focus
fn render_row(frame: &mut Frame, area: Rect, app: &App, row: &BrowseRow, selected: Option<usize>) {
    if area.height == 0 {
        return;
    }
    let title_style = if selected.is_some() {
        Theme::heading()
    } else {
        Theme::secondary()
    };
    frame.render_widget(
        Paragraph::new(Span::styled(row.title.clone(), title_style)),
        Rect { height: 1, ..area },
    );

    let cards_area = Rect {
        y: area.y + 1,
        height: area.height.saturating_sub(1),
        ..area
    };
    let per_row = (cards_area.width / CARD_WIDTH).max(1) as usize;
    let col = selected.unwrap_or(0);
    let first = if col >= per_row { col + 1 - per_row } else { 0 };

    for (slot, (i, movie)) in row
        .movies
        .iter()
        .enumerate()
        .skip(first)
        .take(per_row)
        .enumerate()
    {
        let card = Rect {
            x: cards_area.x + slot as u16 * CARD_WIDTH,
            y: cards_area.y,
            width: CARD_WIDTH - 1,
            height: cards_area.height,
        };
        render_card(frame, card, app, movie, selected == Some(i));
    }
}

fn render_card(frame: &mut Frame, area: Rect, app: &App, movie: &Movie, focused: bool) {
    let width = area.width.saturating_sub(2) as usize;
    let title_style = if focused {
        Theme::list_item_selected()
    } else {
        Theme::list_item()
    };

    let mut badges = vec![Span::styled(format!("★{:.1}", movie.rating), Theme::accent())];
    if app.my_list.contains(&movie.id) {
        badges.push(Span::styled(" ✓", Theme::in_list()));
    }
    let status = app.downloads.status(&movie.id);
    if status.is_active() {
        badges.push(Span::styled(format!(" ⇣{}%", status.progress()), Theme::success()));
    }
    if let Some(pos) = app.resume.get(&movie.id).filter(|p| **p > 0.0) {
        badges.push(Span::styled(
            format!(" ▸{}", crate::models::format_time(*pos)),
            Theme::dimmed(),
        ));
    }

    let para = Paragraph::new(vec![
        Line::from(Span::styled(widgets::truncate(&movie.title, width), title_style)),
        Line::from(badges),
    ])
    .block(widgets::panel("", focused));
    frame.render_widget(para, area);
}
