//! Search screen: query box, filtered results and the filter panel

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, FilterItem, InputMode, SearchState};
use crate::ui::{widgets, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let search = &app.search;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    render_input(frame, chunks[0], search, app.input_mode == InputMode::Editing);
    render_results(frame, chunks[1], app);

    if let Some(panel) = &search.panel {
        render_filter_panel(frame, area, search, panel.selected);
    }
}

fn render_input(frame: &mut Frame, area: Rect, search: &SearchState, editing: bool) {
    let text = if editing {
        let (before, after) = search.input.split();
        Line::from(vec![
            Span::raw("⌕ "),
            Span::raw(before.to_string()),
            Span::styled("│", Theme::input_cursor()),
            Span::raw(after.to_string()),
        ])
    } else if search.input.value.is_empty() {
        Line::from(Span::styled("⌕ Titles, people, genres", Theme::dimmed()))
    } else {
        Line::from(format!("⌕ {}", search.input.value))
    };
    let para = Paragraph::new(text)
        .style(Theme::input())
        .block(widgets::panel("Search", editing));
    frame.render_widget(para, area);
}

fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let search = &app.search;
    let filters = search.filters.active_count();
    let title = if filters > 0 {
        format!(
            "{} results · {} filters · {}",
            search.visible.len(),
            filters,
            search.filters.sort_by.label()
        )
    } else {
        format!("{} results · {}", search.visible.len(), search.filters.sort_by.label())
    };
    let block = widgets::panel(&title, app.input_mode == InputMode::Normal && search.panel.is_none());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if search.loading.is_loading() {
        frame.render_widget(
            Paragraph::new(Span::styled("Searching...", Theme::loading())),
            inner,
        );
        return;
    }
    if search.visible.is_empty() {
        let msg = if search.last_query.is_empty() {
            "Type a title and press Enter"
        } else if search.results.is_empty() {
            "No matches"
        } else {
            "No matches for the current filters (c to clear)"
        };
        frame.render_widget(Paragraph::new(Span::styled(msg, Theme::dimmed())), inner);
        return;
    }

    let visible_height = inner.height as usize;
    let mut list_state = search.list.clone();
    list_state.scroll_into_view(visible_height);

    let items: Vec<ListItem> = search
        .visible
        .iter()
        .enumerate()
        .skip(list_state.offset)
        .take(visible_height)
        .map(|(i, movie)| {
            let selected = i == list_state.selected;
            let mut spans = vec![Span::styled(
                format!(" {} ", movie.title),
                if selected {
                    Theme::list_item_selected()
                } else {
                    Theme::list_item()
                },
            )];
            spans.push(Span::raw(" "));
            spans.extend(widgets::movie_meta(movie));
            if app.my_list.contains(&movie.id) {
                spans.push(Span::styled("  ✓", Theme::in_list()));
            }
            if !movie.genre.is_empty() {
                spans.push(Span::styled(format!("  {}", movie.genres_display()), Theme::genre()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    frame.render_widget(List::new(items), inner);
}

fn render_filter_panel(frame: &mut Frame, area: Rect, search: &SearchState, selected: usize) {
    let popup = Rect {
        x: area.x + area.width.saturating_sub(34),
        y: area.y,
        width: 34.min(area.width),
        height: area.height,
    };
    frame.render_widget(Clear, popup);
    let block = widgets::panel("Filters", true);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let items = search.filter_items();
    let mut list = crate::app::ListState::new(items.len());
    list.selected = selected.min(items.len().saturating_sub(1));
    list.scroll_into_view(inner.height as usize);

    let mut last_group = "";
    let mut lines: Vec<ListItem> = Vec::new();
    for (i, item) in items.iter().enumerate().skip(list.offset) {
        let group = match item {
            FilterItem::Sort(_) => "Sort",
            FilterItem::Genre(_) => "Genre",
            FilterItem::Year(_) => "Year",
            FilterItem::Rating(_) => "Rating",
            FilterItem::Clear => "",
        };
        if group != last_group && !group.is_empty() {
            lines.push(ListItem::new(Span::styled(group, Theme::heading())));
            last_group = group;
        }
        let label = match item {
            FilterItem::Sort(s) => s.label().to_string(),
            FilterItem::Genre(g) => g.to_string(),
            FilterItem::Year(y) => y.to_string(),
            FilterItem::Rating(b) => b.label().to_string(),
            FilterItem::Clear => "Clear all".to_string(),
        };
        let mark = if search.is_item_active(item) { "◉" } else { "○" };
        let style = if i == list.selected {
            Theme::list_item_selected()
        } else {
            Theme::list_item()
        };
        let text = if matches!(item, FilterItem::Clear) {
            format!("  {}", label)
        } else {
            format!("  {} {}", mark, label)
        };
        lines.push(ListItem::new(Span::styled(text, style)));
    }
    frame.render_widget(List::new(lines), inner);
}
