//! My List and Downloads screens

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::library::MutationState;
use crate::ui::{widgets, Theme};

pub fn render_my_list(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!("My List ({})", app.my_list.len());
    let block = widgets::panel(&title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.my_list.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled("Your list is empty", Theme::secondary())),
                Line::from(Span::styled(
                    "Press + on any title to save it here",
                    Theme::dimmed(),
                )),
            ]),
            inner,
        );
        return;
    }

    let mut list_state = app.my_list_view.clone();
    list_state.scroll_into_view(inner.height as usize);

    let items: Vec<ListItem> = app
        .my_list
        .movies()
        .iter()
        .enumerate()
        .skip(list_state.offset)
        .take(inner.height as usize)
        .map(|(i, movie)| {
            let style = if i == list_state.selected {
                Theme::list_item_selected()
            } else {
                Theme::list_item()
            };
            let mut spans = vec![Span::styled(format!(" {} ", movie.title), style), Span::raw(" ")];
            spans.extend(widgets::movie_meta(movie));
            if app.my_list.mutation_state(&movie.id) == Some(MutationState::Pending) {
                spans.push(Span::styled("  saving…", Theme::dimmed()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    frame.render_widget(List::new(items), inner);
}

pub fn render_downloads(frame: &mut Frame, area: Rect, app: &App) {
    let view = &app.downloads_view;
    let block = widgets::panel("Downloads", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut items: Vec<ListItem> = Vec::new();

    // Running simulations first
    for (movie_id, percent) in app.downloads.active() {
        let title = app
            .find_movie(movie_id)
            .map(|m| m.title.clone())
            .unwrap_or_else(|| movie_id.to_string());
        let mut spans = vec![Span::styled(format!(" ⇣ {} ", title), Theme::success())];
        spans.extend(widgets::progress_bar(percent as f64 / 100.0, 20).spans);
        spans.push(Span::styled(format!(" {}%", percent), Theme::dimmed()));
        items.push(ListItem::new(Line::from(spans)));
    }

    if let Some(msg) = view.loading.message() {
        let style = if view.loading.is_error() {
            Theme::error()
        } else {
            Theme::loading()
        };
        items.push(ListItem::new(Span::styled(msg.to_string(), style)));
    }

    if view.records.is_empty() && items.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled("No downloads yet", Theme::secondary())),
                Line::from(Span::styled(
                    "Press w on a title's page to download it",
                    Theme::dimmed(),
                )),
            ]),
            inner,
        );
        return;
    }

    let used = items.len();
    let room = (inner.height as usize).saturating_sub(used);
    let mut list_state = view.list.clone();
    list_state.scroll_into_view(room);

    items.extend(
        view.records
            .iter()
            .enumerate()
            .skip(list_state.offset)
            .take(room)
            .map(|(i, record)| {
                let style = if i == list_state.selected {
                    Theme::list_item_selected()
                } else {
                    Theme::list_item()
                };
                let mut spans = vec![
                    Span::styled(format!(" {} ", record.movie.title), style),
                    Span::styled(format!("  {}", record.display_size()), Theme::secondary()),
                ];
                if !record.downloaded_on().is_empty() {
                    spans.push(Span::styled(
                        format!("  Downloaded {}", record.downloaded_on()),
                        Theme::dimmed(),
                    ));
                }
                ListItem::new(Line::from(spans))
            }),
    );
    frame.render_widget(List::new(items), inner);
}
