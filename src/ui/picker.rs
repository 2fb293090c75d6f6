use crate::app::App;
use crate::selection::LANGUAGES;
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use super::render::centered_rect;

/// Label of the picker entry that clears the category filter.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Category picker: "All Categories" followed by the catalog.
pub fn render_categories(f: &mut Frame, app: &App, selected: usize) {
    let current = &app.selection.current().category;
    let mut entries = vec![(ALL_CATEGORIES.to_string(), current.is_empty())];
    entries.extend(
        app.catalog
            .as_slice()
            .iter()
            .map(|c| (strip_control_chars(c).into_owned(), c == current)),
    );
    let title = if app.catalog.is_empty() {
        " Category (loading catalog...) "
    } else {
        " Category "
    };
    render_list(f, title, entries, selected);
}

/// Language picker over the fixed language table.
pub fn render_languages(f: &mut Frame, app: &App, selected: usize) {
    let current = &app.selection.current().language;
    let entries = LANGUAGES
        .iter()
        .map(|(code, name)| (format!("{}  {}", code, name), *code == current.as_str()))
        .collect();
    render_list(f, " Language ", entries, selected);
}

fn render_list(f: &mut Frame, title: &str, entries: Vec<(String, bool)>, selected: usize) {
    let overlay = centered_rect(40, 60, f.area());
    if overlay.width < 10 || overlay.height < 4 {
        return;
    }
    f.render_widget(Clear, overlay);

    let items: Vec<ListItem> = entries
        .into_iter()
        .map(|(label, active)| {
            let marker = if active { "● " } else { "  " };
            let style = if active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", marker, label)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(list, overlay, &mut state);
}
