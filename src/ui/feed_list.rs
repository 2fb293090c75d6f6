use crate::app::App;
use crate::feed::{FeedResult, FetchRequest, Severity};
use crate::selection::language_name;
use crate::util::{display_width, single_line, strip_control_chars, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Format a publication time relative to `now`.
pub fn format_relative_time(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = published else {
        return String::new();
    };

    let diff = (now - ts).num_seconds();
    if diff < 60 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }
    ts.format("%b %d").to_string()
}

/// Columns the category tag and time take on the title line, separators
/// included.
fn meta_width(time: &str, category: &str) -> usize {
    display_width(time) + display_width(category) + 4
}

fn panel_title(app: &App) -> String {
    match app.feed.current_request() {
        Some(FetchRequest::Search { keyword }) => {
            return format!(" Search: {} ", strip_control_chars(keyword));
        }
        Some(FetchRequest::External { query, language }) => {
            return format!(
                " Fetched: {} · {} ",
                strip_control_chars(query),
                language_name(language)
            );
        }
        _ => {}
    }
    let selection = app.selection.current();
    let category = selection.category_filter().unwrap_or("All Categories");
    format!(
        " {} · {} ",
        strip_control_chars(category),
        language_name(&selection.language)
    )
}

/// Render the feed panel: spinner while loading, message on failure, items
/// otherwise.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(panel_title(app));

    match app.feed.result() {
        FeedResult::Loading => {
            let frame = SPINNER[app.spinner_frame % SPINNER.len()];
            let text = format!("{} Loading news...", frame);
            f.render_widget(
                Paragraph::new(text).alignment(Alignment::Center).block(block),
                area,
            );
        }
        FeedResult::Failed { message, severity } => {
            let style = match severity {
                Severity::Info => Style::default().fg(Color::Gray),
                Severity::Error => Style::default().fg(Color::Red),
            };
            let hint = match severity {
                Severity::Info => "",
                Severity::Error => "\n\n[r] retry",
            };
            f.render_widget(
                Paragraph::new(format!("{}{}", strip_control_chars(message), hint))
                    .style(style)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(block),
                area,
            );
        }
        FeedResult::Ready { items } if items.is_empty() => {
            f.render_widget(
                Paragraph::new("No news yet. Press [f] to fetch from the source.")
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
        }
        FeedResult::Ready { items } => {
            let now = Utc::now();
            let inner_width = area.width.saturating_sub(2) as usize;

            let list_items: Vec<ListItem> = items
                .iter()
                .map(|item| {
                    let time_str = format_relative_time(item.published_at, now);
                    let category = item.category.as_deref().map(single_line).unwrap_or_default();
                    let meta_width = meta_width(&time_str, &category);

                    let deleting = app.feed.is_deleting(item.id);
                    let title_style = if deleting {
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    };

                    let title = single_line(&item.title);
                    let title = truncate_to_width(&title, inner_width.saturating_sub(meta_width));
                    let mut first = vec![Span::styled(title.into_owned(), title_style)];
                    if !category.is_empty() {
                        first.push(Span::styled(
                            format!("  [{}]", category),
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                    if !time_str.is_empty() {
                        first.push(Span::styled(
                            format!("  {}", time_str),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }

                    let description = single_line(&item.description);
                    let second = Line::from(Span::styled(
                        truncate_to_width(&description, inner_width).into_owned(),
                        Style::default().fg(Color::Gray),
                    ));

                    ListItem::new(vec![Line::from(first), second])
                })
                .collect();

            let list = List::new(list_items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

            let mut state = ListState::default().with_selected(Some(app.selected));
            f.render_stateful_widget(list, area, &mut state);
        }
    }
}
