//! Render functions for the TUI.
//!
//! Draws the feed view and layers whichever overlay the current mode calls
//! for on top of it.

use crate::app::{App, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{feed_list, help, picker, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

const DELETE_ALL_PROMPT: &str =
    "Are you sure you want to delete all news?\nThis action cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel";

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    feed_list::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);

    match &app.mode {
        Mode::Browse => {}
        Mode::Help => help::render(f),
        Mode::CategoryPicker { selected } => picker::render_categories(f, app, *selected),
        Mode::LanguagePicker { selected } => picker::render_languages(f, app, *selected),
        Mode::Prompt { kind, input } => {
            render_dialog(
                f,
                kind.title(),
                &format!("> {}_\n\n(Enter) Submit  (Esc) Cancel", input),
                4,
            );
        }
    }

    if app.awaiting_delete_all_confirmation() {
        render_dialog(f, " Confirm ", DELETE_ALL_PROMPT, 6);
    }
}

/// Small bordered dialog centered on screen.
fn render_dialog(f: &mut Frame, title: &str, text: &str, lines: u16) {
    let area = f.area();
    let width = 56u16.min(area.width.saturating_sub(4));
    let height = (lines + 2).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 10 || overlay.height < 3 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title.to_string()),
        )
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center);
    f.render_widget(paragraph, overlay);
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
