use crate::app::{App, Mode};
use crate::feed::NoticeKind;
use crate::util::{display_width, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar: notice or key hints on the left, feed link on the
/// right.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, Style) = match app.feed.notice() {
        Some(notice) => {
            let bg = match notice.kind {
                NoticeKind::Success => Color::Green,
                NoticeKind::Info => Color::Blue,
                NoticeKind::Error => Color::Red,
            };
            (
                Cow::Borrowed(&*notice.message),
                Style::default().bg(bg).fg(Color::White),
            )
        }
        None => {
            let hints = match app.mode {
                Mode::Prompt { .. } => "Type query | ENTER submit | ESC cancel",
                Mode::CategoryPicker { .. } | Mode::LanguagePicker { .. } => {
                    "[j/k] move | ENTER select | ESC cancel"
                }
                Mode::Help => "? or ESC close",
                Mode::Browse => {
                    "[c]ategory [l]anguage [/]search [f]etch [r]efresh [d]elete [o]pen [?]help [q]uit"
                }
            };
            (
                Cow::Borrowed(hints),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            )
        }
    };

    let link = app.link().as_str();
    let link_width = u16::try_from(display_width(link) + 2)
        .unwrap_or(u16::MAX)
        .min(area.width / 3);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(link_width)])
        .split(area);

    let left = truncate_to_width(&text, chunks[0].width as usize);
    f.render_widget(Paragraph::new(left.into_owned()).style(style), chunks[0]);

    let right = truncate_to_width(link, chunks[1].width.saturating_sub(1) as usize);
    f.render_widget(
        Paragraph::new(format!(" {}", right))
            .style(Style::default().bg(Color::Black).fg(Color::Cyan)),
        chunks[1],
    );
}
