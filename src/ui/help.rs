//! Help overlay listing the key bindings.

use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

use super::render::centered_rect;

const BINDINGS: &[(&str, &str)] = &[
    ("j / Down", "Next item"),
    ("k / Up", "Previous item"),
    ("g / G", "First / last item"),
    ("o / Enter", "Open source in browser"),
    ("c", "Choose category"),
    ("a", "Show all categories"),
    ("l", "Choose language"),
    ("/", "Search by keyword"),
    ("f", "Fetch from source and save"),
    ("r", "Refresh"),
    ("d", "Delete selected item"),
    ("D", "Delete all news"),
    ("Esc", "Dismiss notice"),
    ("?", "Toggle help"),
    ("q / Ctrl+c", "Quit"),
];

pub fn render(f: &mut Frame) {
    let overlay = centered_rect(60, 70, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let rows = BINDINGS
        .iter()
        .map(|(key, action)| Row::new(vec![format!("  {}", key), action.to_string()]));

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (? to close) "),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        );

    f.render_widget(table, overlay);
}
