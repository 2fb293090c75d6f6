//! Input handling for the TUI.
//!
//! Routes key presses to the handler for whatever currently captures input:
//! the delete-all confirmation, the help overlay, a picker, a prompt, or the
//! feed list.

use crate::app::{App, Mode, PromptKind};
use crate::util::{validate_url_for_open, MAX_QUERY_LENGTH};
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    // Confirmation captures all keys while armed
    if app.awaiting_delete_all_confirmation() {
        handle_confirm_input(app, code);
        return Action::Continue;
    }

    match app.mode {
        Mode::Help => handle_help_input(app, code),
        Mode::CategoryPicker { .. } | Mode::LanguagePicker { .. } => {
            handle_picker_input(app, code)
        }
        Mode::Prompt { .. } => handle_prompt_input(app, code),
        Mode::Browse => return handle_browse_input(app, code),
    }
    Action::Continue
}

fn handle_confirm_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete_all(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete_all(),
        _ => {}
    }
}

fn handle_help_input(app: &mut App, code: KeyCode) {
    if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
        app.mode = Mode::Browse;
    }
}

fn handle_picker_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter => app.commit_picker(),
        KeyCode::Esc | KeyCode::Char('q') => app.mode = Mode::Browse,
        _ => {}
    }
}

fn handle_prompt_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Esc => app.mode = Mode::Browse,
        KeyCode::Backspace => {
            if let Mode::Prompt { input, .. } = &mut app.mode {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            let too_long = match &mut app.mode {
                Mode::Prompt { input, .. } if input.chars().count() < MAX_QUERY_LENGTH => {
                    input.push(c);
                    false
                }
                Mode::Prompt { .. } => true,
                _ => false,
            };
            if too_long {
                app.set_status(format!("Query too long (max {} chars)", MAX_QUERY_LENGTH));
            }
        }
        _ => {}
    }
}

fn handle_browse_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('g') | KeyCode::Home => app.selected = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.selected = app.items().len().saturating_sub(1);
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('c') => app.open_category_picker(),
        KeyCode::Char('l') => app.open_language_picker(),
        KeyCode::Char('a') => app.set_category(""),
        KeyCode::Char('/') => {
            app.mode = Mode::Prompt {
                kind: PromptKind::Search,
                input: String::new(),
            };
        }
        KeyCode::Char('f') => {
            app.mode = Mode::Prompt {
                kind: PromptKind::External,
                input: String::new(),
            };
        }
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Char('D') => app.request_delete_all(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Esc => {
            app.feed.dismiss_notice();
        }
        _ => {}
    }
    Action::Continue
}

/// Open the selected item's source in the browser.
fn open_selected(app: &mut App) {
    let Some(item) = app.selected_item() else {
        return;
    };
    // Validate before open::that() so no other handler can be launched
    match validate_url_for_open(&item.source_url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(url = %url, error = %e, "Failed to open browser");
                app.set_status(format!("Failed to open browser: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NewsApi;
    use crate::app::{AppEvent, AppSettings, EVENT_CHANNEL_CAPACITY};
    use crate::feed::DeleteAllState;
    use crate::location::UrlSync;
    use crate::selection::SelectionState;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let api = NewsApi::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let link = UrlSync::root("http://localhost:3000/").unwrap();
        let app = App::new(api, link, SelectionState::default(), AppSettings::default(), tx);
        (app, rx)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = test_app();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Quit);
        assert_eq!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit
        );
    }

    #[test]
    fn test_prompt_typing_and_cancel() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('/'));
        for c in "rustx".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(
            app.mode,
            Mode::Prompt {
                kind: PromptKind::Search,
                input: "rust".into()
            }
        );
        // 'q' is text inside a prompt, not quit
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Continue);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_delete_all_confirmation_keys() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('D'));
        assert!(app.awaiting_delete_all_confirmation());
        // Unrelated keys are swallowed while armed
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Continue);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.feed.delete_all_state(), DeleteAllState::Idle);
    }

    #[test]
    fn test_help_toggle() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_picker_escape_keeps_selection() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.selection.current().language, "en");
    }
}
