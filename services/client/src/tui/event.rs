//! services/client/src/tui/event.rs
//!
//! Terminal event polling and per-screen key dispatch. Handlers never
//! block: submits spawn background operations and return immediately.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::ClientError;
use crate::tui::app::{App, AuthField, Screen, UploadField};

/// Polls for a terminal event without blocking the render loop.
pub fn poll_event(timeout_ms: u64) -> Result<Option<Event>, ClientError> {
    if event::poll(Duration::from_millis(timeout_ms))? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Routes a terminal event to the active screen's handler.
pub fn handle_event(app: &mut App, evt: Event) {
    let Event::Key(key) = evt else {
        return;
    };
    // Windows terminals emit both press and release.
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.screen {
        Screen::Auth => handle_auth(app, key),
        Screen::Documents => handle_documents(app, key),
        Screen::Upload => handle_upload(app, key),
        Screen::Question => handle_question(app, key),
        Screen::ConfirmDelete(id) => handle_confirm_delete(app, key, id),
    }
}

fn handle_auth(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('t') = key.code {
            app.toggle_auth_mode();
        }
        return;
    }
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => app.next_auth_field(),
        KeyCode::Enter => app.submit_auth(),
        KeyCode::Backspace => {
            match app.auth_field {
                AuthField::Username => app.username_input.pop(),
                AuthField::Password => app.password_input.pop(),
            };
        }
        KeyCode::Char(c) => match app.auth_field {
            AuthField::Username => app.username_input.push(c),
            AuthField::Password => app.password_input.push(c),
        },
        _ => {}
    }
}

fn handle_documents(app: &mut App, key: KeyEvent) {
    // An active inline rename captures the keyboard.
    if app.rename_input.is_some() {
        match key.code {
            KeyCode::Esc => app.cancel_rename(),
            KeyCode::Enter => app.submit_rename(),
            KeyCode::Backspace => {
                if let Some(input) = app.rename_input.as_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = app.rename_input.as_mut() {
                    input.push(c);
                }
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.list_up(),
        KeyCode::Down | KeyCode::Char('j') => app.list_down(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('e') => app.begin_rename(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(doc) = app.selected_row() {
                app.screen = Screen::ConfirmDelete(doc.id);
            }
        }
        KeyCode::Char('r') => app.refresh_documents(),
        KeyCode::Char('x') => app.logout(),
        _ => {}
    }
}

fn handle_upload(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_upload(),
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => app.next_upload_field(),
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Backspace => {
            match app.upload_field {
                UploadField::Path => app.path_input.pop(),
                UploadField::Title => app.title_input.pop(),
            };
        }
        KeyCode::Char(c) => match app.upload_field {
            UploadField::Path => app.path_input.push(c),
            UploadField::Title => app.title_input.push(c),
        },
        _ => {}
    }
}

fn handle_question(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.back_to_list(),
        KeyCode::Enter => app.submit_question(),
        KeyCode::Backspace => {
            app.question_input.pop();
        }
        KeyCode::Char(c) => app.question_input.push(c),
        _ => {}
    }
}

fn handle_confirm_delete(app: &mut App, key: KeyEvent, id: i64) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(id),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.screen = Screen::Documents;
        }
        _ => {}
    }
}
