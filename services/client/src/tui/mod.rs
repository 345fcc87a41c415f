//! services/client/src/tui/mod.rs
//!
//! Terminal UI: the render loop, the per-screen event handlers, and the
//! application state machine.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

use std::sync::Arc;

use ratatui::DefaultTerminal;

use crate::error::ClientError;
use crate::stores::{DocumentStore, SessionStore};

use app::App;

/// Drives the TUI until the user quits. The caller owns terminal setup
/// and teardown so a panic or error still restores the terminal.
pub async fn run(
    mut terminal: DefaultTerminal,
    session: Arc<SessionStore>,
    documents: Arc<DocumentStore>,
) -> Result<(), ClientError> {
    let mut app = App::new(session, documents);
    if app.session.is_authenticated() {
        app.refresh_documents();
    }

    // Network work runs on spawned tasks; the loop only draws, applies
    // finished outcomes in tick, and handles keys, so the UI stays
    // responsive while requests are in flight.
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;
        if app.should_quit {
            return Ok(());
        }
        app.tick();
        if let Some(evt) = event::poll_event(100)? {
            event::handle_event(&mut app, evt);
        }
    }
}
