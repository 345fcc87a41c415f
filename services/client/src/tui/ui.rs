//! services/client/src/tui/ui.rs
//!
//! Screen rendering. Every frame is drawn from scratch off the current
//! `App` and store state.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::app::{format_file_size, App, AuthField, AuthMode, Screen, UploadField};
use crate::tui::theme::Theme;

pub fn render(frame: &mut Frame, app: &App) {
    let theme = Theme::default();
    match app.screen {
        Screen::Auth => render_auth(frame, app, &theme),
        Screen::Documents => render_documents(frame, app, &theme),
        Screen::Upload => render_upload(frame, app, &theme),
        Screen::Question => render_question(frame, app, &theme),
        Screen::ConfirmDelete(_) => {
            render_documents(frame, app, &theme);
            render_delete_popup(frame, app, &theme);
        }
    }
}

//=========================================================================================
// Auth
//=========================================================================================

fn render_auth(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(50, 12, frame.area());
    let title = match app.auth_mode {
        AuthMode::Login => " AskDoc — Sign In ",
        AuthMode::Signup => " AskDoc — Create Account ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let field_style = |field: AuthField| {
        if app.auth_field == field {
            theme.input_focused
        } else {
            theme.input
        }
    };
    let masked: String = "*".repeat(app.password_input.chars().count());

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Username: ", theme.normal),
            Span::styled(app.username_input.as_str(), field_style(AuthField::Username)),
            cursor_span(app.auth_field == AuthField::Username, theme),
        ])),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Password: ", theme.normal),
            Span::styled(masked, field_style(AuthField::Password)),
            cursor_span(app.auth_field == AuthField::Password, theme),
        ])),
        rows[2],
    );

    if app.auth_busy {
        frame.render_widget(
            Paragraph::new(Span::styled("Working...", theme.muted)),
            rows[4],
        );
    } else if let Some(err) = &app.auth_error {
        frame.render_widget(
            Paragraph::new(Span::styled(err.as_str(), theme.danger)).wrap(Wrap { trim: true }),
            rows[4],
        );
    }

    let hint = match app.auth_mode {
        AuthMode::Login => "enter submit  tab switch field  ctrl+t sign up  esc quit",
        AuthMode::Signup => "enter submit  tab switch field  ctrl+t sign in  esc quit",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, theme.key_hint)).alignment(Alignment::Center),
        rows[5],
    );
}

//=========================================================================================
// Document List
//=========================================================================================

fn render_documents(frame: &mut Frame, app: &App, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let docs = app.documents.documents();
    let title = match app.session.current_user() {
        Some(user) => format!(" Documents — {} ", user.username),
        None => " Documents ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title));

    if docs.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No documents yet. Press 'u' to upload one.",
            theme.muted,
        ))
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(empty, layout[0]);
    } else {
        let items: Vec<ListItem> = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let title_text = match (&app.rename_input, i == app.list_index) {
                    (Some(editing), true) => format!("{}█", editing),
                    _ => doc.title.clone(),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<40}", title_text), theme.normal),
                    Span::styled(format!("{:<28}", doc.file_name), theme.muted),
                    Span::styled(format!("{:>12}", format_file_size(doc.file_size)), theme.muted),
                    Span::styled(
                        format!("  {}", doc.uploaded_at.format("%Y-%m-%d")),
                        theme.muted,
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selected)
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(app.list_index));
        frame.render_stateful_widget(list, layout[0], &mut state);
    }

    render_status(frame, app, theme, layout[1]);

    let hint = if app.rename_input.is_some() {
        "enter save  esc cancel"
    } else {
        "enter open  u upload  e rename  d delete  r refresh  x logout  q quit"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, theme.key_hint)),
        layout[2],
    );
}

fn render_delete_popup(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(50, 6, frame.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.danger)
        .title(Span::styled(" Delete Document ", theme.danger));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let name = app
        .selected_row()
        .map(|d| d.title)
        .unwrap_or_else(|| "this document".to_string());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("Delete \"{}\"? This cannot be undone.", name),
            theme.normal,
        ))
        .wrap(Wrap { trim: true }),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled("y confirm  n cancel", theme.key_hint))
            .alignment(Alignment::Center),
        rows[1],
    );
}

//=========================================================================================
// Upload
//=========================================================================================

fn render_upload(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(70, 12, frame.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(" Upload Document ", theme.title));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let field_style = |field: UploadField| {
        if app.upload_field == field {
            theme.input_focused
        } else {
            theme.input
        }
    };

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("File path: ", theme.normal),
            Span::styled(app.path_input.as_str(), field_style(UploadField::Path)),
            cursor_span(app.upload_field == UploadField::Path, theme),
        ])),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Title:     ", theme.normal),
            Span::styled(app.title_input.as_str(), field_style(UploadField::Title)),
            cursor_span(app.upload_field == UploadField::Title, theme),
        ])),
        rows[2],
    );

    if app.uploading {
        frame.render_widget(
            Paragraph::new(Span::styled("Uploading...", theme.muted)),
            rows[4],
        );
    } else if let Some(err) = &app.upload_error {
        frame.render_widget(
            Paragraph::new(Span::styled(err.as_str(), theme.danger)).wrap(Wrap { trim: true }),
            rows[4],
        );
    }

    frame.render_widget(
        Paragraph::new(Span::styled(
            "enter upload  tab switch field  esc back",
            theme.key_hint,
        ))
        .alignment(Alignment::Center),
        rows[5],
    );
}

//=========================================================================================
// Question Panel
//=========================================================================================

fn render_question(frame: &mut Frame, app: &App, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = match app.documents.selected() {
        Some(doc) => format!(" Ask — {} ", doc.title),
        None => " Ask ".to_string(),
    };
    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title));

    let turns = app.conversation.turns();
    if turns.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Ask a question about this document to get started.",
                theme.muted,
            ))
            .block(transcript_block)
            .alignment(Alignment::Center),
            layout[0],
        );
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for turn in turns {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", turn.timestamp.format("%H:%M:%S")),
                    theme.muted,
                ),
                Span::styled("You: ", theme.key_hint),
                Span::styled(turn.question.clone(), theme.normal),
            ]));
            lines.push(Line::from(vec![
                Span::styled("         AskDoc: ", theme.success),
                Span::styled(turn.answer.clone(), theme.normal),
            ]));
            lines.push(Line::default());
        }
        // Keep the newest turns in view.
        let visible = layout[0].height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(visible) as u16;
        frame.render_widget(
            Paragraph::new(lines)
                .block(transcript_block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            layout[0],
        );
    }

    let input_title = if app.asking {
        " Question (waiting for answer...) "
    } else {
        " Question "
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(app.question_input.as_str(), theme.input_focused),
            cursor_span(!app.asking, theme),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(input_title, theme.title)),
        ),
        layout[1],
    );

    render_status(frame, app, theme, layout[2]);
    frame.render_widget(
        Paragraph::new(Span::styled("enter ask  esc back to documents", theme.key_hint)),
        layout[3],
    );
}

//=========================================================================================
// Shared
//=========================================================================================

fn render_status(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    if let Some(status) = &app.status {
        let style = if status.is_error {
            theme.danger
        } else {
            theme.success
        };
        frame.render_widget(Paragraph::new(Span::styled(status.text.as_str(), style)), area);
    }
}

fn cursor_span(focused: bool, theme: &Theme) -> Span<'static> {
    if focused {
        Span::styled("█", theme.input_focused)
    } else {
        Span::raw("")
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
