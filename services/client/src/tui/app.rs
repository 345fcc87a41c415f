//! services/client/src/tui/app.rs
//!
//! The TUI state machine. Screens correspond to the views of the
//! application: the login/signup form, the document list, the upload
//! form, and the question panel. The `App` owns only UI-local state
//! (input buffers, focus, list cursor); everything shared lives in the
//! session and document stores, which it renders from and dispatches to.
//!
//! Store operations run on spawned tasks so the render loop never
//! blocks on the network: a submit sets a busy flag and spawns, the
//! task posts an `Outcome` back through a channel, and `tick` drains
//! the channel and applies results between frames. Keys and drawing
//! keep working while a request is in flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

use askdoc_core::domain::{ConversationTurn, CurrentUser, Document, DocumentUpload};
use askdoc_core::ports::PortError;

use crate::stores::{ConversationLog, DocumentStore, SessionStore};

//=========================================================================================
// Screen State Machine
//=========================================================================================

/// Screen states for the TUI state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Login / signup form.
    Auth,
    /// The document list.
    Documents,
    /// The upload form (path + title).
    Upload,
    /// The question panel for the selected document.
    Question,
    /// Delete confirmation for a document id.
    ConfirmDelete(i64),
}

/// Which form is active on the auth screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

/// Focus within the auth form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
}

/// Focus within the upload form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadField {
    Path,
    Title,
}

/// A transient notification shown in the status bar (the toast
/// equivalent).
#[derive(Clone, Debug)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// The result of a spawned store operation, posted back to the UI task.
enum Outcome {
    Auth(Result<CurrentUser, PortError>),
    Listing(Result<(), PortError>),
    Upload(Result<Document, String>),
    Rename(Result<Document, PortError>),
    Delete(Result<(), PortError>),
    Answer {
        document_id: i64,
        question: String,
        result: Result<String, PortError>,
    },
}

//=========================================================================================
// Application State
//=========================================================================================

pub struct App {
    pub session: Arc<SessionStore>,
    pub documents: Arc<DocumentStore>,
    pub conversation: ConversationLog,

    pub screen: Screen,
    pub should_quit: bool,

    // Auth form state
    pub auth_mode: AuthMode,
    pub auth_field: AuthField,
    pub username_input: String,
    pub password_input: String,
    pub auth_error: Option<String>,
    pub auth_busy: bool,

    // Document list state
    pub list_index: usize,
    /// `Some` while the selected row's title is being edited inline.
    pub rename_input: Option<String>,

    // Upload form state
    pub upload_field: UploadField,
    pub path_input: String,
    pub title_input: String,
    pub upload_error: Option<String>,
    pub uploading: bool,

    // Question panel state
    pub question_input: String,
    pub asking: bool,

    pub status: Option<StatusLine>,

    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes: mpsc::UnboundedReceiver<Outcome>,
}

impl App {
    pub fn new(session: Arc<SessionStore>, documents: Arc<DocumentStore>) -> Self {
        let screen = if session.is_authenticated() {
            Screen::Documents
        } else {
            Screen::Auth
        };
        let (outcomes_tx, outcomes) = mpsc::unbounded_channel();
        Self {
            session,
            documents,
            conversation: ConversationLog::new(),
            screen,
            should_quit: false,
            auth_mode: AuthMode::Login,
            auth_field: AuthField::Username,
            username_input: String::new(),
            password_input: String::new(),
            auth_error: None,
            auth_busy: false,
            list_index: 0,
            rename_input: None,
            upload_field: UploadField::Path,
            path_input: String::new(),
            title_input: String::new(),
            upload_error: None,
            uploading: false,
            question_input: String::new(),
            asking: false,
            status: None,
            outcomes_tx,
            outcomes,
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    /// Called every loop tick: propagates a transport-forced logout (a
    /// 401 on any call) into the UI, then applies results of finished
    /// background operations.
    pub fn tick(&mut self) {
        if self.session.sync_with_transport() {
            self.documents.reset();
            self.conversation.reset_for(None);
            self.rename_input = None;
            self.list_index = 0;
            self.asking = false;
            self.uploading = false;
            self.screen = Screen::Auth;
            self.auth_error = Some("Your session has expired. Please sign in again.".to_string());
        }
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Auth(Ok(user)) => {
                self.auth_busy = false;
                self.username_input.clear();
                self.password_input.clear();
                self.screen = Screen::Documents;
                self.notify(format!("Signed in as {}", user.username));
                self.refresh_documents();
            }
            Outcome::Auth(Err(e)) => {
                self.auth_busy = false;
                self.auth_error = Some(e.to_string());
            }
            Outcome::Listing(Ok(())) => self.clamp_list_index(),
            Outcome::Listing(Err(_)) => self.notify_error("Failed to fetch documents"),
            Outcome::Upload(Ok(doc)) => {
                self.uploading = false;
                self.notify("Document uploaded successfully");
                // Auto-select the new document and jump to its panel.
                self.conversation.reset_for(Some(doc.id));
                self.documents.select_document(Some(doc));
                self.list_index = 0;
                self.question_input.clear();
                self.screen = Screen::Question;
            }
            Outcome::Upload(Err(msg)) => {
                self.uploading = false;
                self.upload_error = Some(msg);
            }
            Outcome::Rename(Ok(_)) => self.notify("Document updated successfully"),
            Outcome::Rename(Err(_)) => self.notify_error("Failed to update document"),
            Outcome::Delete(Ok(())) => {
                // A deleted selection also ends its conversation.
                self.conversation
                    .reset_for(self.documents.selected().map(|d| d.id));
                self.clamp_list_index();
                self.notify("Document deleted successfully");
            }
            Outcome::Delete(Err(_)) => self.notify_error("Failed to delete document"),
            Outcome::Answer {
                document_id,
                question,
                result,
            } => {
                self.asking = false;
                match result {
                    Ok(answer) => {
                        let turn = ConversationTurn {
                            question,
                            answer,
                            timestamp: Utc::now(),
                        };
                        // The answer may be stale if the user has since
                        // moved to a different document; the log drops it
                        // in that case.
                        if self.conversation.record(document_id, turn) {
                            self.question_input.clear();
                            self.notify("Question answered successfully");
                        }
                    }
                    Err(_) => {
                        // The failed turn is not appended.
                        self.notify_error("Failed to get answer");
                    }
                }
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Auth screen
    //-------------------------------------------------------------------------------------

    pub fn toggle_auth_mode(&mut self) {
        self.auth_mode = match self.auth_mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
        self.auth_error = None;
    }

    pub fn next_auth_field(&mut self) {
        self.auth_field = match self.auth_field {
            AuthField::Username => AuthField::Password,
            AuthField::Password => AuthField::Username,
        };
    }

    /// Validates the form locally, then logs in or signs up on a
    /// background task. Validation failures never reach the network.
    pub fn submit_auth(&mut self) {
        if self.auth_busy {
            return;
        }
        let username = self.username_input.trim().to_string();
        let password = self.password_input.clone();
        if username.is_empty() || password.is_empty() {
            self.auth_error = Some("Username and password are required.".to_string());
            return;
        }

        self.auth_busy = true;
        self.auth_error = None;
        let session = self.session.clone();
        let mode = self.auth_mode;
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = match mode {
                AuthMode::Login => session.login(&username, &password).await,
                AuthMode::Signup => session.signup(&username, &password).await,
            };
            let _ = tx.send(Outcome::Auth(result));
        });
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.documents.reset();
        self.conversation.reset_for(None);
        self.rename_input = None;
        self.list_index = 0;
        self.question_input.clear();
        self.screen = Screen::Auth;
        self.status = None;
        self.auth_error = None;
    }

    //-------------------------------------------------------------------------------------
    // Document list
    //-------------------------------------------------------------------------------------

    pub fn refresh_documents(&mut self) {
        let documents = self.documents.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Outcome::Listing(documents.fetch_documents().await));
        });
    }

    fn clamp_list_index(&mut self) {
        let count = self.documents.documents().len();
        if count == 0 {
            self.list_index = 0;
        } else if self.list_index >= count {
            self.list_index = count - 1;
        }
    }

    pub fn selected_row(&self) -> Option<Document> {
        self.documents.documents().get(self.list_index).cloned()
    }

    pub fn list_up(&mut self) {
        if self.list_index > 0 {
            self.list_index -= 1;
        }
    }

    pub fn list_down(&mut self) {
        let count = self.documents.documents().len();
        if self.list_index + 1 < count {
            self.list_index += 1;
        }
    }

    /// Opens the question panel for the highlighted row. Selecting a
    /// different document rebinds (and thereby clears) the conversation.
    pub fn open_selected(&mut self) {
        if let Some(doc) = self.selected_row() {
            debug!(id = doc.id, "opening question panel");
            self.conversation.reset_for(Some(doc.id));
            self.documents.select_document(Some(doc));
            self.question_input.clear();
            self.screen = Screen::Question;
        }
    }

    /// Back to the list. The selection survives so re-opening the same
    /// document keeps its conversation.
    pub fn back_to_list(&mut self) {
        self.screen = Screen::Documents;
    }

    pub fn begin_rename(&mut self) {
        if let Some(doc) = self.selected_row() {
            self.rename_input = Some(doc.title);
        }
    }

    pub fn cancel_rename(&mut self) {
        self.rename_input = None;
    }

    pub fn submit_rename(&mut self) {
        let Some(title) = self.rename_input.take() else {
            return;
        };
        let Some(doc) = self.selected_row() else {
            return;
        };
        let title = title.trim().to_string();
        if title.is_empty() || title == doc.title {
            return;
        }

        let documents = self.documents.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Outcome::Rename(
                documents.update_document(doc.id, &title).await,
            ));
        });
    }

    pub fn confirm_delete(&mut self, id: i64) {
        self.screen = Screen::Documents;
        let documents = self.documents.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Outcome::Delete(documents.delete_document(id).await));
        });
    }

    //-------------------------------------------------------------------------------------
    // Upload form
    //-------------------------------------------------------------------------------------

    pub fn start_upload(&mut self) {
        self.path_input.clear();
        self.title_input.clear();
        self.upload_error = None;
        self.upload_field = UploadField::Path;
        self.screen = Screen::Upload;
    }

    pub fn next_upload_field(&mut self) {
        // Moving off the path field fills an empty title from the file
        // name, extension stripped.
        if self.upload_field == UploadField::Path && self.title_input.is_empty() {
            if let Some(name) = Path::new(&self.path_input)
                .file_name()
                .and_then(|n| n.to_str())
            {
                self.title_input = title_from_file_name(name);
            }
        }
        self.upload_field = match self.upload_field {
            UploadField::Path => UploadField::Title,
            UploadField::Title => UploadField::Path,
        };
    }

    pub fn submit_upload(&mut self) {
        if self.uploading {
            return;
        }
        let path_raw = self.path_input.trim().to_string();
        if path_raw.is_empty() {
            self.upload_error = Some("Please select a file to upload".to_string());
            return;
        }
        let path = PathBuf::from(&path_raw);
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            self.upload_error = Some("That path has no file name".to_string());
            return;
        };
        if self.title_input.trim().is_empty() {
            self.title_input = title_from_file_name(&file_name);
        }
        let title = self.title_input.trim().to_string();
        if title.is_empty() {
            self.upload_error = Some("Please enter a title for your document".to_string());
            return;
        }

        self.uploading = true;
        self.upload_error = None;
        let content_type = content_type_for(&file_name).to_string();
        let documents = self.documents.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => documents
                    .upload_document(DocumentUpload {
                        title,
                        file_name,
                        content_type,
                        bytes,
                    })
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(format!("Could not read {}: {}", path.display(), e)),
            };
            let _ = tx.send(Outcome::Upload(result));
        });
    }

    pub fn cancel_upload(&mut self) {
        self.screen = Screen::Documents;
    }

    //-------------------------------------------------------------------------------------
    // Question panel
    //-------------------------------------------------------------------------------------

    pub fn submit_question(&mut self) {
        if self.asking {
            return;
        }
        let question = self.question_input.trim().to_string();
        if question.is_empty() {
            return;
        }
        let Some(doc) = self.documents.selected() else {
            self.screen = Screen::Documents;
            return;
        };

        self.asking = true;
        let documents = self.documents.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = documents.ask_question(doc.id, &question).await;
            let _ = tx.send(Outcome::Answer {
                document_id: doc.id,
                question,
                result,
            });
        });
    }
}

//=========================================================================================
// View Helpers
//=========================================================================================

/// Human-readable file size, matching the card view's formatting.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let units = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(units.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, units[exponent])
}

/// Default document title: the file name with its final extension
/// stripped (a bare name is used as-is).
pub fn title_from_file_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => file_name.to_string(),
        Some(index) => file_name[..index].to_string(),
    }
}

/// Content type for the multipart upload, keyed off the extension set
/// the backend accepts.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("txt") => "text/plain",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
