//! crates/askdoc_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! stores to be independent of the concrete HTTP transport and token storage.

use async_trait::async_trait;

use crate::domain::{Document, DocumentUpload, TokenPair};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The backend denied the request (401), with the server's reason
    /// (bad credentials on login, an invalid token elsewhere). The
    /// transport has already discarded any persisted credentials by the
    /// time callers see this.
    #[error("{0}")]
    Unauthorized(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backend rejected the request and provided a reason
    /// (bad credentials, a taken username, an invalid payload).
    #[error("{0}")]
    Rejected(String),
    /// The request never completed (connection refused, timeout).
    #[error("Network error: {0}")]
    Network(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The authentication endpoints of the backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for an access/refresh token pair.
    async fn obtain_tokens(&self, username: &str, password: &str) -> PortResult<TokenPair>;

    /// Registers a new account. The caller is expected to log in
    /// afterwards; registration itself returns no tokens.
    async fn register(&self, username: &str, password: &str) -> PortResult<()>;
}

/// The document and question-answering endpoints of the backend.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Lists the authenticated user's documents, in server order.
    async fn list_documents(&self) -> PortResult<Vec<Document>>;

    /// Uploads a new document; the server assigns the id.
    async fn upload_document(&self, upload: &DocumentUpload) -> PortResult<Document>;

    /// Renames a document. Only the title is sent; the server returns
    /// the updated record.
    async fn rename_document(&self, id: i64, title: &str) -> PortResult<Document>;

    /// Deletes a document.
    async fn delete_document(&self, id: i64) -> PortResult<()>;

    /// Asks a question about one document and returns the answer text.
    async fn ask_question(&self, document_id: i64, question: &str) -> PortResult<String>;
}

/// Persistent storage for the two token strings.
///
/// This is the only client-side persistence in the application.
pub trait TokenVault: Send + Sync {
    /// Returns the stored pair, or `None` when no tokens are persisted.
    fn load(&self) -> PortResult<Option<TokenPair>>;

    /// Persists both tokens, replacing any previous pair.
    fn store(&self, tokens: &TokenPair) -> PortResult<()>;

    /// Removes both tokens. Clearing an empty vault is a no-op.
    fn clear(&self) -> PortResult<()>;
}
