//! crates/askdoc_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a document uploaded by the authenticated user.
///
/// The `id` is server-assigned; every field except `title` is immutable
/// from the client's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    /// URI of the stored file on the backend.
    pub file: String,
    pub file_name: String,
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The identity of the signed-in user, decoded from the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// The claims the backend places in the access token payload.
///
/// The client decodes these for display only; it never verifies the
/// signature (the backend is the sole authority on token validity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub username: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

/// The access/refresh token pair returned by the token endpoint.
///
/// The refresh token is persisted alongside the access token but no
/// refresh flow exercises it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// A staged file upload: raw bytes plus the metadata the backend needs
/// to build the multipart request.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Represents a single question-and-answer exchange about a document.
///
/// Turns are ephemeral and client-only: they live in memory for as long
/// as the document they belong to stays selected.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}
