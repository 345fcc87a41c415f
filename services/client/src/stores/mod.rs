//! services/client/src/stores/mod.rs
//!
//! The two shared state containers (session, documents) plus the
//! ephemeral per-document conversation log. Views never talk to the
//! network themselves: every call routes through a store, and stores
//! reach the backend only through the core ports.

pub mod conversation;
pub mod documents;
pub mod session;

pub use conversation::ConversationLog;
pub use documents::DocumentStore;
pub use session::{AuthState, SessionStore};
