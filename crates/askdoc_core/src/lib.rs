pub mod domain;
pub mod ports;

pub use domain::{ConversationTurn, CurrentUser, Document, DocumentUpload, TokenClaims, TokenPair};
pub use ports::{AuthApi, DocumentApi, PortError, PortResult, TokenVault};
