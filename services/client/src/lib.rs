//! services/client/src/lib.rs
//!
//! Library crate for the AskDoc terminal client: configuration, the REST
//! and token-vault adapters, the shared state stores, and the TUI.

pub mod adapters;
pub mod config;
pub mod error;
pub mod stores;
pub mod tui;
