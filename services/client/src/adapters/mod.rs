//! services/client/src/adapters/mod.rs
//!
//! This module contains the concrete implementations ("adapters") of the
//! service ports defined in the `askdoc_core` crate.

pub mod rest;
pub mod vault;
