//! services/client/src/stores/conversation.rs
//!
//! The per-document conversation history shown in the question panel.
//! Turns are client-only and never persisted; the log is bound to one
//! document id at a time and emptied whenever that binding changes.
//!
//! Requests are not cancellable once issued, so an answer can arrive
//! after the user has switched documents. `record` takes the id of the
//! document the question was asked about and silently drops the turn when
//! it no longer matches the bound document, so a late response from an
//! abandoned panel cannot corrupt the current one.

use askdoc_core::domain::ConversationTurn;

#[derive(Debug, Default)]
pub struct ConversationLog {
    document_id: Option<i64>,
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebinds the log to a document (or to nothing). Binding to a
    /// different document clears the accumulated turns; rebinding to the
    /// same one keeps them.
    pub fn reset_for(&mut self, document_id: Option<i64>) {
        if self.document_id != document_id {
            self.document_id = document_id;
            self.turns.clear();
        }
    }

    /// Appends a turn if `document_id` is still the bound document.
    /// Returns whether the turn was recorded.
    pub fn record(&mut self, document_id: i64, turn: ConversationTurn) -> bool {
        if self.document_id == Some(document_id) {
            self.turns.push(turn);
            true
        } else {
            false
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}
