//! Error types for the roster core

use crate::types::AnchorId;
use thiserror::Error;

/// Errors returned to callers of the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("A roster session is already active (anchor {anchor})")]
    AlreadyActive { anchor: AnchorId },

    #[error("Roster session {0} not found")]
    SessionNotFound(AnchorId),
}

/// Errors raised by presenters; logged and ignored by the scheduler
#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("Render failed: {0}")]
    Render(String),

    #[error("Anchor delete failed: {0}")]
    Delete(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
