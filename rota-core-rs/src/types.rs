//! Core types for the ROTA roster

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the channel a roster belongs to
pub type ScopeId = i64;

/// Identifier of the status message a session is bound to (registry key)
pub type AnchorId = i64;

/// Identifier of an operator eligible for duty
pub type OperatorId = i64;

/// Roster session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Enrollment window is open, nobody is on duty yet
    Joining,
    /// Duty is assigned and rotates periodically
    Running,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Joining
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Joining => write!(f, "joining"),
            Phase::Running => write!(f, "running"),
        }
    }
}

/// Why a session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Enrollment window closed with fewer than quorum operators
    QuorumNotReached,
    /// A running roster fell below quorum
    QuorumLost,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::QuorumNotReached => write!(f, "quorum not reached"),
            EndReason::QuorumLost => write!(f, "quorum lost"),
        }
    }
}

/// Serializable copy of a session's observable state.
///
/// Membership lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub scope_id: ScopeId,
    pub anchor_id: AnchorId,
    pub phase: Phase,
    pub enrolled: Vec<OperatorId>,
    pub on_duty: Vec<OperatorId>,
    pub waiting: Vec<OperatorId>,
    /// Number of duty assignments performed so far
    pub round: u64,
    pub opened_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Serialize snapshot to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What a presenter is asked to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RosterView {
    /// Session is live, show its current panel
    Active(SessionSnapshot),
    /// Session has been torn down, show the final notice
    Ended {
        snapshot: SessionSnapshot,
        reason: EndReason,
    },
}

impl RosterView {
    /// Snapshot carried by either variant
    pub fn snapshot(&self) -> &SessionSnapshot {
        match self {
            RosterView::Active(snapshot) => snapshot,
            RosterView::Ended { snapshot, .. } => snapshot,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RosterView::Ended { .. })
    }
}
