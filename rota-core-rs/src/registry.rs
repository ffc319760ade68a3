//! Process-wide session registry.
//!
//! Holds at most one live session. The map itself sits behind a synchronous
//! lock that is never held across an await; each session sits behind its own
//! async lock so that triggers for one session run one at a time, including
//! the render that follows a mutation.

use crate::error::RosterError;
use crate::session::Session;
use crate::types::{AnchorId, ScopeId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Shared, lockable handle to a registered session
pub type SessionHandle = Arc<AsyncMutex<SessionEntry>>;

/// A session plus the resources tied to its lifetime
#[derive(Debug)]
pub struct SessionEntry {
    session: Session,
    /// Set at teardown; holders of a stale handle must treat the session as gone
    retired: bool,
    rotation_timer: Option<JoinHandle<()>>,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            retired: false,
            rotation_timer: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn has_rotation_timer(&self) -> bool {
        self.rotation_timer.is_some()
    }

    /// Attach the recurring rotation task, cancelling any previous one
    pub fn set_rotation_timer(&mut self, timer: JoinHandle<()>) {
        if let Some(old) = self.rotation_timer.replace(timer) {
            old.abort();
        }
    }

    /// Mark the entry dead and hand back its rotation task, if any
    pub fn retire(&mut self) -> Option<JoinHandle<()>> {
        self.retired = true;
        self.rotation_timer.take()
    }
}

/// Keyed collection of sessions enforcing global exclusivity
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<AnchorId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new joining session unless any session already exists.
    ///
    /// The emptiness check and the insert happen under one lock acquisition.
    pub fn try_create(
        &self,
        scope_id: ScopeId,
        anchor_id: AnchorId,
    ) -> Result<SessionHandle, RosterError> {
        let mut sessions = self.sessions.lock();

        if let Some(&anchor) = sessions.keys().next() {
            debug!(
                "Registry: Rejecting session {} in scope {}, {} is active",
                anchor_id, scope_id, anchor
            );
            return Err(RosterError::AlreadyActive { anchor });
        }

        let handle = Arc::new(AsyncMutex::new(SessionEntry::new(Session::new(
            scope_id, anchor_id,
        ))));
        sessions.insert(anchor_id, handle.clone());

        info!("Registry: Opened session {} in scope {}", anchor_id, scope_id);
        Ok(handle)
    }

    pub fn get(&self, anchor_id: AnchorId) -> Result<SessionHandle, RosterError> {
        self.sessions
            .lock()
            .get(&anchor_id)
            .cloned()
            .ok_or(RosterError::SessionNotFound(anchor_id))
    }

    /// Remove a session. Removing an absent anchor is a no-op.
    pub fn remove(&self, anchor_id: AnchorId) -> Option<SessionHandle> {
        let removed = self.sessions.lock().remove(&anchor_id);
        if removed.is_some() {
            info!("Registry: Removed session {}", anchor_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Anchor of the live session, if any
    pub fn active_anchor(&self) -> Option<AnchorId> {
        self.sessions.lock().keys().next().copied()
    }
}
