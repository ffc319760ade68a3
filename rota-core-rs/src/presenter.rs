//! Presenter hook consumed by the scheduler.

use crate::error::PresenterError;
use crate::types::{AnchorId, RosterView, ScopeId};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Renders roster state for the outside world.
///
/// Called while the session lock is held, after every accepted change and
/// once more at teardown with [`RosterView::Ended`]. Errors are logged by the
/// scheduler and never roll back state.
#[async_trait]
pub trait RosterPresenter: Send + Sync {
    async fn render(&self, view: &RosterView) -> Result<(), PresenterError>;

    /// Best-effort removal of the anchor message at teardown
    async fn delete_anchor(&self, scope_id: ScopeId, anchor_id: AnchorId)
        -> Result<(), PresenterError>;
}

/// Presenter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

#[async_trait]
impl RosterPresenter for NullPresenter {
    async fn render(&self, _view: &RosterView) -> Result<(), PresenterError> {
        Ok(())
    }

    async fn delete_anchor(
        &self,
        _scope_id: ScopeId,
        _anchor_id: AnchorId,
    ) -> Result<(), PresenterError> {
        Ok(())
    }
}

/// Presenter that keeps every view and anchor deletion in memory.
///
/// Useful for tests and for embedding the scheduler behind a poller.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    views: Mutex<Vec<RosterView>>,
    deleted: Mutex<Vec<AnchorId>>,
    failing: bool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records everything but reports every call as failed
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn views(&self) -> Vec<RosterView> {
        self.views.lock().clone()
    }

    pub fn last_view(&self) -> Option<RosterView> {
        self.views.lock().last().cloned()
    }

    pub fn deleted_anchors(&self) -> Vec<AnchorId> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl RosterPresenter for RecordingPresenter {
    async fn render(&self, view: &RosterView) -> Result<(), PresenterError> {
        self.views.lock().push(view.clone());
        if self.failing {
            return Err(PresenterError::Render("recording presenter set to fail".into()));
        }
        Ok(())
    }

    async fn delete_anchor(
        &self,
        _scope_id: ScopeId,
        anchor_id: AnchorId,
    ) -> Result<(), PresenterError> {
        self.deleted.lock().push(anchor_id);
        if self.failing {
            return Err(PresenterError::Delete(format!("anchor {} is gone", anchor_id)));
        }
        Ok(())
    }
}
