//! Roster rotation scheduler.
//!
//! Drives sessions through their lifecycle:
//! - Start: register a joining session and arm the one-shot enrollment timer
//! - Enrollment close: below quorum the session ends, otherwise the first
//!   shift is drawn and the recurring rotation timer starts
//! - Rotation tick: draw a new shift, preferring operators who were not on duty
//! - Join/leave: reconcile membership immediately, replacing a departing
//!   on-duty operator and ending a running session that drops below quorum
//!
//! Every trigger locks its session for the whole read-modify-render sequence.
//! Timers carry the session id they were armed for and do nothing when the
//! anchor now holds a different (or no) session.

use crate::config::SchedulerConfig;
use crate::error::RosterError;
use crate::presenter::RosterPresenter;
use crate::registry::{SessionEntry, SessionRegistry};
use crate::selector::{RandomSelector, UniformSelector};
use crate::types::{
    AnchorId, EndReason, OperatorId, Phase, RosterView, ScopeId, SessionSnapshot,
};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What to do with a session's rotation task at teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerDisposal {
    /// Abort it; teardown was triggered from elsewhere
    Cancel,
    /// Let it finish; teardown runs inside the task itself
    Detach,
}

struct Inner {
    config: SchedulerConfig,
    registry: SessionRegistry,
    selector: Arc<dyn RandomSelector>,
    presenter: Arc<dyn RosterPresenter>,
}

/// Cheaply cloneable handle to the roster state machine
#[derive(Clone)]
pub struct RotationScheduler {
    inner: Arc<Inner>,
}

impl RotationScheduler {
    /// Create a scheduler with an explicit selector
    pub fn new(
        config: SchedulerConfig,
        selector: Arc<dyn RandomSelector>,
        presenter: Arc<dyn RosterPresenter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: SessionRegistry::new(),
                selector,
                presenter,
            }),
        }
    }

    /// Create a scheduler drawing shifts uniformly from the thread RNG
    pub fn with_presenter(config: SchedulerConfig, presenter: Arc<dyn RosterPresenter>) -> Self {
        Self::new(config, Arc::new(UniformSelector), presenter)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Open a new roster session bound to `anchor_id`.
    ///
    /// Fails with [`RosterError::AlreadyActive`] while any session exists.
    pub async fn request_session_start(
        &self,
        scope_id: ScopeId,
        anchor_id: AnchorId,
    ) -> Result<SessionSnapshot, RosterError> {
        let handle = self.inner.registry.try_create(scope_id, anchor_id)?;
        let entry = handle.lock().await;
        let snapshot = entry.session().snapshot();

        self.inner.arm_enrollment_timer(anchor_id, snapshot.session_id);
        info!(
            "Scheduler: Session {} open for enrollment ({:?})",
            anchor_id, self.inner.config.enrollment_window
        );

        self.inner.render(RosterView::Active(snapshot.clone())).await;
        Ok(snapshot)
    }

    /// Enroll an operator; returns the view rendered afterwards
    pub async fn request_join(
        &self,
        anchor_id: AnchorId,
        operator: OperatorId,
    ) -> Result<RosterView, RosterError> {
        let handle = self.inner.registry.get(anchor_id)?;
        let mut entry = handle.lock().await;
        if entry.is_retired() {
            return Err(RosterError::SessionNotFound(anchor_id));
        }

        entry.session_mut().join(operator);

        let view = RosterView::Active(entry.session().snapshot());
        self.inner.render(view.clone()).await;
        Ok(view)
    }

    /// Remove an operator; returns the view rendered afterwards, which is
    /// [`RosterView::Ended`] when the departure cost a running session its quorum
    pub async fn request_leave(
        &self,
        anchor_id: AnchorId,
        operator: OperatorId,
    ) -> Result<RosterView, RosterError> {
        let handle = self.inner.registry.get(anchor_id)?;
        let mut entry = handle.lock().await;
        if entry.is_retired() {
            return Err(RosterError::SessionNotFound(anchor_id));
        }

        let departure = entry.session_mut().leave(operator);
        debug!("Scheduler: Session {} departure {:?}", anchor_id, departure);

        let session = entry.session();
        if session.phase() == Phase::Running && !session.has_quorum() {
            let view = self
                .inner
                .teardown(&mut entry, EndReason::QuorumLost, TimerDisposal::Cancel)
                .await;
            return Ok(view);
        }

        let view = RosterView::Active(session.snapshot());
        self.inner.render(view.clone()).await;
        Ok(view)
    }

    /// Current state of a session
    pub async fn snapshot(&self, anchor_id: AnchorId) -> Result<SessionSnapshot, RosterError> {
        let handle = self.inner.registry.get(anchor_id)?;
        let entry = handle.lock().await;
        if entry.is_retired() {
            return Err(RosterError::SessionNotFound(anchor_id));
        }
        Ok(entry.session().snapshot())
    }

    /// Current state of the live session, if there is one
    pub async fn active_snapshot(&self) -> Option<SessionSnapshot> {
        let anchor_id = self.inner.registry.active_anchor()?;
        self.snapshot(anchor_id).await.ok()
    }
}

impl Inner {
    fn arm_enrollment_timer(self: &Arc<Self>, anchor_id: AnchorId, session_id: Uuid) {
        let inner = Arc::downgrade(self);
        let window = self.config.enrollment_window;

        tokio::spawn(async move {
            sleep(window).await;
            if let Some(scheduler) = inner.upgrade() {
                scheduler.close_enrollment(anchor_id, session_id).await;
            }
        });
    }

    fn arm_rotation_timer(
        self: &Arc<Self>,
        anchor_id: AnchorId,
        session_id: Uuid,
    ) -> JoinHandle<()> {
        let inner: Weak<Self> = Arc::downgrade(self);
        let period = self.config.effective_rotation_period();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(scheduler) = inner.upgrade() else {
                    break;
                };
                if !scheduler.rotation_tick(anchor_id, session_id).await {
                    break;
                }
            }
            debug!("Scheduler: Rotation timer for session {} stopped", anchor_id);
        })
    }

    /// Enrollment window elapsed
    async fn close_enrollment(self: &Arc<Self>, anchor_id: AnchorId, session_id: Uuid) {
        let Ok(handle) = self.registry.get(anchor_id) else {
            debug!("Scheduler: Enrollment timer for vanished session {}", anchor_id);
            return;
        };
        let mut entry = handle.lock().await;

        let session = entry.session();
        if entry.is_retired()
            || session.session_id() != session_id
            || session.phase() != Phase::Joining
        {
            debug!("Scheduler: Ignoring stale enrollment timer for session {}", anchor_id);
            return;
        }

        if !session.has_quorum() {
            info!(
                "Scheduler: Session {} closed enrollment with {} operators, quorum not reached",
                anchor_id,
                session.enrolled().len()
            );
            self.teardown(&mut entry, EndReason::QuorumNotReached, TimerDisposal::Cancel)
                .await;
            return;
        }

        entry.session_mut().start_duty(self.selector.as_ref());
        let snapshot = entry.session().snapshot();
        info!(
            "Scheduler: Session {} running, on duty {:?}, waiting {:?}",
            anchor_id, snapshot.on_duty, snapshot.waiting
        );

        self.render(RosterView::Active(snapshot)).await;

        let timer = self.arm_rotation_timer(anchor_id, session_id);
        entry.set_rotation_timer(timer);
    }

    /// Rotation period elapsed. Returns false once the timer should stop.
    async fn rotation_tick(&self, anchor_id: AnchorId, session_id: Uuid) -> bool {
        let Ok(handle) = self.registry.get(anchor_id) else {
            return false;
        };
        let mut entry = handle.lock().await;

        let session = entry.session();
        if entry.is_retired()
            || session.session_id() != session_id
            || session.phase() != Phase::Running
        {
            debug!("Scheduler: Ignoring stale rotation tick for session {}", anchor_id);
            return false;
        }

        if !session.has_quorum() {
            self.teardown(&mut entry, EndReason::QuorumLost, TimerDisposal::Detach)
                .await;
            return false;
        }

        let rotation = entry.session_mut().rotate(self.selector.as_ref());
        let snapshot = entry.session().snapshot();
        info!(
            "Scheduler: Session {} round {}: on duty {:?} (was {:?}{})",
            anchor_id,
            snapshot.round,
            snapshot.on_duty,
            rotation.previous,
            if rotation.repeats_allowed { ", repeats allowed" } else { "" }
        );

        self.render(RosterView::Active(snapshot)).await;
        true
    }

    /// Remove a session for good and show its final notice.
    ///
    /// State is committed (entry retired, registry cleared, timer handled)
    /// before the presenter is called.
    async fn teardown(
        &self,
        entry: &mut SessionEntry,
        reason: EndReason,
        disposal: TimerDisposal,
    ) -> RosterView {
        let snapshot = entry.session().snapshot();
        let (scope_id, anchor_id) = (snapshot.scope_id, snapshot.anchor_id);

        if let Some(timer) = entry.retire() {
            if disposal == TimerDisposal::Cancel {
                timer.abort();
            }
        }
        self.registry.remove(anchor_id);

        info!("Scheduler: Session {} ended: {}", anchor_id, reason);

        let view = RosterView::Ended { snapshot, reason };
        self.render(view.clone()).await;

        if reason == EndReason::QuorumLost {
            if let Err(e) = self.presenter.delete_anchor(scope_id, anchor_id).await {
                debug!("Scheduler: Could not delete anchor {}: {}", anchor_id, e);
            }
        }

        view
    }

    async fn render(&self, view: RosterView) {
        if let Err(e) = self.presenter.render(&view).await {
            warn!(
                "Scheduler: Render for session {} failed: {}",
                view.snapshot().anchor_id,
                e
            );
        }
    }
}
