//! Roster session state.
//!
//! A [`Session`] is one in-progress roster run bound to an anchor message.
//! All membership rules live here as plain synchronous transitions:
//! - Joining: operators enroll and withdraw freely, nobody is on duty
//! - Running: exactly [`DUTY_SLOTS`] operators are on duty while quorum holds,
//!   a departing on-duty operator is replaced immediately from the waiting list
//!
//! Timers, locking and teardown are the scheduler's concern.

use crate::selector::RandomSelector;
use crate::types::{AnchorId, OperatorId, Phase, ScopeId, SessionSnapshot};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// Minimum enrolled operators for a roster to start or keep running
pub const QUORUM: usize = 3;

/// Operators on duty at once while running
pub const DUTY_SLOTS: usize = 2;

/// Result of an operator leaving the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Operator was not part of the roster
    NotEnrolled,
    /// Operator left while enrolling or while waiting
    Withdrawn,
    /// An on-duty operator left; `replacement` took the slot if anyone was waiting
    OffDuty { replacement: Option<OperatorId> },
}

/// Outcome of a rotation tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub previous: BTreeSet<OperatorId>,
    /// Too few fresh operators, so the whole roster was eligible
    pub repeats_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    session_id: Uuid,
    scope_id: ScopeId,
    anchor_id: AnchorId,
    phase: Phase,
    enrolled: BTreeSet<OperatorId>,
    on_duty: BTreeSet<OperatorId>,
    waiting: BTreeSet<OperatorId>,
    round: u64,
    opened_at: DateTime<Utc>,
    rotated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create an empty session in the joining phase
    pub fn new(scope_id: ScopeId, anchor_id: AnchorId) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            scope_id,
            anchor_id,
            phase: Phase::Joining,
            enrolled: BTreeSet::new(),
            on_duty: BTreeSet::new(),
            waiting: BTreeSet::new(),
            round: 0,
            opened_at: Utc::now(),
            rotated_at: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    pub fn anchor_id(&self) -> AnchorId {
        self.anchor_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn enrolled(&self) -> &BTreeSet<OperatorId> {
        &self.enrolled
    }

    pub fn on_duty(&self) -> &BTreeSet<OperatorId> {
        &self.on_duty
    }

    pub fn waiting(&self) -> &BTreeSet<OperatorId> {
        &self.waiting
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Check if enough operators are enrolled to run
    pub fn has_quorum(&self) -> bool {
        self.enrolled.len() >= QUORUM
    }

    /// Enroll an operator. Returns false if already enrolled.
    pub fn join(&mut self, operator: OperatorId) -> bool {
        let added = self.enrolled.insert(operator);

        if self.phase == Phase::Running && !self.on_duty.contains(&operator) {
            self.waiting.insert(operator);
        }

        debug!(
            "Session {}: operator {} joined ({:?}, {} enrolled)",
            self.anchor_id,
            operator,
            self.phase,
            self.enrolled.len()
        );
        added
    }

    /// Remove an operator, promoting a waiting operator if a duty slot opens.
    ///
    /// Does not check quorum; the caller decides whether the session survives.
    pub fn leave(&mut self, operator: OperatorId) -> Departure {
        let departure = match self.phase {
            Phase::Joining => {
                if self.enrolled.remove(&operator) {
                    Departure::Withdrawn
                } else {
                    Departure::NotEnrolled
                }
            }
            Phase::Running => {
                if self.on_duty.remove(&operator) {
                    self.enrolled.remove(&operator);
                    let replacement = self.waiting.pop_first();
                    if let Some(next) = replacement {
                        self.on_duty.insert(next);
                    }
                    Departure::OffDuty { replacement }
                } else if self.waiting.remove(&operator) {
                    self.enrolled.remove(&operator);
                    Departure::Withdrawn
                } else {
                    Departure::NotEnrolled
                }
            }
        };

        debug!(
            "Session {}: operator {} left ({:?}, {} enrolled)",
            self.anchor_id,
            operator,
            departure,
            self.enrolled.len()
        );
        departure
    }

    /// Close enrollment: pick the first shift and switch to running.
    ///
    /// Returns false (and changes nothing) unless the session is joining.
    pub fn start_duty(&mut self, selector: &dyn RandomSelector) -> bool {
        if self.phase != Phase::Joining {
            return false;
        }

        let first_shift = selector.select(&self.enrolled, DUTY_SLOTS);
        self.assign(first_shift);
        self.phase = Phase::Running;
        true
    }

    /// Hand duty to a new shift, avoiding the previous one when possible.
    pub fn rotate(&mut self, selector: &dyn RandomSelector) -> Rotation {
        let previous = std::mem::take(&mut self.on_duty);

        let fresh: BTreeSet<OperatorId> = self.enrolled.difference(&previous).copied().collect();
        let repeats_allowed = fresh.len() < DUTY_SLOTS;
        let candidates = if repeats_allowed { &self.enrolled } else { &fresh };

        let next_shift = selector.select(candidates, DUTY_SLOTS);
        self.assign(next_shift);

        Rotation {
            previous,
            repeats_allowed,
        }
    }

    fn assign(&mut self, shift: BTreeSet<OperatorId>) {
        self.on_duty = shift.intersection(&self.enrolled).copied().collect();
        self.waiting = self.enrolled.difference(&self.on_duty).copied().collect();
        self.round += 1;
        self.rotated_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            scope_id: self.scope_id,
            anchor_id: self.anchor_id,
            phase: self.phase,
            enrolled: self.enrolled.iter().copied().collect(),
            on_duty: self.on_duty.iter().copied().collect(),
            waiting: self.waiting.iter().copied().collect(),
            round: self.round,
            opened_at: self.opened_at,
            rotated_at: self.rotated_at,
        }
    }
}
