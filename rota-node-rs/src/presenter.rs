//! Plain-text roster panels
//!
//! Renders what the chat front end would show on the anchor message:
//! the enrollment panel, the running panel and the final notices.

use crate::directory::OperatorDirectory;
use async_trait::async_trait;
use rota_core::{
    AnchorId, EndReason, OperatorId, Phase, PresenterError, RosterPresenter, RosterView,
    ScopeId, SessionSnapshot, QUORUM,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const HEADER: &str = "ROTA duty roster";

pub struct TextPresenter {
    directory: Arc<OperatorDirectory>,
    enrollment_window: Duration,
    rotation_period: Duration,
}

impl TextPresenter {
    pub fn new(
        directory: Arc<OperatorDirectory>,
        enrollment_window: Duration,
        rotation_period: Duration,
    ) -> Self {
        Self {
            directory,
            enrollment_window,
            rotation_period,
        }
    }

    fn roster_list(&self, operators: &[OperatorId]) -> String {
        if operators.is_empty() {
            return "- Nobody".to_string();
        }
        operators
            .iter()
            .map(|op| format!("* Operator {}", self.directory.display(*op)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn joining_panel(&self, snapshot: &SessionSnapshot) -> String {
        format!(
            "{}\n\nOpening the duty roster.\nFor the next {} you can join or leave the session.\n\nOperators in session:\n{}",
            HEADER,
            minutes(self.enrollment_window),
            self.roster_list(&snapshot.enrolled)
        )
    }

    fn running_panel(&self, snapshot: &SessionSnapshot) -> String {
        format!(
            "{}\n\nDuty roster active (round {}).\n\nCurrent shift ({}):\n{}\n\nWaiting for a shift:\n{}\n\nOperators in session:\n{}",
            HEADER,
            snapshot.round,
            minutes(self.rotation_period),
            self.roster_list(&snapshot.on_duty),
            self.roster_list(&snapshot.waiting),
            self.roster_list(&snapshot.enrolled)
        )
    }

    /// Text shown on the anchor message for `view`
    pub fn format_view(&self, view: &RosterView) -> String {
        match view {
            RosterView::Active(snapshot) => match snapshot.phase {
                Phase::Joining => self.joining_panel(snapshot),
                Phase::Running => self.running_panel(snapshot),
            },
            RosterView::Ended {
                reason: EndReason::QuorumNotReached,
                ..
            } => format!(
                "{}\n\nThe session cannot start.\nThe minimum of {} operators was not reached.",
                HEADER, QUORUM
            ),
            RosterView::Ended {
                reason: EndReason::QuorumLost,
                ..
            } => format!(
                "The session has ended: fewer than {} operators remain.\nSession messages will be removed.",
                QUORUM
            ),
        }
    }
}

fn minutes(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs % 60 == 0 {
        let mins = secs / 60;
        if mins == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", mins)
        }
    } else {
        format!("{} seconds", secs)
    }
}

#[async_trait]
impl RosterPresenter for TextPresenter {
    async fn render(&self, view: &RosterView) -> Result<(), PresenterError> {
        let text = self.format_view(view);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "\n[anchor {}]\n{}\n", view.snapshot().anchor_id, text)?;
        stdout.flush()?;
        Ok(())
    }

    async fn delete_anchor(
        &self,
        scope_id: ScopeId,
        anchor_id: AnchorId,
    ) -> Result<(), PresenterError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "[anchor {} removed from scope {}]", anchor_id, scope_id)?;
        Ok(())
    }
}
