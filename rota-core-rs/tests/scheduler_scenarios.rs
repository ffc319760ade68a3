//! End-to-end roster scenarios driven through the public scheduler API
//! on paused tokio time.

use rota_core::{
    EndReason, OperatorId, Phase, RandomSelector, RecordingPresenter, RosterError, RosterView,
    RotationScheduler, SchedulerConfig, SeededSelector,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const WINDOW: Duration = Duration::from_secs(120);
const PERIOD: Duration = Duration::from_secs(1800);
const SCOPE: i64 = -1001;

/// Always picks the lowest ids
struct Lowest;

impl RandomSelector for Lowest {
    fn select(&self, candidates: &BTreeSet<OperatorId>, count: usize) -> BTreeSet<OperatorId> {
        candidates.iter().copied().take(count).collect()
    }
}

fn setup(selector: Arc<dyn RandomSelector>) -> (RotationScheduler, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::new());
    let scheduler = RotationScheduler::new(SchedulerConfig::default(), selector, presenter.clone());
    (scheduler, presenter)
}

async fn past_enrollment() {
    sleep(WINDOW + Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn three_operators_then_on_duty_leave_ends_session() {
    let (scheduler, presenter) = setup(Arc::new(Lowest));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    for op in [10, 20, 30] {
        scheduler.request_join(1, op).await.unwrap();
    }
    past_enrollment().await;

    let snapshot = scheduler.snapshot(1).await.unwrap();
    assert_eq!(snapshot.phase, Phase::Running);
    assert_eq!(snapshot.on_duty, vec![10, 20]);
    assert_eq!(snapshot.waiting, vec![30]);

    let view = scheduler.request_leave(1, 10).await.unwrap();
    match view {
        RosterView::Ended { snapshot, reason } => {
            assert_eq!(reason, EndReason::QuorumLost);
            // The waiting operator was promoted before quorum was checked
            assert_eq!(snapshot.on_duty, vec![20, 30]);
            assert!(snapshot.waiting.is_empty());
            assert_eq!(snapshot.enrolled.len(), 2);
        }
        other => panic!("Expected Ended view, got {:?}", other),
    }

    assert!(scheduler.registry().is_empty());
    assert_eq!(presenter.deleted_anchors(), vec![1]);
    assert_eq!(
        scheduler.request_join(1, 40).await.unwrap_err(),
        RosterError::SessionNotFound(1)
    );
}

#[tokio::test(start_paused = true)]
async fn quorum_not_reached_frees_registry() {
    let (scheduler, presenter) = setup(Arc::new(Lowest));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    scheduler.request_join(1, 10).await.unwrap();
    scheduler.request_join(1, 20).await.unwrap();
    past_enrollment().await;

    assert!(scheduler.registry().is_empty());
    match presenter.last_view() {
        Some(RosterView::Ended { snapshot, reason }) => {
            assert_eq!(reason, EndReason::QuorumNotReached);
            assert_eq!(snapshot.phase, Phase::Joining);
            assert_eq!(snapshot.enrolled, vec![10, 20]);
        }
        other => panic!("Expected Ended view, got {:?}", other),
    }
    // The notice replaces the panel, the anchor stays
    assert!(presenter.deleted_anchors().is_empty());

    // Nothing keeps ticking for the dead session
    let rendered = presenter.views().len();
    sleep(PERIOD * 2).await;
    assert_eq!(presenter.views().len(), rendered);

    // A new session in another scope is accepted
    let snapshot = scheduler.request_session_start(-2002, 2).await.unwrap();
    assert_eq!(snapshot.scope_id, -2002);
}

#[tokio::test(start_paused = true)]
async fn second_start_rejected_while_active() {
    let (scheduler, _presenter) = setup(Arc::new(Lowest));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    assert_eq!(
        scheduler.request_session_start(-9, 2).await.unwrap_err(),
        RosterError::AlreadyActive { anchor: 1 }
    );
    assert_eq!(scheduler.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn joining_phase_tracks_last_event_per_operator() {
    let (scheduler, _presenter) = setup(Arc::new(Lowest));
    scheduler.request_session_start(SCOPE, 1).await.unwrap();

    scheduler.request_join(1, 1).await.unwrap();
    scheduler.request_join(1, 2).await.unwrap();
    scheduler.request_leave(1, 1).await.unwrap();
    scheduler.request_join(1, 3).await.unwrap();
    scheduler.request_join(1, 3).await.unwrap();
    scheduler.request_leave(1, 4).await.unwrap();

    let snapshot = scheduler.snapshot(1).await.unwrap();
    assert_eq!(snapshot.enrolled, vec![2, 3]);
    assert!(snapshot.on_duty.is_empty());

    // Dropping to zero while joining does not end the session early
    scheduler.request_leave(1, 2).await.unwrap();
    scheduler.request_leave(1, 3).await.unwrap();
    assert_eq!(scheduler.snapshot(1).await.unwrap().phase, Phase::Joining);
}

#[tokio::test(start_paused = true)]
async fn late_joiner_waits_and_rotates_in() {
    let (scheduler, _presenter) = setup(Arc::new(Lowest));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    for op in [1, 2, 3] {
        scheduler.request_join(1, op).await.unwrap();
    }
    past_enrollment().await;

    scheduler.request_join(1, 4).await.unwrap();
    let snapshot = scheduler.snapshot(1).await.unwrap();
    assert_eq!(snapshot.on_duty, vec![1, 2]);
    assert_eq!(snapshot.waiting, vec![3, 4]);

    sleep(PERIOD).await;
    let snapshot = scheduler.snapshot(1).await.unwrap();
    assert_eq!(snapshot.round, 2);
    assert_eq!(snapshot.on_duty, vec![3, 4]);
    assert_eq!(snapshot.waiting, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn rotation_never_repeats_when_enough_fresh_operators() {
    let (scheduler, _presenter) = setup(Arc::new(SeededSelector::new(2024)));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    for op in 1..=6 {
        scheduler.request_join(1, op).await.unwrap();
    }
    past_enrollment().await;

    let mut previous = scheduler.snapshot(1).await.unwrap().on_duty;
    for round in 2..=12 {
        sleep(PERIOD).await;
        let snapshot = scheduler.snapshot(1).await.unwrap();
        assert_eq!(snapshot.round, round);
        assert_eq!(snapshot.on_duty.len(), 2);
        assert!(snapshot.on_duty.iter().all(|op| !previous.contains(op)));
        previous = snapshot.on_duty;
    }
}

#[tokio::test(start_paused = true)]
async fn rotation_at_quorum_floor_keeps_two_on_duty() {
    let (scheduler, _presenter) = setup(Arc::new(SeededSelector::new(7)));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    for op in [1, 2, 3] {
        scheduler.request_join(1, op).await.unwrap();
    }
    past_enrollment().await;

    for _ in 0..10 {
        sleep(PERIOD).await;
        let snapshot = scheduler.snapshot(1).await.unwrap();
        assert_eq!(snapshot.on_duty.len(), 2);
        assert_eq!(snapshot.waiting.len(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_on_duty_leaves_promote_distinct_operators() {
    let (scheduler, _presenter) = setup(Arc::new(Lowest));

    scheduler.request_session_start(SCOPE, 1).await.unwrap();
    for op in 1..=5 {
        scheduler.request_join(1, op).await.unwrap();
    }
    past_enrollment().await;

    let (a, b) = tokio::join!(scheduler.request_leave(1, 1), scheduler.request_leave(1, 2));
    a.unwrap();
    b.unwrap();

    let snapshot = scheduler.snapshot(1).await.unwrap();
    assert_eq!(snapshot.on_duty, vec![3, 4]);
    assert_eq!(snapshot.waiting, vec![5]);
    assert_eq!(snapshot.enrolled, vec![3, 4, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_admit_exactly_one() {
    let (scheduler, _presenter) = setup(Arc::new(Lowest));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.request_session_start(-i, 100 + i).await })
        })
        .collect();

    let mut admitted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(RosterError::AlreadyActive { .. }) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(scheduler.registry().len(), 1);
}
