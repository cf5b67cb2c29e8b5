use rspace_core::contract::ClientError;
use rspace_core::pool::{run_pool, TaskOutcome, CHANNEL_CAPACITY, DEFAULT_WORKERS};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn every_task_yields_exactly_one_outcome() {
    for n in 1..=(3 * CHANNEL_CAPACITY + 2) {
        let tasks: Vec<usize> = (0..n).collect();
        let outcomes = run_pool(tasks, DEFAULT_WORKERS, |t: usize| async move {
            Ok::<usize, ClientError>(t * 10)
        })
        .await;

        assert_eq!(outcomes.len(), n, "expected {n} outcomes");
        let indices: BTreeSet<usize> = outcomes.iter().map(|o| o.index()).collect();
        assert_eq!(indices, (0..n).collect::<BTreeSet<_>>());
        for outcome in &outcomes {
            match outcome {
                TaskOutcome::Succeeded { index, value } => assert_eq!(*value, index * 10),
                TaskOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
            }
        }
    }
}

#[tokio::test]
async fn failures_and_panics_are_reported_not_lost() {
    let tasks: Vec<usize> = (0..12).collect();
    let outcomes = run_pool(tasks, DEFAULT_WORKERS, |t: usize| async move {
        if t == 5 {
            panic!("worker blew up on {t}");
        }
        if t % 3 == 0 {
            return Err(ClientError::from(format!("409 Conflict for task {t}")));
        }
        Ok(t)
    })
    .await;

    assert_eq!(outcomes.len(), 12);
    let failed: BTreeSet<usize> = outcomes
        .iter()
        .filter(|o| !o.is_success())
        .map(|o| o.index())
        .collect();
    assert_eq!(failed, BTreeSet::from([0, 3, 5, 6, 9]));

    let panicked = outcomes
        .iter()
        .find(|o| o.index() == 5)
        .expect("outcome for the panicking task");
    match panicked {
        TaskOutcome::Failed { error, .. } => assert!(error.contains("worker blew up on 5")),
        TaskOutcome::Succeeded { .. } => panic!("panicking task reported success"),
    }
}

#[tokio::test]
async fn never_runs_more_tasks_at_once_than_workers() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let tasks: Vec<usize> = (0..20).collect();

    let (r, p) = (running.clone(), peak.clone());
    let outcomes = run_pool(tasks, DEFAULT_WORKERS, move |t: usize| {
        let running = r.clone();
        let peak = p.clone();
        async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            Ok::<usize, ClientError>(t)
        }
    })
    .await;

    assert_eq!(outcomes.len(), 20);
    assert!(peak.load(Ordering::SeqCst) <= DEFAULT_WORKERS);
}

#[tokio::test]
async fn empty_input_returns_immediately() {
    let outcomes = run_pool(Vec::<usize>::new(), DEFAULT_WORKERS, |t: usize| async move {
        Ok::<usize, ClientError>(t)
    })
    .await;
    assert!(outcomes.is_empty());
}
