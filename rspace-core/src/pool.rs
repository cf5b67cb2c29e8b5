//! Bounded worker pool for independent remote submissions.
//!
//! A producer task feeds a bounded task channel; a fixed number of workers
//! pull from it and publish to a bounded result channel that the caller
//! drains. Every consumed task produces exactly one [`TaskOutcome`], even
//! when its future fails or panics, so draining by count always terminates.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::contract::ClientError;

/// Number of concurrent workers used for bulk user creation.
pub const DEFAULT_WORKERS: usize = 3;

/// Capacity of both the task and the result channel.
pub const CHANNEL_CAPACITY: usize = 5;

/// The result of one task. `index` is the task's position in the input.
#[derive(Debug)]
pub enum TaskOutcome<R> {
    Succeeded { index: usize, value: R },
    Failed { index: usize, error: String },
}

impl<R> TaskOutcome<R> {
    pub fn index(&self) -> usize {
        match self {
            TaskOutcome::Succeeded { index, .. } | TaskOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Runs `submit` over every task using `workers` concurrent workers and
/// returns one outcome per task, in completion order.
pub async fn run_pool<T, R, F, Fut>(tasks: Vec<T>, workers: usize, submit: F) -> Vec<TaskOutcome<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ClientError>> + Send + 'static,
{
    let expected = tasks.len();
    let workers = workers.max(1);
    let (task_tx, task_rx) = mpsc::channel::<(usize, T)>(CHANNEL_CAPACITY);
    let (result_tx, mut result_rx) = mpsc::channel::<TaskOutcome<R>>(CHANNEL_CAPACITY);
    let task_rx = Arc::new(Mutex::new(task_rx));
    let submit = Arc::new(submit);

    info!(tasks = expected, workers, "Starting worker pool");

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let task_rx = Arc::clone(&task_rx);
        let result_tx = result_tx.clone();
        let submit = Arc::clone(&submit);
        handles.push(tokio::spawn(async move {
            loop {
                let next = task_rx.lock().await.recv().await;
                let Some((index, task)) = next else {
                    break;
                };
                debug!(worker, index, "Worker picked up task");
                // the call itself happens inside the async block so a panic
                // while building the future is caught as well
                let submit = Arc::clone(&submit);
                let attempt = AssertUnwindSafe(async move { submit(task).await }).catch_unwind();
                let outcome = match attempt.await {
                    Ok(Ok(value)) => TaskOutcome::Succeeded { index, value },
                    Ok(Err(e)) => TaskOutcome::Failed {
                        index,
                        error: e.to_string(),
                    },
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(worker, index, panic = %message, "Submission task panicked");
                        TaskOutcome::Failed {
                            index,
                            error: format!("task panicked: {message}"),
                        }
                    }
                };
                if result_tx.send(outcome).await.is_err() {
                    break;
                }
            }
            debug!(worker, "Worker finished");
        }));
    }
    drop(result_tx);

    let producer = tokio::spawn(async move {
        for (index, task) in tasks.into_iter().enumerate() {
            if task_tx.send((index, task)).await.is_err() {
                break;
            }
        }
    });

    let mut outcomes = Vec::with_capacity(expected);
    while outcomes.len() < expected {
        match result_rx.recv().await {
            Some(outcome) => outcomes.push(outcome),
            None => break,
        }
    }

    if let Err(e) = producer.await {
        error!(error = %e, "Task producer failed");
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Worker did not shut down cleanly");
        }
    }

    info!(
        expected,
        received = outcomes.len(),
        succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
        "Worker pool drained"
    );
    outcomes
}
