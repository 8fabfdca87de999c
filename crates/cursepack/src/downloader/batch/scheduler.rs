//! Bounded worker pool for a batch
//!
//! Every item becomes a spawned task gated by a semaphore sized to the pool.
//! Tasks report `(index, outcome)` over a channel; the drain loop consumes them in
//! completion order, drives progress, and stops once it has one outcome per item.
//! It then joins every task, so nothing is still running when `run` returns.

use super::RetryingTask;
use crate::downloader::core::{AssetRequest, DownloadOutcome, ProgressCallback, ProgressEvent};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error};

/// Fixed-size worker pool running [`RetryingTask`]s
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    workers: usize,
}

impl Scheduler {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every request to a terminal outcome; the result is indexed like `requests`
    pub async fn run(
        &self,
        task: Arc<RetryingTask>,
        requests: &[AssetRequest],
        progress: Option<ProgressCallback>,
    ) -> Vec<DownloadOutcome> {
        let total = requests.len();
        debug!("Scheduling {} items on {} workers", total, self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, DownloadOutcome)>();

        let mut handles = Vec::with_capacity(total);
        for (index, request) in requests.iter().cloned().enumerate() {
            let task = task.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so this only waits for a free worker
                let _permit = semaphore.acquire_owned().await.ok();
                let fallback_name = request.display_name();

                let outcome = AssertUnwindSafe(task.run(index, request))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!("Worker for item #{} panicked", index);
                        DownloadOutcome::DownloadFailed {
                            filename: fallback_name,
                            attempts: 0,
                            last_error: "worker panicked".to_string(),
                        }
                    });

                let _ = tx.send((index, outcome));
            }));
        }
        drop(tx);

        let mut outcomes: Vec<Option<DownloadOutcome>> = vec![None; total];
        let mut completed = 0;
        while completed < total {
            let Some((index, outcome)) = rx.recv().await else {
                break;
            };
            completed += 1;

            if let Some(ref callback) = progress {
                callback(ProgressEvent::ItemFinished {
                    index,
                    completed,
                    total,
                    outcome: outcome.clone(),
                });
            }
            outcomes[index] = Some(outcome);
        }

        futures::future::join_all(handles).await;

        outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.unwrap_or_else(|| {
                    error!("Item #{} finished without reporting an outcome", index);
                    DownloadOutcome::DownloadFailed {
                        filename: requests[index].display_name(),
                        attempts: 0,
                        last_error: "no outcome reported".to_string(),
                    }
                })
            })
            .collect()
    }
}
