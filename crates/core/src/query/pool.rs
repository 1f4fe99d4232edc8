//! Bounded fan-out of a predicate over a stream of items.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::QueryError;
use crate::config::QueryConfig;

/// Runs a stateless predicate over items on a fixed number of tasks.
///
/// The producer pushes into a bounded queue; workers share its receiver and
/// forward accepted items to an unbounded collector. Results come back in
/// no particular order.
#[derive(Debug, Clone, Copy)]
pub struct FilterPool {
    workers: usize,
    queue_depth: usize,
}

impl FilterPool {
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_depth: queue_depth.max(1),
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(config.workers, config.queue_depth)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Keep the items for which `predicate` holds.
    ///
    /// The first producer error stops the run; workers are still joined
    /// before it is returned.
    pub async fn filter<T, I, P>(&self, items: I, predicate: P) -> Result<Vec<T>, QueryError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = Result<T, QueryError>>,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        let (work_tx, work_rx) = mpsc::channel::<T>(self.queue_depth);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<T>();

        let workers: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                let work_rx = Arc::clone(&work_rx);
                let result_tx = result_tx.clone();
                let predicate = Arc::clone(&predicate);
                tokio::spawn(async move {
                    loop {
                        let item = work_rx.lock().await.recv().await;
                        let Some(item) = item else { break };
                        if predicate(&item) && result_tx.send(item).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(result_tx);

        let collector = tokio::spawn(async move {
            let mut results = Vec::new();
            while let Some(item) = result_rx.recv().await {
                results.push(item);
            }
            results
        });

        let mut produced = Ok(());
        for item in items {
            match item {
                Ok(item) => {
                    if work_tx.send(item).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    produced = Err(e);
                    break;
                }
            }
        }
        drop(work_tx);

        for worker in workers {
            worker
                .await
                .map_err(|e| QueryError::Worker(e.to_string()))?;
        }
        let results = collector
            .await
            .map_err(|e| QueryError::Worker(e.to_string()))?;

        produced.map(|_| results)
    }
}
