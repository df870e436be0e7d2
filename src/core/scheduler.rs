// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Named task registry with a shared shutdown signal

use std::future::Future;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

struct ScheduledTask {
    name: String,
    handle: JoinHandle<Result<()>>,
}

/// Spawns long-running tasks and shuts them all down together.
///
/// Each task receives its own shutdown receiver at spawn time, so a
/// shutdown sent later is always observed.
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            tasks: Vec::new(),
            shutdown_tx,
        }
    }

    pub fn spawn<F, Fut>(&mut self, name: &str, task: F)
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(task(self.shutdown_tx.subscribe()));
        self.tasks.push(ScheduledTask {
            name: name.to_string(),
            handle,
        });
        debug!("Spawned task '{}'", name);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Signal every task and wait for all of them to return
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(());

        let tasks = std::mem::take(&mut self.tasks);
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
        let results = futures::future::join_all(tasks.into_iter().map(|t| t.handle)).await;

        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(Ok(())) => debug!("Task '{}' stopped", name),
                Ok(Err(e)) => warn!("Task '{}' exited with error: {}", name, e),
                Err(e) => error!("Task '{}' panicked or was aborted: {}", name, e),
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shutdown_joins_all_tasks() {
        let mut scheduler = Scheduler::new();
        let stopped = Arc::new(AtomicUsize::new(0));

        for i in 0..3 {
            let stopped = stopped.clone();
            scheduler.spawn(&format!("worker-{}", i), move |mut shutdown| async move {
                let _ = shutdown.recv().await;
                stopped.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(scheduler.names(), vec!["worker-0", "worker-1", "worker-2"]);

        scheduler.shutdown().await;
        assert_eq!(stopped.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_empty());
    }
}
