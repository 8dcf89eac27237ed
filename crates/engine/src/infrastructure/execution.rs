//! Execution strategies for generation jobs.
//!
//! `InlineStrategy` runs a job to completion on the caller's task.
//! `InstanceQueueStrategy` gives every instance its own serial task queue.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use delve_domain::InstanceId;
use futures_util::FutureExt;
use tokio::sync::mpsc;

use crate::infrastructure::ports::{ExecutionStrategy, Job};

/// Awaits each job in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineStrategy;

#[async_trait]
impl ExecutionStrategy for InlineStrategy {
    async fn run(&self, _instance: &InstanceId, job: Job) {
        job.await;
    }
}

/// One worker task per instance, draining that instance's jobs in order.
///
/// A worker closes its queue once it has nothing left to run; the next job
/// for that instance starts a fresh one.
#[derive(Debug, Default)]
pub struct InstanceQueueStrategy {
    queues: Arc<DashMap<InstanceId, InstanceQueue>>,
    next_worker: AtomicU64,
}

#[derive(Debug)]
struct InstanceQueue {
    worker: u64,
    tx: mpsc::UnboundedSender<Job>,
}

impl InstanceQueueStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances that currently own a worker.
    pub fn active_queues(&self) -> usize {
        self.queues.len()
    }

    fn spawn_worker(&self, instance: InstanceId) -> InstanceQueue {
        let worker = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let queues = Arc::clone(&self.queues);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    tracing::error!(instance = %instance, "Generation job panicked");
                }
                // Senders enqueue under the same shard lock, so an empty
                // queue here stays empty once the entry is gone.
                queues.remove_if(&instance, |_, queue| queue.worker == worker && rx.is_empty());
            }
            tracing::debug!(instance = %instance, "Instance queue closed");
        });
        InstanceQueue { worker, tx }
    }
}

#[async_trait]
impl ExecutionStrategy for InstanceQueueStrategy {
    async fn run(&self, instance: &InstanceId, job: Job) {
        let mut queue = self
            .queues
            .entry(instance.clone())
            .or_insert_with(|| self.spawn_worker(instance.clone()));

        if let Err(mpsc::error::SendError(job)) = queue.tx.send(job) {
            tracing::warn!(instance = %instance, "Instance queue worker gone, restarting");
            *queue = self.spawn_worker(instance.clone());
            if queue.tx.send(job).is_err() {
                tracing::error!(instance = %instance, "Could not enqueue generation job");
            }
        }
    }

    fn release(&self, instance: &InstanceId) {
        if self.queues.remove(instance).is_some() {
            tracing::debug!(instance = %instance, "Released instance queue");
        }
    }
}
