//! Scheduling port for generation work.

use async_trait::async_trait;
use delve_domain::InstanceId;
use futures_util::future::BoxFuture;

/// A unit of generation work. Reports its own outcome; the strategy only runs it.
pub type Job = BoxFuture<'static, ()>;

/// Decides where and when generation work for an instance runs.
///
/// Implementations must run jobs for one instance one at a time, in
/// submission order. Jobs for different instances may overlap.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Submit a job. Returns once the job is accepted, which for inline
    /// strategies means once it has finished.
    async fn run(&self, instance: &InstanceId, job: Job);

    /// Drop any per-instance resources held for `instance`.
    fn release(&self, _instance: &InstanceId) {}
}
