//! The `JobQueue` abstraction. At-least-once, pull-based, consumer-group
//! semantics with explicit ack.

use async_trait::async_trait;

use crate::error::JobQueueError;
use crate::model::{AnalysisJob, DispatchResult};

pub type Result<T> = std::result::Result<T, JobQueueError>;

/// A job delivered to a consumer, paired with the delivery id it must be
/// acked with.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Stream-assigned delivery id (Redis Streams entry id).
    pub delivery_id: String,
    pub job: AnalysisJob,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish a unit of work onto the analysis stream.
    async fn publish_analysis(&self, job: &AnalysisJob) -> Result<()>;

    /// Pull the next pending job for `consumer_name` within `consumer_group`,
    /// blocking up to `block_ms`. Returns `None` on timeout. A message that
    /// fails to parse is auto-acked and dropped (poison-pill handling) and
    /// this call continues to the next entry rather than returning it.
    async fn next_job(&self, consumer_name: &str, block_ms: u64) -> Result<Option<Delivery>>;

    /// Acknowledge successful processing of `delivery_id`, removing it from
    /// the consumer group's pending set.
    async fn ack(&self, delivery_id: &str) -> Result<()>;

    /// Publish a completed job's result onto the dispatch stream.
    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<()>;

    /// Ensure the consumer group exists on the analysis stream, creating the
    /// stream if necessary.
    async fn ensure_group(&self) -> Result<()>;
}
