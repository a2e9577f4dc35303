//! In-memory `JobQueue` for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::jobqueue::traits::{Delivery, JobQueue, Result};
use crate::model::{AnalysisJob, DispatchResult};

#[derive(Default)]
pub struct MockJobQueue {
    pending: Mutex<VecDeque<Delivery>>,
    acked: Mutex<Vec<String>>,
    pub dispatched: Mutex<Vec<DispatchResult>>,
    next_id: AtomicU64,
}

impl MockJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acked_ids(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for MockJobQueue {
    async fn publish_analysis(&self, job: &AnalysisJob) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().unwrap().push_back(Delivery {
            delivery_id: format!("{id}-0"),
            job: job.clone(),
        });
        Ok(())
    }

    async fn next_job(&self, _consumer_name: &str, _block_ms: u64) -> Result<Option<Delivery>> {
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn ack(&self, delivery_id: &str) -> Result<()> {
        self.acked.lock().unwrap().push(delivery_id.to_string());
        Ok(())
    }

    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<()> {
        self.dispatched.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn ensure_group(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_next_job_roundtrips() {
        let queue = MockJobQueue::new();
        let job = AnalysisJob {
            job_id: "1".into(),
            repo_name: "acme/widgets".into(),
            commit_sha: "deadbeef".into(),
            event: "push".into(),
            pr_number: None,
            received_at: "2026-01-01T00:00:00Z".into(),
        };
        queue.publish_analysis(&job).await.unwrap();

        let delivery = queue.next_job("worker-1", 0).await.unwrap().unwrap();
        assert_eq!(delivery.job.commit_sha, "deadbeef");

        queue.ack(&delivery.delivery_id).await.unwrap();
        assert_eq!(queue.acked_ids(), vec![delivery.delivery_id]);
    }
}
