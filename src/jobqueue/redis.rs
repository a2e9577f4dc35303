//! Redis Streams-backed `JobQueue`. Consumer groups map onto
//! `XGROUP CREATE ... MKSTREAM` / `XREADGROUP GROUP ... BLOCK ...` / `XACK`,
//! via `redis::aio::ConnectionManager` for transparent reconnects on top of
//! the explicit connect-with-backoff loop below.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::JobQueueError;
use crate::jobqueue::traits::{Delivery, JobQueue, Result};
use crate::model::{AnalysisJob, DispatchResult};

const RECONNECT_BACKOFF_INITIAL_MS: u64 = 50;
const RECONNECT_BACKOFF_MAX_MS: u64 = 5_000;
const CONSUMER_GROUP_START_ID: &str = "0";

pub struct RedisJobQueue {
    manager: ConnectionManager,
    analysis_stream: String,
    dispatch_stream: String,
    consumer_group: String,
}

impl RedisJobQueue {
    pub async fn connect(
        redis_url: &str,
        analysis_stream: impl Into<String>,
        dispatch_stream: impl Into<String>,
        consumer_group: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let manager = Self::connect_with_backoff(redis_url).await?;
        Ok(Self {
            manager,
            analysis_stream: analysis_stream.into(),
            dispatch_stream: dispatch_stream.into(),
            consumer_group: consumer_group.into(),
        })
    }

    async fn connect_with_backoff(redis_url: &str) -> anyhow::Result<ConnectionManager> {
        let mut backoff_ms = RECONNECT_BACKOFF_INITIAL_MS;
        loop {
            let client = redis::Client::open(redis_url)?;
            match client.get_connection_manager().await {
                Ok(manager) => return Ok(manager),
                Err(e) => {
                    tracing::warn!("redis connect failed ({}), retrying in {}ms", e, backoff_ms);
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(RECONNECT_BACKOFF_MAX_MS);
                }
            }
        }
    }

    fn op_err(e: redis::RedisError) -> JobQueueError {
        JobQueueError::Operation(e.to_string())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn publish_analysis(&self, job: &AnalysisJob) -> Result<()> {
        let payload = serde_json::to_string(job)
            .map_err(|e| JobQueueError::Operation(format!("serialize job: {e}")))?;
        let mut conn = self.manager.clone();
        let _: String = conn
            .xadd(&self.analysis_stream, "*", &[("payload", payload)])
            .await
            .map_err(Self::op_err)?;
        Ok(())
    }

    async fn next_job(&self, consumer_name: &str, block_ms: u64) -> Result<Option<Delivery>> {
        let mut conn = self.manager.clone();

        let reply: redis::streams::StreamReadReply = conn
            .xread_options(
                &[&self.analysis_stream],
                &[">"],
                &redis::streams::StreamReadOptions::default()
                    .group(&self.consumer_group, consumer_name)
                    .count(1)
                    .block(block_ms as usize),
            )
            .await
            .map_err(Self::op_err)?;

        for stream_key in reply.keys {
            for entry in stream_key.ids {
                let payload: Option<String> = entry.map.get("payload").and_then(|v| match v {
                    redis::Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
                    redis::Value::SimpleString(s) => Some(s.clone()),
                    _ => None,
                });

                let Some(payload) = payload else {
                    // Poison pill: no parseable payload field. Ack and move on.
                    tracing::warn!("dropping malformed entry {} (no payload)", entry.id);
                    let _ = self.ack(&entry.id).await;
                    continue;
                };

                match serde_json::from_str::<AnalysisJob>(&payload) {
                    Ok(job) => {
                        return Ok(Some(Delivery {
                            delivery_id: entry.id,
                            job,
                        }))
                    }
                    Err(e) => {
                        tracing::warn!("dropping unparseable entry {}: {}", entry.id, e);
                        let _ = self.ack(&entry.id).await;
                        continue;
                    }
                }
            }
        }

        Ok(None)
    }

    async fn ack(&self, delivery_id: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: i64 = conn
            .xack(&self.analysis_stream, &self.consumer_group, &[delivery_id])
            .await
            .map_err(Self::op_err)?;
        Ok(())
    }

    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<()> {
        let payload = serde_json::to_string(result)
            .map_err(|e| JobQueueError::Operation(format!("serialize result: {e}")))?;
        let mut conn = self.manager.clone();
        let _: String = conn
            .xadd(&self.dispatch_stream, "*", &[("payload", payload)])
            .await
            .map_err(Self::op_err)?;
        Ok(())
    }

    async fn ensure_group(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let result: redis::RedisResult<String> = conn
            .xgroup_create_mkstream(&self.analysis_stream, &self.consumer_group, CONSUMER_GROUP_START_ID)
            .await;

        if let Err(e) = result {
            if !e.to_string().contains("BUSYGROUP") {
                return Err(Self::op_err(e));
            }
        }
        Ok(())
    }
}
