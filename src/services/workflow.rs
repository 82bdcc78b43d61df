use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Input handed to the translation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInput {
    pub job_id: String,
    pub s3_key: String,
    pub source_language: String,
    pub target_language: String,
}

/// Execution request as it sits on the queue.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub execution_name: String,
    pub input: WorkflowInput,
}

impl ExecutionRequest {
    pub fn for_input(input: &WorkflowInput) -> Self {
        Self {
            execution_name: format!("exec-{}", input.job_id),
            input: input.clone(),
        }
    }
}

/// Starts the external translation workflow for a job.
#[async_trait]
pub trait WorkflowLauncher: Send + Sync {
    /// Request an execution; returns its name.
    async fn start_execution(&self, input: &WorkflowInput) -> Result<String, WorkflowError>;

    async fn health_check(&self) -> Result<(), WorkflowError>;
}

/// Redis list the workflow runner consumes execution requests from.
pub struct RedisWorkflowQueue {
    client: redis::Client,
    queue_key: String,
}

impl RedisWorkflowQueue {
    pub fn new(redis_url: &str, queue_key: impl Into<String>) -> Result<Self, WorkflowError> {
        let client = redis::Client::open(redis_url).map_err(WorkflowError::Redis)?;
        Ok(Self {
            client,
            queue_key: queue_key.into(),
        })
    }

    /// Number of execution requests not yet picked up.
    pub async fn queue_depth(&self) -> Result<u64, WorkflowError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(WorkflowError::Redis)?;
        let depth: u64 = conn.llen(&self.queue_key).await.map_err(WorkflowError::Redis)?;
        Ok(depth)
    }
}

#[async_trait]
impl WorkflowLauncher for RedisWorkflowQueue {
    async fn start_execution(&self, input: &WorkflowInput) -> Result<String, WorkflowError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(WorkflowError::Redis)?;
        let request = ExecutionRequest::for_input(input);
        let payload = serde_json::to_string(&request).map_err(WorkflowError::Serialize)?;
        conn.lpush::<_, _, ()>(&self.queue_key, &payload)
            .await
            .map_err(WorkflowError::Redis)?;
        Ok(request.execution_name)
    }

    async fn health_check(&self) -> Result<(), WorkflowError> {
        let depth = self.queue_depth().await?;
        metrics::gauge!("workflow_queue_depth").set(depth as f64);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
