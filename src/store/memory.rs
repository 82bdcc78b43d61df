use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{JobStore, StatusUpdate, StoreError};
use crate::models::job::{attr, JobAttributes, JobRecord, JobStatus};

/// In-process job store for local runs and tests.
///
/// Expired records (past their `ttl`) are treated as gone.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobAttributes>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw attributes as-is, bypassing all checks.
    pub async fn insert_raw(&self, job_id: impl Into<String>, attrs: JobAttributes) {
        self.jobs.write().await.insert(job_id.into(), attrs);
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

fn is_expired(attrs: &JobAttributes) -> bool {
    attrs
        .get(attr::TTL)
        .and_then(|ttl| ttl.parse::<i64>().ok())
        .is_some_and(|ttl| ttl <= Utc::now().timestamp())
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.get(&record.job_id).is_some_and(|a| !is_expired(a)) {
            return Err(StoreError::AlreadyExists(record.job_id.clone()));
        }
        jobs.insert(record.job_id.clone(), record.to_attributes());
        Ok(())
    }

    async fn fetch(&self, job_id: &str) -> Result<Option<JobAttributes>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(job_id).filter(|a| !is_expired(a)).cloned())
    }

    async fn apply(&self, job_id: &str, update: &StatusUpdate) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let attrs = jobs
            .get_mut(job_id)
            .filter(|a| !is_expired(a))
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        let current = attrs.get(attr::STATUS).cloned().unwrap_or_default();
        let permitted = current
            .parse::<JobStatus>()
            .is_ok_and(|status| update.permits(status));
        if !permitted {
            return Err(StoreError::InvalidTransition {
                job_id: job_id.to_string(),
                from: current,
                to: update.target_status(),
            });
        }

        for (name, value) in update.attributes(Utc::now()) {
            attrs.insert(name.to_string(), value);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
