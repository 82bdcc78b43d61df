//! Job record store.
//!
//! Records are kept as flat string attribute maps, the way the workflow
//! runner writes them. Readers map them into [`JobRecord`] right after
//! retrieval; writers go through [`StatusUpdate`] so status only moves forward.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::job::{attr, format_timestamp, JobAttributes, JobRecord, JobStatus};
use crate::models::progress::RawProgress;
use crate::models::stats::RawStats;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryJobStore;
pub use redis_store::RedisJobStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Write a new record. Fails if a record with the same id exists.
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Fetch the raw attributes of a record, `None` if unknown or expired.
    async fn fetch(&self, job_id: &str) -> Result<Option<JobAttributes>, StoreError>;

    /// Apply a status-writer update, rejecting backward transitions.
    async fn apply(&self, job_id: &str, update: &StatusUpdate) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// An update as issued by the status writer.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The workflow picked the job up.
    Processing,
    /// Fresh progress for a job that is already processing.
    Progress(RawProgress),
    Completed {
        output_s3_key: String,
        download_url: String,
        stats: Option<RawStats>,
    },
    Failed {
        error: String,
    },
}

impl StatusUpdate {
    pub fn target_status(&self) -> JobStatus {
        match self {
            StatusUpdate::Processing | StatusUpdate::Progress(_) => JobStatus::Processing,
            StatusUpdate::Completed { .. } => JobStatus::Completed,
            StatusUpdate::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Whether this update may be applied to a record currently in `current`.
    pub fn permits(&self, current: JobStatus) -> bool {
        match self {
            StatusUpdate::Processing => current == JobStatus::Pending,
            StatusUpdate::Progress(_) => current == JobStatus::Processing,
            other => current.can_advance_to(other.target_status()),
        }
    }

    /// Stored status spellings this update may be applied to.
    pub fn permitted_spellings(&self) -> Vec<&'static str> {
        JobStatus::spellings_where(|s| self.permits(s))
    }

    /// Attributes to write, status and the matching timestamp included.
    pub fn attributes(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let status = (attr::STATUS, self.target_status().to_string());
        let now = format_timestamp(now);
        match self {
            StatusUpdate::Processing => vec![status, (attr::STARTED_AT, now)],
            StatusUpdate::Progress(progress) => vec![status, (attr::PROGRESS, progress.to_json())],
            StatusUpdate::Completed {
                output_s3_key,
                download_url,
                stats,
            } => {
                let mut fields = vec![
                    status,
                    (attr::OUTPUT_S3_KEY, output_s3_key.clone()),
                    (attr::DOWNLOAD_URL, download_url.clone()),
                    (attr::COMPLETED_AT, now),
                ];
                if let Some(stats) = stats {
                    fields.push((attr::STATS, stats.to_json()));
                }
                fields
            }
            StatusUpdate::Failed { error } => vec![
                status,
                (attr::ERROR, error.clone()),
                (attr::FAILED_AT, now),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("job {0} already exists")]
    AlreadyExists(String),

    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: JobStatus,
    },
}
