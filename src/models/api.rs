use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::{serialize_opt_timestamp, serialize_timestamp, JobRecord, JobStatus};
use crate::models::progress::{ProgressView, RawProgress};
use crate::models::stats::StatsView;

pub const DEFAULT_SOURCE_LANGUAGE: &str = "Japanese";
pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Body of `POST /start-job`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,

    #[garde(length(max = 64))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,

    #[garde(length(max = 64))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

impl StartJobRequest {
    pub fn source_language_or_default(&self) -> &str {
        non_blank(self.source_language.as_deref()).unwrap_or(DEFAULT_SOURCE_LANGUAGE)
    }

    pub fn target_language_or_default(&self) -> &str {
        non_blank(self.target_language.as_deref()).unwrap_or(DEFAULT_TARGET_LANGUAGE)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Response after a job was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// Response for `GET /job-status/{jobId}`.
///
/// The base fields are always present; everything else comes from the
/// status-tagged [`JobDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub detail: JobDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobDetail {
    Pending,
    #[serde(rename_all = "camelCase")]
    Processing {
        #[serde(serialize_with = "serialize_opt_timestamp")]
        started_at: Option<DateTime<Utc>>,
        progress: Option<ProgressView>,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        download_url: String,
        output_s3_key: String,
        stats: Option<StatsView>,
        #[serde(serialize_with = "serialize_opt_timestamp")]
        completed_at: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        error: String,
        #[serde(serialize_with = "serialize_opt_timestamp")]
        failed_at: Option<DateTime<Utc>>,
    },
}

impl JobDetail {
    pub fn status(&self) -> JobStatus {
        match self {
            JobDetail::Pending => JobStatus::Pending,
            JobDetail::Processing { .. } => JobStatus::Processing,
            JobDetail::Completed { .. } => JobStatus::Completed,
            JobDetail::Failed { .. } => JobStatus::Failed,
        }
    }
}

impl JobStatusResponse {
    pub fn status(&self) -> JobStatus {
        self.detail.status()
    }
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        let detail = match record.status {
            JobStatus::Pending => JobDetail::Pending,
            JobStatus::Processing => JobDetail::Processing {
                started_at: record.started_at,
                progress: record.progress.as_ref().map(RawProgress::normalize),
            },
            JobStatus::Completed => JobDetail::Completed {
                download_url: record.download_url.unwrap_or_default(),
                output_s3_key: record.output_s3_key.unwrap_or_default(),
                stats: record.stats.as_ref().map(StatsView::from),
                completed_at: record.completed_at,
            },
            JobStatus::Failed => JobDetail::Failed {
                error: record
                    .error
                    .unwrap_or_else(|| "Translation failed".to_string()),
                failed_at: record.failed_at,
            },
        };

        Self {
            job_id: record.job_id,
            created_at: record.created_at,
            detail,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
