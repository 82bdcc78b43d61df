use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::IntoEnumIterator;

use crate::models::progress::RawProgress;
use crate::models::stats::RawStats;

/// How long a job record lives in the store before it is garbage-collected.
pub const JOB_TTL_HOURS: i64 = 24;

/// Loosely-typed attribute map exactly as the record store holds it.
pub type JobAttributes = HashMap<String, String>;

/// Attribute names shared with the workflow runner that writes the record.
pub mod attr {
    pub const JOB_ID: &str = "jobId";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "createdAt";
    pub const STARTED_AT: &str = "startedAt";
    pub const COMPLETED_AT: &str = "completedAt";
    pub const FAILED_AT: &str = "failedAt";
    pub const S3_KEY: &str = "s3Key";
    pub const SOURCE_LANGUAGE: &str = "sourceLanguage";
    pub const TARGET_LANGUAGE: &str = "targetLanguage";
    pub const PROGRESS: &str = "progress";
    pub const STATS: &str = "stats";
    pub const ERROR: &str = "error";
    pub const DOWNLOAD_URL: &str = "downloadUrl";
    pub const OUTPUT_S3_KEY: &str = "outputS3Key";
    pub const TTL: &str = "ttl";
}

/// Lifecycle status of a translation job.
///
/// The runner also writes stage names (`PREPARING`, `TRANSLATING`, `MERGING`)
/// into the status attribute; those all read back as [`JobStatus::Processing`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    #[strum(
        to_string = "PROCESSING",
        serialize = "PREPARING",
        serialize = "TRANSLATING",
        serialize = "MERGING"
    )]
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    fn stage(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a record in `self` may be moved to `next`.
    ///
    /// Transitions only go forward. `PROCESSING -> PROCESSING` is allowed so
    /// the runner can refresh progress; terminal states accept nothing.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if self == JobStatus::Processing && next == JobStatus::Processing {
            return true;
        }
        next.stage() > self.stage()
    }

    /// Every spelling of this status that may appear in the store.
    pub fn stored_spellings(self) -> &'static [&'static str] {
        match self {
            JobStatus::Pending => &["PENDING"],
            JobStatus::Processing => &["PROCESSING", "PREPARING", "TRANSLATING", "MERGING"],
            JobStatus::Completed => &["COMPLETED"],
            JobStatus::Failed => &["FAILED"],
        }
    }

    /// Stored spellings of every status matching `pred`.
    pub fn spellings_where(pred: impl Fn(JobStatus) -> bool) -> Vec<&'static str> {
        JobStatus::iter()
            .filter(|s| pred(*s))
            .flat_map(|s| s.stored_spellings().iter().copied())
            .collect()
    }
}

/// A job record mapped from the store into strong types.
///
/// `progress` and `stats` are parsed here and only here: a payload that does
/// not parse becomes `None` instead of failing the whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub s3_key: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub progress: Option<RawProgress>,
    pub stats: Option<RawStats>,
    pub error: Option<String>,
    pub download_url: Option<String>,
    pub output_s3_key: Option<String>,
    /// Unix seconds after which the store may drop the record.
    pub ttl: Option<i64>,
}

impl JobRecord {
    /// A freshly created job, waiting for the workflow to pick it up.
    pub fn new_pending(
        job_id: impl Into<String>,
        s3_key: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            created_at: now,
            s3_key: Some(s3_key.into()),
            source_language: Some(source_language.into()),
            target_language: Some(target_language.into()),
            started_at: None,
            completed_at: None,
            failed_at: None,
            progress: None,
            stats: None,
            error: None,
            download_url: None,
            output_s3_key: None,
            ttl: Some((now + Duration::hours(JOB_TTL_HOURS)).timestamp()),
        }
    }

    /// Build a typed record from the store's attribute map.
    pub fn from_attributes(attrs: &JobAttributes) -> Result<Self, RecordError> {
        let job_id = required(attrs, attr::JOB_ID)?.to_string();

        let raw_status = required(attrs, attr::STATUS)?;
        let status = raw_status
            .parse::<JobStatus>()
            .map_err(|_| RecordError::UnknownStatus(raw_status.to_string()))?;

        let created_at = timestamp(attrs, attr::CREATED_AT)?
            .ok_or(RecordError::Missing(attr::CREATED_AT))?;

        let progress = attrs.get(attr::PROGRESS).and_then(|raw| {
            RawProgress::parse(raw)
                .map_err(|e| {
                    tracing::warn!(job_id = %job_id, error = %e, "Ignoring unreadable progress payload");
                    metrics::counter!("malformed_job_payloads_total", "field" => attr::PROGRESS)
                        .increment(1);
                })
                .ok()
        });

        let stats = attrs.get(attr::STATS).and_then(|raw| {
            RawStats::parse(raw)
                .map_err(|e| {
                    tracing::warn!(job_id = %job_id, error = %e, "Ignoring unreadable stats payload");
                    metrics::counter!("malformed_job_payloads_total", "field" => attr::STATS)
                        .increment(1);
                })
                .ok()
        });

        let ttl = match attrs.get(attr::TTL) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| RecordError::Invalid {
                field: attr::TTL,
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            status,
            created_at,
            s3_key: optional(attrs, attr::S3_KEY),
            source_language: optional(attrs, attr::SOURCE_LANGUAGE),
            target_language: optional(attrs, attr::TARGET_LANGUAGE),
            started_at: timestamp(attrs, attr::STARTED_AT)?,
            completed_at: timestamp(attrs, attr::COMPLETED_AT)?,
            failed_at: timestamp(attrs, attr::FAILED_AT)?,
            progress,
            stats,
            error: optional(attrs, attr::ERROR),
            download_url: optional(attrs, attr::DOWNLOAD_URL),
            output_s3_key: optional(attrs, attr::OUTPUT_S3_KEY),
            ttl,
            job_id,
        })
    }

    /// Render the record back into store attributes. Absent fields are omitted.
    pub fn to_attributes(&self) -> JobAttributes {
        let mut attrs = JobAttributes::new();
        attrs.insert(attr::JOB_ID.into(), self.job_id.clone());
        attrs.insert(attr::STATUS.into(), self.status.to_string());
        attrs.insert(attr::CREATED_AT.into(), format_timestamp(self.created_at));

        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                attrs.insert(key.to_string(), v);
            }
        };
        put(attr::S3_KEY, self.s3_key.clone());
        put(attr::SOURCE_LANGUAGE, self.source_language.clone());
        put(attr::TARGET_LANGUAGE, self.target_language.clone());
        put(attr::STARTED_AT, self.started_at.map(format_timestamp));
        put(attr::COMPLETED_AT, self.completed_at.map(format_timestamp));
        put(attr::FAILED_AT, self.failed_at.map(format_timestamp));
        put(attr::PROGRESS, self.progress.as_ref().map(RawProgress::to_json));
        put(attr::STATS, self.stats.as_ref().map(RawStats::to_json));
        put(attr::ERROR, self.error.clone());
        put(attr::DOWNLOAD_URL, self.download_url.clone());
        put(attr::OUTPUT_S3_KEY, self.output_s3_key.clone());
        put(attr::TTL, self.ttl.map(|t| t.to_string()));
        attrs
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Serde hook writing timestamps in the stored form.
pub fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*ts))
}

pub fn serialize_opt_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serialize_timestamp(ts, serializer),
        None => serializer.serialize_none(),
    }
}

/// Accepts RFC 3339 as well as the naive ISO-8601 form the runner writes,
/// which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

fn required<'a>(attrs: &'a JobAttributes, field: &'static str) -> Result<&'a str, RecordError> {
    attrs
        .get(field)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(RecordError::Missing(field))
}

fn optional(attrs: &JobAttributes, field: &str) -> Option<String> {
    attrs.get(field).filter(|v| !v.is_empty()).cloned()
}

fn timestamp(
    attrs: &JobAttributes,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, RecordError> {
    match attrs.get(field).filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| RecordError::Invalid {
                field,
                value: raw.clone(),
            }),
        None => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("job record is missing `{0}`")]
    Missing(&'static str),

    #[error("job record has unknown status `{0}`")]
    UnknownStatus(String),

    #[error("job record field `{field}` has invalid value `{value}`")]
    Invalid { field: &'static str, value: String },
}
