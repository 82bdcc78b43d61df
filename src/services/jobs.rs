use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::api::{JobStatusResponse, StartJobRequest, StartJobResponse};
use crate::models::job::{JobRecord, JobStatus};
use crate::services::workflow::WorkflowInput;
use crate::store::StatusUpdate;

/// Error recorded on a job whose workflow never started.
pub const WORKFLOW_START_FAILED: &str = "Failed to start translation workflow";

/// Create a PENDING job record and trigger the translation workflow.
///
/// The record is written before the workflow is triggered. If the trigger
/// fails, the record is marked FAILED so pollers do not wait on a job that
/// will never run.
pub async fn start_job(
    state: &AppState,
    request: StartJobRequest,
) -> Result<StartJobResponse, ApiError> {
    let s3_key = request
        .s3_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::Validation("s3Key is required".to_string()))?
        .to_string();

    request
        .validate()
        .map_err(|report| ApiError::Validation(report.to_string()))?;

    let source_language = request.source_language_or_default().to_string();
    let target_language = request.target_language_or_default().to_string();
    let job_id = Uuid::new_v4().to_string();

    let record = JobRecord::new_pending(
        &job_id,
        &s3_key,
        &source_language,
        &target_language,
        Utc::now(),
    );
    state.store.create(&record).await.inspect_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "Failed to write job record");
        metrics::counter!("translation_jobs_start_failed_total").increment(1);
    })?;

    let input = WorkflowInput {
        job_id: job_id.clone(),
        s3_key,
        source_language,
        target_language,
    };

    match state.workflow.start_execution(&input).await {
        Ok(execution) => {
            tracing::info!(
                job_id = %job_id,
                execution = %execution,
                source_language = %input.source_language,
                target_language = %input.target_language,
                "Translation job started"
            );
            metrics::counter!("translation_jobs_started_total").increment(1);

            Ok(StartJobResponse {
                job_id,
                status: JobStatus::Pending,
                message: "Translation job started".to_string(),
            })
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Failed to trigger translation workflow");
            metrics::counter!("translation_jobs_start_failed_total").increment(1);

            let update = StatusUpdate::Failed {
                error: WORKFLOW_START_FAILED.to_string(),
            };
            if let Err(mark_err) = state.store.apply(&job_id, &update).await {
                tracing::error!(
                    job_id = %job_id,
                    error = %mark_err,
                    "Could not mark job failed; record stays PENDING"
                );
            }

            Err(e.into())
        }
    }
}

/// Read a job record and project it into the status response.
pub async fn get_job_status(state: &AppState, job_id: &str) -> Result<JobStatusResponse, ApiError> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(ApiError::Validation("jobId is required".to_string()));
    }

    let attrs = state
        .store
        .fetch(job_id)
        .await
        .inspect_err(|e| tracing::error!(job_id = %job_id, error = %e, "Failed to read job record"))?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    let record = JobRecord::from_attributes(&attrs)
        .inspect_err(|e| tracing::error!(job_id = %job_id, error = %e, "Unreadable job record"))?;

    let response = JobStatusResponse::from(record);
    metrics::counter!("job_status_requests_total", "status" => response.status().to_string())
        .increment(1);
    Ok(response)
}
