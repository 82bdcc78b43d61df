use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::api::{JobStatusResponse, StartJobRequest, StartJobResponse};
use crate::services::jobs;

/// POST /start-job — Create a translation job for an uploaded spreadsheet.
pub async fn start_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<StartJobResponse>), ApiError> {
    // An empty body reads as `{}` so the missing key is reported by name.
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartJobRequest::default()
    } else {
        serde_json::from_slice::<StartJobRequest>(&body)
            .map_err(|_| ApiError::Validation("Invalid JSON body".to_string()))?
    };

    let response = jobs::start_job(&state, request).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /job-status/{job_id} — Current state of a translation job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    jobs::get_job_status(&state, &job_id).await.map(Json)
}

/// GET /job-status — Status requested without a job identifier.
pub async fn missing_job_id() -> ApiError {
    ApiError::Validation("jobId is required".to_string())
}
