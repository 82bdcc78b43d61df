//! Test doubles and request helpers shared by the integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use excel_translate_jobs::{
    app_state::AppState,
    client::{ClientApiError, FileUploader, JobApi, SelectedFile, UploadError},
    models::api::{JobDetail, JobStatusResponse, StartJobRequest, StartJobResponse},
    models::job::JobStatus,
    models::progress::ProgressView,
    models::stats::StatsView,
    routes,
    services::workflow::{WorkflowError, WorkflowInput, WorkflowLauncher},
    store::MemoryJobStore,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use tokio::time::Instant;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:5173";

/// Workflow launcher that records every execution request.
#[derive(Default)]
pub struct RecordingLauncher {
    pub inputs: Mutex<Vec<WorkflowInput>>,
    pub fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn inputs(&self) -> Vec<WorkflowInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowLauncher for RecordingLauncher {
    async fn start_execution(&self, input: &WorkflowInput) -> Result<String, WorkflowError> {
        self.inputs.lock().unwrap().push(input.clone());
        if self.fail {
            return Err(WorkflowError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Connection refused",
            ))));
        }
        Ok(format!("exec-{}", input.job_id))
    }

    async fn health_check(&self) -> Result<(), WorkflowError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryJobStore>,
    pub launcher: Arc<RecordingLauncher>,
}

pub fn test_app() -> TestApp {
    test_app_with(RecordingLauncher::default())
}

pub fn test_app_with(launcher: RecordingLauncher) -> TestApp {
    let store = Arc::new(MemoryJobStore::new());
    let launcher = Arc::new(launcher);
    let state = AppState::from_shared(store.clone(), launcher.clone());
    let prometheus = PrometheusBuilder::new().build_recorder().handle();
    TestApp {
        router: routes::router(state, prometheus),
        store,
        launcher,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn post_start_job(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/start-job")
        .header("content-type", "application/json")
        .header("origin", TEST_ORIGIN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("origin", TEST_ORIGIN)
        .body(Body::empty())
        .unwrap()
}

/// Sorted top-level keys of a JSON object.
pub fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

pub fn assert_json_with_cors(response: &TestResponse) {
    assert_eq!(
        response.headers.get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(response
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
}

// ── Client-side doubles ─────────────────────────────────────────────

/// One scripted reply of the status endpoint.
#[derive(Clone)]
pub enum Reply {
    Status(JobStatusResponse),
    /// Transient failure (gateway error).
    Unavailable,
}

/// Job API that replays a script of status replies.
///
/// Once the script is exhausted the last reply repeats.
pub struct ScriptedApi {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    start_result: Mutex<Option<Result<StartJobResponse, (u16, String)>>>,
    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub poll_times: Mutex<Vec<Instant>>,
}

impl ScriptedApi {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(None),
            start_result: Mutex::new(Some(Ok(StartJobResponse {
                job_id: "job-42".into(),
                status: JobStatus::Pending,
                message: "Translation job started".into(),
            }))),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            poll_times: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting_start(status: u16, message: &str) -> Arc<Self> {
        let api = Self::new(Vec::new());
        *api.start_result.lock().unwrap() = Some(Err((status, message.to_string())));
        api
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobApi for ScriptedApi {
    async fn start_job(
        &self,
        _request: &StartJobRequest,
    ) -> Result<StartJobResponse, ClientApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match self.start_result.lock().unwrap().clone() {
            Some(Ok(response)) => Ok(response),
            Some(Err((status, message))) => Err(ClientApiError::Status { status, message }),
            None => Err(ClientApiError::Status {
                status: 500,
                message: "Internal server error".into(),
            }),
        }
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusResponse, ClientApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.poll_times.lock().unwrap().push(Instant::now());

        let next = self.script.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self.last.lock().unwrap().clone().unwrap_or(Reply::Unavailable),
        };

        match reply {
            Reply::Status(response) => Ok(response),
            Reply::Unavailable => Err(ClientApiError::Status {
                status: 502,
                message: "Bad Gateway".into(),
            }),
        }
    }
}

/// Uploader that counts calls and optionally fails.
#[derive(Default)]
pub struct FakeUploader {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeUploader {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileUploader for FakeUploader {
    async fn upload(&self, file: &SelectedFile) -> Result<String, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UploadError::Rejected(403));
        }
        Ok(format!("uploads/test/{}", file.base_name()))
    }
}

pub fn pending() -> Reply {
    Reply::Status(JobStatusResponse {
        job_id: "job-42".into(),
        created_at: Utc::now(),
        detail: JobDetail::Pending,
    })
}

pub fn processing(percent: u32) -> Reply {
    Reply::Status(JobStatusResponse {
        job_id: "job-42".into(),
        created_at: Utc::now(),
        detail: JobDetail::Processing {
            started_at: Some(Utc::now()),
            progress: Some(ProgressView {
                phase: Some("translating".into()),
                percent: Some(percent),
                ..ProgressView::default()
            }),
        },
    })
}

pub fn completed() -> Reply {
    Reply::Status(JobStatusResponse {
        job_id: "job-42".into(),
        created_at: Utc::now(),
        detail: JobDetail::Completed {
            download_url: "https://files.test/translated/book_translated.xlsx".into(),
            output_s3_key: "translated/abc/book_translated.xlsx".into(),
            stats: Some(StatsView {
                total_cells: 1200,
                translatable_cells: 400,
                translated_cells: 400,
                sheets_processed: 3,
                unique_texts: 250,
                batch_count: 3,
            }),
            completed_at: Some(Utc::now()),
        },
    })
}

pub fn failed(error: &str) -> Reply {
    Reply::Status(JobStatusResponse {
        job_id: "job-42".into(),
        created_at: Utc::now(),
        detail: JobDetail::Failed {
            error: error.into(),
            failed_at: Some(Utc::now()),
        },
    })
}

pub fn spreadsheet() -> Option<SelectedFile> {
    Some(SelectedFile::new("book.xlsx", b"PK\x03\x04 fake workbook".to_vec()))
}
