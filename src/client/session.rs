//! Client-side translation session.
//!
//! `idle -> uploading -> pending -> processing -> completed | failed`, with
//! `failed` also reachable from any upload or start error. The current
//! [`SessionView`] is published on a `watch` channel for the display layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::client::api::{ClientApiError, JobApi};
use crate::client::poller::{PollHandle, StatusPoller, DEFAULT_POLL_INTERVAL};
use crate::client::upload::{FileUploader, SelectedFile, UploadError};
use crate::models::api::{JobDetail, JobStatusResponse, StartJobRequest};
use crate::models::progress::ProgressView;
use crate::models::stats::StatsView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Uploading,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SessionPhase {
    /// Upload or job in flight.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Uploading | SessionPhase::Pending | SessionPhase::Processing
        )
    }
}

/// Everything the display layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub job_id: Option<String>,
    pub progress: Option<ProgressView>,
    pub stats: Option<StatsView>,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Stop,
}

impl SessionView {
    /// Fold one status response into the view.
    pub fn apply(&mut self, response: &JobStatusResponse) -> PollOutcome {
        match &response.detail {
            JobDetail::Pending => PollOutcome::Continue,
            JobDetail::Processing { progress, .. } => {
                self.phase = SessionPhase::Processing;
                if let Some(progress) = progress {
                    self.progress = Some(progress.clone());
                }
                PollOutcome::Continue
            }
            JobDetail::Completed {
                download_url,
                stats,
                ..
            } => {
                self.phase = SessionPhase::Completed;
                self.progress = None;
                self.stats = stats.clone();
                self.download_url = Some(download_url.clone());
                PollOutcome::Stop
            }
            JobDetail::Failed { error, .. } => {
                self.phase = SessionPhase::Failed;
                self.error = Some(error.clone());
                PollOutcome::Stop
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("A translation is already in progress")]
    Busy,

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Failed to start translation: {0}")]
    Start(#[from] ClientApiError),
}

/// Drives one upload-translate-download cycle at a time.
///
/// Polling stops on a terminal status, on [`reset`](Self::reset), and when
/// the session is dropped.
pub struct TranslationSession {
    api: Arc<dyn JobApi>,
    uploader: Arc<dyn FileUploader>,
    poller: StatusPoller,
    view: Arc<watch::Sender<SessionView>>,
    polling: Option<PollHandle>,
}

impl TranslationSession {
    pub fn new(api: Arc<dyn JobApi>, uploader: Arc<dyn FileUploader>) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            poller: StatusPoller::new(Arc::clone(&api), DEFAULT_POLL_INTERVAL),
            api,
            uploader,
            view: Arc::new(view),
            polling: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = StatusPoller::new(Arc::clone(&self.api), interval);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Whether a poll loop is still running.
    pub fn is_polling(&self) -> bool {
        self.polling
            .as_ref()
            .is_some_and(|h| !h.is_cancelled() && !h.is_finished())
    }

    /// Upload `file`, start a job for it and begin polling.
    ///
    /// Selection problems are reported without touching the network and
    /// leave the phase unchanged. Upload and start failures move the session
    /// to `failed`. Returns the new job id.
    pub async fn start(
        &mut self,
        file: Option<SelectedFile>,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, SessionError> {
        if self.view.borrow().phase.is_active() {
            return Err(SessionError::Busy);
        }

        let file = match validate_selection(file, source_language, target_language) {
            Ok(file) => file,
            Err(message) => {
                self.view.send_modify(|v| v.error = Some(message.clone()));
                return Err(SessionError::Validation(message));
            }
        };

        self.stop_polling();
        self.view.send_replace(SessionView {
            phase: SessionPhase::Uploading,
            ..SessionView::default()
        });

        let s3_key = match self.uploader.upload(&file).await {
            Ok(key) => key,
            Err(e) => return Err(self.fail(e.into())),
        };

        let request = StartJobRequest {
            s3_key: Some(s3_key),
            source_language: Some(source_language.to_string()),
            target_language: Some(target_language.to_string()),
        };
        let started = match self.api.start_job(&request).await {
            Ok(started) => started,
            Err(e) => return Err(self.fail(e.into())),
        };

        tracing::info!(job_id = %started.job_id, file = %file.base_name(), "Translation job submitted");

        self.view.send_modify(|v| {
            v.phase = SessionPhase::Pending;
            v.job_id = Some(started.job_id.clone());
        });
        self.polling = Some(self.poller.spawn(started.job_id.clone(), Arc::clone(&self.view)));

        Ok(started.job_id)
    }

    /// Stop polling and return to `idle`.
    pub fn reset(&mut self) {
        self.stop_polling();
        self.view.send_replace(SessionView::default());
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.polling.take() {
            handle.cancel();
        }
    }

    fn fail(&self, error: SessionError) -> SessionError {
        let message = error.to_string();
        tracing::error!(error = %message, "Translation session failed");
        self.view.send_modify(|v| {
            v.phase = SessionPhase::Failed;
            v.error = Some(message);
        });
        error
    }
}

fn validate_selection(
    file: Option<SelectedFile>,
    source_language: &str,
    target_language: &str,
) -> Result<SelectedFile, String> {
    let file = file
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| "Please select a file to translate".to_string())?;
    if source_language == target_language {
        return Err("Source and target languages must be different".to_string());
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn response(detail: JobDetail) -> JobStatusResponse {
        JobStatusResponse {
            job_id: "job-1".into(),
            created_at: Utc::now(),
            detail,
        }
    }

    #[test]
    fn test_processing_keeps_last_progress_when_none_reported() {
        let mut view = SessionView {
            phase: SessionPhase::Pending,
            ..SessionView::default()
        };
        let progress = ProgressView {
            phase: Some("merging".into()),
            percent: Some(90),
            ..ProgressView::default()
        };

        let outcome = view.apply(&response(JobDetail::Processing {
            started_at: None,
            progress: Some(progress.clone()),
        }));
        assert_eq!(outcome, PollOutcome::Continue);
        assert_eq!(view.phase, SessionPhase::Processing);

        view.apply(&response(JobDetail::Processing {
            started_at: None,
            progress: None,
        }));
        assert_eq!(view.progress, Some(progress));
    }

    #[test]
    fn test_terminal_statuses_stop_polling() {
        let mut view = SessionView::default();
        let outcome = view.apply(&response(JobDetail::Failed {
            error: "Bedrock throttled".into(),
            failed_at: None,
        }));
        assert_eq!(outcome, PollOutcome::Stop);
        assert_eq!(view.phase, SessionPhase::Failed);
        assert_eq!(view.error.as_deref(), Some("Bedrock throttled"));

        let mut view = SessionView::default();
        let outcome = view.apply(&response(JobDetail::Completed {
            download_url: "https://files.test/out.xlsx".into(),
            output_s3_key: "translated/x/out.xlsx".into(),
            stats: Some(StatsView::default()),
            completed_at: None,
        }));
        assert_eq!(outcome, PollOutcome::Stop);
        assert_eq!(view.phase, SessionPhase::Completed);
        assert_eq!(view.download_url.as_deref(), Some("https://files.test/out.xlsx"));
    }

    #[test]
    fn test_selection_rules() {
        let file = || Some(SelectedFile::new("book.xlsx", vec![1, 2, 3]));
        assert!(validate_selection(file(), "Japanese", "English").is_ok());
        assert!(validate_selection(None, "Japanese", "English").is_err());
        assert!(validate_selection(Some(SelectedFile::new("e.xlsx", vec![])), "Japanese", "English").is_err());
        assert_eq!(
            validate_selection(file(), "English", "English").unwrap_err(),
            "Source and target languages must be different"
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(SessionPhase::Processing.to_string(), "processing");
        assert!(SessionPhase::Uploading.is_active());
        assert!(!SessionPhase::Failed.is_active());
    }
}
