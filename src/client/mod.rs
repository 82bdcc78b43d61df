//! Client side of the job workflow: upload, start, and poll until done.

use std::sync::Arc;

use crate::config::ClientConfig;

pub mod api;
pub mod poller;
pub mod session;
pub mod upload;

pub use api::{ClientApiError, HttpJobApi, JobApi};
pub use poller::{PollHandle, StatusPoller, DEFAULT_POLL_INTERVAL};
pub use session::{SessionError, SessionPhase, SessionView, TranslationSession};
pub use upload::{FileUploader, S3Uploader, SelectedFile, UploadError};

impl TranslationSession {
    /// Session wired to the HTTP API and S3 uploads described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, UploadError> {
        let uploader = S3Uploader::new(
            &config.bucket,
            &config.region,
            &config.endpoint,
            &config.access_key,
            &config.secret_key,
        )?;
        let api = HttpJobApi::new(config.api_base_url.clone());

        Ok(TranslationSession::new(Arc::new(api), Arc::new(uploader))
            .with_poll_interval(config.poll_interval()))
    }
}
