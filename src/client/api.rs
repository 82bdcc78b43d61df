use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::models::api::{ErrorBody, JobStatusResponse, StartJobRequest, StartJobResponse};

/// The two translation endpoints as seen from the client.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn start_job(&self, request: &StartJobRequest)
        -> Result<StartJobResponse, ClientApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientApiError>;
}

/// HTTP client for the translation API.
pub struct HttpJobApi {
    http: Client,
    base_url: String,
}

impl HttpJobApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        return Err(ClientApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    response.json::<T>().await.map_err(ClientApiError::Http)
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn start_job(
        &self,
        request: &StartJobRequest,
    ) -> Result<StartJobResponse, ClientApiError> {
        let response = self
            .http
            .post(format!("{}/start-job", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(ClientApiError::Http)?;
        read_json(response).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientApiError> {
        let response = self
            .http
            .get(format!("{}/job-status/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(ClientApiError::Http)?;
        read_json(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let api = HttpJobApi::new("https://api.example.test/prod/");
        assert_eq!(api.base_url(), "https://api.example.test/prod");
    }
}
