use std::time::Duration;

use serde::Deserialize;

/// Server configuration, read from the environment.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Redis connection string for the job record store and workflow queue
    pub redis_url: String,

    /// Prefix of the per-job record keys
    #[serde(default = "default_job_key_prefix")]
    pub job_key_prefix: String,

    /// List the workflow runner pops execution requests from
    #[serde(default = "default_workflow_queue_key")]
    pub workflow_queue_key: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_job_key_prefix() -> String {
    "excel_translate:job:".to_string()
}

fn default_workflow_queue_key() -> String {
    "excel_translate:executions".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

/// Client configuration, read from `TRANSLATE_CLIENT_*` variables.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the translation API (e.g., "https://api.example.com/prod")
    pub api_base_url: String,

    /// Interval between status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upload bucket name
    pub bucket: String,

    /// S3-compatible endpoint URL
    pub endpoint: String,

    pub access_key: String,

    pub secret_key: String,

    #[serde(default = "default_region")]
    pub region: String,
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_region() -> String {
    "auto".to_string()
}

impl ClientConfig {
    pub const ENV_PREFIX: &'static str = "TRANSLATE_CLIENT_";

    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed(Self::ENV_PREFIX).from_env()
    }

    /// Poll period; `0` means the default.
    pub fn poll_interval(&self) -> Duration {
        match self.poll_interval_ms {
            0 => Duration::from_millis(default_poll_interval_ms()),
            ms => Duration::from_millis(ms),
        }
    }
}
