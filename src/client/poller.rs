//! Fixed-interval job status polling.
//!
//! A poll runs immediately, then once per interval, until the job reports a
//! terminal status or the returned [`PollHandle`] is cancelled or dropped.
//! Failed polls are logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::api::JobApi;
use crate::client::session::{PollOutcome, SessionView};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Handle to a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the loop has exited, whatever the reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    api: Arc<dyn JobApi>,
    interval: Duration,
}

impl StatusPoller {
    /// A zero `interval` falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn new(api: Arc<dyn JobApi>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!(
                default_ms = DEFAULT_POLL_INTERVAL.as_millis() as u64,
                "Zero poll interval requested, using default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        Self { api, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `job_id`, folding every response into `view`.
    pub fn spawn(&self, job_id: String, view: Arc<watch::Sender<SessionView>>) -> PollHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            Arc::clone(&self.api),
            job_id,
            self.interval,
            view,
            cancel.clone(),
        ));
        PollHandle { cancel, task }
    }
}

async fn run(
    api: Arc<dyn JobApi>,
    job_id: String,
    interval: Duration,
    view: Arc<watch::Sender<SessionView>>,
    cancel: CancellationToken,
) {
    // The first tick completes immediately, which gives the out-of-cycle poll.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(job_id = %job_id, interval_ms = interval.as_millis() as u64, "Polling job status");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = api.job_status(&job_id) => result,
        };

        match result {
            Ok(status) => {
                let mut outcome = PollOutcome::Continue;
                view.send_if_modified(|current| {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    outcome = current.apply(&status);
                    true
                });

                if outcome == PollOutcome::Stop {
                    tracing::info!(job_id = %job_id, status = %status.status(), "Job reached terminal status");
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Status poll failed, retrying on next tick");
            }
        }
    }

    tracing::debug!(job_id = %job_id, "Stopped polling job status");
}
