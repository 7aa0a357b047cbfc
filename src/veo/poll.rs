//! Drives a long-running generation operation to completion.

use std::time::Duration;

use tokio::time::Instant;

use super::cancel::Cancellation;
use super::client::{VeoError, VideoService};
use super::types::{GeneratedVideo, OperationHandle};

/// Delay between status checks (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How to wait for an operation.
///
/// The default polls every 10 seconds with no attempt or time limit; set
/// `max_attempts` or `timeout` to bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Poll `handle` until the service reports it done, then pick the result.
///
/// Status checks are strictly sequential. An already-done handle causes no
/// network traffic at all.
///
/// # Errors
///
/// - `VeoError::OperationFailed` if the finished operation carries an error
/// - `VeoError::NoVideosGenerated` if it finished without any video
/// - `VeoError::Timeout` if the policy's attempt or time limit is hit
/// - `VeoError::Cancelled` if `cancel` fires while waiting
/// - any error from `VideoService::refresh`, unchanged
pub async fn await_completion<S: VideoService>(
    service: &S,
    mut handle: OperationHandle,
    policy: &PollPolicy,
    cancel: &Cancellation,
) -> Result<GeneratedVideo, VeoError> {
    let started = Instant::now();
    let mut attempts = 0u32;

    while !handle.done {
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            log::error!("Gave up on {} after {} status checks", handle.name, attempts);
            return Err(VeoError::Timeout {
                attempts,
                elapsed: started.elapsed(),
            });
        }
        if let Some(timeout) = policy.timeout {
            if started.elapsed() + policy.interval > timeout {
                log::error!("Generation timed out after {:?}", started.elapsed());
                return Err(VeoError::Timeout {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
        }

        cancel
            .guard(async {
                tokio::time::sleep(policy.interval).await;
                Ok(())
            })
            .await?;

        log::info!("...Generating...");
        let refreshed = cancel.guard(service.refresh(&handle)).await?;
        handle = refreshed;
        attempts += 1;
    }

    log::info!(
        "Operation {} finished after {} status checks",
        handle.name,
        attempts
    );
    first_video(handle)
}

fn first_video(handle: OperationHandle) -> Result<GeneratedVideo, VeoError> {
    if let Some(error) = handle.error {
        return Err(VeoError::OperationFailed {
            code: error.code,
            message: error.message,
        });
    }

    let mut videos = handle
        .response
        .and_then(|r| r.generated_videos)
        .unwrap_or_default();

    if videos.len() > 1 {
        log::warn!(
            "Expected one generated video, got {}; using the first",
            videos.len()
        );
    }
    if videos.is_empty() {
        return Err(VeoError::NoVideosGenerated);
    }
    Ok(videos.swap_remove(0))
}
