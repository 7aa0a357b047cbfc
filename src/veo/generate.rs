//! The full submit -> poll -> fetch sequence.

use super::cancel::Cancellation;
use super::client::{VeoError, VideoService};
use super::materialize::materialize;
use super::poll::{await_completion, PollPolicy};
use super::types::GenerationRequest;

/// Generate one video and return it as a base64 payload.
///
/// Every suspension point is awaited in order and guarded by `cancel`.
/// Errors from any stage are returned as-is; nothing is retried.
pub async fn generate_video<S: VideoService>(
    service: &S,
    request: &GenerationRequest,
    credential: &str,
    policy: &PollPolicy,
    cancel: &Cancellation,
) -> Result<String, VeoError> {
    log::info!("Generating video for prompt: {}", request.prompt());

    let handle = cancel.guard(service.submit(request)).await?;
    let descriptor = await_completion(service, handle, policy, cancel).await?;
    let payload = materialize(service, &descriptor, credential, cancel).await?;

    log::info!("Generated video data received ({} base64 chars)", payload.len());
    Ok(payload)
}
