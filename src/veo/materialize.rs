//! Turns a finished video descriptor into an embeddable base64 payload.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Url;

use super::cancel::Cancellation;
use super::client::{VeoError, VideoService};
use super::types::GeneratedVideo;

/// Query parameter the download endpoint expects the API key in.
const KEY_QUERY_PARAM: &str = "key";

/// Build the authenticated download URL for a generated video.
///
/// The descriptor URI may be percent-encoded. Any query it already carries
/// is kept; the key is appended as one more parameter.
pub fn signed_video_url(descriptor: &GeneratedVideo, credential: &str) -> Result<Url, VeoError> {
    let decoded = urlencoding::decode(descriptor.uri())
        .map_err(|e| VeoError::InvalidVideoUri(format!("{}: {}", descriptor.uri(), e)))?;

    let mut url = Url::parse(&decoded)
        .map_err(|e| VeoError::InvalidVideoUri(format!("{}: {}", decoded, e)))?;
    url.query_pairs_mut().append_pair(KEY_QUERY_PARAM, credential);
    Ok(url)
}

/// Base64-encode raw video bytes (standard alphabet, padded).
pub fn encode_video(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Wrap a base64 payload as a data URI a video element can play directly.
pub fn video_data_uri(payload: &str) -> String {
    format!("data:video/mp4;base64,{}", payload)
}

/// Fetch the finished video and return its base64 payload.
///
/// # Errors
///
/// `VeoError::InvalidVideoUri` if the descriptor does not hold a usable URL,
/// `VeoError::FetchFailed` if the download answers with an error status.
pub async fn materialize<S: VideoService>(
    service: &S,
    descriptor: &GeneratedVideo,
    credential: &str,
    cancel: &Cancellation,
) -> Result<String, VeoError> {
    let url = signed_video_url(descriptor, credential)?;
    log::info!("Fetching generated video from {}", redact_key(&url));

    let bytes = cancel.guard(service.fetch(&url)).await?;
    Ok(encode_video(&bytes))
}

/// The URL with the key parameter masked, for logging.
fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == KEY_QUERY_PARAM { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
