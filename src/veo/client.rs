//! VeoClient - handles communication with the Generative Language API.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{StatusCode, Url};

use super::types::{GenerationRequest, OperationHandle, OperationWire, PredictRequestWire};

/// The environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default base URL for the Generative Language API.
pub const VEO_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for video generation.
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

/// API version path segment.
const API_VERSION: &str = "v1beta";

/// Header carrying the API key on submit and status calls.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Timeout for submit and status requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the buffer reserved from a Content-Length header (64 MiB).
const MAX_DOWNLOAD_PREALLOC: u64 = 64 << 20;

/// Read the API key from the environment.
///
/// Called once at startup; the key is then passed explicitly to the client
/// and the materializer.
pub fn api_key_from_env() -> Result<String, VeoError> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(VeoError::MissingApiKey),
    }
}

/// The remote operations a generation needs.
///
/// `VeoClient` is the production implementation; tests substitute fakes.
pub trait VideoService {
    /// Start a generation. Issues exactly one network call.
    fn submit(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<OperationHandle, VeoError>> + Send;

    /// Query the current state of an operation.
    fn refresh(
        &self,
        handle: &OperationHandle,
    ) -> impl Future<Output = Result<OperationHandle, VeoError>> + Send;

    /// Download the full body at `url`.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, VeoError>> + Send;
}

/// Client for the Veo long-running prediction API.
#[derive(Debug, Clone)]
pub struct VeoClient {
    api_key: String,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl VeoClient {
    /// Create a client against the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns `VeoError::MissingApiKey` if `api_key` is empty.
    pub fn with_api_key(api_key: String) -> Result<Self, VeoError> {
        Self::with_options(api_key, VEO_API_BASE_URL.to_string(), DEFAULT_MODEL.to_string())
    }

    /// Create a client with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, VeoError> {
        Self::with_options(api_key, base_url, DEFAULT_MODEL.to_string())
    }

    /// Create a client with every knob set explicitly.
    pub fn with_options(api_key: String, base_url: String, model: String) -> Result<Self, VeoError> {
        if api_key.trim().is_empty() {
            return Err(VeoError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http_client,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn submit_url(&self) -> String {
        format!(
            "{}/{}/models/{}:predictLongRunning",
            self.base_url, API_VERSION, self.model
        )
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, name)
    }

    /// Submit a generation request.
    ///
    /// The returned handle may already be `done`.
    ///
    /// # Errors
    ///
    /// `VeoError::Api` if the service answers with a non-success status,
    /// `VeoError::HttpError` if the request itself fails. Nothing is retried.
    pub async fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<OperationHandle, VeoError> {
        let body = PredictRequestWire::from(request);

        let response = self
            .http_client
            .post(self.submit_url())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let handle = Self::parse_operation(response, "Generation request").await?;
        log::info!("Generation submitted, operation: {}", handle.name);
        Ok(handle)
    }

    /// Refresh an operation by name.
    pub async fn get_operation(&self, handle: &OperationHandle) -> Result<OperationHandle, VeoError> {
        let response = self
            .http_client
            .get(self.operation_url(&handle.name))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send()
            .await?;

        Self::parse_operation(response, "Status check").await
    }

    async fn parse_operation(
        response: reqwest::Response,
        what: &str,
    ) -> Result<OperationHandle, VeoError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::warn!("{} failed with status {}: {}", what, status, error_text);
            return Err(VeoError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let wire: OperationWire = response.json().await?;
        Ok(wire.into())
    }

    /// Download a video into memory.
    ///
    /// # Errors
    ///
    /// `VeoError::FetchFailed` carrying the status code and reason phrase if
    /// the server answers with a non-success status.
    pub async fn download_video(&self, url: &Url) -> Result<Vec<u8>, VeoError> {
        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VeoError::fetch_failed(status));
        }

        let capacity = response
            .content_length()
            .unwrap_or(0)
            .min(MAX_DOWNLOAD_PREALLOC);
        let mut bytes = Vec::with_capacity(capacity as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        log::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }
}

impl VideoService for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<OperationHandle, VeoError> {
        self.submit_generation(request).await
    }

    async fn refresh(&self, handle: &OperationHandle) -> Result<OperationHandle, VeoError> {
        self.get_operation(handle).await
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, VeoError> {
        self.download_video(url).await
    }
}

/// Errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum VeoError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Generation failed with code {code}: {message}")]
    OperationFailed { code: i32, message: String },

    #[error("No videos generated")]
    NoVideosGenerated,

    #[error("Failed to fetch video: {status} {reason}")]
    FetchFailed { status: u16, reason: String },

    #[error("Invalid video URI: {0}")]
    InvalidVideoUri(String),

    #[error("Generation timed out after {attempts} status checks ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("Generation cancelled")]
    Cancelled,
}

impl VeoError {
    pub(crate) fn fetch_failed(status: StatusCode) -> Self {
        VeoError::FetchFailed {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}
