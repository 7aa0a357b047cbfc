//! Request and operation types for the Veo generation API.
//!
//! Domain types are what the rest of the crate works with. The `*Wire`
//! structs mirror the REST JSON and are converted at the client boundary.

use serde::{Deserialize, Serialize};

/// Number of videos requested per generation. Fixed.
pub const NUMBER_OF_VIDEOS: u32 = 1;

/// Aspect ratio requested for every generation. Fixed.
pub const ASPECT_RATIO: &str = "16:9";

/// A still image the generated video is conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Guess an image MIME type from a file extension.
    ///
    /// Returns `None` for anything that is not jpeg, png or webp.
    pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "webp" => Some("image/webp"),
            _ => None,
        }
    }
}

/// Generation options. Only the fixed values are ever sent.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub number_of_videos: u32,
    pub aspect_ratio: &'static str,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            number_of_videos: NUMBER_OF_VIDEOS,
            aspect_ratio: ASPECT_RATIO,
        }
    }
}

/// One user-initiated submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    reference_image: ReferenceImage,
    config: GenerationConfig,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, reference_image: ReferenceImage) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image,
            config: GenerationConfig::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn reference_image(&self) -> &ReferenceImage {
        &self.reference_image
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

/// A server-side long-running generation job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationHandle {
    /// Operation resource name, e.g. `models/veo-2.0-generate-001/operations/abc`.
    pub name: String,
    pub done: bool,
    pub response: Option<GenerateVideosResponse>,
    pub error: Option<OperationError>,
}

/// Error the service attaches to a finished operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateVideosResponse {
    pub generated_videos: Option<Vec<GeneratedVideo>>,
}

/// Result descriptor for one finished video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedVideo {
    pub video: VideoRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRef {
    /// Download location. May be percent-encoded.
    pub uri: String,
}

impl GeneratedVideo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            video: VideoRef { uri: uri.into() },
        }
    }

    pub fn uri(&self) -> &str {
        &self.video.uri
    }
}

// --- wire format ---

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequestWire<'a> {
    pub instances: [InstanceWire<'a>; 1],
    pub parameters: ParametersWire,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstanceWire<'a> {
    pub prompt: &'a str,
    pub image: ImageWire<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageWire<'a> {
    pub bytes_base64_encoded: String,
    pub mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ParametersWire {
    pub sample_count: u32,
    pub aspect_ratio: &'static str,
}

impl<'a> From<&'a GenerationRequest> for PredictRequestWire<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        use base64::Engine;

        let image = request.reference_image();
        Self {
            instances: [InstanceWire {
                prompt: request.prompt(),
                image: ImageWire {
                    bytes_base64_encoded: base64::engine::general_purpose::STANDARD
                        .encode(&image.bytes),
                    mime_type: &image.mime_type,
                },
            }],
            parameters: ParametersWire {
                sample_count: request.config().number_of_videos,
                aspect_ratio: request.config().aspect_ratio,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationWire {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub response: Option<ResponseWire>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseWire {
    #[serde(default)]
    pub generate_video_response: Option<SamplesWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SamplesWire {
    #[serde(default, alias = "generatedVideos")]
    pub generated_samples: Option<Vec<GeneratedVideo>>,
}

impl From<OperationWire> for OperationHandle {
    fn from(wire: OperationWire) -> Self {
        let response = wire.response.map(|r| GenerateVideosResponse {
            generated_videos: r.generate_video_response.and_then(|s| s.generated_samples),
        });
        Self {
            name: wire.name,
            done: wire.done.unwrap_or(false),
            response,
            error: wire.error,
        }
    }
}
