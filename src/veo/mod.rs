//! Veo video generation: submit, poll until done, materialize the result.
//!
//! `VeoClient` talks to the service, `await_completion` drives the
//! long-running operation, and `materialize` turns the finished video into a
//! base64 payload for a `data:` URI.

mod cancel;
mod client;
mod generate;
mod materialize;
mod poll;
mod types;

pub use cancel::Cancellation;
pub use client::{
    api_key_from_env, VeoClient, VeoError, VideoService, API_KEY_ENV, DEFAULT_MODEL,
    VEO_API_BASE_URL,
};
pub use generate::generate_video;
pub use materialize::{encode_video, materialize, signed_video_url, video_data_uri};
pub use poll::{await_completion, PollPolicy, DEFAULT_POLL_INTERVAL};
pub use types::{
    GenerateVideosResponse, GeneratedVideo, GenerationConfig, GenerationRequest,
    OperationError, OperationHandle, ReferenceImage, VideoRef, ASPECT_RATIO, NUMBER_OF_VIDEOS,
};
