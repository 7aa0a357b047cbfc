//! Scene session state: prompt, busy flag, the playing video and the error.
//!
//! A `SceneSession` is what a front end drives. It runs one generation at a
//! time (`generate` takes `&mut self`) and always ends in exactly one of two
//! states: a `PlayableVideo` or a `GenerationErrorState`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::veo::{
    generate_video, video_data_uri, Cancellation, GenerationRequest, PollPolicy, ReferenceImage,
    VideoService,
};

/// Shown for every failure. The underlying error is only logged.
pub const GENERATION_FAILED_MESSAGE: [&str; 2] = [
    "Video generation failed. Veo is only available on the Paid Tier.",
    "Please select your Cloud Project to get started",
];

/// Default title given to generated scenes.
pub const DEFAULT_SCENE_TITLE: &str = "Story Scene 1";

/// A finished video ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableVideo {
    pub id: String,
    pub title: String,
    /// The prompt the video was generated from.
    pub description: String,
    /// `data:video/mp4;base64,...`
    pub video_url: String,
}

/// Lines shown to the user after a failed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationErrorState {
    lines: Vec<String>,
}

impl GenerationErrorState {
    fn generation_failed() -> Self {
        Self {
            lines: GENERATION_FAILED_MESSAGE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Shared view of whether a generation is in flight.
///
/// Clones observe the same flag, so a progress indicator can watch it while
/// the session is mutably borrowed by `generate`.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, busy: bool) {
        self.0.store(busy, Ordering::SeqCst);
    }
}

/// Clears the busy flag however the generation ends, including when the
/// future is dropped mid-flight.
struct BusyGuard<'a>(&'a BusyFlag);

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a BusyFlag) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// UI state for one story scene.
pub struct SceneSession {
    title: String,
    prompt: String,
    reference_image: ReferenceImage,
    credential: String,
    policy: PollPolicy,
    busy: BusyFlag,
    playing: Option<PlayableVideo>,
    error: Option<GenerationErrorState>,
}

impl SceneSession {
    pub fn new(reference_image: ReferenceImage, credential: String) -> Self {
        Self {
            title: DEFAULT_SCENE_TITLE.to_string(),
            prompt: String::new(),
            reference_image,
            credential,
            policy: PollPolicy::default(),
            busy: BusyFlag::default(),
            playing: None,
            error: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn playing(&self) -> Option<&PlayableVideo> {
        self.playing.as_ref()
    }

    pub fn error(&self) -> Option<&GenerationErrorState> {
        self.error.as_ref()
    }

    /// Close the video player.
    pub fn close_player(&mut self) {
        self.playing = None;
    }

    /// Dismiss the error message.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Generate a video for the current prompt.
    ///
    /// Clears any previous video and error first. On return exactly one of
    /// `playing()` and `error()` is set and the session is no longer busy.
    pub async fn generate<S: VideoService>(
        &mut self,
        service: &S,
        cancel: &Cancellation,
    ) -> Result<&PlayableVideo, &GenerationErrorState> {
        self.playing = None;
        self.error = None;

        let request = GenerationRequest::new(self.prompt.clone(), self.reference_image.clone());
        let result = {
            let _busy = BusyGuard::engage(&self.busy);
            generate_video(service, &request, &self.credential, &self.policy, cancel).await
        };

        match result {
            Ok(payload) => {
                let video = PlayableVideo {
                    id: uuid::Uuid::new_v4().to_string(),
                    title: self.title.clone(),
                    description: self.prompt.clone(),
                    video_url: video_data_uri(&payload),
                };
                Ok(&*self.playing.insert(video))
            }
            Err(e) => {
                log::error!("Video generation failed: {}", e);
                Err(&*self.error.insert(GenerationErrorState::generation_failed()))
            }
        }
    }
}
