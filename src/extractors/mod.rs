use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod innertube;
pub mod youtube;

use crate::Result;

/// What to fetch: a video and an ordered language preference
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRequest {
    /// Opaque video identifier
    pub video_id: String,

    /// Language codes, most preferred first
    pub languages: Vec<String>,

    /// Translate the selected track into this language code
    pub translate_to: Option<String>,
}

impl TranscriptRequest {
    pub fn new(video_id: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            video_id: video_id.into(),
            languages,
            translate_to: None,
        }
    }

    pub fn with_translation(mut self, language: Option<String>) -> Self {
        self.translate_to = language;
        self
    }
}

/// A timed text fragment as returned by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
}

/// A transcript as returned by a source
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTranscript {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub snippets: Vec<Snippet>,
}

/// One caption track a video offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// Trait for retrieving transcripts from a video platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the best transcript for the request's language preference
    async fn fetch(&self, request: &TranscriptRequest) -> Result<FetchedTranscript>;

    /// List every transcript track the video offers, in platform order
    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptTrack>>;

    /// Name of the platform
    fn platform_name(&self) -> &'static str;
}
