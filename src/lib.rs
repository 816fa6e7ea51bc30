//! Transcript Fetcher - A small Rust CLI adapter around YouTube transcript retrieval
//!
//! This library fetches a transcript (or the list of available transcript tracks) for a
//! video identifier and shapes the outcome into a fixed record that is printed as a single
//! line of JSON for another process to consume.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod transcript;

pub use cli::{Cli, Mode};
pub use config::{Config, DEFAULT_LANGUAGES};
pub use extractors::{FetchedTranscript, TranscriptRequest, TranscriptSource, TranscriptTrack};
pub use transcript::{TranscriptListing, TranscriptResult, TranscriptService, TranscriptSnippet};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures raised while retrieving transcripts from the video platform
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid video id {0}: pass the video id, not the full URL")]
    InvalidVideoId(String),

    #[error("Failed to automatically give consent to saving cookies for video {0}")]
    FailedToCreateConsentCookie(String),

    #[error("YouTube is blocking requests from this IP for video {0}")]
    IpBlocked(String),

    #[error("YouTube is blocking requests for video {0}: sign in to confirm you're not a bot")]
    RequestBlocked(String),

    #[error("YouTube is receiving too many requests from this IP (video {0})")]
    TooManyRequests(String),

    #[error("The data required to fetch the transcript for video {0} is not parsable")]
    YouTubeDataUnparsable(String),

    #[error("The video {0} is no longer available")]
    VideoUnavailable(String),

    #[error("The video {video_id} is age restricted")]
    AgeRestricted { video_id: String },

    #[error("The video {video_id} is unplayable: {reason}")]
    VideoUnplayable { video_id: String, reason: String },

    #[error("Subtitles are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error(
        "No transcript found for video {video_id} in any of the requested languages {requested:?} (available: {available:?})"
    )]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("The requested transcript of video {0} is not translatable")]
    NotTranslatable(String),

    #[error("Translation language {language} is not available for video {video_id}")]
    TranslationLanguageNotAvailable { video_id: String, language: String },

    #[error("A PO token is required to fetch the transcript of video {0}")]
    PoTokenRequired(String),

    #[error("HTTP request for video {video_id} failed with status {status}")]
    Http { video_id: String, status: u16 },
}
