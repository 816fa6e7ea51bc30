//! Output records printed on stdout.
//!
//! Field order follows what consumers of the JSON line already read: `success` first,
//! then the identifier and the mode-specific fields; failures carry `error` before
//! `video_id`.

use serde::{Deserialize, Serialize};

use super::TranscriptSnippet;
use crate::extractors::TranscriptTrack;

/// Outcome of a transcript fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptResult {
    Fetched(FetchedRecord),
    Failed(Failure),
}

/// Outcome of a transcript listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptListing {
    Listed(ListedRecord),
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub success: bool,
    pub video_id: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub transcript: Vec<TranscriptSnippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedRecord {
    pub success: bool,
    pub video_id: String,
    pub available_transcripts: Vec<TrackRecord>,
}

/// One available transcript track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// Shared failure shape of both operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
    pub video_id: String,
}

impl FetchedRecord {
    pub fn new(
        video_id: impl Into<String>,
        language: String,
        language_code: String,
        is_generated: bool,
        transcript: Vec<TranscriptSnippet>,
    ) -> Self {
        Self {
            success: true,
            video_id: video_id.into(),
            language,
            language_code,
            is_generated,
            transcript,
        }
    }
}

impl ListedRecord {
    pub fn new(video_id: impl Into<String>, tracks: Vec<TranscriptTrack>) -> Self {
        Self {
            success: true,
            video_id: video_id.into(),
            available_transcripts: tracks.iter().map(TrackRecord::from).collect(),
        }
    }
}

impl From<&TranscriptTrack> for TrackRecord {
    fn from(track: &TranscriptTrack) -> Self {
        Self {
            language: track.language.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            is_translatable: track.is_translatable,
        }
    }
}

impl Failure {
    pub fn new(error: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            video_id: video_id.into(),
        }
    }
}

impl TranscriptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptResult::Fetched(record) if record.success)
    }

    pub fn video_id(&self) -> &str {
        match self {
            TranscriptResult::Fetched(record) => &record.video_id,
            TranscriptResult::Failed(failure) => &failure.video_id,
        }
    }
}

impl TranscriptListing {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptListing::Listed(record) if record.success)
    }

    pub fn video_id(&self) -> &str {
        match self {
            TranscriptListing::Listed(record) => &record.video_id,
            TranscriptListing::Failed(failure) => &failure.video_id,
        }
    }
}
