use serde::{Deserialize, Serialize};

use crate::extractors::{FetchedTranscript, TranscriptRequest, TranscriptSource};

pub mod records;

pub use records::{
    Failure, FetchedRecord, ListedRecord, TrackRecord, TranscriptListing, TranscriptResult,
};

/// Individual transcript snippet as relayed to the consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    /// Snippet text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Adapter turning source outcomes into fixed output records.
///
/// Every failure of the source is caught here and reported inside the record; nothing
/// propagates to the caller.
pub struct TranscriptService<S: TranscriptSource> {
    source: S,
    languages: Vec<String>,
}

impl<S: TranscriptSource> TranscriptService<S> {
    /// Create a service with the default language preference for fetches
    pub fn new(source: S, languages: Vec<String>) -> Self {
        Self { source, languages }
    }

    /// Fetch a transcript using the service's language preference
    pub async fn fetch_transcript(&self, video_id: &str) -> TranscriptResult {
        let request = TranscriptRequest::new(video_id, self.languages.clone());
        self.fetch_with(&request).await
    }

    /// Fetch a transcript for an explicit request
    pub async fn fetch_with(&self, request: &TranscriptRequest) -> TranscriptResult {
        tracing::info!(
            "Fetching transcript for video {} from {} (languages: {:?})",
            request.video_id,
            self.source.platform_name(),
            request.languages
        );

        match self.source.fetch(request).await {
            Ok(transcript) => TranscriptResult::Fetched(fetched_record(transcript, &request.video_id)),
            Err(err) => {
                let message = describe_error(&err);
                tracing::warn!("Transcript fetch failed for {}: {}", request.video_id, message);
                TranscriptResult::Failed(Failure::new(message, &request.video_id))
            }
        }
    }

    /// List the transcript tracks a video offers
    pub async fn list_transcripts(&self, video_id: &str) -> TranscriptListing {
        tracing::info!(
            "Listing transcripts for video {} from {}",
            video_id,
            self.source.platform_name()
        );

        match self.source.list(video_id).await {
            Ok(tracks) => TranscriptListing::Listed(ListedRecord::new(video_id, tracks)),
            Err(err) => {
                let message = describe_error(&err);
                tracing::warn!("Transcript listing failed for {}: {}", video_id, message);
                TranscriptListing::Failed(Failure::new(message, video_id))
            }
        }
    }
}

/// Error message with its cause chain, skipping causes whose text is already included.
///
/// HTTP client errors repeat their source in their own message.
pub fn describe_error(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if text.is_empty() || message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

/// The record echoes the requested identifier, not whatever the source reports
fn fetched_record(transcript: FetchedTranscript, video_id: &str) -> FetchedRecord {
    let snippets = transcript
        .snippets
        .into_iter()
        .map(|snippet| TranscriptSnippet {
            text: snippet.text,
            start: snippet.start,
            duration: snippet.duration,
        })
        .collect();

    FetchedRecord::new(
        video_id,
        transcript.language,
        transcript.language_code,
        transcript.is_generated,
        snippets,
    )
}
