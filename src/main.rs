use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_fetcher::cli::{Cli, Mode};
use transcript_fetcher::config::Config;
use transcript_fetcher::extractors::youtube::YoutubeTranscriptSource;
use transcript_fetcher::extractors::TranscriptRequest;
use transcript_fetcher::output;
use transcript_fetcher::transcript::TranscriptService;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let Some(video_id) = cli.video_id.as_deref() else {
        return fatal("Video ID required");
    };

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fatal(&format!("{:#}", err)),
    };

    let source = match YoutubeTranscriptSource::new(&config) {
        Ok(source) => source,
        Err(err) => return fatal(&format!("{:#}", err)),
    };
    let service = TranscriptService::new(source, config.languages_or(&cli.languages));

    tracing::debug!("Running {} for video: {}", cli.mode(), video_id);

    let printed = match cli.mode() {
        Mode::List => {
            let listing = service.list_transcripts(video_id).await;
            tracing::debug!(
                success = listing.is_success(),
                "Listing ready for video: {}",
                listing.video_id()
            );
            output::print_to_console(&listing)
        }
        Mode::Fetch => {
            let result = match &cli.translate {
                None => service.fetch_transcript(video_id).await,
                Some(target) => {
                    let request =
                        TranscriptRequest::new(video_id, config.languages_or(&cli.languages))
                            .with_translation(Some(target.clone()));
                    service.fetch_with(&request).await
                }
            };
            tracing::debug!(
                success = result.is_success(),
                "Transcript ready for video: {}",
                result.video_id()
            );
            output::print_to_console(&result)
        }
    };

    match printed {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Failed to write result: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries only the JSON line
fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "transcript_fetcher=debug"
    } else {
        "transcript_fetcher=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Print the minimal error object and fail before any network call
fn fatal(message: &str) -> ExitCode {
    if let Err(err) = output::print_to_console(&output::fatal_error(message)) {
        tracing::error!("Failed to write error: {:#}", err);
    }
    ExitCode::FAILURE
}
