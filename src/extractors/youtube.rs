use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::innertube::{self, CaptionCatalog, PlayerResponse};
use super::{FetchedTranscript, TranscriptRequest, TranscriptSource, TranscriptTrack};
use crate::config::Config;
use crate::{Result, TranscriptError};

/// YouTube transcript source talking to the watch page and the InnerTube API
pub struct YoutubeTranscriptSource {
    client: Client,
    base_url: String,
}

impl YoutubeTranscriptSource {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.http.accept_language)
                .context("Invalid Accept-Language header")?,
        );

        let mut builder = Client::builder()
            .user_agent(config.http.user_agent.clone())
            .default_headers(headers);

        if let Some(secs) = config.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(proxy) = &config.http.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            base_url: config.youtube.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!(
            "{}/watch?v={}",
            self.base_url,
            urlencoding::encode(video_id)
        )
    }

    async fn fetch_watch_page(&self, video_id: &str, cookie: Option<&str>) -> Result<String> {
        let mut request = self.client.get(self.watch_url(video_id));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let response = check_status(video_id, response)?;
        Ok(response.text().await?)
    }

    /// Watch page HTML, passing the cookie-consent interstitial when it shows up
    async fn watch_page(&self, video_id: &str) -> Result<String> {
        tracing::debug!("Fetching watch page for video: {}", video_id);
        let html = self.fetch_watch_page(video_id, None).await?;
        if !innertube::is_consent_page(&html) {
            return Ok(html);
        }

        tracing::debug!("Consent page served, retrying with consent cookie");
        let token = innertube::extract_consent_token(&html)
            .ok_or_else(|| TranscriptError::FailedToCreateConsentCookie(video_id.to_string()))?;
        let html = self
            .fetch_watch_page(video_id, Some(&format!("CONSENT=YES+{}", token)))
            .await?;

        if innertube::is_consent_page(&html) {
            return Err(TranscriptError::FailedToCreateConsentCookie(video_id.to_string()).into());
        }
        Ok(html)
    }

    async fn player_response(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        tracing::debug!("Requesting InnerTube player data for video: {}", video_id);
        let response = self
            .client
            .post(format!(
                "{}/youtubei/v1/player?key={}",
                self.base_url,
                urlencoding::encode(api_key)
            ))
            .json(&innertube::player_request_body(video_id))
            .send()
            .await?;

        let response = check_status(video_id, response)?;
        let player: PlayerResponse = response
            .json()
            .await
            .with_context(|| TranscriptError::YouTubeDataUnparsable(video_id.to_string()))?;
        Ok(player)
    }

    /// Caption tracks for a video, following the full page -> API key -> player flow
    async fn catalog(&self, video_id: &str) -> Result<CaptionCatalog> {
        if video_id.starts_with("http://") || video_id.starts_with("https://") {
            return Err(TranscriptError::InvalidVideoId(video_id.to_string()).into());
        }

        let html = self.watch_page(video_id).await?;
        let api_key = match innertube::extract_api_key(&html) {
            Some(key) => key,
            None if innertube::has_recaptcha(&html) => {
                return Err(TranscriptError::IpBlocked(video_id.to_string()).into())
            }
            None => {
                return Err(TranscriptError::YouTubeDataUnparsable(video_id.to_string()).into())
            }
        };

        let player = self.player_response(video_id, &api_key).await?;
        innertube::check_playability(video_id, &player)?;
        CaptionCatalog::from_player(video_id, &player)
    }
}

/// Turn rate limiting and other HTTP failures into transcript errors
fn check_status(video_id: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => {
            Err(TranscriptError::TooManyRequests(video_id.to_string()).into())
        }
        status => Err(TranscriptError::Http {
            video_id: video_id.to_string(),
            status: status.as_u16(),
        }
        .into()),
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn fetch(&self, request: &TranscriptRequest) -> Result<FetchedTranscript> {
        let video_id = request.video_id.as_str();
        let catalog = self.catalog(video_id).await?;
        let selected = catalog.find(&request.languages)?;

        let mut language = selected.track.language.clone();
        let mut language_code = selected.track.language_code.clone();
        let mut is_generated = selected.track.is_generated;

        if let Some(target) = request.translate_to.as_deref() {
            if !selected.track.is_translatable {
                return Err(TranscriptError::NotTranslatable(video_id.to_string()).into());
            }
            let name = catalog.translation_language(target).ok_or_else(|| {
                TranscriptError::TranslationLanguageNotAvailable {
                    video_id: video_id.to_string(),
                    language: target.to_string(),
                }
            })?;
            language = name.to_string();
            language_code = target.to_string();
            is_generated = true;
        }

        let url = innertube::timedtext_url(video_id, &selected.url, request.translate_to.as_deref())?;
        tracing::debug!(
            "Downloading {} transcript for video: {}",
            language_code,
            video_id
        );

        let response = self.client.get(url).send().await?;
        let body = check_status(video_id, response)?.text().await?;
        let snippets = innertube::parse_json3(video_id, &body)?;

        tracing::info!(
            "Fetched {} snippets ({}) for video: {}",
            snippets.len(),
            language_code,
            video_id
        );

        Ok(FetchedTranscript {
            language,
            language_code,
            is_generated,
            snippets,
        })
    }

    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptTrack>> {
        let catalog = self.catalog(video_id).await?;
        let tracks: Vec<TranscriptTrack> = catalog.tracks().map(|info| info.track.clone()).collect();
        tracing::info!("Found {} transcript tracks for video: {}", tracks.len(), video_id);
        Ok(tracks)
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}
