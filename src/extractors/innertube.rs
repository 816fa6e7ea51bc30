//! Parsing of the pieces YouTube hands back: the watch page, the InnerTube player
//! response and the `json3` timed-text documents.

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{Snippet, TranscriptTrack};
use crate::{Result, TranscriptError};

const CONSENT_FORM_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const API_KEY_MARKER: &str = "\"INNERTUBE_API_KEY\":";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";

const BOT_DETECTED_REASON: &str = "Sign in to confirm you're not a bot";
const AGE_RESTRICTED_REASON: &str = "This video may be inappropriate for some users.";
const VIDEO_UNAVAILABLE_REASON: &str = "This video is unavailable";

/// Whether the watch page is the cookie-consent interstitial
pub fn is_consent_page(html: &str) -> bool {
    html.contains(CONSENT_FORM_ACTION)
}

/// Value of the consent form's `v` field, used to build the `CONSENT` cookie
pub fn extract_consent_token(html: &str) -> Option<String> {
    let marker = "name=\"v\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// InnerTube API key embedded in the watch page
pub fn extract_api_key(html: &str) -> Option<String> {
    let start = html.find(API_KEY_MARKER)? + API_KEY_MARKER.len();
    let rest = html[start..].trim_start().strip_prefix('"')?;
    let key: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if key.is_empty() || !rest[key.len()..].starts_with('"') {
        return None;
    }
    Some(key)
}

pub fn has_recaptcha(html: &str) -> bool {
    html.contains(RECAPTCHA_MARKER)
}

/// Body of the InnerTube `player` request
pub fn player_request_body(video_id: &str) -> serde_json::Value {
    serde_json::json!({
        "context": {
            "client": {
                "clientName": "ANDROID",
                "clientVersion": "20.10.38"
            }
        },
        "videoId": video_id
    })
}

/// The subset of the InnerTube player response needed for captions
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    pub status: Option<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub error_screen: Option<ErrorScreen>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorScreen {
    #[serde(default)]
    pub player_error_message_renderer: Option<PlayerErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerErrorMessage {
    #[serde(default)]
    pub subreason: Option<TextRuns>,
}

#[derive(Debug, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracklist {
    pub caption_tracks: Option<Vec<CaptionTrack>>,
    #[serde(default)]
    pub translation_languages: Vec<TranslationLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub name: TextRuns,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationLanguage {
    pub language_code: String,
    pub language_name: TextRuns,
}

/// YouTube's text container: either `simpleText` or a list of `runs`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRuns {
    #[serde(default)]
    pub simple_text: Option<String>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

#[derive(Debug, Deserialize)]
pub struct Run {
    pub text: String,
}

impl TextRuns {
    /// First run's text, or the simple text
    pub fn first(&self) -> String {
        self.runs
            .first()
            .map(|run| run.text.clone())
            .or_else(|| self.simple_text.clone())
            .unwrap_or_default()
    }

    /// Every run's text, or the simple text
    pub fn all(&self) -> Vec<String> {
        if self.runs.is_empty() {
            self.simple_text.iter().cloned().collect()
        } else {
            self.runs.iter().map(|run| run.text.clone()).collect()
        }
    }
}

/// Map a non-OK playability status onto the matching failure
pub fn check_playability(video_id: &str, response: &PlayerResponse) -> Result<()> {
    let Some(playability) = &response.playability_status else {
        return Ok(());
    };
    let status = match playability.status.as_deref() {
        None | Some("OK") => return Ok(()),
        Some(status) => status,
    };
    let reason = playability.reason.as_deref();

    if status == "LOGIN_REQUIRED" {
        if reason == Some(BOT_DETECTED_REASON) {
            return Err(TranscriptError::RequestBlocked(video_id.to_string()).into());
        }
        if reason == Some(AGE_RESTRICTED_REASON) {
            return Err(TranscriptError::AgeRestricted {
                video_id: video_id.to_string(),
            }
            .into());
        }
    }
    if status == "ERROR" && reason == Some(VIDEO_UNAVAILABLE_REASON) {
        return Err(TranscriptError::VideoUnavailable(video_id.to_string()).into());
    }

    let subreasons = playability
        .error_screen
        .as_ref()
        .and_then(|screen| screen.player_error_message_renderer.as_ref())
        .and_then(|message| message.subreason.as_ref())
        .map(TextRuns::all)
        .unwrap_or_default();

    let mut description = reason.unwrap_or("no reason given").to_string();
    for sub in subreasons {
        description.push_str("; ");
        description.push_str(&sub);
    }

    Err(TranscriptError::VideoUnplayable {
        video_id: video_id.to_string(),
        reason: description,
    }
    .into())
}

/// One caption track together with the URL its content is served from
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrackInfo {
    pub url: String,
    pub track: TranscriptTrack,
}

/// Caption tracks of a video, split the way selection needs them
#[derive(Debug, Clone, Default)]
pub struct CaptionCatalog {
    pub video_id: String,
    manual: Vec<CaptionTrackInfo>,
    generated: Vec<CaptionTrackInfo>,
    translation_languages: Vec<(String, String)>,
}

impl CaptionCatalog {
    /// Build the catalog from a player response whose playability already checked out
    pub fn from_player(video_id: &str, response: &PlayerResponse) -> Result<Self> {
        let tracklist = response
            .captions
            .as_ref()
            .and_then(|captions| captions.tracklist.as_ref());
        let Some(caption_tracks) = tracklist.and_then(|t| t.caption_tracks.as_ref()) else {
            return Err(TranscriptError::TranscriptsDisabled(video_id.to_string()).into());
        };

        let mut catalog = Self {
            video_id: video_id.to_string(),
            ..Self::default()
        };

        for caption in caption_tracks {
            let is_generated = caption.kind.as_deref() == Some("asr");
            let info = CaptionTrackInfo {
                url: caption.base_url.replace("&fmt=srv3", ""),
                track: TranscriptTrack {
                    language: caption.name.first(),
                    language_code: caption.language_code.clone(),
                    is_generated,
                    is_translatable: caption.is_translatable,
                },
            };
            let bucket = if is_generated {
                &mut catalog.generated
            } else {
                &mut catalog.manual
            };
            // One track per language code; a later duplicate replaces the earlier one in place
            match bucket
                .iter_mut()
                .find(|existing| existing.track.language_code == info.track.language_code)
            {
                Some(existing) => *existing = info,
                None => bucket.push(info),
            }
        }

        if let Some(tracklist) = tracklist {
            catalog.translation_languages = tracklist
                .translation_languages
                .iter()
                .map(|lang| (lang.language_code.clone(), lang.language_name.first()))
                .collect();
        }

        Ok(catalog)
    }

    /// All tracks, manually created first, then generated
    pub fn tracks(&self) -> impl Iterator<Item = &CaptionTrackInfo> {
        self.manual.iter().chain(self.generated.iter())
    }

    /// First track matching the preference list; manual tracks win per language
    pub fn find(&self, languages: &[String]) -> Result<&CaptionTrackInfo> {
        for code in languages {
            if let Some(found) = self
                .manual
                .iter()
                .chain(self.generated.iter())
                .find(|info| &info.track.language_code == code)
            {
                return Ok(found);
            }
        }

        Err(TranscriptError::NoTranscriptFound {
            video_id: self.video_id.clone(),
            requested: languages.to_vec(),
            available: self
                .tracks()
                .map(|info| info.track.language_code.clone())
                .collect(),
        }
        .into())
    }

    /// Display name of a translation target, if the video offers it
    pub fn translation_language(&self, code: &str) -> Option<&str> {
        self.translation_languages
            .iter()
            .find(|(lang_code, _)| lang_code == code)
            .map(|(_, name)| name.as_str())
    }
}

/// URL serving the track's content as `json3`, optionally translated
pub fn timedtext_url(video_id: &str, base_url: &str, translate_to: Option<&str>) -> Result<Url> {
    if base_url.contains("&exp=xpe") {
        return Err(TranscriptError::PoTokenRequired(video_id.to_string()).into());
    }

    let mut url = Url::parse(base_url)
        .map_err(|e| anyhow::anyhow!("Invalid caption track URL {}: {}", base_url, e))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt" && key != "tlang")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(kept.iter());
        query.append_pair("fmt", "json3");
        if let Some(lang) = translate_to {
            query.append_pair("tlang", lang);
        }
    }

    Ok(url)
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    #[serde(default)]
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` timed-text document into snippets, keeping document order
pub fn parse_json3(video_id: &str, body: &str) -> Result<Vec<Snippet>> {
    if body.trim().is_empty() {
        return Err(TranscriptError::YouTubeDataUnparsable(video_id.to_string()).into());
    }

    let document: Json3Document = serde_json::from_str(body)
        .with_context(|| TranscriptError::YouTubeDataUnparsable(video_id.to_string()))?;

    let snippets = document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|seg| seg.utf8).collect();
            if text.is_empty() || text == "\n" {
                return None;
            }
            Some(Snippet {
                text,
                start: event.t_start_ms / 1000.0,
                duration: event.d_duration_ms / 1000.0,
            })
        })
        .collect();

    Ok(snippets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(json: serde_json::Value) -> PlayerResponse {
        serde_json::from_value(json).unwrap()
    }

    fn error_kind(err: anyhow::Error) -> TranscriptError {
        err.downcast::<TranscriptError>().unwrap()
    }

    fn sample_player() -> PlayerResponse {
        player(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "captions": {
                "playerCaptionsTracklistRenderer": {
                    "captionTracks": [
                        {
                            "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=en&kind=asr&fmt=srv3",
                            "name": { "runs": [{ "text": "English (auto-generated)" }] },
                            "languageCode": "en",
                            "kind": "asr",
                            "isTranslatable": true
                        },
                        {
                            "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=de",
                            "name": { "simpleText": "German" },
                            "languageCode": "de",
                            "isTranslatable": false
                        },
                        {
                            "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=en-GB",
                            "name": { "runs": [{ "text": "English (United Kingdom)" }] },
                            "languageCode": "en-GB",
                            "isTranslatable": true
                        }
                    ],
                    "translationLanguages": [
                        { "languageCode": "fr", "languageName": { "runs": [{ "text": "French" }] } }
                    ]
                }
            }
        }))
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSy_test-KEY1","OTHER":1})</script>"#;
        assert_eq!(extract_api_key(html), Some("AIzaSy_test-KEY1".to_string()));

        let compact = r#"{"INNERTUBE_API_KEY":"abc"}"#;
        assert_eq!(extract_api_key(compact), Some("abc".to_string()));

        assert_eq!(extract_api_key("<html></html>"), None);
        assert_eq!(extract_api_key(r#""INNERTUBE_API_KEY": "bad key""#), None);
    }

    #[test]
    fn test_consent_page() {
        let html = r#"<form action="https://consent.youtube.com/s"><input name="v" value="cb.20210328-17-p0.en+FX+123"></form>"#;
        assert!(is_consent_page(html));
        assert_eq!(
            extract_consent_token(html),
            Some("cb.20210328-17-p0.en+FX+123".to_string())
        );
        assert!(!is_consent_page("<html></html>"));
        assert_eq!(extract_consent_token("<html></html>"), None);
    }

    #[test]
    fn test_recaptcha() {
        assert!(has_recaptcha(r#"<div class="g-recaptcha"></div>"#));
        assert!(!has_recaptcha("<div></div>"));
    }

    #[test]
    fn test_player_request_body() {
        let body = player_request_body("abc");
        assert_eq!(body["videoId"], "abc");
        assert_eq!(body["context"]["client"]["clientName"], "ANDROID");
    }

    #[test]
    fn test_playability_ok() {
        assert!(check_playability("abc", &sample_player()).is_ok());
        assert!(check_playability("abc", &PlayerResponse::default()).is_ok());
    }

    #[test]
    fn test_playability_failures() {
        let blocked = player(serde_json::json!({
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": BOT_DETECTED_REASON }
        }));
        assert!(matches!(
            error_kind(check_playability("abc", &blocked).unwrap_err()),
            TranscriptError::RequestBlocked(_)
        ));

        let age = player(serde_json::json!({
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": AGE_RESTRICTED_REASON }
        }));
        assert!(matches!(
            error_kind(check_playability("abc", &age).unwrap_err()),
            TranscriptError::AgeRestricted { .. }
        ));

        let unavailable = player(serde_json::json!({
            "playabilityStatus": { "status": "ERROR", "reason": VIDEO_UNAVAILABLE_REASON }
        }));
        assert!(matches!(
            error_kind(check_playability("abc", &unavailable).unwrap_err()),
            TranscriptError::VideoUnavailable(_)
        ));
    }

    #[test]
    fn test_playability_unplayable_carries_subreasons() {
        let unplayable = player(serde_json::json!({
            "playabilityStatus": {
                "status": "UNPLAYABLE",
                "reason": "Video unavailable",
                "errorScreen": {
                    "playerErrorMessageRenderer": {
                        "subreason": { "runs": [{ "text": "Blocked in your country" }] }
                    }
                }
            }
        }));
        let err = check_playability("abc", &unplayable).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The video abc is unplayable: Video unavailable; Blocked in your country"
        );
    }

    #[test]
    fn test_catalog_missing_captions_is_disabled() {
        let response = player(serde_json::json!({ "playabilityStatus": { "status": "OK" } }));
        let err = CaptionCatalog::from_player("abc", &response).unwrap_err();
        assert!(matches!(error_kind(err), TranscriptError::TranscriptsDisabled(_)));

        let no_tracks = player(serde_json::json!({
            "captions": { "playerCaptionsTracklistRenderer": { "translationLanguages": [] } }
        }));
        assert!(CaptionCatalog::from_player("abc", &no_tracks).is_err());
    }

    #[test]
    fn test_catalog_orders_manual_before_generated() {
        let catalog = CaptionCatalog::from_player("abc", &sample_player()).unwrap();
        let codes: Vec<_> = catalog
            .tracks()
            .map(|info| info.track.language_code.as_str())
            .collect();
        assert_eq!(codes, vec!["de", "en-GB", "en"]);

        let en = catalog.tracks().last().unwrap();
        assert_eq!(en.track.language, "English (auto-generated)");
        assert!(en.track.is_generated);
        assert!(en.track.is_translatable);
        assert!(!en.url.contains("fmt=srv3"));

        let de = catalog.tracks().next().unwrap();
        assert_eq!(de.track.language, "German");
        assert!(!de.track.is_generated);
    }

    #[test]
    fn test_find_follows_preference_order() {
        let catalog = CaptionCatalog::from_player("abc", &sample_player()).unwrap();

        let langs = |codes: &[&str]| codes.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        let found = catalog.find(&langs(&["en", "en-US", "en-GB"])).unwrap();
        assert_eq!(found.track.language_code, "en");

        let found = catalog.find(&langs(&["fr", "en-GB", "en"])).unwrap();
        assert_eq!(found.track.language_code, "en-GB");

        let err = catalog.find(&langs(&["ja"])).unwrap_err();
        match error_kind(err) {
            TranscriptError::NoTranscriptFound {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, vec!["ja"]);
                assert_eq!(available, vec!["de", "en-GB", "en"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_manual_track_wins_for_same_language() {
        let response = player(serde_json::json!({
            "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [
                { "baseUrl": "https://x/asr", "name": { "simpleText": "English (auto)" }, "languageCode": "en", "kind": "asr" },
                { "baseUrl": "https://x/manual", "name": { "simpleText": "English" }, "languageCode": "en" }
            ] } }
        }));
        let catalog = CaptionCatalog::from_player("abc", &response).unwrap();
        let found = catalog.find(&["en".to_string()]).unwrap();
        assert_eq!(found.url, "https://x/manual");
    }

    #[test]
    fn test_translation_language_lookup() {
        let catalog = CaptionCatalog::from_player("abc", &sample_player()).unwrap();
        assert_eq!(catalog.translation_language("fr"), Some("French"));
        assert_eq!(catalog.translation_language("ja"), None);
    }

    #[test]
    fn test_timedtext_url() {
        let url = timedtext_url(
            "abc",
            "https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv3",
            None,
        )
        .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("fmt".to_string(), "json3".to_string())));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "fmt").count(), 1);
        assert!(pairs.contains(&("lang".to_string(), "en".to_string())));

        let translated = timedtext_url("abc", "https://www.youtube.com/api/timedtext?v=abc", Some("fr")).unwrap();
        assert!(translated.query_pairs().any(|(k, v)| k == "tlang" && v == "fr"));
    }

    #[test]
    fn test_timedtext_url_requires_po_token() {
        let err = timedtext_url("abc", "https://www.youtube.com/api/timedtext?v=abc&exp=xpe", None)
            .unwrap_err();
        assert!(matches!(error_kind(err), TranscriptError::PoTokenRequired(_)));
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                { "tStartMs": 0, "dDurationMs": 1540 },
                { "tStartMs": 0, "dDurationMs": 1540, "segs": [{ "utf8": "Hello " }, { "utf8": "world" }] },
                { "tStartMs": 1540, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 1540, "dDurationMs": 2000, "segs": [{ "utf8": "Ça va?" }] }
            ]
        }"#;
        let snippets = parse_json3("abc", body).unwrap();
        assert_eq!(
            snippets,
            vec![
                Snippet {
                    text: "Hello world".to_string(),
                    start: 0.0,
                    duration: 1.54
                },
                Snippet {
                    text: "Ça va?".to_string(),
                    start: 1.54,
                    duration: 2.0
                },
            ]
        );
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3("abc", "").is_err());
        assert!(parse_json3("abc", "<transcript/>").is_err());
        assert!(parse_json3("abc", "{}").unwrap().is_empty());
    }
}
