use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::{CaptionError, CaptionFragment, CaptionSource, VideoId};
use crate::Result;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";

static API_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#)
        .expect("InnerTube key pattern should compile")
});
const TEXT_TAG: &[u8] = b"text";

/// One caption track advertised by the player response
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub is_generated: bool,
    pub base_url: String,
}

/// Caption source backed by the public watch page and InnerTube player API
pub struct WatchPageCaptions {
    client: Client,
}

impl WatchPageCaptions {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CaptionError::Http(format!("Failed to fetch watch page: {}", e)))?;

        check_http_errors(&response, video_id)?;

        let html = response
            .text()
            .await
            .map_err(|e| CaptionError::Http(format!("Failed to read watch page: {}", e)))?;

        Ok(html)
    }

    async fn fetch_player_data(&self, video_id: &str, api_key: &str) -> Result<Value> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptionError::Http(format!("Failed to fetch player data: {}", e)))?;

        check_http_errors(&response, video_id)?;

        let data = response
            .json()
            .await
            .map_err(|_| CaptionError::Unparsable(video_id.to_string()))?;

        Ok(data)
    }

    async fn fetch_track(&self, video_id: &str, track: &CaptionTrack) -> Result<Vec<CaptionFragment>> {
        if track.base_url.contains("&exp=xpe") {
            return Err(CaptionError::PoTokenRequired(video_id.to_string()).into());
        }

        let response = self
            .client
            .get(&track.base_url)
            .send()
            .await
            .map_err(|e| CaptionError::Http(format!("Failed to fetch caption track: {}", e)))?;

        check_http_errors(&response, video_id)?;

        let xml = response
            .text()
            .await
            .map_err(|e| CaptionError::Http(format!("Failed to read caption track: {}", e)))?;

        parse_timed_text(&xml).map_err(|e| {
            tracing::debug!("Malformed timed text for {}: {}", video_id, e);
            CaptionError::Unparsable(video_id.to_string()).into()
        })
    }
}

#[async_trait]
impl CaptionSource for WatchPageCaptions {
    async fn fetch_captions(
        &self,
        video: &VideoId,
        languages: &[String],
    ) -> Result<Vec<CaptionFragment>> {
        let video_id = video.as_str();
        tracing::debug!("Fetching captions for {} (languages: {:?})", video_id, languages);

        let html = self.fetch_watch_page(video_id).await?;
        let api_key = extract_api_key(&html, video_id)?;
        let player = self.fetch_player_data(video_id, &api_key).await?;
        let tracks = extract_caption_tracks(video_id, &player)?;
        let track = choose_track(&tracks, languages).ok_or_else(|| {
            CaptionError::NoTranscriptFound(video_id.to_string(), languages.to_vec())
        })?;

        tracing::debug!(
            "Using {} caption track '{}' for {}",
            if track.is_generated { "generated" } else { "manual" },
            track.language_code,
            video_id
        );

        self.fetch_track(video_id, track).await
    }
}

fn check_http_errors(response: &reqwest::Response, video_id: &str) -> std::result::Result<(), CaptionError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(CaptionError::RequestBlocked(video_id.to_string()));
    }
    if !status.is_success() {
        return Err(CaptionError::Http(format!(
            "HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown error")
        )));
    }
    Ok(())
}

fn extract_api_key(html: &str, video_id: &str) -> std::result::Result<String, CaptionError> {
    if html.contains("g-recaptcha") {
        return Err(CaptionError::RequestBlocked(video_id.to_string()));
    }

    API_KEY_REGEX
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| CaptionError::Unparsable(video_id.to_string()))
}

fn assert_playability(video_id: &str, player: &Value) -> std::result::Result<(), CaptionError> {
    let Some(playability) = player.get("playabilityStatus") else {
        return Ok(());
    };

    let status = playability.get("status").and_then(Value::as_str).unwrap_or("");
    if status == "OK" {
        return Ok(());
    }

    let reason = playability.get("reason").and_then(Value::as_str).unwrap_or("");
    match status {
        "LOGIN_REQUIRED" if reason.contains("not a bot") => {
            Err(CaptionError::RequestBlocked(video_id.to_string()))
        }
        "ERROR" if reason.contains("unavailable") => {
            Err(CaptionError::VideoUnavailable(video_id.to_string()))
        }
        _ => Err(CaptionError::VideoUnplayable(
            video_id.to_string(),
            reason.to_string(),
        )),
    }
}

/// Read the advertised caption tracks out of an InnerTube player response
pub fn extract_caption_tracks(
    video_id: &str,
    player: &Value,
) -> std::result::Result<Vec<CaptionTrack>, CaptionError> {
    assert_playability(video_id, player)?;

    let tracks: Vec<CaptionTrack> = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|track| {
                    let language_code = track.get("languageCode")?.as_str()?.to_string();
                    let base_url = track.get("baseUrl")?.as_str()?.replace("&fmt=srv3", "");
                    let is_generated = track.get("kind").and_then(Value::as_str) == Some("asr");
                    Some(CaptionTrack {
                        language_code,
                        is_generated,
                        base_url,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(CaptionError::TranscriptsDisabled(video_id.to_string()));
    }

    Ok(tracks)
}

/// First track in language preference order, manual tracks before generated ones
pub fn choose_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
        let manual = candidates.clone().find(|t| !t.is_generated);
        manual.or_else(|| candidates.next())
    })
}

/// Parse a timed-text XML document into fragments, in document order.
///
/// Self-closing and whitespace-only `<text>` elements yield no fragment.
pub fn parse_timed_text(xml: &str) -> std::result::Result<Vec<CaptionFragment>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();
    let mut current: Option<CaptionFragment> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) if element.name().as_ref() == TEXT_TAG => {
                current = Some(fragment_from_attributes(&element));
            }
            Event::Empty(element) if element.name().as_ref() == TEXT_TAG => {}
            Event::Text(text) => {
                if let Some(fragment) = current.as_mut() {
                    let decoded = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    fragment.text.push_str(&decoded);
                }
            }
            Event::End(element) if element.name().as_ref() == TEXT_TAG => {
                if let Some(mut fragment) = current.take() {
                    // Caption payloads are entity-escaped twice: once for XML, once for HTML.
                    let text = unescape(&fragment.text).trim().to_string();
                    if !text.is_empty() {
                        fragment.text = text;
                        fragments.push(fragment);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fragments)
}

fn fragment_from_attributes(element: &BytesStart<'_>) -> CaptionFragment {
    let mut fragment = CaptionFragment::new(String::new());
    for attribute in element.attributes().flatten() {
        let value = attribute
            .unescape_value()
            .ok()
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        match attribute.key.as_ref() {
            b"start" => fragment.start = value,
            b"dur" => fragment.duration = value,
            _ => {}
        }
    }
    fragment
}

fn unescape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}
