//! Platform API provider
//!
//! Resolves metadata by driving the platform's internal JSON API through the
//! transport adapter: `browse` for the trending feed and channels, `search`
//! for queries, `player` for stream detail. Responses are deeply nested and
//! versioned by the platform, so extraction walks the JSON for well-known
//! renderer objects instead of binding the whole payload to types. Whatever
//! it finds is shaped into the same raw records the tool provider emits.

use crate::mapper::{extract_channel_id, extract_video_id};
use crate::provider::models::{RawChannel, RawFormat, RawThumbnail, RawVideo};
use crate::provider::traits::MetadataProvider;
use crate::transport::{HttpRequest, Transport};
use crate::utils::BridgeError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const API_BASE: &str = "https://www.youtube.com/youtubei/v1";
const CLIENT_NAME: &str = "WEB";
const CLIENT_VERSION: &str = "2.20250702.00.00";
const TRENDING_BROWSE_ID: &str = "FEtrending";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Metadata provider backed by the platform's internal JSON API.
pub struct ApiProvider {
    transport: Arc<Transport>,
}

impl ApiProvider {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// POST one API call and parse the response body as JSON.
    async fn call(&self, endpoint: &str, mut payload: Value) -> Result<Value, BridgeError> {
        payload["context"] = json!({
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en",
                "gl": "US",
            }
        });

        let url = format!("{}/{}?prettyPrint=false", API_BASE, endpoint);
        let request = HttpRequest::post(url, payload.to_string())
            .header("content-type", "application/json")
            .header("x-youtube-client-name", "1")
            .header("x-youtube-client-version", CLIENT_VERSION);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(BridgeError::Provider(format!(
                "API {} returned {} {}",
                endpoint, response.status, response.message
            )));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            BridgeError::Provider(format!("API {} returned malformed JSON: {}", endpoint, e))
        })
    }

    fn list_from_renderers(response: &Value) -> Vec<RawVideo> {
        let mut renderers = Vec::new();
        collect_objects(response, "videoRenderer", &mut renderers);

        let videos: Vec<RawVideo> = renderers.iter().filter_map(|r| map_renderer(r)).collect();
        debug!(count = videos.len(), "mapped video renderers");
        videos
    }
}

#[async_trait]
impl MetadataProvider for ApiProvider {
    fn id(&self) -> &'static str {
        "platform-api"
    }

    async fn fetch_trending(&self) -> Result<Vec<RawVideo>, BridgeError> {
        let response = self
            .call("browse", json!({ "browseId": TRENDING_BROWSE_ID }))
            .await?;

        let videos = Self::list_from_renderers(&response);
        if videos.is_empty() {
            return Err(BridgeError::Provider(
                "trending feed produced no entries".to_string(),
            ));
        }
        Ok(videos)
    }

    async fn fetch_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawVideo>, BridgeError> {
        let response = self.call("search", json!({ "query": query })).await?;

        let mut videos = Self::list_from_renderers(&response);
        videos.truncate(max_results);
        Ok(videos)
    }

    async fn fetch_stream_detail(&self, url: &str) -> Result<RawVideo, BridgeError> {
        let video_id = extract_video_id(url);
        if video_id.is_empty() {
            return Err(BridgeError::InvalidUrl(url.to_string()));
        }

        let response = self.call("player", json!({ "videoId": video_id })).await?;

        let status = str_at(&response, &["playabilityStatus", "status"]).unwrap_or("UNKNOWN");
        if status != "OK" {
            let reason = str_at(&response, &["playabilityStatus", "reason"]).unwrap_or(status);
            return Err(BridgeError::Provider(format!(
                "video {} not playable: {}",
                video_id, reason
            )));
        }

        let details = &response["videoDetails"];
        let mut formats = Vec::new();
        for section in ["formats", "adaptiveFormats"] {
            if let Some(entries) = response["streamingData"][section].as_array() {
                formats.extend(entries.iter().filter_map(map_player_format));
            }
        }

        Ok(RawVideo {
            id: details["videoId"].as_str().unwrap_or(&video_id).to_string(),
            title: details["title"].as_str().unwrap_or_default().to_string(),
            url: format!("{}{}", WATCH_URL_PREFIX, video_id),
            uploader: details["author"].as_str().map(str::to_string),
            uploader_id: details["channelId"].as_str().map(str::to_string),
            uploader_url: details["channelId"]
                .as_str()
                .map(|id| format!("https://www.youtube.com/channel/{}", id)),
            description: details["shortDescription"].as_str().map(str::to_string),
            duration: details["lengthSeconds"]
                .as_str()
                .and_then(|s| s.parse().ok()),
            view_count: details["viewCount"].as_str().and_then(|s| s.parse().ok()),
            upload_date: str_at(&response, &["microformat", "playerMicroformatRenderer", "publishDate"])
                .map(str::to_string),
            thumbnails: thumbnails_of(&details["thumbnail"]),
            is_live: details["isLiveContent"].as_bool().and_then(|live| {
                // isLiveContent stays true for finished premieres; only an
                // active broadcast disqualifies the record
                if live && response["videoDetails"]["isLive"].as_bool() == Some(true) {
                    Some(true)
                } else {
                    None
                }
            }),
            ..RawVideo::default()
        })
    }

    async fn fetch_channel(&self, channel_url: &str) -> Result<RawChannel, BridgeError> {
        // Channel URLs come in /channel/, /c/, and /user/ shapes; resolve_url
        // maps all of them to a canonical browse id.
        let channel_id = extract_channel_id(Some(channel_url));
        let browse_id = if channel_id.starts_with("UC") {
            channel_id
        } else {
            let resolved = self
                .call("navigation/resolve_url", json!({ "url": channel_url }))
                .await?;
            str_at(&resolved, &["endpoint", "browseEndpoint", "browseId"])
                .map(str::to_string)
                .ok_or_else(|| {
                    BridgeError::InvalidUrl(format!("cannot resolve channel: {}", channel_url))
                })?
        };

        let response = self.call("browse", json!({ "browseId": browse_id })).await?;

        let metadata = &response["metadata"]["channelMetadataRenderer"];
        if metadata.is_null() {
            return Err(BridgeError::Provider(
                "channel response carried no metadata".to_string(),
            ));
        }

        let subscriber_count = text_of(&response["header"]["c4TabbedHeaderRenderer"]["subscriberCountText"])
            .and_then(|text| parse_abbrev_count(&text));
        let video_count = text_of(&response["header"]["c4TabbedHeaderRenderer"]["videosCountText"])
            .and_then(|text| parse_digits(&text));

        Ok(RawChannel {
            id: metadata["externalId"].as_str().unwrap_or_default().to_string(),
            title: metadata["title"].as_str().unwrap_or_default().to_string(),
            description: metadata["description"].as_str().map(str::to_string),
            subscriber_count,
            video_count,
            thumbnails: thumbnails_of(&metadata["avatar"]),
            banner_url: response["header"]["c4TabbedHeaderRenderer"]["banner"]["thumbnails"]
                .as_array()
                .and_then(|thumbs| thumbs.last())
                .and_then(|thumb| thumb["url"].as_str())
                .map(str::to_string),
            verified: None,
        })
    }
}

// ============================================================
// Response walking helpers
// ============================================================

/// Collect every object held under `key` anywhere in the tree.
fn collect_objects<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key && v.is_object() {
                    out.push(v);
                }
                collect_objects(v, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_objects(item, key, out);
            }
        }
        _ => {}
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

/// Flatten a text node: either `{"simpleText": ...}` or `{"runs": [...]}`.
fn text_of(value: &Value) -> Option<String> {
    if let Some(simple) = value["simpleText"].as_str() {
        return Some(simple.to_string());
    }
    let runs = value["runs"].as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run["text"].as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn thumbnails_of(value: &Value) -> Vec<RawThumbnail> {
    value["thumbnails"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|t| serde_json::from_value(t.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// "1:02:03" → 3723 seconds; "45" and "12:34" work too.
fn parse_duration_text(text: &str) -> Option<u64> {
    let mut seconds: u64 = 0;
    for part in text.split(':') {
        seconds = seconds
            .checked_mul(60)?
            .checked_add(part.trim().parse().ok()?)?;
    }
    Some(seconds)
}

/// "1,234,567 views" → 1234567.
fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// "1.23M subscribers" → 1_230_000; bare numbers pass through.
fn parse_abbrev_count(text: &str) -> Option<u64> {
    let token = text.split_whitespace().next()?;
    let multiplier = match token.chars().last()? {
        'K' | 'k' => 1_000.0,
        'M' | 'm' => 1_000_000.0,
        'B' | 'b' => 1_000_000_000.0,
        _ => return parse_digits(token),
    };
    let number: f64 = token[..token.len() - 1].replace(',', "").parse().ok()?;
    Some((number * multiplier) as u64)
}

/// Shape one `videoRenderer` object into a list record.
fn map_renderer(renderer: &Value) -> Option<RawVideo> {
    let id = renderer["videoId"].as_str()?;
    let byline = if renderer["ownerText"].is_object() {
        &renderer["ownerText"]
    } else {
        &renderer["longBylineText"]
    };
    let channel_endpoint = &byline["runs"][0]["navigationEndpoint"]["browseEndpoint"];

    Some(RawVideo {
        id: id.to_string(),
        title: text_of(&renderer["title"]).unwrap_or_default(),
        url: format!("{}{}", WATCH_URL_PREFIX, id),
        uploader: text_of(byline),
        uploader_id: channel_endpoint["browseId"].as_str().map(str::to_string),
        uploader_url: channel_endpoint["canonicalBaseUrl"]
            .as_str()
            .map(|base| format!("https://www.youtube.com{}", base)),
        duration: text_of(&renderer["lengthText"]).and_then(|t| parse_duration_text(&t)),
        view_count: text_of(&renderer["viewCountText"]).and_then(|t| parse_digits(&t)),
        thumbnails: thumbnails_of(&renderer["thumbnail"]),
        ..RawVideo::default()
    })
}

/// Shape one `player` format entry into a raw format.
fn map_player_format(entry: &Value) -> Option<RawFormat> {
    let itag = entry["itag"].as_u64()?;
    let mime = entry["mimeType"].as_str().unwrap_or_default();
    let (ext, vcodec, acodec) = split_mime(mime);

    // bitrate fields are bits per second; raw records carry kbps
    let tbr = entry["bitrate"].as_f64().map(|b| (b / 1000.0) as f32);
    let abr = entry["averageBitrate"]
        .as_f64()
        .map(|b| (b / 1000.0) as f32)
        .filter(|_| acodec.as_deref() != Some("none"));

    Some(RawFormat {
        format_id: itag.to_string(),
        url: entry["url"].as_str().unwrap_or_default().to_string(),
        ext,
        vcodec,
        acodec,
        width: entry["width"].as_u64().map(|w| w as u32),
        height: entry["height"].as_u64().map(|h| h as u32),
        fps: entry["fps"].as_f64().map(|f| f as f32),
        abr,
        vbr: None,
        tbr,
        filesize: entry["contentLength"].as_str().and_then(|s| s.parse().ok()),
        protocol: Some("https".to_string()),
        format_note: entry["qualityLabel"].as_str().map(str::to_string),
    })
}

/// `video/mp4; codecs="avc1.4d401f, mp4a.40.2"` → (mp4, avc1…, mp4a…).
/// A single codec lands on the side the top-level type names; the other side
/// is reported as "none" so capability filtering stays uniform.
fn split_mime(mime: &str) -> (String, Option<String>, Option<String>) {
    let mut parts = mime.splitn(2, ';');
    let top = parts.next().unwrap_or_default().trim();
    let ext = top.rsplit('/').next().unwrap_or_default().to_string();

    let codecs: Vec<String> = parts
        .next()
        .and_then(|p| p.split('"').nth(1))
        .map(|list| list.split(',').map(|c| c.trim().to_string()).collect())
        .unwrap_or_default();

    let is_video = top.starts_with("video/");
    match codecs.len() {
        0 => (ext, None, None),
        1 if is_video => (ext, Some(codecs[0].clone()), Some("none".to_string())),
        1 => (ext, Some("none".to_string()), Some(codecs[0].clone())),
        _ => (ext, Some(codecs[0].clone()), Some(codecs[1].clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_of_handles_both_shapes() {
        let simple = json!({ "simpleText": "Hello" });
        assert_eq!(text_of(&simple), Some("Hello".to_string()));

        let runs = json!({ "runs": [{ "text": "Hel" }, { "text": "lo" }] });
        assert_eq!(text_of(&runs), Some("Hello".to_string()));

        assert_eq!(text_of(&json!({})), None);
    }

    #[test]
    fn duration_and_count_parsing() {
        assert_eq!(parse_duration_text("1:02:03"), Some(3723));
        assert_eq!(parse_duration_text("12:34"), Some(754));
        assert_eq!(parse_duration_text("45"), Some(45));
        assert_eq!(parse_duration_text("abc"), None);

        assert_eq!(parse_digits("1,234,567 views"), Some(1_234_567));
        assert_eq!(parse_abbrev_count("1.23M subscribers"), Some(1_230_000));
        assert_eq!(parse_abbrev_count("840 subscribers"), Some(840));
    }

    #[test]
    fn split_mime_categorizes_codecs() {
        let (ext, v, a) = split_mime(r#"video/mp4; codecs="avc1.4d401f, mp4a.40.2""#);
        assert_eq!(ext, "mp4");
        assert_eq!(v.as_deref(), Some("avc1.4d401f"));
        assert_eq!(a.as_deref(), Some("mp4a.40.2"));

        let (ext, v, a) = split_mime(r#"audio/webm; codecs="opus""#);
        assert_eq!(ext, "webm");
        assert_eq!(v.as_deref(), Some("none"));
        assert_eq!(a.as_deref(), Some("opus"));

        let (ext, v, a) = split_mime(r#"video/webm; codecs="vp9""#);
        assert_eq!(ext, "webm");
        assert_eq!(v.as_deref(), Some("vp9"));
        assert_eq!(a.as_deref(), Some("none"));
    }

    #[test]
    fn renderer_mapping_pulls_the_essentials() {
        let renderer = json!({
            "videoId": "abc123",
            "title": { "runs": [{ "text": "A Title" }] },
            "ownerText": {
                "runs": [{
                    "text": "Channel Name",
                    "navigationEndpoint": { "browseEndpoint": {
                        "browseId": "UCxyz",
                        "canonicalBaseUrl": "/channel/UCxyz"
                    }}
                }]
            },
            "lengthText": { "simpleText": "10:01" },
            "viewCountText": { "simpleText": "3,456 views" },
            "thumbnail": { "thumbnails": [
                { "url": "small.jpg", "width": 120, "height": 90 },
                { "url": "big.jpg", "width": 336, "height": 188 }
            ]}
        });

        let video = map_renderer(&renderer).unwrap();
        assert_eq!(video.id, "abc123");
        assert_eq!(video.title, "A Title");
        assert_eq!(video.uploader.as_deref(), Some("Channel Name"));
        assert_eq!(video.uploader_id.as_deref(), Some("UCxyz"));
        assert_eq!(video.duration, Some(601));
        assert_eq!(video.view_count, Some(3456));
        assert_eq!(video.thumbnails.len(), 2);
    }

    #[test]
    fn renderers_are_collected_recursively() {
        let tree = json!({
            "contents": [
                { "itemSectionRenderer": { "contents": [
                    { "videoRenderer": { "videoId": "a" } },
                    { "somethingElse": {} },
                    { "videoRenderer": { "videoId": "b" } }
                ]}}
            ]
        });
        let mut found = Vec::new();
        collect_objects(&tree, "videoRenderer", &mut found);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn player_format_mapping() {
        let entry = json!({
            "itag": 22,
            "mimeType": "video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"",
            "bitrate": 1578000,
            "averageBitrate": 1400000,
            "width": 1280,
            "height": 720,
            "fps": 30,
            "contentLength": "123456",
            "url": "https://cdn/media",
            "qualityLabel": "720p"
        });
        let format = map_player_format(&entry).unwrap();
        assert_eq!(format.format_id, "22");
        assert_eq!(format.height, Some(720));
        assert_eq!(format.tbr, Some(1578.0));
        assert_eq!(format.abr, Some(1400.0));
        assert_eq!(format.filesize, Some(123456));
    }
}
