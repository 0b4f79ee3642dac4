//! Response mapping
//!
//! Normalizes raw provider records into the stable shapes the app consumes.
//! Missing fields become documented defaults (0, empty, absent), identifiers
//! are canonicalized out of arbitrarily shaped URLs, and thumbnail selection
//! always takes the candidate with the largest pixel area. Parse failures
//! yield empty values, never errors.

use crate::provider::models::{RawChannel, RawThumbnail, RawVideo};
use crate::selector::StreamRendition;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One list item: the fields every surface that lists videos needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub channel_id: String,
    /// Seconds; 0 when the provider omitted it
    pub duration: u64,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub upload_date: Option<String>,
    pub uploader_avatar_url: Option<String>,
    pub is_verified: bool,
}

/// Full detail record: summary plus description text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub summary: VideoSummary,
    pub description: String,
}

/// Channel metadata for the channel surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub avatar_url: String,
    pub banner_url: Option<String>,
    pub is_verified: bool,
}

/// Result of a stream-resolution request: one playable video URL and one
/// playable audio URL, plus what the player needs to present choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSelection {
    pub video_url: String,
    pub audio_url: String,
    pub selected_quality: String,
    pub available_qualities: Vec<String>,
    /// Selected audio bitrate, kbps
    pub bitrate: u32,
    pub title: String,
    pub duration: u64,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

/// Canonical video id out of the URL shapes the platform emits.
pub fn extract_video_id(url: &str) -> String {
    if let Some(rest) = url.split_once("v=").map(|(_, rest)| rest) {
        return rest.split('&').next().unwrap_or_default().to_string();
    }
    if let Some(rest) = url.split_once("/watch/").map(|(_, rest)| rest) {
        return rest.split('?').next().unwrap_or_default().to_string();
    }
    if let Some(rest) = url.split_once("youtu.be/").map(|(_, rest)| rest) {
        return rest.split('?').next().unwrap_or_default().to_string();
    }
    // Fallback: last path segment, query stripped
    let without_query = url.split('?').next().unwrap_or_default();
    without_query
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Canonical channel id out of an uploader URL; empty when no pattern matches.
pub fn extract_channel_id(uploader_url: Option<&str>) -> String {
    let Some(url) = uploader_url else {
        return String::new();
    };
    for marker in ["/channel/", "/c/", "/user/"] {
        if let Some((_, rest)) = url.split_once(marker) {
            return rest.split('?').next().unwrap_or_default().to_string();
        }
    }
    String::new()
}

/// URL of the thumbnail with the largest pixel area; empty when none exist.
pub fn best_thumbnail(thumbnails: &[RawThumbnail]) -> String {
    thumbnails
        .iter()
        .max_by_key(|t| t.area())
        .map(|t| t.url.clone())
        .unwrap_or_default()
}

/// Normalize the tool provider's `YYYYMMDD` dates to RFC 3339; anything
/// already in another format passes through verbatim.
pub fn normalize_upload_date(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
            return Some(format!("{}T00:00:00Z", date.format("%Y-%m-%d")));
        }
    }
    Some(raw.to_string())
}

/// Shape one raw record into a list summary, applying all defaults.
pub fn map_summary(raw: &RawVideo) -> VideoSummary {
    let id = if raw.id.is_empty() {
        extract_video_id(&raw.url)
    } else {
        raw.id.clone()
    };

    let channel_id = match raw.uploader_id.clone() {
        Some(cid) if !cid.is_empty() => cid,
        _ => extract_channel_id(raw.uploader_url.as_deref()),
    };

    let thumbnail_url = if raw.thumbnails.is_empty() {
        raw.thumbnail.clone().unwrap_or_default()
    } else {
        best_thumbnail(&raw.thumbnails)
    };

    VideoSummary {
        id,
        title: raw.title.clone(),
        author: raw
            .uploader
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        channel_id,
        duration: raw.duration.unwrap_or(0),
        thumbnail_url,
        view_count: raw.view_count.unwrap_or(0),
        upload_date: raw
            .upload_date
            .as_deref()
            .and_then(normalize_upload_date),
        uploader_avatar_url: raw.uploader_avatar_url.clone(),
        is_verified: raw.uploader_verified.unwrap_or(false),
    }
}

/// Shape one raw detail record, carrying the description along.
pub fn map_detail(raw: &RawVideo) -> VideoDetail {
    VideoDetail {
        summary: map_summary(raw),
        description: raw.description.clone().unwrap_or_default(),
    }
}

pub fn map_channel(raw: &RawChannel) -> ChannelInfo {
    ChannelInfo {
        id: raw.id.clone(),
        title: raw.title.clone(),
        description: raw.description.clone().unwrap_or_default(),
        subscriber_count: raw.subscriber_count.unwrap_or(0),
        video_count: raw.video_count.unwrap_or(0),
        avatar_url: best_thumbnail(&raw.thumbnails),
        banner_url: raw.banner_url.clone(),
        is_verified: raw.verified.unwrap_or(false),
    }
}

/// Assemble the stream-selection payload once both renditions are chosen.
pub fn map_selection(
    detail: &RawVideo,
    video: &StreamRendition,
    audio: &StreamRendition,
    available_qualities: Vec<String>,
) -> StreamSelection {
    StreamSelection {
        video_url: video.url.clone(),
        audio_url: audio.url.clone(),
        selected_quality: format!("{}p", video.height),
        available_qualities,
        bitrate: audio.abr.round() as u32,
        title: detail.title.clone(),
        duration: detail.duration.unwrap_or(0),
        video_codec: video.vcodec.clone().filter(|c| c != "none"),
        audio_codec: audio.acodec.clone().filter(|c| c != "none"),
    }
}
