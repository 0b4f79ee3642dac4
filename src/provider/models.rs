//! Raw provider records
//!
//! Both providers deserialize into these shapes before any normalization.
//! Every field that a platform response may omit is defaulted or optional;
//! absence never becomes a parse fault.

use serde::{Deserialize, Serialize};

/// One thumbnail candidate with optional pixel dimensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl RawThumbnail {
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// One encoded rendition as reported by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f32>,
    /// Average audio bitrate, kbps
    #[serde(default)]
    pub abr: Option<f32>,
    /// Video bitrate, kbps
    #[serde(default)]
    pub vbr: Option<f32>,
    /// Total bitrate, kbps
    #[serde(default)]
    pub tbr: Option<f32>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub format_note: Option<String>,
}

/// One video record: a list item or a full detail object.
///
/// List-shaped responses leave `formats` and `description` empty; detail
/// responses fill them in. The field names follow the tool provider's JSON
/// with aliases for the variants seen in the wild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "webpage_url")]
    pub url: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default, alias = "channel_id")]
    pub uploader_id: Option<String>,
    #[serde(default, alias = "channel_url")]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Platform-dependent format; the mapper normalizes `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, alias = "channel_avatar_url", alias = "uploader_thumbnail")]
    pub uploader_avatar_url: Option<String>,
    #[serde(default, alias = "channel_is_verified")]
    pub uploader_verified: Option<bool>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub live_status: Option<String>,
}

impl RawVideo {
    /// Whether this record describes a plain on-demand video.
    ///
    /// Live and upcoming entities are legitimate provider responses but
    /// cannot satisfy a stream-detail request.
    pub fn is_playable_video(&self) -> bool {
        if self.is_live == Some(true) {
            return false;
        }
        !matches!(
            self.live_status.as_deref(),
            Some("is_live") | Some("is_upcoming") | Some("post_live")
        )
    }
}

/// Channel record from either provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChannel {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "channel", alias = "uploader")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "channel_follower_count")]
    pub subscriber_count: Option<u64>,
    #[serde(default, alias = "playlist_count")]
    pub video_count: Option<u64>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default, alias = "channel_is_verified")]
    pub verified: Option<bool>,
}
