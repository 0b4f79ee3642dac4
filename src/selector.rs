//! Deterministic rendition selection
//!
//! Given the rendition set of one provider response and a requested quality
//! tier, picks the single best-fit video rendition (by height) and audio
//! rendition (by bitrate). Selection is a pure function of its inputs:
//! identical rendition sets and tier always yield the identical choice.

use crate::provider::models::RawFormat;
use crate::utils::BridgeError;
use serde::{Deserialize, Serialize};

/// Bitrate window for named audio tiers, kbps: one step down from the target.
const AUDIO_STEP: u32 = 64;

/// One encoded variant of a video, as parsed from provider output.
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRendition {
    pub format_id: String,
    pub url: String,
    pub ext: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    /// Average audio bitrate, kbps
    pub abr: f32,
    /// Total bitrate, kbps
    pub tbr: f32,
    pub filesize: Option<u64>,
    pub protocol: String,
}

impl StreamRendition {
    pub fn from_raw(raw: &RawFormat) -> Self {
        Self {
            format_id: raw.format_id.clone(),
            url: raw.url.clone(),
            ext: raw.ext.clone(),
            vcodec: raw.vcodec.clone(),
            acodec: raw.acodec.clone(),
            width: raw.width.unwrap_or(0),
            height: raw.height.unwrap_or(0),
            fps: raw.fps.unwrap_or(0.0),
            abr: raw.abr.unwrap_or(0.0),
            tbr: raw.tbr.unwrap_or(0.0),
            filesize: raw.filesize,
            protocol: raw.protocol.clone().unwrap_or_default(),
        }
    }

    /// Carries a real video track: a named video codec and positive height.
    pub fn is_video_capable(&self) -> bool {
        has_codec(&self.vcodec) && self.height > 0
    }

    /// Carries a real audio track: a named audio codec and positive bitrate.
    pub fn is_audio_capable(&self) -> bool {
        has_codec(&self.acodec) && self.abr > 0.0
    }
}

fn has_codec(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
}

/// Named video quality tiers, by target height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    P144,
    P240,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
    P4320,
    Best,
    Worst,
}

impl VideoQuality {
    pub fn target_height(self) -> Option<u32> {
        match self {
            VideoQuality::P144 => Some(144),
            VideoQuality::P240 => Some(240),
            VideoQuality::P360 => Some(360),
            VideoQuality::P480 => Some(480),
            VideoQuality::P720 => Some(720),
            VideoQuality::P1080 => Some(1080),
            VideoQuality::P1440 => Some(1440),
            VideoQuality::P2160 => Some(2160),
            VideoQuality::P4320 => Some(4320),
            VideoQuality::Best | VideoQuality::Worst => None,
        }
    }

    /// Parse the strings the app sends. "auto" means best; anything
    /// unrecognized falls back to 720p.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "auto" | "best" => VideoQuality::Best,
            "worst" => VideoQuality::Worst,
            "144p" => VideoQuality::P144,
            "240p" => VideoQuality::P240,
            "360p" => VideoQuality::P360,
            "480p" => VideoQuality::P480,
            "720p" => VideoQuality::P720,
            "1080p" => VideoQuality::P1080,
            "1440p" | "2k" => VideoQuality::P1440,
            "2160p" | "4k" => VideoQuality::P2160,
            "4320p" | "8k" => VideoQuality::P4320,
            _ => VideoQuality::P720,
        }
    }
}

/// Named audio quality tiers, by target average bitrate (kbps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioQuality {
    K48,
    K64,
    K96,
    K128,
    K160,
    K192,
    K256,
    K320,
    Best,
    Worst,
}

impl AudioQuality {
    pub fn target_bitrate(self) -> Option<u32> {
        match self {
            AudioQuality::K48 => Some(48),
            AudioQuality::K64 => Some(64),
            AudioQuality::K96 => Some(96),
            AudioQuality::K128 => Some(128),
            AudioQuality::K160 => Some(160),
            AudioQuality::K192 => Some(192),
            AudioQuality::K256 => Some(256),
            AudioQuality::K320 => Some(320),
            AudioQuality::Best | AudioQuality::Worst => None,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "auto" | "best" => AudioQuality::Best,
            "worst" => AudioQuality::Worst,
            "48k" => AudioQuality::K48,
            "64k" => AudioQuality::K64,
            "96k" => AudioQuality::K96,
            "128k" => AudioQuality::K128,
            "160k" => AudioQuality::K160,
            "192k" => AudioQuality::K192,
            "256k" => AudioQuality::K256,
            "320k" => AudioQuality::K320,
            _ => AudioQuality::K128,
        }
    }
}

/// Pick the video rendition for a tier.
///
/// BEST takes the maximum height, ties broken by maximum total bitrate,
/// remaining ties by input order. WORST takes the minimum height. A named
/// tier takes the largest height not exceeding the target; when every
/// rendition exceeds it, the globally smallest height wins.
pub fn select_video(
    renditions: &[StreamRendition],
    tier: VideoQuality,
) -> Result<&StreamRendition, BridgeError> {
    let candidates: Vec<&StreamRendition> =
        renditions.iter().filter(|r| r.is_video_capable()).collect();
    if candidates.is_empty() {
        return Err(BridgeError::NoStreamAvailable("video"));
    }

    let chosen = match tier {
        VideoQuality::Best => max_by_key_stable(&candidates, |r| (r.height, r.tbr as u64)),
        VideoQuality::Worst => min_by_key_stable(&candidates, |r| r.height),
        _ => {
            let target = tier.target_height().expect("named tier has a target");
            let within: Vec<&StreamRendition> = candidates
                .iter()
                .copied()
                .filter(|r| r.height <= target)
                .collect();
            if within.is_empty() {
                // Every rendition exceeds the target: closest without
                // exceeding degenerates to the global minimum
                min_by_key_stable(&candidates, |r| r.height)
            } else {
                max_by_key_stable(&within, |r| r.height)
            }
        }
    };

    Ok(chosen)
}

/// Pick the audio rendition for a tier; mirrors video selection on bitrate.
///
/// A named tier accepts candidates inside the tolerance window
/// (target − 64, target]; when none falls inside, the bitrate with the
/// smallest absolute distance to the target wins.
pub fn select_audio(
    renditions: &[StreamRendition],
    tier: AudioQuality,
) -> Result<&StreamRendition, BridgeError> {
    let candidates: Vec<&StreamRendition> =
        renditions.iter().filter(|r| r.is_audio_capable()).collect();
    if candidates.is_empty() {
        return Err(BridgeError::NoStreamAvailable("audio"));
    }

    let chosen = match tier {
        AudioQuality::Best => max_by_key_stable(&candidates, |r| r.abr as u64),
        AudioQuality::Worst => min_by_key_stable(&candidates, |r| r.abr as u64),
        _ => {
            let target = tier.target_bitrate().expect("named tier has a target") as f32;
            let floor = target - AUDIO_STEP as f32;
            let within: Vec<&StreamRendition> = candidates
                .iter()
                .copied()
                .filter(|r| r.abr <= target && r.abr > floor)
                .collect();
            if within.is_empty() {
                min_by_key_stable(&candidates, |r| (r.abr - target).abs() as u64)
            } else {
                max_by_key_stable(&within, |r| r.abr as u64)
            }
        }
    };

    Ok(chosen)
}

/// Distinct video heights present, ascending, rendered as "480p" style labels.
pub fn available_video_qualities(renditions: &[StreamRendition]) -> Vec<String> {
    let mut heights: Vec<u32> = renditions
        .iter()
        .filter(|r| r.is_video_capable())
        .map(|r| r.height)
        .collect();
    heights.sort_unstable();
    heights.dedup();
    heights.into_iter().map(|h| format!("{}p", h)).collect()
}

// First maximal / minimal element, so equal keys resolve by input order.
fn max_by_key_stable<'a, K: Ord>(
    items: &[&'a StreamRendition],
    key: impl Fn(&StreamRendition) -> K,
) -> &'a StreamRendition {
    let mut best = items[0];
    let mut best_key = key(best);
    for &item in &items[1..] {
        let k = key(item);
        if k > best_key {
            best = item;
            best_key = k;
        }
    }
    best
}

fn min_by_key_stable<'a, K: Ord>(
    items: &[&'a StreamRendition],
    key: impl Fn(&StreamRendition) -> K,
) -> &'a StreamRendition {
    let mut best = items[0];
    let mut best_key = key(best);
    for &item in &items[1..] {
        let k = key(item);
        if k < best_key {
            best = item;
            best_key = k;
        }
    }
    best
}
