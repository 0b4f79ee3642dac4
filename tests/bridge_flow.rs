//! Integration-style tests covering the bridge request flows against an
//! in-process provider, without hitting the network.

use async_trait::async_trait;
use sinkbridge::provider::{MetadataProvider, RawChannel, RawFormat, RawVideo};
use sinkbridge::{Bridge, BridgeConfig, BridgeError, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fast_config() -> BridgeConfig {
    BridgeConfig {
        retry: RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(2),
        },
        ..BridgeConfig::default()
    }
}

fn sample_video(id: &str) -> RawVideo {
    RawVideo {
        id: id.to_string(),
        title: format!("Video {}", id),
        url: format!("https://host/watch?v={}", id),
        uploader: Some("Uploader".to_string()),
        duration: Some(60),
        view_count: Some(1_000),
        ..RawVideo::default()
    }
}

fn video_format(format_id: &str, height: u32, tbr: f32) -> RawFormat {
    RawFormat {
        format_id: format_id.to_string(),
        url: format!("https://cdn/{}", format_id),
        ext: "mp4".to_string(),
        vcodec: Some("avc1.640028".to_string()),
        acodec: Some("none".to_string()),
        width: Some(height * 16 / 9),
        height: Some(height),
        tbr: Some(tbr),
        ..RawFormat::default()
    }
}

fn audio_format(format_id: &str, abr: f32) -> RawFormat {
    RawFormat {
        format_id: format_id.to_string(),
        url: format!("https://cdn/{}", format_id),
        ext: "m4a".to_string(),
        vcodec: Some("none".to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        abr: Some(abr),
        ..RawFormat::default()
    }
}

/// Scriptable provider: counts calls per operation and fails the first
/// `n` attempts of each when configured.
#[derive(Default)]
struct ScriptedProvider {
    trending_failures: u32,
    search_failures: u32,
    trending_calls: AtomicU32,
    search_calls: AtomicU32,
    detail_calls: AtomicU32,
    detail_response: Option<RawVideo>,
    last_search_query: Mutex<Option<String>>,
}

#[async_trait]
impl MetadataProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_trending(&self) -> Result<Vec<RawVideo>, BridgeError> {
        let call = self.trending_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.trending_failures {
            return Err(BridgeError::Provider(format!("trending failure {}", call)));
        }
        Ok(vec![sample_video("t1"), sample_video("t2")])
    }

    async fn fetch_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawVideo>, BridgeError> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.search_failures {
            return Err(BridgeError::Provider(format!("search failure {}", call)));
        }
        *self.last_search_query.lock().unwrap() = Some(query.to_string());
        Ok((0..max_results.min(3))
            .map(|i| sample_video(&format!("s{}", i)))
            .collect())
    }

    async fn fetch_stream_detail(&self, _url: &str) -> Result<RawVideo, BridgeError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_response
            .clone()
            .ok_or_else(|| BridgeError::Provider("no detail scripted".to_string()))
    }

    async fn fetch_channel(&self, _channel_url: &str) -> Result<RawChannel, BridgeError> {
        Ok(RawChannel {
            id: "UCabc".to_string(),
            title: "Channel".to_string(),
            subscriber_count: Some(42),
            ..RawChannel::default()
        })
    }
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let provider = Arc::new(ScriptedProvider {
        search_failures: 3,
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider.clone());

    let videos = bridge
        .search_videos("rust async", 5)
        .await
        .expect("search should recover on the fourth attempt");
    assert_eq!(videos.len(), 3);
    assert_eq!(provider.search_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn exhausted_retries_surface_the_last_error() {
    let provider = Arc::new(ScriptedProvider {
        search_failures: u32::MAX,
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider.clone());

    let err = bridge
        .search_videos("anything", 5)
        .await
        .expect_err("search should run out of attempts");
    assert_eq!(provider.search_calls.load(Ordering::SeqCst), 5);
    assert_eq!(err.code(), "PROVIDER_ERROR");
    assert!(err.to_string().contains("search failure 5"));
}

#[tokio::test]
async fn trending_falls_back_to_canned_search() {
    let provider = Arc::new(ScriptedProvider {
        trending_failures: u32::MAX,
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider.clone());

    let videos = bridge
        .trending_videos()
        .await
        .expect("fallback search should serve the trending request");
    assert!(!videos.is_empty());
    assert_eq!(
        provider.last_search_query.lock().unwrap().as_deref(),
        Some("music 2024 hindi")
    );
}

#[tokio::test]
async fn live_detail_fails_without_retry() {
    let mut live = sample_video("live1");
    live.is_live = Some(true);
    let provider = Arc::new(ScriptedProvider {
        detail_response: Some(live),
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider.clone());

    let err = bridge
        .detailed_video_info("live1")
        .await
        .expect_err("live content is not a plain video");
    assert_eq!(err.code(), "WRONG_STREAM_TYPE");
    assert_eq!(provider.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_selection_needs_both_tracks() {
    let mut video = sample_video("v1");
    video.formats = vec![video_format("v720", 720, 1_500.0)];
    let provider = Arc::new(ScriptedProvider {
        detail_response: Some(video),
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider);

    let err = bridge
        .video_streams("https://host/watch?v=v1", "720p")
        .await
        .expect_err("a video-only format list cannot satisfy playback");
    assert_eq!(err.code(), "NO_STREAM_AVAILABLE");
}

#[tokio::test]
async fn stream_selection_picks_tier_and_reports_qualities() {
    let mut video = sample_video("v2");
    video.formats = vec![
        video_format("v360", 360, 600.0),
        video_format("v720", 720, 1_500.0),
        video_format("v1080", 1080, 3_000.0),
        audio_format("a128", 128.0),
        audio_format("a160", 160.0),
    ];
    let provider = Arc::new(ScriptedProvider {
        detail_response: Some(video),
        ..ScriptedProvider::default()
    });
    let bridge = Bridge::with_provider(fast_config(), provider);

    let selection = bridge
        .video_streams("https://host/watch?v=v2", "720p")
        .await
        .expect("selection should succeed");
    assert_eq!(selection.selected_quality, "720p");
    assert_eq!(selection.video_url, "https://cdn/v720");
    // Audio defaults to the best rendition available.
    assert_eq!(selection.audio_url, "https://cdn/a160");
    assert_eq!(
        selection.available_qualities,
        vec!["360p".to_string(), "720p".to_string(), "1080p".to_string()]
    );
}

#[tokio::test]
async fn shutdown_cancels_pending_requests() {
    let provider = Arc::new(ScriptedProvider {
        search_failures: u32::MAX,
        ..ScriptedProvider::default()
    });
    let config = BridgeConfig {
        retry: RetryPolicy {
            max_attempts: 50,
            initial_backoff: Duration::from_millis(50),
        },
        ..BridgeConfig::default()
    };
    let bridge = Bridge::with_provider(config, provider);

    let worker = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.search_videos("slow", 5).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    bridge.shutdown();

    let err = worker
        .await
        .expect("worker should not panic")
        .expect_err("cancelled request must fail");
    assert_eq!(err.code(), "CANCELLED");
}

#[tokio::test]
async fn batch_thumbnails_resolve_and_cache() {
    let bridge = Bridge::with_provider(
        fast_config(),
        Arc::new(ScriptedProvider::default()),
    );

    let ids: Vec<String> = (0..45).map(|i| format!("vid{:02}", i)).collect();
    let resolved = bridge.batch_thumbnails(&ids, "high").await;
    assert_eq!(resolved.len(), 45);
    assert_eq!(bridge.thumbnail_cache_size(), 45);
    assert_eq!(
        resolved.get("vid07").map(String::as_str),
        Some("https://i.ytimg.com/vi/vid07/hqdefault.jpg")
    );

    // A second pass serves from the cache and leaves its size unchanged.
    let again = bridge.batch_thumbnails(&ids, "high").await;
    assert_eq!(again, resolved);
    assert_eq!(bridge.thumbnail_cache_size(), 45);

    bridge.clear_thumbnail_cache();
    assert_eq!(bridge.thumbnail_cache_size(), 0);
}
