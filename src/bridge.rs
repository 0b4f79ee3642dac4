//! Inbound bridge surface
//!
//! The methods the app shell invokes. Each call runs on its own spawned
//! worker task and resolves a future with either a success payload or a
//! `BridgeError` carrying a machine-readable code; in-flight requests never
//! block each other, and retries suspend only their own worker. The only
//! state shared between requests is the thumbnail cache.

use crate::cache::{thumbnail_url, ThumbnailCache};
use crate::mapper::{
    self, ChannelInfo, StreamSelection, VideoDetail, VideoSummary,
};
use crate::orchestrator::Orchestrator;
use crate::provider::{ApiProvider, MetadataProvider, ToolProvider};
use crate::selector::{
    available_video_qualities, select_audio, select_video, AudioQuality, StreamRendition,
    VideoQuality,
};
use crate::transport::Transport;
use crate::utils::{BridgeConfig, BridgeError};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Thumbnail fan-out width: ids are resolved in chunks of this size, each
/// chunk joined before the next starts.
const THUMBNAIL_CHUNK: usize = 20;

/// The bridge service object. Cheap to clone; clones share the provider,
/// cache, and root cancellation token.
#[derive(Clone)]
pub struct Bridge {
    orchestrator: Arc<Orchestrator>,
    cache: Arc<ThumbnailCache>,
    config: Arc<BridgeConfig>,
    shutdown: CancellationToken,
}

impl Bridge {
    /// Build a bridge with the provider the configuration selects.
    ///
    /// When the tool provider is requested but cannot be set up (binary
    /// missing or not executable), the API provider takes over.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let provider: Arc<dyn MetadataProvider> = if config.use_tool_provider {
            match ToolProvider::new(&config) {
                Ok(tool) => Arc::new(tool),
                Err(err @ (BridgeError::ToolNotFound | BridgeError::Permission(_))) => {
                    warn!(
                        "tool provider unavailable ({}), falling back to platform API",
                        err
                    );
                    Arc::new(ApiProvider::new(Arc::new(Transport::new(
                        config.mobile_user_agent,
                    )?)))
                }
                Err(err) => return Err(err),
            }
        } else {
            Arc::new(ApiProvider::new(Arc::new(Transport::new(
                config.mobile_user_agent,
            )?)))
        };

        Ok(Self::with_provider(config, provider))
    }

    /// Build a bridge around an explicit provider. Used by tests and by
    /// embedders that bring their own extraction engine.
    pub fn with_provider(config: BridgeConfig, provider: Arc<dyn MetadataProvider>) -> Self {
        info!(provider = provider.id(), "bridge initialized");
        let orchestrator = Arc::new(Orchestrator::new(provider, &config));
        Self {
            orchestrator,
            cache: Arc::new(ThumbnailCache::new()),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel every in-flight and future request.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Trending feed, with the canned-search fallback on primary failure.
    pub async fn trending_videos(&self) -> Result<Vec<VideoSummary>, BridgeError> {
        let orch = Arc::clone(&self.orchestrator);
        let cancel = self.shutdown.child_token();
        spawn_request(async move {
            let raw = orch.trending(&cancel).await?;
            Ok(raw.iter().map(mapper::map_summary).collect())
        })
        .await
    }

    /// Videos matching an interest tag.
    pub async fn videos_by_interest(&self, tag: &str) -> Result<Vec<VideoSummary>, BridgeError> {
        self.search_videos(tag, self.config.list_limit).await
    }

    /// Free-text search capped at `max_results`.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoSummary>, BridgeError> {
        let orch = Arc::clone(&self.orchestrator);
        let cancel = self.shutdown.child_token();
        let query = query.to_string();
        spawn_request(async move {
            let raw = orch.search(&cancel, &query, max_results).await?;
            Ok(raw.iter().map(mapper::map_summary).collect())
        })
        .await
    }

    /// Full detail for one video id.
    pub async fn detailed_video_info(&self, video_id: &str) -> Result<VideoDetail, BridgeError> {
        let orch = Arc::clone(&self.orchestrator);
        let cancel = self.shutdown.child_token();
        let video_id = video_id.to_string();
        spawn_request(async move {
            let raw = orch.detail(&cancel, &video_id).await?;
            Ok(mapper::map_detail(&raw))
        })
        .await
    }

    /// Resolve playable stream URLs for a video at the preferred quality.
    ///
    /// Playback needs both tracks, so a missing audio or video rendition
    /// fails the whole request.
    pub async fn video_streams(
        &self,
        video_url: &str,
        preferred_quality: &str,
    ) -> Result<StreamSelection, BridgeError> {
        let orch = Arc::clone(&self.orchestrator);
        let cancel = self.shutdown.child_token();
        let video_url = video_url.to_string();
        let tier = if preferred_quality.trim().is_empty() {
            VideoQuality::parse(&self.config.default_quality)
        } else {
            VideoQuality::parse(preferred_quality)
        };
        spawn_request(async move {
            let raw = orch.detail_for_url(&cancel, &video_url).await?;

            let renditions: Vec<StreamRendition> =
                raw.formats.iter().map(StreamRendition::from_raw).collect();
            debug!(count = renditions.len(), "renditions parsed");

            let video = select_video(&renditions, tier)?;
            let audio = select_audio(&renditions, AudioQuality::Best)?;
            let qualities = available_video_qualities(&renditions);

            Ok(mapper::map_selection(&raw, video, audio, qualities))
        })
        .await
    }

    /// Channel metadata for a channel URL.
    pub async fn channel_info(&self, channel_url: &str) -> Result<ChannelInfo, BridgeError> {
        let orch = Arc::clone(&self.orchestrator);
        let cancel = self.shutdown.child_token();
        let channel_url = channel_url.to_string();
        spawn_request(async move {
            let raw = orch.channel(&cancel, &channel_url).await?;
            Ok(mapper::map_channel(&raw))
        })
        .await
    }

    /// Thumbnail URLs for many ids at once, served from the cache where
    /// possible. Ids are processed in bounded chunks so an arbitrarily long
    /// input cannot fan out unbounded work.
    pub async fn batch_thumbnails(
        &self,
        video_ids: &[String],
        quality: &str,
    ) -> HashMap<String, String> {
        let mut resolved = HashMap::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(THUMBNAIL_CHUNK) {
            let lookups = chunk.iter().map(|id| {
                let cache = Arc::clone(&self.cache);
                let id = id.clone();
                let quality = quality.to_string();
                async move {
                    let url = match cache.get(&id) {
                        Some(cached) => cached,
                        None => {
                            let url = thumbnail_url(&id, &quality);
                            cache.insert(id.clone(), url.clone());
                            url
                        }
                    };
                    (id, url)
                }
            });

            for (id, url) in join_all(lookups).await {
                resolved.insert(id, url);
            }
        }

        resolved
    }

    /// Drop every cached thumbnail URL.
    pub fn clear_thumbnail_cache(&self) {
        debug!(entries = self.cache.len(), "clearing thumbnail cache");
        self.cache.clear();
    }

    pub fn thumbnail_cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn provider_id(&self) -> &'static str {
        self.orchestrator.provider_id()
    }
}

/// Run one request on its own worker task. A panicking worker is reported
/// as a provider failure instead of tearing down the caller.
async fn spawn_request<T: Send + 'static>(
    fut: impl std::future::Future<Output = Result<T, BridgeError>> + Send + 'static,
) -> Result<T, BridgeError> {
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(join_err) => {
            warn!("request worker failed: {}", join_err);
            Err(BridgeError::Provider(format!(
                "request worker failed: {}",
                join_err
            )))
        }
    }
}
