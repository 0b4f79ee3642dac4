//! Retry and fallback sequencing
//!
//! Every provider call passes through one retry loop: up to five attempts
//! with an exponentially doubling backoff between them, surfacing the last
//! error on exhaustion. The trending read path additionally falls back to a
//! canned search query when the primary call fails for any reason.
//! Cancellation is observed at every suspension point, and each request runs
//! under one overall deadline on top of the per-attempt transport timeouts.

use crate::provider::models::{RawChannel, RawVideo};
use crate::provider::traits::MetadataProvider;
use crate::utils::{BridgeConfig, BridgeError, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Sequences provider calls with retry, fallback, and deadline handling.
pub struct Orchestrator {
    provider: Arc<dyn MetadataProvider>,
    retry: RetryPolicy,
    deadline: Duration,
    fallback_query: String,
    list_limit: usize,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn MetadataProvider>, config: &BridgeConfig) -> Self {
        Self {
            provider,
            retry: config.retry.clone(),
            deadline: config.request_deadline,
            fallback_query: config.trending_fallback_query.clone(),
            list_limit: config.list_limit,
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Trending feed with the one-level search fallback: when the primary
    /// listing fails after all retries, the canned query goes through the
    /// same retry machinery and its outcome becomes the request's outcome.
    pub async fn trending(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawVideo>, BridgeError> {
        self.with_deadline(cancel, async {
            match self
                .with_retry(cancel, || self.provider.fetch_trending())
                .await
            {
                Ok(mut videos) => {
                    videos.truncate(self.list_limit);
                    Ok(videos)
                }
                Err(primary_err) => {
                    info!(
                        "trending failed ({}), falling back to search: {}",
                        primary_err.code(),
                        self.fallback_query
                    );
                    let mut videos = self
                        .with_retry(cancel, || {
                            self.provider
                                .fetch_search(&self.fallback_query, self.list_limit)
                        })
                        .await?;
                    videos.truncate(self.list_limit);
                    Ok(videos)
                }
            }
        })
        .await
    }

    pub async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawVideo>, BridgeError> {
        self.with_deadline(cancel, async {
            let mut videos = self
                .with_retry(cancel, || self.provider.fetch_search(query, max_results))
                .await?;
            videos.truncate(max_results);
            Ok(videos)
        })
        .await
    }

    /// Detail record for a video id, validated to be a playable video.
    pub async fn detail(
        &self,
        cancel: &CancellationToken,
        video_id: &str,
    ) -> Result<RawVideo, BridgeError> {
        let url = format!("{}{}", WATCH_URL_PREFIX, video_id);
        self.detail_for_url(cancel, &url).await
    }

    /// Detail record for a full video URL, validated to be a playable video.
    ///
    /// A non-video stream type is a legitimate provider response that cannot
    /// satisfy the request, so it ends the retry loop immediately.
    pub async fn detail_for_url(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<RawVideo, BridgeError> {
        self.with_deadline(cancel, async {
            self.with_retry(cancel, move || async move {
                let raw = self.provider.fetch_stream_detail(url).await?;
                if !raw.is_playable_video() {
                    return Err(BridgeError::WrongStreamType(
                        raw.live_status
                            .clone()
                            .unwrap_or_else(|| "live".to_string()),
                    ));
                }
                Ok(raw)
            })
            .await
        })
        .await
    }

    pub async fn channel(
        &self,
        cancel: &CancellationToken,
        channel_url: &str,
    ) -> Result<RawChannel, BridgeError> {
        self.with_deadline(cancel, async {
            self.with_retry(cancel, || self.provider.fetch_channel(channel_url))
                .await
        })
        .await
    }

    /// Run one operation under the retry policy.
    ///
    /// Retryable errors trigger backoff and another attempt; terminal errors
    /// and cancellation return immediately; exhaustion surfaces the last
    /// error encountered, never a generic timeout.
    async fn with_retry<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, BridgeError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let mut last_error: Option<BridgeError> = None;

        for attempt in 1..=self.retry.max_attempts {
            if cancel.is_cancelled() {
                return Err(BridgeError::Cancelled);
            }

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() => {
                    warn!(attempt, code = err.code(), "attempt failed: {}", err);
                    last_error = Some(err);
                }
                Err(err) => {
                    debug!(code = err.code(), "terminal error, not retrying");
                    return Err(err);
                }
            }

            if let Some(backoff) = self.retry.backoff_before(attempt + 1) {
                tokio::select! {
                    _ = sleep(backoff) => {}
                    _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::Provider("exhausted attempts without an error".to_string())
        }))
    }

    /// Overall ceiling per request, across all attempts and backoff waits.
    async fn with_deadline<T>(
        &self,
        cancel: &CancellationToken,
        fut: impl Future<Output = Result<T, BridgeError>>,
    ) -> Result<T, BridgeError> {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }
        match timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::DeadlineExceeded(self.deadline)),
        }
    }
}
