use crate::provider::models::{RawChannel, RawVideo};
use crate::utils::BridgeError;
use async_trait::async_trait;

/// Core trait for all metadata providers
///
/// This trait isolates the bridge from the specific extraction method
/// (platform API, external yt-dlp tool, future engines). Both implementations
/// return identically shaped raw records; the mapper applies the defaults.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Returns a unique identifier for this provider (e.g., "platform-api", "ytdlp-tool")
    fn id(&self) -> &'static str;

    /// Fetches the platform's trending feed as list records
    async fn fetch_trending(&self) -> Result<Vec<RawVideo>, BridgeError>;

    /// Fetches search results for a free-text query
    async fn fetch_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawVideo>, BridgeError>;

    /// Fetches the full detail record, including formats, for one video URL
    async fn fetch_stream_detail(&self, url: &str) -> Result<RawVideo, BridgeError>;

    /// Fetches channel metadata for a channel URL
    async fn fetch_channel(&self, channel_url: &str) -> Result<RawChannel, BridgeError>;
}
