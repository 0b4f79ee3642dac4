//! Sinkbridge library

pub mod bridge;
pub mod cache;
pub mod mapper;
pub mod orchestrator;
pub mod provider;
pub mod selector;
pub mod transport;
pub mod utils;

// Re-export main types for easier use
pub use bridge::Bridge;
pub use mapper::{ChannelInfo, StreamSelection, VideoDetail, VideoSummary};
pub use provider::{ApiProvider, MetadataProvider, ToolProvider};
pub use selector::{AudioQuality, StreamRendition, VideoQuality};
pub use utils::{BridgeConfig, BridgeError, RetryPolicy};
