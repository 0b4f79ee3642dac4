//! Sinkbridge - Video Platform Bridge
//!
//! A small CLI front for the bridge layer: fetch trending and search feeds,
//! video details, channel metadata, and resolved stream URLs as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sinkbridge::{Bridge, BridgeConfig};

#[derive(Parser)]
#[command(name = "sinkbridge", about = "Video platform bridge CLI")]
struct Args {
    /// Use the external extraction tool instead of the platform API
    #[arg(long)]
    tool: bool,

    /// Send a desktop browser user agent instead of the mobile one
    #[arg(long)]
    desktop: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trending videos
    Trending,
    /// Videos for an interest tag
    Interest { tag: String },
    /// Detailed info for a video id
    Info { video_id: String },
    /// Resolved stream URLs for a video URL
    Streams {
        video_url: String,
        /// Quality tier such as 720p, 1080p, 4k, or best
        #[arg(default_value = "720p")]
        quality: String,
    },
    /// Free-text search
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Channel metadata for a channel URL
    Channel { channel_url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = BridgeConfig {
        use_tool_provider: args.tool,
        mobile_user_agent: !args.desktop,
        ..BridgeConfig::default()
    };
    let bridge = Bridge::new(config)?;

    match args.command {
        Command::Trending => {
            let videos = bridge.trending_videos().await?;
            println!("{}", serde_json::to_string_pretty(&videos)?);
        }
        Command::Interest { tag } => {
            let videos = bridge.videos_by_interest(&tag).await?;
            println!("{}", serde_json::to_string_pretty(&videos)?);
        }
        Command::Info { video_id } => {
            let detail = bridge.detailed_video_info(&video_id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        Command::Streams { video_url, quality } => {
            let selection = bridge.video_streams(&video_url, &quality).await?;
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
        Command::Search { query, limit } => {
            let videos = bridge.search_videos(&query, limit).await?;
            println!("{}", serde_json::to_string_pretty(&videos)?);
        }
        Command::Channel { channel_url } => {
            let channel = bridge.channel_info(&channel_url).await?;
            println!("{}", serde_json::to_string_pretty(&channel)?);
        }
    }

    Ok(())
}
