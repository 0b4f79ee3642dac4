//! yt-dlp tool provider
//!
//! Resolves metadata by shelling out to a yt-dlp binary. One OS process is
//! spawned per call; stdout and stderr are both fully captured before the
//! exit status is awaited, so a full pipe buffer can never deadlock the call.
//! Detail requests parse stdout as one JSON object, list requests as one
//! object per line.

use crate::provider::models::{RawChannel, RawVideo};
use crate::provider::traits::MetadataProvider;
use crate::utils::{BridgeConfig, BridgeError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info, warn};

const TRENDING_URL: &str = "https://www.youtube.com/feed/trending";

/// Metadata provider backed by an external yt-dlp executable.
pub struct ToolProvider {
    tool_path: PathBuf,
    working_dir: PathBuf,
}

impl ToolProvider {
    /// Initialize the provider and verify yt-dlp availability.
    ///
    /// Search order: explicit config path, system PATH, common install
    /// locations. A binary that exists but cannot be executed is a
    /// `Permission` error so the caller can fall back to the API provider.
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let tool_path = match &config.tool_path {
            Some(path) => path.clone(),
            None => match find_tool() {
                Some(path) => path,
                None => {
                    error!("yt-dlp not found anywhere");
                    return Err(BridgeError::ToolNotFound);
                }
            },
        };

        if !tool_path.exists() {
            error!("configured yt-dlp path does not exist: {}", tool_path.display());
            return Err(BridgeError::ToolNotFound);
        }
        if !is_executable(&tool_path) {
            return Err(BridgeError::Permission(format!(
                "{} exists but is not executable",
                tool_path.display()
            )));
        }

        info!("Using yt-dlp at: {}", tool_path.display());
        Ok(Self {
            tool_path,
            working_dir: config.working_dir.clone(),
        })
    }

    /// Run yt-dlp with the given arguments and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, BridgeError> {
        debug!(tool = %self.tool_path.display(), ?args, "invoking yt-dlp");

        // Command::output drains both pipes concurrently before waiting
        let output = AsyncCommand::new(&self.tool_path)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => BridgeError::Permission(e.to_string()),
                ErrorKind::NotFound => BridgeError::ToolNotFound,
                _ => BridgeError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(code = ?output.status.code(), "yt-dlp failed: {}", stderr);
            return Err(BridgeError::Provider(if stderr.is_empty() {
                format!("yt-dlp exited with {:?}", output.status.code())
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parse a one-JSON-object-per-line listing. Unparseable lines are
    /// skipped rather than failing the whole list.
    fn parse_lines(stdout: &str) -> Vec<RawVideo> {
        let mut videos = Vec::new();
        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawVideo>(line) {
                Ok(video) => videos.push(video),
                Err(e) => warn!("skipping unparseable result line: {}", e),
            }
        }
        videos
    }
}

#[async_trait]
impl MetadataProvider for ToolProvider {
    fn id(&self) -> &'static str {
        "ytdlp-tool"
    }

    async fn fetch_trending(&self) -> Result<Vec<RawVideo>, BridgeError> {
        let stdout = self
            .run(&[
                "--dump-json",
                "--flat-playlist",
                "--no-warnings",
                TRENDING_URL,
            ])
            .await?;

        let videos = Self::parse_lines(&stdout);
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
        let search_target = format!("ytsearch{}:{}", max_results, query);
        let stdout = self
            .run(&[
                "--dump-json",
                "--flat-playlist",
                "--no-warnings",
                &search_target,
            ])
            .await?;

        Ok(Self::parse_lines(&stdout))
    }

    async fn fetch_stream_detail(&self, url: &str) -> Result<RawVideo, BridgeError> {
        let stdout = self
            .run(&["--dump-json", "--no-playlist", "--no-warnings", url])
            .await?;

        if stdout.trim().is_empty() {
            return Err(BridgeError::Provider(
                "yt-dlp produced empty output".to_string(),
            ));
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn fetch_channel(&self, channel_url: &str) -> Result<RawChannel, BridgeError> {
        let stdout = self
            .run(&[
                "--dump-json",
                "--playlist-items",
                "0",
                "--no-warnings",
                channel_url,
            ])
            .await?;

        if stdout.trim().is_empty() {
            return Err(BridgeError::Provider(
                "yt-dlp produced empty channel output".to_string(),
            ));
        }
        Ok(serde_json::from_str(&stdout)?)
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find the yt-dlp binary: PATH first, then common installation paths.
pub fn find_tool() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        if path.exists() {
            debug!("found yt-dlp on PATH: {}", path.display());
            return Some(path);
        }
    }

    for candidate in common_paths() {
        if candidate.exists() && is_executable(&candidate) {
            debug!("found yt-dlp at common path: {}", candidate.display());
            return Some(candidate);
        }
    }

    warn!("yt-dlp not found on PATH or common paths");
    None
}

fn common_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
    ];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".local/bin/yt-dlp"));
    }
    paths
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = std::fs::metadata(path) {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}
