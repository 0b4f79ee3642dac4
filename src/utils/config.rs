//! Bridge configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retry behavior of the orchestrator.
///
/// Production defaults are 5 attempts with a 1 s initial backoff that doubles
/// after each failure (waits of 1 s, 2 s, 4 s, 8 s between the five attempts).
/// The durations are injectable so tests can run the full schedule in
/// milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Wait before the second attempt; doubles after every failed attempt
    #[serde(with = "duration_millis")]
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `next_attempt` (1-based); `None` once exhausted.
    pub fn backoff_before(&self, next_attempt: u32) -> Option<Duration> {
        if next_attempt <= 1 || next_attempt > self.max_attempts {
            return None;
        }
        Some(self.initial_backoff * 2u32.pow(next_attempt - 2))
    }
}

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Quality used when the caller passes an unknown preference
    pub default_quality: String,

    /// Maximum items returned by list surfaces (trending, interest search)
    pub list_limit: usize,

    /// Retry schedule for provider calls
    pub retry: RetryPolicy,

    /// Canned search query substituted when the trending path fails
    pub trending_fallback_query: String,

    /// Hard ceiling for a whole request, across all attempts and backoffs
    #[serde(with = "duration_millis")]
    pub request_deadline: Duration,

    /// Explicit yt-dlp path; discovered via PATH and common locations when unset
    pub tool_path: Option<PathBuf>,

    /// Working directory for tool invocations
    pub working_dir: PathBuf,

    /// Present a mobile browser identity instead of a desktop one
    pub mobile_user_agent: bool,

    /// Resolve metadata through the external yt-dlp tool instead of the
    /// platform API provider
    pub use_tool_provider: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_quality: "720p".to_string(),
            list_limit: 10,
            retry: RetryPolicy::default(),
            trending_fallback_query: "music 2024 hindi".to_string(),
            request_deadline: Duration::from_secs(120),
            tool_path: None,
            working_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("sinkbridge"),
            mobile_user_agent: true,
            use_tool_provider: false,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_before(1), None);
        assert_eq!(policy.backoff_before(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.backoff_before(3), Some(Duration::from_secs(2)));
        assert_eq!(policy.backoff_before(4), Some(Duration::from_secs(4)));
        assert_eq!(policy.backoff_before(5), Some(Duration::from_secs(8)));
        assert_eq!(policy.backoff_before(6), None);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = BridgeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.list_limit, 10);
        assert_eq!(back.retry.initial_backoff, Duration::from_millis(1000));
        assert_eq!(back.trending_fallback_query, config.trending_fallback_query);
    }
}
