//! Request-scoped thumbnail URL cache
//!
//! Keyed by video id, unbounded until the caller clears it. Safe for
//! concurrent read/write from multiple worker tasks.

use std::collections::HashMap;
use std::sync::RwLock;

/// Quality names accepted by [`thumbnail_url`].
pub const THUMBNAIL_QUALITIES: [&str; 4] = ["maxres", "high", "medium", "standard"];

/// Fixed URL scheme for platform thumbnails by quality name. Unknown
/// quality names fall back to "high".
pub fn thumbnail_url(video_id: &str, quality: &str) -> String {
    let file = match quality {
        "maxres" => "maxresdefault.jpg",
        "high" => "hqdefault.jpg",
        "medium" => "mqdefault.jpg",
        "standard" => "sddefault.jpg",
        _ => "hqdefault.jpg",
    };
    format!("https://i.ytimg.com/vi/{}/{}", video_id, file)
}

/// Concurrent video-id → thumbnail-URL map.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    inner: RwLock<HashMap<String, String>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Option<String> {
        self.inner
            .read()
            .expect("thumbnail cache poisoned")
            .get(video_id)
            .cloned()
    }

    pub fn insert(&self, video_id: impl Into<String>, url: impl Into<String>) {
        self.inner
            .write()
            .expect("thumbnail cache poisoned")
            .insert(video_id.into(), url.into());
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("thumbnail cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .expect("thumbnail cache poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_quality_scheme() {
        assert_eq!(
            thumbnail_url("abc", "maxres"),
            "https://i.ytimg.com/vi/abc/maxresdefault.jpg"
        );
        assert_eq!(
            thumbnail_url("abc", "unknown"),
            "https://i.ytimg.com/vi/abc/hqdefault.jpg"
        );
    }

    #[test]
    fn cache_round_trip_and_clear() {
        let cache = ThumbnailCache::new();
        assert!(cache.is_empty());

        cache.insert("a", "url-a");
        cache.insert("b", "url-b");
        assert_eq!(cache.get("a").as_deref(), Some("url-a"));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_access_is_safe() {
        use std::sync::Arc;

        let cache = Arc::new(ThumbnailCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let id = format!("{}-{}", i, j);
                        cache.insert(id.clone(), thumbnail_url(&id, "high"));
                        assert!(cache.get(&id).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 400);
    }
}
