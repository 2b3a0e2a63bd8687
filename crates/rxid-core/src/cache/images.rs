//! Image → validated name cache.

use dashmap::DashMap;

use crate::models::{fold_name, ImageKey};

use super::{CacheStats, Counters};

/// Remembers which drug name validated for each submitted image.
#[derive(Debug, Default)]
pub struct ImageResolutionCache {
    entries: DashMap<ImageKey, String>,
    counters: Counters,
}

impl ImageResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name previously validated for this image, if any.
    pub fn lookup_resolved_name(&self, key: &ImageKey) -> Option<String> {
        match self.entries.get(key) {
            Some(name) => {
                self.counters.hit();
                Some(name.value().clone())
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    /// Record the validated name for an image (stored case-folded).
    pub fn record_resolved_name(&self, key: &ImageKey, name: &str) {
        self.entries.insert(key.clone(), fold_name(name));
    }

    /// Number of remembered images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let cache = ImageResolutionCache::new();
        let key = ImageKey::from_source("https://img.example/label.jpg");

        assert_eq!(cache.lookup_resolved_name(&key), None);

        cache.record_resolved_name(&key, "Lisinopril");
        assert_eq!(cache.lookup_resolved_name(&key), Some("lisinopril".into()));

        let same = ImageKey::from_source("HTTPS://IMG.EXAMPLE/LABEL.JPG");
        assert_eq!(cache.lookup_resolved_name(&same), Some("lisinopril".into()));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = std::sync::Arc::new(ImageResolutionCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let key = ImageKey::from_source(&format!("img-{}", i % 4));
                    cache.record_resolved_name(&key, "ibuprofen");
                    cache.lookup_resolved_name(&key)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("ibuprofen".into()));
        }
        assert_eq!(cache.len(), 4);
    }
}
