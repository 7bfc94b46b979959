//! Whole-page cache for the home page. Entries are keyed by the request's
//! query string and served for a short TTL, so the hot feed page skips the
//! database entirely. Any write to the site clears the whole cache.

use crate::metrics;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CachedPage {
    body: String,
    stored_at: Instant,
}

/// A shared TTL cache of rendered pages.
#[derive(Clone)]
pub struct PageCache {
    ttl: Duration,
    pages: Arc<Mutex<HashMap<String, CachedPage>>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The cached body for this key, unless it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let pages = self.pages.lock().unwrap();
        let hit = pages
            .get(key)
            .filter(|page| page.stored_at.elapsed() < self.ttl)
            .map(|page| page.body.clone());
        let label = if hit.is_some() { "hit" } else { "miss" };
        metrics::CACHE_LOOKUPS.with_label_values(&[label]).inc();
        hit
    }

    pub fn put(&self, key: &str, body: String) {
        self.pages.lock().unwrap().insert(
            key.to_owned(),
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every cached page. Called after each write.
    pub fn clear(&self) {
        self.pages.lock().unwrap().clear();
    }
}
