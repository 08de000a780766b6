// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! LRU cache for storefront-mirror first-page lookups.
//!
//! The mirror listing is read far more often than it changes (it only moves
//! when a sync runs), so first pages are cached per page size and dropped
//! wholesale after every sync.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::catalog::StoredStoreProduct;

/// Cached entry: first page of mirror rows + insertion timestamp.
struct CacheEntry {
    products: Vec<StoredStoreProduct>,
    inserted_at: Instant,
}

/// In-process LRU cache for hot mirror listings.
pub struct MirrorCache {
    cache: Mutex<LruCache<usize, CacheEntry>>,
    ttl: Duration,
}

impl MirrorCache {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// - `capacity`: Max number of distinct page sizes to cache.
    /// - `ttl`: Time-to-live for each cache entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Get the cached first page for a page size.
    ///
    /// Returns `None` if not cached or expired.
    pub fn get_first_page(&self, limit: usize) -> Option<Vec<StoredStoreProduct>> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(&limit) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.products.clone());
            }
            // Expired — remove it
            cache.pop(&limit);
        }
        None
    }

    /// Store the first page for a page size.
    pub fn put_first_page(&self, limit: usize, products: Vec<StoredStoreProduct>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                limit,
                CacheEntry {
                    products,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every cached page. Called after each sync run.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Default for MirrorCache {
    fn default() -> Self {
        Self::new(8, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(remote_id: u64) -> StoredStoreProduct {
        StoredStoreProduct {
            remote_id,
            name: format!("Remote {remote_id}"),
            sku: String::new(),
            price: "5.00".to_string(),
            stock_quantity: None,
            status: "publish".to_string(),
            permalink: String::new(),
            is_missing_from_store: false,
            last_seen_at: Utc::now(),
            synced_at: Utc::now(),
        }
    }

    #[test]
    fn cache_put_and_get() {
        let cache = MirrorCache::new(4, Duration::from_secs(300));
        assert!(cache.get_first_page(50).is_none());

        cache.put_first_page(50, vec![sample(1), sample(2)]);

        let page = cache.get_first_page(50).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].remote_id, 1);

        // A different page size is a different entry
        assert!(cache.get_first_page(100).is_none());
    }

    #[test]
    fn cache_invalidate_all() {
        let cache = MirrorCache::new(4, Duration::from_secs(300));
        cache.put_first_page(50, vec![sample(1)]);
        cache.put_first_page(100, vec![sample(1)]);

        cache.invalidate_all();
        assert!(cache.get_first_page(50).is_none());
        assert!(cache.get_first_page(100).is_none());
    }

    #[test]
    fn cache_ttl_expiry() {
        let cache = MirrorCache::new(4, Duration::from_millis(1));
        cache.put_first_page(50, vec![sample(1)]);

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get_first_page(50).is_none());
    }
}
