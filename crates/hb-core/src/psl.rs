//! Public Suffix List (PSL) utilities for registrable-domain extraction
//!
//! This module provides eTLD+1 extraction with LRU caching. The suffix rules
//! are the ones compiled into the `psl` crate; history visits repeat the same
//! handful of hosts, so the cache absorbs nearly every lookup.
//!
//! # Examples
//!
//! ```
//! use hb_core::psl::registrable_domain;
//!
//! assert_eq!(registrable_domain("sub.example.com").as_deref(), Some("example.com"));
//! assert_eq!(registrable_domain("www.google.co.uk").as_deref(), Some("google.co.uk"));
//! assert_eq!(registrable_domain("co.uk"), None);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// =============================================================================
// LRU Cache
// =============================================================================

const CACHE_CAPACITY: usize = 4096;

/// Simple fixed-size cache for eTLD+1 lookups.
/// Uses a basic LRU strategy with a hashmap + vec.
pub struct LruCache {
    capacity: usize,
    entries: HashMap<String, Option<String>>,
    order: VecDeque<String>,
}

impl LruCache {
    /// Create a new LRU cache with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Get a value from the cache.
    ///
    /// The outer `Option` is the cache hit, the inner one the cached result.
    pub fn get(&mut self, key: &str) -> Option<Option<&str>> {
        if self.entries.contains_key(key) {
            // Move to back (most recently used)
            self.order.retain(|k| k != key);
            self.order.push_back(key.to_string());
            self.entries.get(key).map(|v| v.as_deref())
        } else {
            None
        }
    }

    /// Insert a value into the cache.
    pub fn insert(&mut self, key: String, value: Option<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            // Evict oldest
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        if self.entries.insert(key.clone(), value).is_some() {
            self.order.retain(|k| *k != key);
        }
        self.order.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

// =============================================================================
// Global Cache
// =============================================================================

static ETLD1_CACHE: Mutex<Option<LruCache>> = Mutex::new(None);

// =============================================================================
// eTLD+1 Extraction
// =============================================================================

/// Get the registrable domain (eTLD+1) for a hostname.
///
/// The host is lowercased and a trailing dot dropped first. Returns `None`
/// for public suffixes themselves (`co.uk`) and for hosts the suffix rules
/// cannot split (`intranet`).
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    // Check cache
    if let Ok(mut guard) = ETLD1_CACHE.lock() {
        if let Some(cached) = guard.as_mut().and_then(|cache| cache.get(&host)) {
            return cached.map(str::to_string);
        }
    }

    let result = compute_registrable_domain(&host);

    // Store in cache
    if let Ok(mut guard) = ETLD1_CACHE.lock() {
        guard
            .get_or_insert_with(|| LruCache::new(CACHE_CAPACITY))
            .insert(host, result.clone());
    }

    result
}

/// Compute the registrable domain without caching.
fn compute_registrable_domain(host: &str) -> Option<String> {
    // Empty labels ("a..b") never form a domain
    if host.split('.').any(str::is_empty) {
        return None;
    }

    psl::domain_str(host).map(str::to_string)
}
