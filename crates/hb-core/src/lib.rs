//! HistoryBlock Core Library
//!
//! This crate provides the pure half of HistoryBlock: turning a URL into a
//! blacklist entry. It performs no I/O and holds no state beyond a small
//! registrable-domain cache.
//!
//! # Architecture
//!
//! A URL goes through two pluggable strategies:
//!
//! 1. a [`Matcher`] reduces it to a canonical key (registrable domain, full
//!    host, or scheme-less URL without query/fragment),
//! 2. a [`HashStrategy`] turns the key into the stored entry (SHA-1 hex or
//!    the key itself).
//!
//! The runtime side (storage, browser events) lives in `hb-background`.
//!
//! # Modules
//!
//! - `url`: allocation-free scheme/host/path slicing
//! - `psl`: Public Suffix List lookups for registrable domains
//! - `hash`: SHA-1 (FIPS 180-1) and the hash strategies
//! - `matcher`: the matcher strategies
//! - `types`: matching and encryption modes

pub mod hash;
pub mod matcher;
pub mod psl;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use hash::{hash_for, sha1, sha1_hex, HashStrategy, NoHash, Sha1Hash};
pub use matcher::{matcher_for, DomainMatcher, Matcher, SubdomainMatcher, UrlMatcher};
pub use psl::registrable_domain;
pub use types::{EncryptionMode, MatchingMode, ParseModeError};

/// Compute the blacklist entry for `url` under the given strategies.
///
/// Returns `None` when the matcher finds nothing to key on.
#[inline]
pub fn entry_for(matcher: &dyn Matcher, hash: &dyn HashStrategy, url: &str) -> Option<String> {
    let key = matcher.match_url(url)?;
    Some(hash.digest(&key))
}
