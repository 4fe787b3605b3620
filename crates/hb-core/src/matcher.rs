//! URL Matchers
//!
//! A matcher decides which part of a URL identifies it in the blacklist.
//! Every history visit goes through here, so matchers are pure and only
//! allocate the returned key.

use std::fmt::Debug;
use std::sync::Arc;

use crate::psl::registrable_domain;
use crate::types::MatchingMode;
use crate::url::{extract_host, is_ip_literal, is_localhost, normalize_host, strip_query_and_fragment};

// =============================================================================
// Strategy
// =============================================================================

/// Reduces a URL to its canonical blacklist key.
pub trait Matcher: Send + Sync + Debug {
    /// The mode this matcher implements.
    fn mode(&self) -> MatchingMode;

    /// Canonical key for `url`, or `None` if the URL has nothing to key on.
    fn match_url(&self, url: &str) -> Option<String>;
}

/// Build the matcher for `mode`.
pub fn matcher_for(mode: MatchingMode) -> Arc<dyn Matcher> {
    match mode {
        MatchingMode::Domain => Arc::new(DomainMatcher::new()),
        MatchingMode::Subdomain => Arc::new(SubdomainMatcher),
        MatchingMode::Url => Arc::new(UrlMatcher),
    }
}

// =============================================================================
// Domain
// =============================================================================

/// Keys on the registrable domain.
///
/// `https://foo.bar.baz.google.com/` -> `google.com`,
/// `http://www.google.co.uk/` -> `google.co.uk`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainMatcher;

impl DomainMatcher {
    pub const fn new() -> Self {
        Self
    }
}

impl Matcher for DomainMatcher {
    fn mode(&self) -> MatchingMode {
        MatchingMode::Domain
    }

    fn match_url(&self, url: &str) -> Option<String> {
        let host = normalize_host(extract_host(url)?);

        // No registrable-domain structure to reduce
        if is_localhost(&host) || is_ip_literal(&host) {
            return Some(host);
        }

        let domain = registrable_domain(&host);
        if domain.is_none() {
            log::debug!("no registrable domain for host '{}'", host);
        }
        domain
    }
}

// =============================================================================
// Subdomain
// =============================================================================

/// Keys on the full host.
///
/// `https://foo.bar.baz.google.com/` -> `foo.bar.baz.google.com`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubdomainMatcher;

impl Matcher for SubdomainMatcher {
    fn mode(&self) -> MatchingMode {
        MatchingMode::Subdomain
    }

    fn match_url(&self, url: &str) -> Option<String> {
        let host = normalize_host(extract_host(url)?);
        if host.is_empty() {
            return None;
        }
        Some(host)
    }
}

// =============================================================================
// URL
// =============================================================================

/// Keys on the URL without scheme, query and fragment.
///
/// `http://example.com/a?x=1#y` -> `example.com/a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlMatcher;

impl Matcher for UrlMatcher {
    fn mode(&self) -> MatchingMode {
        MatchingMode::Url
    }

    fn match_url(&self, url: &str) -> Option<String> {
        let key = strip_query_and_fragment(url.trim());
        if key.is_empty() {
            return None;
        }
        Some(key.to_string())
    }
}
