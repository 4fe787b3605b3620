//! Fast URL slicing utilities for the hot path
//!
//! These functions avoid allocations and work directly on string slices.
//! They are deliberately lenient: browsers hand us whatever ended up in
//! history, including `about:`, `moz-extension:` and half-typed URLs.

use std::net::{Ipv4Addr, Ipv6Addr};

// =============================================================================
// Scheme
// =============================================================================

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    // Find ':'
    let colon_pos = bytes.iter().position(|&b| b == b':')?;
    if colon_pos == 0 {
        return None;
    }

    // Scheme must be ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    let scheme = &bytes[..colon_pos];
    if !scheme[0].is_ascii_alphabetic()
        || !scheme
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }

    // Check for "://"
    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

/// Strip the scheme (and a protocol-relative `//`) from a URL.
#[inline]
pub fn strip_scheme(url: &str) -> &str {
    match get_scheme_end(url) {
        Some(end) => &url[end..],
        None => url.strip_prefix("//").unwrap_or(url),
    }
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Authority section: everything between the scheme and the first
/// `/`, `?` or `#`.
#[inline]
pub fn extract_authority(url: &str) -> &str {
    let rest = strip_scheme(url);
    let end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
    &rest[..end]
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL, without userinfo or port.
///
/// Returns `None` when the URL has no hierarchical host, e.g. `about:blank`
/// or `mailto:someone@example.com`.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let authority = extract_authority(url);

    // Userinfo only exists behind an explicit scheme
    let host_port = if get_scheme_end(url).is_some() || url.starts_with("//") {
        match authority.rfind('@') {
            Some(at_pos) => &authority[at_pos + 1..],
            None => authority,
        }
    } else {
        authority
    };

    let (host, port) = split_port(host_port)?;
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if host.is_empty() || host.bytes().any(|b| b.is_ascii_whitespace() || b == b'@') {
        return None;
    }

    Some(host)
}

/// Split `host[:port]`, keeping IPv6 literals bracketed.
fn split_port(host_port: &str) -> Option<(&str, &str)> {
    if host_port.starts_with('[') {
        let close = host_port.find(']')?;
        let (host, rest) = host_port.split_at(close + 1);
        return match rest.strip_prefix(':') {
            Some(port) => Some((host, port)),
            None if rest.is_empty() => Some((host, "")),
            None => None,
        };
    }

    match host_port.find(':') {
        Some(pos) => Some((&host_port[..pos], &host_port[pos + 1..])),
        None => Some((host_port, "")),
    }
}

/// Normalize a host for comparison: lowercase, no trailing dot.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

// =============================================================================
// Path Extraction
// =============================================================================

/// Scheme-less URL truncated at the first `?` or `#`.
#[inline]
pub fn strip_query_and_fragment(url: &str) -> &str {
    let rest = strip_scheme(url);
    let end = rest.find(&['?', '#'][..]).unwrap_or(rest.len());
    &rest[..end]
}

// =============================================================================
// Host Classification
// =============================================================================

/// Check if a host is a literal IPv4 or (bracketed or bare) IPv6 address.
#[inline]
pub fn is_ip_literal(host: &str) -> bool {
    let unbracketed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    unbracketed.parse::<Ipv4Addr>().is_ok() || unbracketed.parse::<Ipv6Addr>().is_ok()
}

/// Check if a host is `localhost` or a `*.localhost` name.
#[inline]
pub fn is_localhost(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || (host.len() > ".localhost".len()
            && host.as_bytes()[host.len() - ".localhost".len()..].eq_ignore_ascii_case(b".localhost"))
}
