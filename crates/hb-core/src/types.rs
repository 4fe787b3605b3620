//! Mode definitions shared by every HistoryBlock crate.
//!
//! The string forms match the values persisted under the `matching` and
//! `encryption` storage keys.

use std::fmt;
use std::str::FromStr;

// =============================================================================
// Matching Mode
// =============================================================================

/// Which part of a URL is used as the blacklist key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchingMode {
    /// Registrable domain (eTLD+1)
    #[default]
    Domain,
    /// Full host including subdomains
    Subdomain,
    /// Scheme-less URL without query and fragment
    Url,
}

impl MatchingMode {
    pub const ALL: [MatchingMode; 3] = [Self::Domain, Self::Subdomain, Self::Url];

    /// Storage/message string for this mode.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Subdomain => "subdomain",
            Self::Url => "url",
        }
    }

    /// Parse a persisted value, falling back to [`MatchingMode::Domain`] for
    /// anything unknown or missing.
    pub fn from_str_lossy(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

// =============================================================================
// Encryption Mode
// =============================================================================

/// How canonical keys are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncryptionMode {
    /// Plain keys (debugging only)
    None,
    /// SHA-1 hex digests
    #[default]
    Sha1,
}

impl EncryptionMode {
    pub const ALL: [EncryptionMode; 2] = [Self::None, Self::Sha1];

    /// Storage/message string for this mode.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sha1 => "sha1",
        }
    }

    /// Parse a persisted value, falling back to [`EncryptionMode::Sha1`] for
    /// anything unknown or missing.
    pub fn from_str_lossy(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Error for mode strings that name no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseModeError {
    #[error("unknown matching mode '{0}' (expected domain, subdomain or url)")]
    Matching(String),
    #[error("unknown encryption mode '{0}' (expected sha1 or none)")]
    Encryption(String),
}

impl FromStr for MatchingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" => Ok(Self::Domain),
            "subdomain" => Ok(Self::Subdomain),
            "url" => Ok(Self::Url),
            _ => Err(ParseModeError::Matching(s.to_string())),
        }
    }
}

impl FromStr for EncryptionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "none" => Ok(Self::None),
            _ => Err(ParseModeError::Encryption(s.to_string())),
        }
    }
}

impl fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
