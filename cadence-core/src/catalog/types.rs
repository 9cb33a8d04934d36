//! Data types shared between the engine and catalog providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Catalog providers a transfer can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Spotify,
    Youtube,
}

impl Provider {
    /// Human-readable provider name for progress messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Spotify => "Spotify",
            Provider::Youtube => "YouTube",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Spotify => write!(f, "spotify"),
            Provider::Youtube => write!(f, "youtube"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spotify" => Ok(Provider::Spotify),
            "youtube" => Ok(Provider::Youtube),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Bearer credential for a catalog provider.
///
/// Wrapped so the secret never leaks into logs or event payloads; `Debug`
/// and `Display` both redact.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw bearer secret, for building Authorization headers only.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<redacted>)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

/// A named collection (playlist) on a catalog provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Provider-scoped collection id
    pub id: String,
    /// Display name
    pub name: String,
    /// Item count as reported by the provider, when known
    pub item_count: Option<u64>,
}

/// One track pulled from a source catalog.
///
/// Owned transiently by the fetch that produced it; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Destination-compatible reference within the item's own provider
    /// (track URI, video id). Reused directly on same-provider clones.
    pub id: String,
    /// Track title as the provider displays it
    pub display_name: String,
    /// Primary artist, when the provider exposes one
    pub primary_artist: Option<String>,
    /// Raw provider payload, kept for diagnostics only
    pub raw: serde_json::Value,
}

/// One result from a destination catalog search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Destination-side reference usable in write calls
    pub ref_id: String,
    /// Result title
    pub title: String,
    /// Result artist or channel, when the provider exposes one
    pub artist: Option<String>,
}

/// Opaque reference to a destination collection created during a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef(pub String);

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_str() {
        assert_eq!("spotify".parse::<Provider>().unwrap(), Provider::Spotify);
        assert_eq!("YouTube".parse::<Provider>().unwrap(), Provider::Youtube);
        assert_eq!(Provider::Spotify.to_string(), "spotify");
        assert!("tidal".parse::<Provider>().is_err());
    }

    #[test]
    fn access_token_redacts_in_debug_output() {
        let token = AccessToken::new("very-secret-bearer");
        let debug = format!("{token:?}");
        let display = format!("{token}");
        assert!(!debug.contains("very-secret-bearer"));
        assert!(!display.contains("very-secret-bearer"));
        assert_eq!(token.secret(), "very-secret-bearer");
    }
}
