/// Terminal disposition definitions for batch items
///
/// Every index submitted to a resolve ends up in exactly one of these buckets.
use serde::Serialize;
use std::fmt;

/// Represents how a single batch item was finally accounted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    // ===== Resolved States =====
    /// Title was already present in the cache; no adapter call was made
    CacheHit,

    /// Adapter returned a record which was then appended to the cache
    Fetched,

    // ===== Terminal Non-Match =====
    /// Adapter determined the item does not exist at the source
    NotFound,

    // ===== Unfinished States =====
    /// Item was attempted but still failing when the run stopped
    Unresolved,

    /// Item was never processed because the run was cut short
    NotAttempted,
}

impl Disposition {
    /// Returns true if the item produced a record
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::CacheHit | Self::Fetched)
    }

    /// Returns true if the item is a permanent non-match
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns true if the item could still succeed on a later run
    ///
    /// NotFound items are terminal and never counted here.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Unresolved | Self::NotAttempted)
    }

    /// Converts the disposition to its stable string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache_hit",
            Self::Fetched => "fetched",
            Self::NotFound => "not_found",
            Self::Unresolved => "unresolved",
            Self::NotAttempted => "not_attempted",
        }
    }

    /// Parses a disposition from its string representation
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "cache_hit" => Some(Self::CacheHit),
            "fetched" => Some(Self::Fetched),
            "not_found" => Some(Self::NotFound),
            "unresolved" => Some(Self::Unresolved),
            "not_attempted" => Some(Self::NotAttempted),
            _ => None,
        }
    }

    /// Returns all dispositions in reporting order
    pub fn all() -> [Self; 5] {
        [
            Self::CacheHit,
            Self::Fetched,
            Self::NotFound,
            Self::Unresolved,
            Self::NotAttempted,
        ]
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
