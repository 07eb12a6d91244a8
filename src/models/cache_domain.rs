use serde::{Deserialize, Serialize};
use std::fmt;

/// Cached query domains the feed can invalidate.
///
/// These are the only side-channel effects the feed has on the rest of the
/// application: when a broadcast event arrives, the [`SessionBinder`] asks
/// the query cache to invalidate the affected domains.
///
/// [`SessionBinder`]: crate::session::SessionBinder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDomain {
    /// Cached order queries (order lists, order detail).
    Orders,
    /// Cached table queries (table map, occupancy).
    Tables,
}

impl CacheDomain {
    /// The cache key for this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDomain::Orders => "orders",
            CacheDomain::Tables => "tables",
        }
    }
}

impl fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
