//! Cache key schema
//!
//! Two namespaces are shared across services and must stay independently
//! invalidatable:
//!
//! - `profile:{identity}`: one profile snapshot per identity
//! - `feed:{scope}`: assembled feed views, scope is `global` or an owner identity

use uuid::Uuid;

/// Prefix of every profile snapshot key.
pub const PROFILE_PREFIX: &str = "profile:";

/// Prefix of every assembled feed key.
pub const FEED_PREFIX: &str = "feed:";

/// Scope name of the feed every viewer sees.
pub const GLOBAL_FEED_SCOPE: &str = "global";

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    // ============= Profile Keys =============

    /// Profile snapshot for an identity
    /// Format: profile:{identity}
    pub fn profile(identity: Uuid) -> String {
        format!("{}{}", PROFILE_PREFIX, identity)
    }

    // ============= Feed Keys =============

    /// Global feed
    /// Format: feed:global
    pub fn global_feed() -> String {
        format!("{}{}", FEED_PREFIX, GLOBAL_FEED_SCOPE)
    }

    /// Feed of the items owned by one identity
    /// Format: feed:{owner}
    pub fn owner_feed(owner: Uuid) -> String {
        format!("{}{}", FEED_PREFIX, owner)
    }

    /// Prefix covering every feed key, global and per-owner.
    pub fn feed_namespace() -> &'static str {
        FEED_PREFIX
    }

}

/// Namespace a key or prefix belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Profile,
    Feed,
    Other,
}

impl CacheNamespace {
    /// Accepts full keys as well as bare prefixes such as `feed:`.
    pub fn of(key: &str) -> Self {
        if key.starts_with(PROFILE_PREFIX) {
            CacheNamespace::Profile
        } else if key.starts_with(FEED_PREFIX) {
            CacheNamespace::Feed
        } else {
            CacheNamespace::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Profile => "profile",
            CacheNamespace::Feed => "feed",
            CacheNamespace::Other => "other",
        }
    }
}
