/// Business logic layer for content-service
///
/// - Feed service: cached, enriched feed reads
/// - Mutation service: content writes, cache invalidation, event publish
/// - Profile resolver: cache-first profile lookups with placeholders
pub mod feed;
pub mod media;
pub mod mutations;
pub mod profiles;

// Re-export commonly used services
pub use feed::{FeedScope, FeedService};
pub use mutations::{ContentChanges, MutationService};
pub use profiles::ProfileResolver;
