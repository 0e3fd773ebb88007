//! Enriched read models
//!
//! What callers receive: every node carries the owner's `ProfileSnapshot`
//! instead of a bare identity. Feeds are cached in this form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Comment, ContentItem, Media, ProfileSnapshot, Reply};

/// Resolved profiles for one assembly pass.
///
/// Lookups for identities that were never resolved fall back to a
/// placeholder, so assembly itself cannot fail.
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
    profiles: HashMap<Uuid, ProfileSnapshot>,
}

impl ProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: ProfileSnapshot) {
        self.profiles.insert(snapshot.identity, snapshot);
    }

    pub fn snapshot(&self, identity: Uuid) -> ProfileSnapshot {
        self.profiles
            .get(&identity)
            .cloned()
            .unwrap_or_else(|| ProfileSnapshot::placeholder(identity))
    }
}

impl FromIterator<ProfileSnapshot> for ProfileDirectory {
    fn from_iter<I: IntoIterator<Item = ProfileSnapshot>>(iter: I) -> Self {
        let mut directory = Self::new();
        for snapshot in iter {
            directory.insert(snapshot);
        }
        directory
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReply {
    pub id: Uuid,
    pub owner: ProfileSnapshot,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl EnrichedReply {
    pub fn assemble(reply: &Reply, profiles: &ProfileDirectory) -> Self {
        Self {
            id: reply.id,
            owner: profiles.snapshot(reply.owner_id),
            body: reply.body.clone(),
            created_at: reply.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedComment {
    pub id: Uuid,
    pub owner: ProfileSnapshot,
    pub body: String,
    pub replies: Vec<EnrichedReply>,
    pub created_at: DateTime<Utc>,
}

impl EnrichedComment {
    pub fn assemble(comment: &Comment, profiles: &ProfileDirectory) -> Self {
        Self {
            id: comment.id,
            owner: profiles.snapshot(comment.owner_id),
            body: comment.body.clone(),
            replies: comment
                .replies
                .iter()
                .map(|r| EnrichedReply::assemble(r, profiles))
                .collect(),
            created_at: comment.created_at,
        }
    }
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub owner: ProfileSnapshot,
    pub body: String,
    pub media: Option<Media>,
    pub comments: Vec<EnrichedComment>,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedItem {
    pub fn assemble(item: &ContentItem, profiles: &ProfileDirectory) -> Self {
        Self {
            id: item.id,
            owner: profiles.snapshot(item.owner_id),
            body: item.body.clone(),
            media: item.media.clone(),
            comments: item
                .comments
                .iter()
                .map(|c| EnrichedComment::assemble(c, profiles))
                .collect(),
            likes: item.likes.clone(),
            like_count: item.like_count(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Like state after a like/unlike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeSummary {
    pub item_id: Uuid,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
}

impl From<&ContentItem> for LikeSummary {
    fn from(item: &ContentItem) -> Self {
        Self {
            item_id: item.id,
            likes: item.likes.clone(),
            like_count: item.like_count(),
        }
    }
}
