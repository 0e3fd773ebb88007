/// Data models for content-service
///
/// Raw content documents as the Content Store holds them. Comments and
/// replies only exist nested inside their item; there is no standalone
/// comment record.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

mod enriched;
mod profile;

pub use enriched::{EnrichedComment, EnrichedReply, FeedItem, LikeSummary, ProfileDirectory};
pub use profile::ProfileSnapshot;

/// Attached media. Closed so an item can never carry both kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Media {
    Image { url: String },
    Video { embed_url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(owner_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            body,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(owner_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            body,
            replies: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn reply(&self, reply_id: Uuid) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }

    /// Remove a reply, returning it if it existed.
    pub fn remove_reply(&mut self, reply_id: Uuid) -> Option<Reply> {
        let idx = self.replies.iter().position(|r| r.id == reply_id)?;
        Some(self.replies.remove(idx))
    }
}

/// A post as stored. Mutated only by the mutation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub media: Option<Media>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Liking identities in insertion order, no duplicates
    #[serde(default)]
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(owner_id: Uuid, body: String, media: Option<Media>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            body,
            media,
            comments: Vec::new(),
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, identity: Uuid) -> bool {
        self.likes.contains(&identity)
    }

    /// Returns false if `identity` already liked the item.
    pub fn add_like(&mut self, identity: Uuid) -> bool {
        if self.is_liked_by(identity) {
            return false;
        }
        self.likes.push(identity);
        true
    }

    /// Returns false if `identity` had not liked the item.
    pub fn remove_like(&mut self, identity: Uuid) -> bool {
        let before = self.likes.len();
        self.likes.retain(|id| *id != identity);
        self.likes.len() != before
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn comment_mut(&mut self, comment_id: Uuid) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }

    /// Remove a comment together with its replies.
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == comment_id)?;
        Some(self.comments.remove(idx))
    }

    /// Every identity that owns this item or any comment or reply in it.
    pub fn owner_identities(&self) -> BTreeSet<Uuid> {
        let mut ids = BTreeSet::new();
        ids.insert(self.owner_id);
        for comment in &self.comments {
            ids.insert(comment.owner_id);
            ids.extend(comment.replies.iter().map(|r| r.owner_id));
        }
        ids
    }
}
