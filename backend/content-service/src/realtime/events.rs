//! Domain events pushed to viewers after a successful mutation.
//!
//! Wire format is one JSON object per event:
//! `{"type": "comment_added", "payload": {"item_id": "...", "comment": {...}}}`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EnrichedComment, EnrichedReply, FeedItem, LikeSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    ContentCreated {
        item: FeedItem,
    },
    ContentUpdated {
        item: FeedItem,
    },
    ContentDeleted {
        item_id: Uuid,
    },
    Liked {
        item_id: Uuid,
        likes: Vec<Uuid>,
        like_count: usize,
    },
    Unliked {
        item_id: Uuid,
        likes: Vec<Uuid>,
        like_count: usize,
    },
    CommentAdded {
        item_id: Uuid,
        comment: EnrichedComment,
    },
    CommentDeleted {
        item_id: Uuid,
        comment_id: Uuid,
    },
    ReplyAdded {
        item_id: Uuid,
        comment_id: Uuid,
        reply: EnrichedReply,
    },
    ReplyDeleted {
        item_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
    },
}

impl DomainEvent {
    pub fn liked(summary: LikeSummary) -> Self {
        DomainEvent::Liked {
            item_id: summary.item_id,
            likes: summary.likes,
            like_count: summary.like_count,
        }
    }

    pub fn unliked(summary: LikeSummary) -> Self {
        DomainEvent::Unliked {
            item_id: summary.item_id,
            likes: summary.likes,
            like_count: summary.like_count,
        }
    }

    /// Matches the `type` tag on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ContentCreated { .. } => "content_created",
            DomainEvent::ContentUpdated { .. } => "content_updated",
            DomainEvent::ContentDeleted { .. } => "content_deleted",
            DomainEvent::Liked { .. } => "liked",
            DomainEvent::Unliked { .. } => "unliked",
            DomainEvent::CommentAdded { .. } => "comment_added",
            DomainEvent::CommentDeleted { .. } => "comment_deleted",
            DomainEvent::ReplyAdded { .. } => "reply_added",
            DomainEvent::ReplyDeleted { .. } => "reply_deleted",
        }
    }

    /// The content item this event concerns.
    pub fn item_id(&self) -> Uuid {
        match self {
            DomainEvent::ContentCreated { item } | DomainEvent::ContentUpdated { item } => item.id,
            DomainEvent::ContentDeleted { item_id }
            | DomainEvent::Liked { item_id, .. }
            | DomainEvent::Unliked { item_id, .. }
            | DomainEvent::CommentAdded { item_id, .. }
            | DomainEvent::CommentDeleted { item_id, .. }
            | DomainEvent::ReplyAdded { item_id, .. }
            | DomainEvent::ReplyDeleted { item_id, .. } => *item_id,
        }
    }
}
