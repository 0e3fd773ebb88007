//! Mutation coordinator
//!
//! Every content write goes through here. The acting identity is already
//! verified. Per mutation the order is fixed:
//!
//! 1. validate input
//! 2. load the document, existence check, then ownership check
//! 3. store write
//! 4. feed cache invalidation
//! 5. event publish
//!
//! Nothing is invalidated or published when the write fails.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::media::{classify_media, require_text};
use super::{FeedService, ProfileResolver};
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::mutations::MUTATION_TOTAL;
use crate::models::{
    Comment, ContentItem, EnrichedComment, EnrichedReply, FeedItem, LikeSummary,
    ProfileDirectory, Reply,
};
use crate::realtime::{DomainEvent, EventHub};

/// Fields a content update may change. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct ContentChanges {
    pub body: Option<String>,
    /// Empty string clears media
    pub media: Option<String>,
}

pub struct MutationService {
    store: Arc<dyn ContentStore>,
    feed: Arc<FeedService>,
    profiles: Arc<ProfileResolver>,
    hub: Arc<EventHub>,
}

fn ensure_owner(actor: Uuid, owner_id: Uuid, what: &str) -> Result<()> {
    if actor == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You don't have permission to modify this {}",
            what
        )))
    }
}

fn post_not_found(item_id: Uuid) -> AppError {
    AppError::NotFound(format!("post {}", item_id))
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("comment {}", comment_id))
}

fn reply_not_found(reply_id: Uuid) -> AppError {
    AppError::NotFound(format!("reply {}", reply_id))
}

impl MutationService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        feed: Arc<FeedService>,
        profiles: Arc<ProfileResolver>,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            store,
            feed,
            profiles,
            hub,
        }
    }

    pub async fn create_content(
        &self,
        actor: Uuid,
        body: &str,
        media: Option<&str>,
    ) -> Result<FeedItem> {
        track("create_content", async {
            let body = require_text(body, "body")?;
            let media = media.and_then(classify_media);

            let item = ContentItem::new(actor, body, media);
            self.store.insert(&item).await?;
            self.after_write().await;

            let enriched = self.feed.enrich_item(&item).await;
            self.publish(DomainEvent::ContentCreated {
                item: enriched.clone(),
            })
            .await;

            info!(item_id = %item.id, owner_id = %actor, "Post created");
            Ok::<_, AppError>(enriched)
        })
        .await
    }

    pub async fn update_content(
        &self,
        actor: Uuid,
        item_id: Uuid,
        changes: ContentChanges,
    ) -> Result<FeedItem> {
        track("update_content", async {
            let body = changes
                .body
                .as_deref()
                .map(|b| require_text(b, "body"))
                .transpose()?;

            let mut item = self.load(item_id).await?;
            ensure_owner(actor, item.owner_id, "post")?;

            if let Some(body) = body {
                item.body = body;
            }
            if let Some(media) = changes.media.as_deref() {
                item.media = classify_media(media);
            }
            item.touch();

            self.replace(&item).await?;
            self.after_write().await;

            let enriched = self.feed.enrich_item(&item).await;
            self.publish(DomainEvent::ContentUpdated {
                item: enriched.clone(),
            })
            .await;

            Ok::<_, AppError>(enriched)
        })
        .await
    }

    pub async fn delete_content(&self, actor: Uuid, item_id: Uuid) -> Result<()> {
        track("delete_content", async {
            let item = self.load(item_id).await?;
            ensure_owner(actor, item.owner_id, "post")?;

            if !self.store.delete(item_id).await? {
                return Err(post_not_found(item_id));
            }
            self.after_write().await;
            self.publish(DomainEvent::ContentDeleted { item_id }).await;

            info!(%item_id, comments = item.comments.len(), "Post deleted");
            Ok::<_, AppError>(())
        })
        .await
    }

    pub async fn like(&self, actor: Uuid, item_id: Uuid) -> Result<LikeSummary> {
        track("like", async {
            let mut item = self.load(item_id).await?;
            if !item.add_like(actor) {
                return Err(AppError::Conflict(format!(
                    "post {} is already liked",
                    item_id
                )));
            }

            self.replace(&item).await?;
            self.after_write().await;

            let summary = LikeSummary::from(&item);
            self.publish(DomainEvent::liked(summary.clone())).await;
            Ok::<_, AppError>(summary)
        })
        .await
    }

    /// Idempotent: unliking something not liked succeeds without a write.
    pub async fn unlike(&self, actor: Uuid, item_id: Uuid) -> Result<LikeSummary> {
        track("unlike", async {
            let mut item = self.load(item_id).await?;
            if !item.remove_like(actor) {
                debug!(%item_id, %actor, "Unlike without a like, nothing to do");
                return Ok(LikeSummary::from(&item));
            }

            self.replace(&item).await?;
            self.after_write().await;

            let summary = LikeSummary::from(&item);
            self.publish(DomainEvent::unliked(summary.clone())).await;
            Ok::<_, AppError>(summary)
        })
        .await
    }

    pub async fn add_comment(
        &self,
        actor: Uuid,
        item_id: Uuid,
        text: &str,
    ) -> Result<EnrichedComment> {
        track("add_comment", async {
            let text = require_text(text, "comment")?;
            let mut item = self.load(item_id).await?;

            let comment = Comment::new(actor, text);
            item.comments.push(comment.clone());

            self.replace(&item).await?;
            self.after_write().await;

            let profiles = self.actor_profile(actor).await;
            let enriched = EnrichedComment::assemble(&comment, &profiles);
            self.publish(DomainEvent::CommentAdded {
                item_id,
                comment: enriched.clone(),
            })
            .await;

            Ok::<_, AppError>(enriched)
        })
        .await
    }

    pub async fn delete_comment(&self, actor: Uuid, item_id: Uuid, comment_id: Uuid) -> Result<()> {
        track("delete_comment", async {
            let mut item = self.load(item_id).await?;
            let comment = item
                .comment(comment_id)
                .ok_or_else(|| comment_not_found(comment_id))?;
            ensure_owner(actor, comment.owner_id, "comment")?;

            item.remove_comment(comment_id);

            self.replace(&item).await?;
            self.after_write().await;
            self.publish(DomainEvent::CommentDeleted {
                item_id,
                comment_id,
            })
            .await;

            Ok::<_, AppError>(())
        })
        .await
    }

    pub async fn add_reply(
        &self,
        actor: Uuid,
        item_id: Uuid,
        comment_id: Uuid,
        text: &str,
    ) -> Result<EnrichedReply> {
        track("add_reply", async {
            let text = require_text(text, "reply")?;
            let mut item = self.load(item_id).await?;

            let reply = Reply::new(actor, text);
            item.comment_mut(comment_id)
                .ok_or_else(|| comment_not_found(comment_id))?
                .replies
                .push(reply.clone());

            self.replace(&item).await?;
            self.after_write().await;

            let profiles = self.actor_profile(actor).await;
            let enriched = EnrichedReply::assemble(&reply, &profiles);
            self.publish(DomainEvent::ReplyAdded {
                item_id,
                comment_id,
                reply: enriched.clone(),
            })
            .await;

            Ok::<_, AppError>(enriched)
        })
        .await
    }

    pub async fn delete_reply(
        &self,
        actor: Uuid,
        item_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
    ) -> Result<()> {
        track("delete_reply", async {
            let mut item = self.load(item_id).await?;
            let comment = item
                .comment_mut(comment_id)
                .ok_or_else(|| comment_not_found(comment_id))?;
            let reply = comment
                .reply(reply_id)
                .ok_or_else(|| reply_not_found(reply_id))?;
            ensure_owner(actor, reply.owner_id, "reply")?;

            comment.remove_reply(reply_id);

            self.replace(&item).await?;
            self.after_write().await;
            self.publish(DomainEvent::ReplyDeleted {
                item_id,
                comment_id,
                reply_id,
            })
            .await;

            Ok::<_, AppError>(())
        })
        .await
    }

    async fn load(&self, item_id: Uuid) -> Result<ContentItem> {
        self.store
            .get(item_id)
            .await?
            .ok_or_else(|| post_not_found(item_id))
    }

    /// A document deleted between load and write reads as not found.
    async fn replace(&self, item: &ContentItem) -> Result<()> {
        if self.store.replace(item).await? {
            Ok(())
        } else {
            Err(post_not_found(item.id))
        }
    }

    async fn after_write(&self) {
        self.feed.invalidate().await;
    }

    async fn actor_profile(&self, actor: Uuid) -> ProfileDirectory {
        std::iter::once(self.profiles.resolve(actor).await).collect()
    }

    async fn publish(&self, event: DomainEvent) {
        let kind = event.kind();
        let delivered = self.hub.publish(event).await;
        debug!(kind, delivered, "Mutation event broadcast");
    }
}

async fn track<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let result = fut.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    MUTATION_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    result
}
