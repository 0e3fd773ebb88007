use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContentStore;
use crate::error::Result;
use crate::models::ContentItem;

/// Process-local content store. Same contract as `PgContentStore`.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    items: RwLock<HashMap<Uuid, ContentItem>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut items: Vec<ContentItem>, limit: i64) -> Vec<ContentItem> {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    items.truncate(usize::try_from(limit).unwrap_or(0));
    items
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, item_id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await.values().cloned().collect();
        Ok(newest_first(items, limit))
    }

    async fn list_by_owner(&self, owner_id: Uuid, limit: i64) -> Result<Vec<ContentItem>> {
        let items = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(items, limit))
    }

    async fn insert(&self, item: &ContentItem) -> Result<()> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }

    async fn replace(&self, item: &ContentItem) -> Result<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, item_id: Uuid) -> Result<bool> {
        Ok(self.items.write().await.remove(&item_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item_at(owner: Uuid, body: &str, minutes_ago: i64) -> ContentItem {
        let mut item = ContentItem::new(owner, body.to_string(), None);
        item.created_at = item.created_at - Duration::minutes(minutes_ago);
        item
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first_and_limited() {
        let store = InMemoryContentStore::new();
        let owner = Uuid::new_v4();
        store.insert(&item_at(owner, "old", 10)).await.unwrap();
        store.insert(&item_at(owner, "new", 0)).await.unwrap();
        store.insert(&item_at(owner, "mid", 5)).await.unwrap();

        let bodies: Vec<_> = store
            .list_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.body)
            .collect();
        assert_eq!(bodies, vec!["new", "mid", "old"]);

        assert_eq!(store.list_recent(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_owner_filters() {
        let store = InMemoryContentStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(&item_at(a, "a1", 1)).await.unwrap();
        store.insert(&item_at(b, "b1", 0)).await.unwrap();

        let items = store.list_by_owner(a, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].owner_id, a);
    }

    #[tokio::test]
    async fn test_replace_and_delete_missing() {
        let store = InMemoryContentStore::new();
        let item = ContentItem::new(Uuid::new_v4(), "x".into(), None);

        assert!(!store.replace(&item).await.unwrap());
        assert!(!store.delete(item.id).await.unwrap());

        store.insert(&item).await.unwrap();
        let mut edited = item.clone();
        edited.body = "y".into();
        assert!(store.replace(&edited).await.unwrap());
        assert_eq!(store.get(item.id).await.unwrap().unwrap().body, "y");

        assert!(store.delete(item.id).await.unwrap());
        assert!(store.get(item.id).await.unwrap().is_none());
        assert!(store.list_recent(10).await.unwrap().is_empty());
    }
}
