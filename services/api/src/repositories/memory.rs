//! In-memory repositories, suitable for development and testing

use async_trait::async_trait;
use chrono::Utc;
use common::error::DatabaseResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContentStore, LeadStore};
use crate::models::{
    content::{ContentRecord, RecordPatch, RecordSummary, ResourceKind},
    lead::{Contact, Subscriber},
};

/// In-memory content store
///
/// Records are kept in insertion order. Each write holds the lock for the
/// whole change, so readers never observe a half-applied update.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    records: Arc<RwLock<Vec<ContentRecord>>>,
}

impl MemoryContentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find_all(&self, kind: ResourceKind) -> DatabaseResult<Vec<RecordSummary>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.kind == kind)
            .map(ContentRecord::summary)
            .collect())
    }

    async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<Option<ContentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.kind == kind && r.id == id)
            .cloned())
    }

    async fn insert(&self, record: &ContentRecord) -> DatabaseResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> DatabaseResult<Option<ContentRecord>> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.kind == kind && r.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            record.name = name.clone();
        }
        if let Some(description) = &patch.description {
            record.description = description.clone();
        }
        if let Some(designation) = &patch.designation {
            record.designation = Some(designation.clone());
        }
        if let Some(image) = &patch.image {
            record.image = image.clone().into();
        }
        record.updated_at = Utc::now();

        Ok(Some(record.clone()))
    }

    async fn delete(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !(r.kind == kind && r.id == id));
        Ok(records.len() < before)
    }
}

/// In-memory lead store
#[derive(Clone, Default)]
pub struct MemoryLeadStore {
    contacts: Arc<RwLock<Vec<Contact>>>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl MemoryLeadStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn insert_contact(&self, contact: &Contact) -> DatabaseResult<()> {
        self.contacts.write().await.push(contact.clone());
        Ok(())
    }

    async fn list_contacts(&self) -> DatabaseResult<Vec<Contact>> {
        Ok(self.contacts.read().await.clone())
    }

    async fn insert_subscriber(&self, subscriber: &Subscriber) -> DatabaseResult<bool> {
        // Check and insert under one write lock.
        let mut subscribers = self.subscribers.write().await;
        if subscribers.iter().any(|s| s.email == subscriber.email) {
            return Ok(false);
        }
        subscribers.push(subscriber.clone());
        Ok(true)
    }

    async fn list_subscribers(&self) -> DatabaseResult<Vec<Subscriber>> {
        Ok(self.subscribers.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::{ImageAsset, ImageRef, ImageUpload};

    fn record(kind: ResourceKind, name: &str) -> ContentRecord {
        let now = Utc::now();
        ContentRecord {
            id: Uuid::new_v4(),
            kind,
            name: name.to_string(),
            description: "A description long enough".to_string(),
            designation: None,
            image: ImageAsset::LegacyPath {
                path: "/uploads/legacy.jpg".to_string(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order_per_kind() {
        let store = MemoryContentStore::new();
        let first = record(ResourceKind::Project, "first");
        let client = record(ResourceKind::Client, "client");
        let second = record(ResourceKind::Project, "second");

        for r in [&first, &client, &second] {
            store.insert(r).await.unwrap();
        }

        let names: Vec<String> = store
            .find_all(ResourceKind::Project)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_listing_carries_image_reference_only() {
        let store = MemoryContentStore::new();
        let mut stored = record(ResourceKind::Client, "stored");
        stored.image = ImageAsset::Stored {
            bytes: vec![7; 64],
            content_type: "image/png".to_string(),
        };
        let legacy = record(ResourceKind::Client, "legacy");
        store.insert(&stored).await.unwrap();
        store.insert(&legacy).await.unwrap();

        let listed = store.find_all(ResourceKind::Client).await.unwrap();
        assert_eq!(listed[0].image, ImageRef::Stored);
        assert_eq!(
            listed[1].image,
            ImageRef::LegacyPath {
                path: "/uploads/legacy.jpg".to_string()
            }
        );
        assert_eq!(
            listed[0].to_view().image,
            format!("/api/clients/{}/image", stored.id)
        );
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_ids() {
        let store = MemoryContentStore::new();
        let project = record(ResourceKind::Project, "p");
        store.insert(&project).await.unwrap();

        assert!(
            store
                .find_by_id(ResourceKind::Client, project.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete(ResourceKind::Client, project.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_image_replacement_discards_legacy_path() {
        let store = MemoryContentStore::new();
        let project = record(ResourceKind::Project, "p");
        store.insert(&project).await.unwrap();

        let patch = RecordPatch {
            image: Some(ImageUpload {
                bytes: vec![1, 2, 3],
                content_type: "image/jpeg".to_string(),
            }),
            ..Default::default()
        };
        let updated = store
            .update(ResourceKind::Project, project.id, &patch)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            updated.image,
            ImageAsset::Stored {
                bytes: vec![1, 2, 3],
                content_type: "image/jpeg".to_string()
            }
        );
        assert_eq!(updated.name, "p");
    }

    #[tokio::test]
    async fn test_duplicate_subscriber_is_refused() {
        let store = MemoryLeadStore::new();
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            date: Utc::now(),
        };
        let again = Subscriber {
            id: Uuid::new_v4(),
            ..subscriber.clone()
        };

        assert!(store.insert_subscriber(&subscriber).await.unwrap());
        assert!(!store.insert_subscriber(&again).await.unwrap());
        assert_eq!(store.list_subscribers().await.unwrap(), vec![subscriber]);
    }
}
