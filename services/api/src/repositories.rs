//! Repositories for content and lead persistence
//!
//! The store is reached only through find, insert, update and delete by id.
//! Every write touches a single record in one step, so a concurrent reader
//! sees either the old record or the new one, never a mix.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{
    content::{ContentRecord, RecordPatch, RecordSummary, ResourceKind},
    lead::{Contact, Subscriber},
};

pub mod content;
pub mod lead;
pub mod memory;

pub use content::PgContentStore;
pub use lead::PgLeadStore;
pub use memory::{MemoryContentStore, MemoryLeadStore};

/// Persistence for projects and client testimonials
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All records of a kind in the store's natural order, without image bytes
    async fn find_all(&self, kind: ResourceKind) -> DatabaseResult<Vec<RecordSummary>>;

    /// A single record, `None` if the id does not resolve
    async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<Option<ContentRecord>>;

    /// Insert a new record with its image
    async fn insert(&self, record: &ContentRecord) -> DatabaseResult<()>;

    /// Apply a partial update, returning the updated record or `None`
    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> DatabaseResult<Option<ContentRecord>>;

    /// Delete a record together with its image; `true` if it existed
    async fn delete(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<bool>;
}

/// Persistence for captured leads
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Append a contact message
    async fn insert_contact(&self, contact: &Contact) -> DatabaseResult<()>;

    /// All contact messages in capture order
    async fn list_contacts(&self) -> DatabaseResult<Vec<Contact>>;

    /// Add a subscription; `false` if the email is already subscribed
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> DatabaseResult<bool>;

    /// All subscriptions in capture order
    async fn list_subscribers(&self) -> DatabaseResult<Vec<Subscriber>>;
}
