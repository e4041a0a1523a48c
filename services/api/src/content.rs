//! Content gateway: validated CRUD over projects and client testimonials
//!
//! Callers never see image bytes through listings or write results, only the
//! retrieval reference; bytes come back through [`ContentGateway::get_image`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::content::{
        ContentFields, ContentRecord, ImageAsset, ImageUpload, RecordPatch, RecordSummary,
        RecordView, ResourceKind,
    },
    repositories::ContentStore,
    upload::MAX_IMAGE_BYTES,
    validation::{validate_new_record, validate_record_patch},
};

/// Gateway over a [`ContentStore`]
#[derive(Clone)]
pub struct ContentGateway {
    store: Arc<dyn ContentStore>,
}

impl ContentGateway {
    /// Create a new gateway
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// All records of a kind, images rewritten to retrieval references
    pub async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<RecordView>> {
        let records = self.store.find_all(kind).await?;
        Ok(records.iter().map(RecordSummary::to_view).collect())
    }

    /// Validate and store a new record with its optional image
    pub async fn create(
        &self,
        kind: ResourceKind,
        fields: ContentFields,
        image: Option<ImageUpload>,
    ) -> ApiResult<RecordView> {
        let fields = normalize(kind, fields);
        validate_new_record(kind, &fields)?;
        check_image_size(image.as_ref())?;

        let now = Utc::now();
        let record = ContentRecord {
            id: Uuid::new_v4(),
            kind,
            name: fields.name.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            designation: fields.designation,
            image: image.map(ImageAsset::from).unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&record).await?;
        info!("Created {} {}", kind.as_str(), record.id);

        Ok(record.to_view())
    }

    /// Apply a partial update
    ///
    /// An attached image replaces the stored one entirely; without one the
    /// stored image is left untouched.
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        fields: ContentFields,
        image: Option<ImageUpload>,
    ) -> ApiResult<RecordView> {
        let fields = normalize(kind, fields);
        validate_record_patch(kind, &fields)?;
        check_image_size(image.as_ref())?;

        let patch = RecordPatch {
            name: fields.name,
            description: fields.description,
            designation: fields.designation,
            image,
        };

        let record = self
            .store
            .update(kind, id, &patch)
            .await?
            .ok_or(ApiError::NotFound(kind.label()))?;
        info!("Updated {} {}", kind.as_str(), id);

        Ok(record.to_view())
    }

    /// Delete a record and the image it owns
    pub async fn remove(&self, kind: ResourceKind, id: Uuid) -> ApiResult<()> {
        if !self.store.delete(kind, id).await? {
            return Err(ApiError::NotFound(kind.label()));
        }

        info!("Deleted {} {}", kind.as_str(), id);
        Ok(())
    }

    /// Raw image bytes and content type for a record
    pub async fn get_image(&self, kind: ResourceKind, id: Uuid) -> ApiResult<(Vec<u8>, String)> {
        let record = self
            .store
            .find_by_id(kind, id)
            .await?
            .ok_or(ApiError::NotFound("Image"))?;

        match record.image {
            ImageAsset::Stored {
                bytes,
                content_type,
            } => Ok((bytes, content_type)),
            ImageAsset::LegacyPath { .. } | ImageAsset::Absent => Err(ApiError::NotFound("Image")),
        }
    }
}

/// Trim text fields and drop fields the kind does not have
fn normalize(kind: ResourceKind, fields: ContentFields) -> ContentFields {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());

    ContentFields {
        name: trim(fields.name),
        description: trim(fields.description),
        designation: if kind.has_designation() {
            trim(fields.designation)
        } else {
            None
        },
    }
}

fn check_image_size(image: Option<&ImageUpload>) -> ApiResult<()> {
    match image {
        Some(image) if image.bytes.len() > MAX_IMAGE_BYTES => {
            warn!("Rejected image of {} bytes", image.bytes.len());
            Err(ApiError::PayloadTooLarge)
        }
        _ => Ok(()),
    }
}
