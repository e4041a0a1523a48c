//! Content models: projects, client testimonials, and their images

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of admin-managed content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Client,
}

impl ResourceKind {
    /// Value stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Client => "client",
        }
    }

    /// Path segment under `/api`
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Project => "projects",
            ResourceKind::Client => "clients",
        }
    }

    /// Human-readable name for messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Project => "Project",
            ResourceKind::Client => "Client",
        }
    }

    /// Clients carry a designation, projects do not
    pub fn has_designation(&self) -> bool {
        matches!(self, ResourceKind::Client)
    }
}

/// The image owned by a content record
///
/// Resolved once when a row leaves the store; nothing downstream inspects
/// raw columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageAsset {
    /// Bytes held in the store with their declared content type
    Stored { bytes: Vec<u8>, content_type: String },
    /// Path from before images were stored inline, returned verbatim
    LegacyPath { path: String },
    #[default]
    Absent,
}

impl ImageAsset {
    /// Fold the nullable image columns into one variant
    pub fn from_columns(
        data: Option<Vec<u8>>,
        content_type: Option<String>,
        path: Option<String>,
    ) -> Self {
        match (data, path) {
            (Some(bytes), _) => ImageAsset::Stored {
                bytes,
                content_type: content_type
                    .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string()),
            },
            (None, Some(path)) if !path.is_empty() => ImageAsset::LegacyPath { path },
            _ => ImageAsset::Absent,
        }
    }

    /// Where the image lives, without its bytes
    pub fn reference(&self) -> ImageRef {
        match self {
            ImageAsset::Stored { .. } => ImageRef::Stored,
            ImageAsset::LegacyPath { path } => ImageRef::LegacyPath { path: path.clone() },
            ImageAsset::Absent => ImageRef::Absent,
        }
    }

    /// The `image` value returned to callers in place of the bytes
    pub fn retrieval_reference(&self, kind: ResourceKind, id: Uuid) -> String {
        self.reference().retrieval_reference(kind, id)
    }
}

/// The shape of a record's image as listings see it; bytes are never loaded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageRef {
    Stored,
    LegacyPath { path: String },
    #[default]
    Absent,
}

impl ImageRef {
    /// Fold the presence flag and legacy path column into one variant
    pub fn from_columns(has_data: bool, path: Option<String>) -> Self {
        match path {
            _ if has_data => ImageRef::Stored,
            Some(path) if !path.is_empty() => ImageRef::LegacyPath { path },
            _ => ImageRef::Absent,
        }
    }

    pub fn retrieval_reference(&self, kind: ResourceKind, id: Uuid) -> String {
        match self {
            ImageRef::Stored => image_path(kind, id),
            ImageRef::LegacyPath { path } => path.clone(),
            ImageRef::Absent => String::new(),
        }
    }
}

/// Content type recorded when an upload does not declare one
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "application/octet-stream";

/// Retrieval path for a stored image
pub fn image_path(kind: ResourceKind, id: Uuid) -> String {
    format!("/api/{}/{}/image", kind.collection(), id)
}

/// An uploaded image waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl From<ImageUpload> for ImageAsset {
    fn from(upload: ImageUpload) -> Self {
        ImageAsset::Stored {
            bytes: upload.bytes,
            content_type: upload.content_type,
        }
    }
}

/// A project or client testimonial as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub description: String,
    pub designation: Option<String>,
    pub image: ImageAsset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// The record without its image bytes
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            description: self.description.clone(),
            designation: self.designation.clone(),
            image: self.image.reference(),
        }
    }

    /// The caller-facing shape, image replaced by its retrieval reference
    pub fn to_view(&self) -> RecordView {
        self.summary().to_view()
    }
}

/// A listed record; carries where its image is but not the image itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub description: String,
    pub designation: Option<String>,
    pub image: ImageRef,
}

impl RecordSummary {
    pub fn to_view(&self) -> RecordView {
        RecordView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            designation: self.designation.clone(),
            image: self.image.retrieval_reference(self.kind, self.id),
        }
    }
}

/// Text fields of a create or update form; absent fields are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContentFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub designation: Option<String>,
}

/// Partial update applied by the store in a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub designation: Option<String>,
    /// Replaces the whole image when present; the old bytes are discarded
    pub image: Option<ImageUpload>,
}

/// JSON shape of a content record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub designation: Option<String>,
    pub image: String,
}
