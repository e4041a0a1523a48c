//! Upload transport: logs in as the admin and posts cropped images

use clap::ValueEnum;
use common::limits::MAX_IMAGE_BYTES;
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cropper::{Aspect, EncodedBlob};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File too large. Max size is 5MB.")]
    PayloadTooLarge,

    #[error("Request rejected with {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The kind of record an image is uploaded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Project,
    Client,
}

impl RecordKind {
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Project => "projects",
            RecordKind::Client => "clients",
        }
    }

    /// File name given to the image part
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Project => "project.jpg",
            RecordKind::Client => "client.jpg",
        }
    }

    /// Aspect ratio the site displays this kind at
    pub fn aspect(self) -> Aspect {
        match self {
            RecordKind::Project => Aspect::PROJECT,
            RecordKind::Client => Aspect::CLIENT,
        }
    }
}

/// Fields of a create or update form
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Existing record to update; a new record is created when unset
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub designation: Option<String>,
    pub image: Option<EncodedBlob>,
}

/// Record as echoed back by the API
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub image: String,
}

/// HTTP client holding the admin session cookie
pub struct Uploader {
    client: Client,
    auth_url: String,
    api_url: String,
}

impl Uploader {
    pub fn new(auth_url: impl Into<String>, api_url: impl Into<String>) -> Result<Self, UploadError> {
        let client = Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Log in; the session cookie is kept for later requests
    pub async fn login(&self, username: &str, password: &str) -> Result<(), UploadError> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.auth_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        check_status(response).await?;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Create or update a record
    ///
    /// Oversized images are refused before anything is sent.
    pub async fn upload(
        &self,
        kind: RecordKind,
        request: UploadRequest,
    ) -> Result<UploadedRecord, UploadError> {
        if let Some(image) = &request.image {
            if image.bytes.len() > MAX_IMAGE_BYTES {
                return Err(UploadError::PayloadTooLarge);
            }
        }

        let (url, existing) = self.endpoint(kind, request.id);
        let form = build_form(kind, request)?;
        let builder = if existing {
            self.client.put(&url)
        } else {
            self.client.post(&url)
        };

        debug!("Sending {} form to {}", kind.collection(), url);
        let response = check_status(builder.multipart(form).send().await?).await?;
        let record: UploadedRecord = response.json().await?;
        info!("Stored {} {}", kind.collection(), record.id);

        Ok(record)
    }

    /// Target URL and whether it addresses an existing record
    fn endpoint(&self, kind: RecordKind, id: Option<Uuid>) -> (String, bool) {
        match id {
            Some(id) => (format!("{}/api/{}/{}", self.api_url, kind.collection(), id), true),
            None => (format!("{}/api/{}", self.api_url, kind.collection()), false),
        }
    }
}

fn text_fields(kind: RecordKind, request: &UploadRequest) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(name) = &request.name {
        fields.push(("name", name.clone()));
    }
    if let Some(description) = &request.description {
        fields.push(("description", description.clone()));
    }
    if kind == RecordKind::Client {
        if let Some(designation) = &request.designation {
            fields.push(("designation", designation.clone()));
        }
    }
    fields
}

fn build_form(kind: RecordKind, request: UploadRequest) -> Result<Form, UploadError> {
    let mut form = Form::new();
    for (name, value) in text_fields(kind, &request) {
        form = form.text(name, value);
    }

    if let Some(image) = request.image {
        let part = Part::bytes(image.bytes)
            .file_name(kind.file_name())
            .mime_str(image.content_type)?;
        form = form.part("image", part);
    }

    Ok(form)
}

/// Turn a non-success response into [`UploadError::Rejected`] carrying the
/// API's `error` message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    Err(UploadError::Rejected { status, message })
}
