//! Lead models: contact messages and newsletter subscriptions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact form submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
}

/// Stored contact message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub date: DateTime<Utc>,
}

/// Newsletter signup request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

/// Stored newsletter subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub date: DateTime<Utc>,
}
