//! API models for request and response payloads

use serde::Serialize;

pub mod content;
pub mod lead;

/// Acknowledgement returned by write endpoints that have no record to echo
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Receipt {
    pub message: String,
}

impl Receipt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
