//! Input validation for content and lead forms

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::content::{ContentFields, ResourceKind};

/// Minimum description length for projects and client testimonials
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// A form field that failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    FieldMissing { field: &'static str },

    #[error("{field} must be at least {min} characters long")]
    FieldTooShort { field: &'static str, min: usize },

    #[error("{field} is not valid")]
    InvalidFormat { field: &'static str },
}

/// Validate the fields of a record about to be created
pub fn validate_new_record(kind: ResourceKind, fields: &ContentFields) -> Result<(), ValidationError> {
    require("name", fields.name.as_deref())?;
    let description = require("description", fields.description.as_deref())?;
    check_description(description)?;

    if kind.has_designation() {
        require("designation", fields.designation.as_deref())?;
    }

    Ok(())
}

/// Validate the fields present in a partial update
///
/// Absent fields keep their stored value and are not checked.
pub fn validate_record_patch(kind: ResourceKind, fields: &ContentFields) -> Result<(), ValidationError> {
    if let Some(name) = fields.name.as_deref() {
        require("name", Some(name))?;
    }

    if let Some(description) = fields.description.as_deref() {
        check_description(description)?;
    }

    if kind.has_designation() {
        if let Some(designation) = fields.designation.as_deref() {
            require("designation", Some(designation))?;
        }
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: Option<&str>) -> Result<&str, ValidationError> {
    let email = require("email", email)?;

    if email.len() > 254 {
        return Err(ValidationError::InvalidFormat { field: "email" });
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::InvalidFormat { field: "email" });
    }

    Ok(email)
}

/// Require a non-blank value and return it trimmed
pub fn require<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::FieldMissing { field })
}

fn check_description(description: &str) -> Result<(), ValidationError> {
    let description = require("description", Some(description))?;

    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::FieldTooShort {
            field: "description",
            min: MIN_DESCRIPTION_CHARS,
        });
    }

    Ok(())
}
