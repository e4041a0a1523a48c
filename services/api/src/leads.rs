//! Lead capture: contact messages and newsletter signups

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        Receipt,
        lead::{Contact, ContactSubmission, Subscriber},
    },
    repositories::LeadStore,
    validation::{require, validate_email},
};

/// Append-only capture of leads
#[derive(Clone)]
pub struct LeadCapture {
    store: Arc<dyn LeadStore>,
}

impl LeadCapture {
    /// Create a new lead capture service
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Store a contact message; there is no uniqueness constraint
    pub async fn submit_contact(&self, submission: ContactSubmission) -> ApiResult<Receipt> {
        let full_name = require("fullName", submission.full_name.as_deref())?.to_string();
        let email = validate_email(submission.email.as_deref())?.to_string();
        let optional = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let contact = Contact {
            id: Uuid::new_v4(),
            full_name,
            email,
            mobile: optional(submission.mobile),
            city: optional(submission.city),
            date: Utc::now(),
        };

        self.store.insert_contact(&contact).await?;
        info!("Captured contact message {}", contact.id);

        Ok(Receipt::new("Contact saved successfully"))
    }

    /// Subscribe an email to the newsletter, refusing repeats
    ///
    /// Emails are compared case-insensitively.
    pub async fn subscribe(&self, email: Option<&str>) -> ApiResult<Receipt> {
        let email = validate_email(email)?.to_lowercase();

        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email,
            date: Utc::now(),
        };

        if !self.store.insert_subscriber(&subscriber).await? {
            return Err(ApiError::Duplicate);
        }
        info!("New newsletter subscriber {}", subscriber.id);

        Ok(Receipt::new("Subscribed successfully"))
    }

    /// All contact messages
    pub async fn list_contacts(&self) -> ApiResult<Vec<Contact>> {
        Ok(self.store.list_contacts().await?)
    }

    /// All newsletter subscriptions
    pub async fn list_subscribers(&self) -> ApiResult<Vec<Subscriber>> {
        Ok(self.store.list_subscribers().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repositories::MemoryLeadStore, validation::ValidationError};

    fn capture() -> LeadCapture {
        LeadCapture::new(Arc::new(MemoryLeadStore::new()))
    }

    #[tokio::test]
    async fn test_second_subscription_is_duplicate() {
        let leads = capture();

        assert!(leads.subscribe(Some("a@x.com")).await.is_ok());
        assert!(matches!(
            leads.subscribe(Some("a@x.com")).await,
            Err(ApiError::Duplicate)
        ));
        assert!(matches!(
            leads.subscribe(Some("A@X.com")).await,
            Err(ApiError::Duplicate)
        ));
        assert_eq!(leads.list_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_email() {
        let leads = capture();

        assert!(matches!(
            leads.subscribe(Some("nope")).await,
            Err(ApiError::Validation(ValidationError::InvalidFormat { field: "email" }))
        ));
        assert!(leads.list_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contacts_are_append_only() {
        let leads = capture();
        let submission = ContactSubmission {
            full_name: Some("Grace Hopper".to_string()),
            email: Some("grace@navy.mil".to_string()),
            mobile: Some("".to_string()),
            city: Some("Arlington".to_string()),
        };

        leads.submit_contact(submission.clone()).await.unwrap();
        leads.submit_contact(submission).await.unwrap();

        let contacts = leads.list_contacts().await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].mobile, None);
        assert_eq!(contacts[0].city.as_deref(), Some("Arlington"));
        assert_ne!(contacts[0].id, contacts[1].id);
    }

    #[tokio::test]
    async fn test_contact_requires_name() {
        let leads = capture();
        let submission = ContactSubmission {
            email: Some("grace@navy.mil".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            leads.submit_contact(submission).await,
            Err(ApiError::Validation(ValidationError::FieldMissing { field: "fullName" }))
        ));
    }
}
