//! PostgreSQL lead repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row};
use tracing::info;

use super::LeadStore;
use crate::models::lead::{Contact, Subscriber};

/// Lead repository backed by the `contacts` and `subscribers` tables
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    /// Create a new lead repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet
    pub async fn init_schema(&self) -> DatabaseResult<()> {
        for statement in [
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id UUID PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL,
                mobile TEXT,
                city TEXT,
                date TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                date TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }

        info!("contacts and subscribers schema ready");
        Ok(())
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert_contact(&self, contact: &Contact) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, full_name, email, mobile, city, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(contact.id)
        .bind(&contact.full_name)
        .bind(&contact.email)
        .bind(&contact.mobile)
        .bind(&contact.city)
        .bind(contact.date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_contacts(&self) -> DatabaseResult<Vec<Contact>> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, email, mobile, city, date
            FROM contacts
            ORDER BY date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DatabaseResult<Contact> {
                Ok(Contact {
                    id: row.try_get("id")?,
                    full_name: row.try_get("full_name")?,
                    email: row.try_get("email")?,
                    mobile: row.try_get("mobile")?,
                    city: row.try_get("city")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    async fn insert_subscriber(&self, subscriber: &Subscriber) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscribers (id, email, date)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(subscriber.id)
        .bind(&subscriber.email)
        .bind(subscriber.date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_subscribers(&self) -> DatabaseResult<Vec<Subscriber>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, date
            FROM subscribers
            ORDER BY date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DatabaseResult<Subscriber> {
                Ok(Subscriber {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }
}
