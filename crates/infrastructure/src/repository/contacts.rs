use application::ContactRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Contact, ContactId, RepositoryError, UserEmail};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{invalid_data, map_sqlx_err};

#[derive(Debug, FromRow)]
struct ContactRecord {
    id: Uuid,
    name: String,
    email: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRecord> for Contact {
    type Error = RepositoryError;

    fn try_from(value: ContactRecord) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Contact {
            id: ContactId::from(value.id),
            name: value.name,
            email,
            message: value.message,
            read: value.read,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn create(&self, contact: Contact) -> Result<Contact, RepositoryError> {
        let record = sqlx::query_as::<_, ContactRecord>(
            r#"
            INSERT INTO contacts (id, name, email, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, message, read, created_at
            "#,
        )
        .bind(Uuid::from(contact.id))
        .bind(&contact.name)
        .bind(contact.email.as_str())
        .bind(&contact.message)
        .bind(contact.read)
        .bind(contact.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Contact::try_from(record)
    }

    async fn list(&self, unread_only: bool) -> Result<Vec<Contact>, RepositoryError> {
        let records = sqlx::query_as::<_, ContactRecord>(
            r#"
            SELECT id, name, email, message, read, created_at
            FROM contacts
            WHERE NOT $1 OR read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Contact::try_from).collect()
    }

    async fn mark_read(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let record = sqlx::query_as::<_, ContactRecord>(
            r#"
            UPDATE contacts SET read = TRUE
            WHERE id = $1
            RETURNING id, name, email, message, read, created_at
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Contact::try_from).transpose()
    }
}
