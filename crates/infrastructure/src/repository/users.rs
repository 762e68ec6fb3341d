use application::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    DisplayName, PasswordHash, RepositoryError, User, UserEmail, UserId, UserProfile, UserRole,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{invalid_data, map_sqlx_err};

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    avatar_url: Option<String>,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let name = DisplayName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;
        let role: UserRole = value
            .role
            .parse()
            .map_err(|err: domain::DomainError| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            email,
            name,
            password,
            role,
            avatar_url: value.avatar_url,
            profile: UserProfile {
                phone: value.phone,
                birth_date: value.birth_date,
                address: value.address,
                city: value.city,
                state: value.state,
                zip_code: value.zip_code,
            },
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, avatar_url, phone, birth_date,
                               address, city, state, zip_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, email, name, password_hash, role, avatar_url, phone, birth_date,
                      address, city, state, zip_code, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.name.as_str())
        .bind(user.password.as_str())
        .bind(user.role.as_str())
        .bind(&user.avatar_url)
        .bind(&user.profile.phone)
        .bind(user.profile.birth_date)
        .bind(&user.profile.address)
        .bind(&user.profile.city)
        .bind(&user.profile.state)
        .bind(&user.profile.zip_code)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET name = $2, role = $3, avatar_url = $4, phone = $5, birth_date = $6,
                address = $7, city = $8, state = $9, zip_code = $10, updated_at = $11
            WHERE id = $1
            RETURNING id, email, name, password_hash, role, avatar_url, phone, birth_date,
                      address, city, state, zip_code, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.name.as_str())
        .bind(user.role.as_str())
        .bind(&user.avatar_url)
        .bind(&user.profile.phone)
        .bind(user.profile.birth_date)
        .bind(&user.profile.address)
        .bind(&user.profile.city)
        .bind(&user.profile.state)
        .bind(&user.profile.zip_code)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, role, avatar_url, phone, birth_date,
                   address, city, state, zip_code, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, role, avatar_url, phone, birth_date,
                   address, city, state, zip_code, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, role, avatar_url, phone, birth_date,
                   address, city, state, zip_code, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn list_except(&self, id: UserId) -> Result<Vec<User>, RepositoryError> {
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, role, avatar_url, phone, birth_date,
                   address, city, state, zip_code, created_at, updated_at
            FROM users
            WHERE id <> $1
            ORDER BY name ASC
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}
