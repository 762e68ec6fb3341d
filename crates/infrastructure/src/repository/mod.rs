//! PostgreSQL 仓储实现

mod catalog;
mod contacts;
mod conversations;
mod forum;
mod messages;
mod progress;
mod users;

use std::sync::Arc;

use domain::RepositoryError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub use catalog::PgCatalogRepository;
pub use contacts::PgContactRepository;
pub use conversations::PgConversationRepository;
pub use forum::PgForumRepository;
pub use messages::PgChatMessageRepository;
pub use progress::PgProgressRepository;
pub use users::PgUserRepository;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

/// 同一个连接池上的全部仓储
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub conversation_repository: Arc<PgConversationRepository>,
    pub message_repository: Arc<PgChatMessageRepository>,
    pub forum_repository: Arc<PgForumRepository>,
    pub progress_repository: Arc<PgProgressRepository>,
    pub contact_repository: Arc<PgContactRepository>,
    pub catalog_repository: Arc<PgCatalogRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            conversation_repository: Arc::new(PgConversationRepository::new(pool.clone())),
            message_repository: Arc::new(PgChatMessageRepository::new(pool.clone())),
            forum_repository: Arc::new(PgForumRepository::new(pool.clone())),
            progress_repository: Arc::new(PgProgressRepository::new(pool.clone())),
            contact_repository: Arc::new(PgContactRepository::new(pool.clone())),
            catalog_repository: Arc::new(PgCatalogRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
