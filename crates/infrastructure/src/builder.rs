use std::sync::Arc;

use application::{StorageError, TopicRegistry};
use config::AppConfig;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
    storage::LocalAvatarStorage,
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("upload storage error: {0}")]
    Storage(#[from] StorageError),
}

/// 启动时一次性建立的外部资源
#[derive(Clone)]
pub struct Infrastructure {
    pub storage: PgStorage,
    pub password_hasher: Arc<BcryptPasswordHasher>,
    pub broadcaster: Arc<TopicRegistry>,
    pub avatar_storage: Arc<LocalAvatarStorage>,
}

impl Infrastructure {
    /// 连接数据库、执行迁移并准备上传目录
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!("database migrations applied");

        let avatar_storage = LocalAvatarStorage::new(&config.uploads.dir).await?;

        Ok(Self {
            storage: PgStorage::new(pool),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost)),
            broadcaster: Arc::new(TopicRegistry::new(config.broadcast.subscriber_capacity)),
            avatar_storage: Arc::new(avatar_storage),
        })
    }
}
