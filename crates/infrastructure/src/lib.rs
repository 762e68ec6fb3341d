//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储、bcrypt 密码哈希、本地文件存储等适配器，实现应用层定义的接口。

pub mod builder;
pub mod migrations;
pub mod password;
pub mod repository;
pub mod storage;

pub use builder::{Infrastructure, InfrastructureError};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgCatalogRepository, PgChatMessageRepository, PgContactRepository,
    PgConversationRepository, PgForumRepository, PgProgressRepository, PgStorage,
    PgUserRepository,
};
pub use storage::LocalAvatarStorage;
