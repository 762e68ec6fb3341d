use sqlx::migrate::Migrator;

/// 仓库根目录下 `migrations/` 中的数据库迁移
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
