use application::ProgressRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    Achievement, AchievementId, ChecklistItem, ChecklistItemId, RepositoryError, UserId,
    UserProgress,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_sqlx_err;

#[derive(Debug, FromRow)]
struct ProgressRecord {
    user_id: Uuid,
    percent: i32,
    phase: String,
    next_goal: String,
    level: i32,
    xp: i32,
    streak_days: i32,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRecord> for UserProgress {
    fn from(value: ProgressRecord) -> Self {
        UserProgress {
            user_id: UserId::from(value.user_id),
            percent: value.percent,
            phase: value.phase,
            next_goal: value.next_goal,
            level: value.level,
            xp: value.xp,
            streak_days: value.streak_days,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ChecklistRecord {
    id: Uuid,
    user_id: Uuid,
    label: String,
    done: bool,
    week_start: NaiveDate,
}

impl From<ChecklistRecord> for ChecklistItem {
    fn from(value: ChecklistRecord) -> Self {
        ChecklistItem {
            id: ChecklistItemId::from(value.id),
            user_id: UserId::from(value.user_id),
            label: value.label,
            done: value.done,
            week_start: value.week_start,
        }
    }
}

#[derive(Debug, FromRow)]
struct AchievementRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    earned_at: DateTime<Utc>,
}

impl From<AchievementRecord> for Achievement {
    fn from(value: AchievementRecord) -> Self {
        Achievement {
            id: AchievementId::from(value.id),
            user_id: UserId::from(value.user_id),
            title: value.title,
            earned_at: value.earned_at,
        }
    }
}

#[derive(Clone)]
pub struct PgProgressRepository {
    pool: PgPool,
}

impl PgProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRepository for PgProgressRepository {
    async fn find_progress(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProgress>, RepositoryError> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            r#"
            SELECT user_id, percent, phase, next_goal, level, xp, streak_days, updated_at
            FROM user_progress
            WHERE user_id = $1
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(UserProgress::from))
    }

    async fn create_progress(
        &self,
        progress: UserProgress,
    ) -> Result<UserProgress, RepositoryError> {
        // 并发首次访问时保留先写入的一条
        sqlx::query(
            r#"
            INSERT INTO user_progress (user_id, percent, phase, next_goal, level, xp, streak_days, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::from(progress.user_id))
        .bind(progress.percent)
        .bind(&progress.phase)
        .bind(&progress.next_goal)
        .bind(progress.level)
        .bind(progress.xp)
        .bind(progress.streak_days)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        self.find_progress(progress.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn checklist_for_week(
        &self,
        user_id: UserId,
        week_start: NaiveDate,
    ) -> Result<Vec<ChecklistItem>, RepositoryError> {
        let records = sqlx::query_as::<_, ChecklistRecord>(
            r#"
            SELECT id, user_id, label, done, week_start
            FROM checklist_items
            WHERE user_id = $1 AND week_start = $2
            ORDER BY seq ASC
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(week_start)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(ChecklistItem::from).collect())
    }

    async fn save_checklist(
        &self,
        items: Vec<ChecklistItem>,
    ) -> Result<Vec<ChecklistItem>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO checklist_items (id, user_id, label, done, week_start)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::from(item.id))
            .bind(Uuid::from(item.user_id))
            .bind(&item.label)
            .bind(item.done)
            .bind(item.week_start)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(items)
    }

    async fn achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, RepositoryError> {
        let records = sqlx::query_as::<_, AchievementRecord>(
            r#"
            SELECT id, user_id, title, earned_at
            FROM achievements
            WHERE user_id = $1
            ORDER BY earned_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Achievement::from).collect())
    }
}
