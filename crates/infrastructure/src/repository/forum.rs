use application::{ForumPostView, ForumRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ForumContent, ForumPost, ForumPostId, RepositoryError, TopicStyle, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{invalid_data, map_sqlx_err};

#[derive(Debug, FromRow)]
struct PostRecord {
    id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    content: String,
    topic_title: Option<String>,
    topic_color: Option<String>,
    topic_emoji: Option<String>,
    city: Option<String>,
    neighborhood: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRecord> for ForumPost {
    type Error = RepositoryError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let content =
            ForumContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;
        Ok(ForumPost {
            id: ForumPostId::from(value.id),
            author_id: UserId::from(value.author_id),
            parent_id: value.parent_id.map(ForumPostId::from),
            content,
            topic: TopicStyle {
                title: value.topic_title,
                color: value.topic_color,
                emoji: value.topic_emoji,
            },
            city: value.city,
            neighborhood: value.neighborhood,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PostViewRecord {
    #[sqlx(flatten)]
    post: PostRecord,
    author_name: String,
    author_avatar_url: Option<String>,
}

impl TryFrom<PostViewRecord> for ForumPostView {
    type Error = RepositoryError;

    fn try_from(value: PostViewRecord) -> Result<Self, Self::Error> {
        Ok(ForumPostView {
            post: ForumPost::try_from(value.post)?,
            author_name: value.author_name,
            author_avatar_url: value.author_avatar_url,
        })
    }
}

#[derive(Clone)]
pub struct PgForumRepository {
    pool: PgPool,
}

impl PgForumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForumRepository for PgForumRepository {
    async fn create(&self, post: ForumPost) -> Result<ForumPost, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO forum_posts (id, author_id, parent_id, content, topic_title, topic_color,
                                     topic_emoji, city, neighborhood, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, author_id, parent_id, content, topic_title, topic_color, topic_emoji,
                      city, neighborhood, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(Uuid::from(post.author_id))
        .bind(post.parent_id.map(Uuid::from))
        .bind(post.content.as_str())
        .bind(&post.topic.title)
        .bind(&post.topic.color)
        .bind(&post.topic.emoji)
        .bind(&post.city)
        .bind(&post.neighborhood)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        ForumPost::try_from(record)
    }

    async fn update(&self, post: ForumPost) -> Result<ForumPost, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            UPDATE forum_posts
            SET content = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, author_id, parent_id, content, topic_title, topic_color, topic_emoji,
                      city, neighborhood, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(post.content.as_str())
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        ForumPost::try_from(record)
    }

    async fn find_by_id(&self, id: ForumPostId) -> Result<Option<ForumPost>, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, author_id, parent_id, content, topic_title, topic_color, topic_emoji,
                   city, neighborhood, created_at, updated_at
            FROM forum_posts
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(ForumPost::try_from).transpose()
    }

    async fn delete_with_replies(&self, id: ForumPostId) -> Result<(), RepositoryError> {
        // 回复通过 parent_id 的级联删除一并清理
        sqlx::query("DELETE FROM forum_posts WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn list_topics(&self, limit: i64) -> Result<Vec<ForumPostView>, RepositoryError> {
        let records = sqlx::query_as::<_, PostViewRecord>(
            r#"
            SELECT f.id, f.author_id, f.parent_id, f.content, f.topic_title, f.topic_color,
                   f.topic_emoji, f.city, f.neighborhood, f.created_at, f.updated_at,
                   u.name AS author_name, u.avatar_url AS author_avatar_url
            FROM forum_posts f
            JOIN users u ON u.id = f.author_id
            WHERE f.parent_id IS NULL
            ORDER BY f.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ForumPostView::try_from).collect()
    }

    async fn list_replies(
        &self,
        parent: ForumPostId,
    ) -> Result<Vec<ForumPostView>, RepositoryError> {
        let records = sqlx::query_as::<_, PostViewRecord>(
            r#"
            SELECT f.id, f.author_id, f.parent_id, f.content, f.topic_title, f.topic_color,
                   f.topic_emoji, f.city, f.neighborhood, f.created_at, f.updated_at,
                   u.name AS author_name, u.avatar_url AS author_avatar_url
            FROM forum_posts f
            JOIN users u ON u.id = f.author_id
            WHERE f.parent_id = $1
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(Uuid::from(parent))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ForumPostView::try_from).collect()
    }
}
