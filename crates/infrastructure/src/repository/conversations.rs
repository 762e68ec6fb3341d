use application::{ConversationRepository, ParticipantView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Conversation, ConversationId, ConversationKind, DomainError, Participant, RepositoryError,
    Timestamp, UserId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{invalid_data, map_sqlx_err};

#[derive(Debug, FromRow)]
struct ConversationRecord {
    id: Uuid,
    kind: String,
    name: Option<String>,
    avatar_url: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = RepositoryError;

    fn try_from(value: ConversationRecord) -> Result<Self, Self::Error> {
        let kind: ConversationKind = value
            .kind
            .parse()
            .map_err(|err: DomainError| invalid_data(err.to_string()))?;
        Ok(Conversation {
            id: ConversationId::from(value.id),
            kind,
            name: value.name,
            avatar_url: value.avatar_url,
            created_by: UserId::from(value.created_by),
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    conversation_id: Uuid,
    user_id: Uuid,
    name: String,
    avatar_url: Option<String>,
    joined_at: DateTime<Utc>,
}

impl From<ParticipantRecord> for ParticipantView {
    fn from(value: ParticipantRecord) -> Self {
        ParticipantView {
            conversation_id: ConversationId::from(value.conversation_id),
            user_id: UserId::from(value.user_id),
            name: value.name,
            avatar_url: value.avatar_url,
            joined_at: value.joined_at,
        }
    }
}

/// 私聊去重键：两个用户 id 排序后拼接
fn direct_key(a: UserId, b: UserId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}:{high}")
}

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn create(
        &self,
        conversation: Conversation,
        participants: Vec<Participant>,
    ) -> Result<Conversation, RepositoryError> {
        let key = match (conversation.kind, participants.as_slice()) {
            (ConversationKind::Direct, [first, second]) => {
                Some(direct_key(first.user_id, second.user_id))
            }
            _ => None,
        };

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            INSERT INTO conversations (id, kind, name, avatar_url, created_by, direct_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, kind, name, avatar_url, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(conversation.id))
        .bind(conversation.kind.as_str())
        .bind(&conversation.name)
        .bind(&conversation.avatar_url)
        .bind(Uuid::from(conversation.created_by))
        .bind(key)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        for participant in &participants {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::from(participant.conversation_id))
            .bind(Uuid::from(participant.user_id))
            .bind(participant.joined_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Conversation::try_from(record)
    }

    async fn update(&self, conversation: Conversation) -> Result<Conversation, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            UPDATE conversations
            SET name = $2, avatar_url = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, kind, name, avatar_url, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(conversation.id))
        .bind(&conversation.name)
        .bind(&conversation.avatar_url)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Conversation::try_from(record)
    }

    async fn touch(&self, id: ConversationId, at: Timestamp) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, kind, name, avatar_url, created_by, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Conversation::try_from).transpose()
    }

    async fn find_direct_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, kind, name, avatar_url, created_by, created_at, updated_at
            FROM conversations
            WHERE direct_key = $1
            "#,
        )
        .bind(direct_key(a, b))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Conversation::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let records = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT c.id, c.kind, c.name, c.avatar_url, c.created_by, c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = $1
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Conversation::try_from).collect()
    }

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM conversation_participants
                WHERE conversation_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(Uuid::from(conversation_id))
        .bind(Uuid::from(user_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn add_participant(&self, participant: Participant) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::from(participant.conversation_id))
        .bind(Uuid::from(participant.user_id))
        .bind(participant.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(conversation_id))
        .bind(Uuid::from(user_id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ParticipantView>, RepositoryError> {
        let ids: Vec<Uuid> = conversation_ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            SELECT p.conversation_id, p.user_id, u.name, u.avatar_url, p.joined_at
            FROM conversation_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.conversation_id = ANY($1)
            ORDER BY p.joined_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(ParticipantView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_key_is_order_independent() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_eq!(direct_key(a, b), direct_key(b, a));
        assert_ne!(direct_key(a, b), direct_key(a, UserId::generate()));
    }
}
