use application::{ChatMessageRepository, ChatMessageView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    ChatMessage, ConversationId, MessageContent, MessageId, RepositoryError, UserId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{invalid_data, map_sqlx_err};

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;
        Ok(ChatMessage::new(
            MessageId::from(value.id),
            ConversationId::from(value.conversation_id),
            UserId::from(value.sender_id),
            content,
            value.created_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct MessageViewRecord {
    #[sqlx(flatten)]
    message: MessageRecord,
    sender_name: String,
    sender_avatar_url: Option<String>,
}

impl TryFrom<MessageViewRecord> for ChatMessageView {
    type Error = RepositoryError;

    fn try_from(value: MessageViewRecord) -> Result<Self, Self::Error> {
        Ok(ChatMessageView {
            message: ChatMessage::try_from(value.message)?,
            sender_name: value.sender_name,
            sender_avatar_url: value.sender_avatar_url,
        })
    }
}

#[derive(Clone)]
pub struct PgChatMessageRepository {
    pool: PgPool,
}

impl PgChatMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO chat_messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.conversation_id))
        .bind(Uuid::from(message.sender_id))
        .bind(message.content.as_str())
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        ChatMessage::try_from(record)
    }

    async fn list_with_senders(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessageView>, RepositoryError> {
        // seq 保证同一时间戳的消息按写入顺序返回
        let records = sqlx::query_as::<_, MessageViewRecord>(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.created_at,
                   u.name AS sender_name, u.avatar_url AS sender_avatar_url
            FROM chat_messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id = $1
            ORDER BY m.created_at ASC, m.seq ASC
            "#,
        )
        .bind(Uuid::from(conversation_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ChatMessageView::try_from).collect()
    }

    async fn latest_for(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let ids: Vec<Uuid> = conversation_ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT DISTINCT ON (conversation_id)
                   id, conversation_id, sender_id, content, created_at
            FROM chat_messages
            WHERE conversation_id = ANY($1)
            ORDER BY conversation_id, created_at DESC, seq DESC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ChatMessage::try_from).collect()
    }
}
