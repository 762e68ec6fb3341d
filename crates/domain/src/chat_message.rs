use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ConversationId, MessageId, Timestamp, UserId};

/// 聊天消息的最大字符数，超出部分截断而不是拒绝。
pub const MAX_CHAT_MESSAGE_CHARS: usize = 4000;

/// 去除首尾空白后的非空消息内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument("content", "message cannot be empty"));
        }
        let content = match trimmed.char_indices().nth(MAX_CHAT_MESSAGE_CHARS) {
            Some((cut, _)) => trimmed[..cut].to_owned(),
            None => trimmed.to_owned(),
        };
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 已持久化的聊天消息，创建后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            content,
            created_at,
        }
    }

    /// 会话列表里展示的最后一条消息摘要。
    pub fn preview(&self, max_chars: usize) -> String {
        let text = self.content.as_str();
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}…", &text[..cut]),
            None => text.to_owned(),
        }
    }
}
