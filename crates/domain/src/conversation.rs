use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ConversationId, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationKind {
    Direct,
    Group,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::Group => "GROUP",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DIRECT" => Ok(Self::Direct),
            "GROUP" => Ok(Self::Group),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown conversation type {other}"),
            )),
        }
    }
}

/// 私聊或群组会话。
///
/// 私聊没有名称且恰好两名参与者；群组的创建者在创建后不可变更，
/// 只有创建者可以改名、换头像、拉人或移除他人。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn direct(id: ConversationId, created_by: UserId, now: Timestamp) -> Self {
        Self {
            id,
            kind: ConversationKind::Direct,
            name: None,
            avatar_url: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn group(
        id: ConversationId,
        name: impl Into<String>,
        avatar_url: Option<String>,
        created_by: UserId,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name", "group name is required"));
        }
        Ok(Self {
            id,
            kind: ConversationKind::Group,
            name: Some(name),
            avatar_url: avatar_url.and_then(non_blank),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }

    pub fn ensure_group(&self) -> DomainResult<()> {
        if self.is_group() {
            Ok(())
        } else {
            Err(DomainError::NotGroupConversation)
        }
    }

    /// 群组写操作的统一前置检查。
    pub fn ensure_creator(&self, actor: UserId, action: &str) -> DomainResult<()> {
        self.ensure_group()?;
        if self.created_by == actor {
            Ok(())
        } else {
            Err(DomainError::not_group_creator(action))
        }
    }

    /// 任何参与者都可以退出群组；移除他人需要创建者身份。
    pub fn authorize_removal(&self, actor: UserId, target: UserId) -> DomainResult<()> {
        self.ensure_group()?;
        if actor == target || actor == self.created_by {
            Ok(())
        } else {
            Err(DomainError::not_group_creator("remove other participants"))
        }
    }

    /// 空白名称保持原值，空白头像地址清空头像。
    pub fn update_details(
        &mut self,
        name: Option<String>,
        avatar_url: Option<String>,
        now: Timestamp,
    ) {
        if let Some(name) = name.and_then(non_blank) {
            self.name = Some(name);
        }
        if let Some(avatar_url) = avatar_url {
            self.avatar_url = non_blank(avatar_url);
        }
        self.updated_at = now;
    }

    pub fn set_avatar(&mut self, url: String, now: Timestamp) {
        self.avatar_url = Some(url);
        self.updated_at = now;
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(conversation_id: ConversationId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            conversation_id,
            user_id,
            joined_at,
        }
    }
}
