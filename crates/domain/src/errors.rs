//! 领域模型错误定义
//!
//! 领域错误描述业务规则被违反的情形；仓储错误描述持久化层的失败。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 字段校验失败
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("email already registered")]
    DuplicateEmail,

    /// 登录失败时不区分用户不存在和密码错误
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("participant not found")]
    ParticipantNotFound,

    #[error("operation only allowed on group conversations")]
    NotGroupConversation,

    /// 群组写操作只允许创建者执行
    #[error("only the group creator can {action}")]
    NotGroupCreator { action: String },

    #[error("forum post not found")]
    ForumPostNotFound,

    #[error("only the author can {action} this post")]
    NotPostAuthor { action: String },

    #[error("contact not found")]
    ContactNotFound,
}

impl DomainError {
    /// 创建字段校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_group_creator(action: impl Into<String>) -> Self {
        Self::NotGroupCreator {
            action: action.into(),
        }
    }

    pub fn not_post_author(action: impl Into<String>) -> Self {
        Self::NotPostAuthor {
            action: action.into(),
        }
    }

    /// 是否属于权限类错误
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotGroupCreator { .. } | Self::NotPostAuthor { .. }
        )
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突，例如重复的邮箱
    #[error("unique constraint violated")]
    Conflict,

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
