//! 社区平台核心领域模型
//!
//! 包含用户、会话、聊天消息、论坛帖子、学习进度等实体，以及它们自身的校验规则。

pub mod catalog;
pub mod chat_message;
pub mod contact;
pub mod conversation;
pub mod errors;
pub mod forum;
pub mod progress;
pub mod user;
pub mod value_objects;

pub use catalog::{Job, Project, JOB_STATUS_OPEN};
pub use chat_message::{ChatMessage, MessageContent, MAX_CHAT_MESSAGE_CHARS};
pub use contact::Contact;
pub use conversation::{Conversation, ConversationKind, Participant};
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use forum::{ForumContent, ForumPost, TopicStyle, MAX_FORUM_CONTENT_CHARS};
pub use progress::{week_start, Achievement, ChecklistItem, UserProgress, DEFAULT_CHECKLIST};
pub use user::{ProfileUpdate, User, UserProfile, UserRole};
pub use value_objects::{
    AchievementId, ChecklistItemId, ContactId, ConversationId, DisplayName, ForumPostId, JobId,
    MessageId, PasswordHash, ProjectId, Timestamp, UserEmail, UserId,
};
