//! 仓储端口
//!
//! 读取接口显式返回联表后的视图（消息附带发送者、参与者附带用户资料），
//! 避免在服务层按行懒加载关联数据。

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{
    Achievement, ChatMessage, ChecklistItem, Contact, ContactId, Conversation, ConversationId,
    ForumPost, ForumPostId, Job, Participant, Project, RepositoryError, Timestamp, User,
    UserEmail, UserId, UserProgress,
};

/// 参与者及其公开资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub joined_at: Timestamp,
}

/// 消息及其发送者资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageView {
    pub message: ChatMessage,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
}

/// 帖子及其作者资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumPostView {
    pub post: ForumPost,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱重复时返回 [`RepositoryError::Conflict`]
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError>;
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;
    /// 除指定用户外的所有用户，按名称排序
    async fn list_except(&self, id: UserId) -> Result<Vec<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 会话与初始参与者在同一事务中写入
    async fn create(
        &self,
        conversation: Conversation,
        participants: Vec<Participant>,
    ) -> Result<Conversation, RepositoryError>;
    async fn update(&self, conversation: Conversation) -> Result<Conversation, RepositoryError>;
    async fn touch(&self, id: ConversationId, at: Timestamp) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: ConversationId)
        -> Result<Option<Conversation>, RepositoryError>;
    /// 两人之间的私聊（与参数顺序无关）
    async fn find_direct_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;
    /// 用户参与的会话，最近活跃的在前
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, RepositoryError>;
    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError>;
    /// 已存在时不做任何修改
    async fn add_participant(&self, participant: Participant) -> Result<(), RepositoryError>;
    /// 返回是否确实删除了一条记录
    async fn remove_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError>;
    async fn list_participants(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ParticipantView>, RepositoryError>;
}

#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError>;
    /// 按创建时间升序，时间相同按插入顺序
    async fn list_with_senders(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessageView>, RepositoryError>;
    /// 每个会话的最后一条消息
    async fn latest_for(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}

#[async_trait]
pub trait ForumRepository: Send + Sync {
    async fn create(&self, post: ForumPost) -> Result<ForumPost, RepositoryError>;
    async fn update(&self, post: ForumPost) -> Result<ForumPost, RepositoryError>;
    async fn find_by_id(&self, id: ForumPostId) -> Result<Option<ForumPost>, RepositoryError>;
    /// 删除帖子及其全部回复
    async fn delete_with_replies(&self, id: ForumPostId) -> Result<(), RepositoryError>;
    /// 最新的主题帖
    async fn list_topics(&self, limit: i64) -> Result<Vec<ForumPostView>, RepositoryError>;
    /// 主题下的回复，最早的在前
    async fn list_replies(&self, parent: ForumPostId)
        -> Result<Vec<ForumPostView>, RepositoryError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find_progress(&self, user_id: UserId)
        -> Result<Option<UserProgress>, RepositoryError>;
    /// 已存在时返回已有记录
    async fn create_progress(
        &self,
        progress: UserProgress,
    ) -> Result<UserProgress, RepositoryError>;
    async fn checklist_for_week(
        &self,
        user_id: UserId,
        week_start: NaiveDate,
    ) -> Result<Vec<ChecklistItem>, RepositoryError>;
    async fn save_checklist(
        &self,
        items: Vec<ChecklistItem>,
    ) -> Result<Vec<ChecklistItem>, RepositoryError>;
    /// 按获得时间倒序
    async fn achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, RepositoryError>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, contact: Contact) -> Result<Contact, RepositoryError>;
    async fn list(&self, unread_only: bool) -> Result<Vec<Contact>, RepositoryError>;
    async fn mark_read(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn jobs_with_status(&self, status: &str) -> Result<Vec<Job>, RepositoryError>;
    async fn projects_for(&self, owner_id: UserId) -> Result<Vec<Project>, RepositoryError>;
}
