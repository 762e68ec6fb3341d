//! 对外输出的数据结构，字段统一使用 camelCase。

use chrono::NaiveDate;
use domain::{
    Contact, ConversationKind, Job, Project, Timestamp, User, UserProgress, UserRole,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{ChatMessageView, ForumPostView, ParticipantView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub message: String,
}

/// 当前用户的完整资料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub created_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            avatar_url: user.avatar_url.clone(),
            phone: user.profile.phone.clone(),
            birth_date: user.profile.birth_date,
            address: user.profile.address.clone(),
            city: user.profile.city.clone(),
            state: user.profile.state.clone(),
            zip_code: user.profile.zip_code.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummaryDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name.as_str().to_owned(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// 其他用户可见的公开资料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileDto {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub role: UserRole,
    pub last_seen_at: Timestamp,
}

impl From<&User> for PublicProfileDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name.as_str().to_owned(),
            avatar_url: user.avatar_url.clone(),
            city: user.profile.city.clone(),
            state: user.profile.state.clone(),
            role: user.role,
            last_seen_at: user.updated_at,
        }
    }
}

/// 推送给订阅者、也用于消息列表的消息结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
    pub created_at: Timestamp,
}

impl From<ChatMessageView> for ChatMessageDto {
    fn from(view: ChatMessageView) -> Self {
        Self {
            id: view.message.id.into(),
            conversation_id: view.message.conversation_id.into(),
            content: view.message.content.into_inner(),
            sender_id: view.message.sender_id.into(),
            sender_name: view.sender_name,
            sender_avatar_url: view.sender_avatar_url,
            created_at: view.message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub joined_at: Timestamp,
}

impl From<ParticipantView> for ParticipantDto {
    fn from(view: ParticipantView) -> Self {
        Self {
            user_id: view.user_id.into(),
            name: view.name,
            avatar_url: view.avatar_url,
            joined_at: view.joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageDto {
    pub preview: String,
    pub sender_id: Uuid,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub participants: Vec<ParticipantDto>,
    pub last_message: Option<LastMessageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedConversationDto {
    pub conversation: ConversationDto,
    pub already_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPostDto {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub author: String,
    pub author_avatar_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub topic_title: Option<String>,
    pub topic_color: Option<String>,
    pub topic_emoji: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ForumPostView> for ForumPostDto {
    fn from(view: ForumPostView) -> Self {
        let post = view.post;
        Self {
            id: post.id.into(),
            content: post.content.as_str().to_owned(),
            author_id: post.author_id.into(),
            author: view.author_name,
            author_avatar_url: view.author_avatar_url,
            parent_id: post.parent_id.map(Uuid::from),
            topic_title: post.topic.title,
            topic_color: post.topic.color,
            topic_emoji: post.topic.emoji,
            city: post.city,
            neighborhood: post.neighborhood,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDto {
    pub percent: i32,
    pub phase: String,
    pub next_goal: String,
    pub level: i32,
    pub xp: i32,
    pub streak_days: i32,
}

impl From<&UserProgress> for ProgressDto {
    fn from(progress: &UserProgress) -> Self {
        Self {
            percent: progress.percent,
            phase: progress.phase.clone(),
            next_goal: progress.next_goal.clone(),
            level: progress.level,
            xp: progress.xp,
            streak_days: progress.streak_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemDto {
    pub label: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextActionDto {
    pub title: String,
    pub description: String,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipStatusDto {
    pub next_session: String,
    pub total_sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentProjectDto {
    pub current: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDto {
    pub unread_messages: u32,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDto {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryDto {
    pub user: UserDto,
    pub progress: ProgressDto,
    pub next_action: NextActionDto,
    pub weekly_checklist: Vec<ChecklistItemDto>,
    pub mentorship: MentorshipStatusDto,
    pub projects: CurrentProjectDto,
    pub community: CommunityDto,
    pub opportunities: Vec<OpportunityDto>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl From<Contact> for ContactDto {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id.into(),
            name: contact.name,
            email: contact.email.as_str().to_owned(),
            message: contact.message,
            read: contact.read,
            created_at: contact.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub created_at: Timestamp,
}

impl From<Job> for JobDto {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.into(),
            title: job.title,
            description: job.description.unwrap_or_default(),
            kind: job.kind,
            status: job.status,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: Timestamp,
}

impl From<Project> for ProjectDto {
    fn from(project: Project) -> Self {
        Self {
            id: project.id.into(),
            title: project.title,
            description: project.description.unwrap_or_default(),
            status: project.status,
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipDto {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub level: String,
    pub price: String,
    pub spots: u32,
}
