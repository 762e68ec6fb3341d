//! 内存实现的仓储与文件存储，供本地开发和测试使用。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{
    Achievement, ChatMessage, ChecklistItem, Contact, ContactId, Conversation, ConversationId,
    ConversationKind, ForumPost, ForumPostId, Job, Participant, Project, RepositoryError,
    Timestamp, User, UserEmail, UserId, UserProgress,
};
use tokio::sync::RwLock;

use crate::{
    repository::{
        CatalogRepository, ChatMessageRepository, ChatMessageView, ContactRepository,
        ConversationRepository, ForumPostView, ForumRepository, ParticipantView,
        ProgressRepository, UserRepository,
    },
    storage::{AvatarStorage, StorageError},
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    conversations: HashMap<ConversationId, Conversation>,
    participants: Vec<Participant>,
    messages: Vec<ChatMessage>,
    forum_posts: Vec<ForumPost>,
    progress: HashMap<UserId, UserProgress>,
    checklist: Vec<ChecklistItem>,
    achievements: Vec<Achievement>,
    contacts: Vec<Contact>,
    jobs: Vec<Job>,
    projects: Vec<Project>,
}

impl State {
    fn members_of(&self, conversation_id: ConversationId) -> impl Iterator<Item = UserId> + '_ {
        self.participants
            .iter()
            .filter(move |p| p.conversation_id == conversation_id)
            .map(|p| p.user_id)
    }

    fn post_view(&self, post: &ForumPost) -> Option<ForumPostView> {
        let author = self.users.get(&post.author_id)?;
        Some(ForumPostView {
            post: post.clone(),
            author_name: author.name.as_str().to_owned(),
            author_avatar_url: author.avatar_url.clone(),
        })
    }
}

/// 所有仓储接口共享同一份内存状态，联表查询因此可以直接完成
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_job(&self, job: Job) {
        self.state.write().await.jobs.push(job);
    }

    pub async fn seed_project(&self, project: Project) {
        self.state.write().await.projects.push(project);
    }

    pub async fn seed_achievement(&self, achievement: Achievement) {
        self.state.write().await.achievements.push(achievement);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        let duplicate = state.users.contains_key(&user.id)
            || state.users.values().any(|u| u.email == user.email);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn list_except(&self, id: UserId) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(users)
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn create(
        &self,
        conversation: Conversation,
        participants: Vec<Participant>,
    ) -> Result<Conversation, RepositoryError> {
        let mut state = self.state.write().await;
        if state.conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::Conflict);
        }
        state.conversations.insert(conversation.id, conversation.clone());
        state.participants.extend(participants);
        Ok(conversation)
    }

    async fn update(&self, conversation: Conversation) -> Result<Conversation, RepositoryError> {
        let mut state = self.state.write().await;
        match state.conversations.get_mut(&conversation.id) {
            Some(stored) => {
                *stored = conversation.clone();
                Ok(conversation)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn touch(&self, id: ConversationId, at: Timestamp) -> Result<(), RepositoryError> {
        if let Some(conversation) = self.state.write().await.conversations.get_mut(&id) {
            conversation.updated_at = at;
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn find_direct_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.read().await;
        let pair: HashSet<UserId> = [a, b].into_iter().collect();
        Ok(state
            .conversations
            .values()
            .filter(|c| c.kind == ConversationKind::Direct)
            .find(|c| state.members_of(c.id).collect::<HashSet<_>>() == pair)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .participants
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| state.conversations.get(&p.conversation_id).cloned())
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;
        let is_member = state.members_of(conversation_id).any(|id| id == user_id);
        Ok(is_member)
    }

    async fn add_participant(&self, participant: Participant) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let exists = state
            .members_of(participant.conversation_id)
            .any(|id| id == participant.user_id);
        if !exists {
            state.participants.push(participant);
        }
        Ok(())
    }

    async fn remove_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.participants.len();
        state
            .participants
            .retain(|p| !(p.conversation_id == conversation_id && p.user_id == user_id));
        Ok(state.participants.len() < before)
    }

    async fn list_participants(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ParticipantView>, RepositoryError> {
        let state = self.state.read().await;
        let mut views: Vec<ParticipantView> = state
            .participants
            .iter()
            .filter(|p| conversation_ids.contains(&p.conversation_id))
            .filter_map(|p| {
                let user = state.users.get(&p.user_id)?;
                Some(ParticipantView {
                    conversation_id: p.conversation_id,
                    user_id: p.user_id,
                    name: user.name.as_str().to_owned(),
                    avatar_url: user.avatar_url.clone(),
                    joined_at: p.joined_at,
                })
            })
            .collect();
        views.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(views)
    }
}

#[async_trait]
impl ChatMessageRepository for MemoryStore {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError> {
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn list_with_senders(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatMessageView>, RepositoryError> {
        let state = self.state.read().await;
        let mut views: Vec<ChatMessageView> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .filter_map(|m| {
                let sender = state.users.get(&m.sender_id)?;
                Some(ChatMessageView {
                    message: m.clone(),
                    sender_name: sender.name.as_str().to_owned(),
                    sender_avatar_url: sender.avatar_url.clone(),
                })
            })
            .collect();
        // 稳定排序，时间相同保持插入顺序
        views.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        Ok(views)
    }

    async fn latest_for(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let state = self.state.read().await;
        let mut latest: HashMap<ConversationId, &ChatMessage> = HashMap::new();
        for message in state
            .messages
            .iter()
            .filter(|m| conversation_ids.contains(&m.conversation_id))
        {
            let newer = latest
                .get(&message.conversation_id)
                .map(|current| message.created_at >= current.created_at)
                .unwrap_or(true);
            if newer {
                latest.insert(message.conversation_id, message);
            }
        }
        Ok(latest.into_values().cloned().collect())
    }
}

#[async_trait]
impl ForumRepository for MemoryStore {
    async fn create(&self, post: ForumPost) -> Result<ForumPost, RepositoryError> {
        self.state.write().await.forum_posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: ForumPost) -> Result<ForumPost, RepositoryError> {
        let mut state = self.state.write().await;
        match state.forum_posts.iter_mut().find(|p| p.id == post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(post)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_id(&self, id: ForumPostId) -> Result<Option<ForumPost>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.forum_posts.iter().find(|p| p.id == id).cloned())
    }

    async fn delete_with_replies(&self, id: ForumPostId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let mut doomed: HashSet<ForumPostId> = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for post in &state.forum_posts {
                if post.parent_id.is_some_and(|parent| doomed.contains(&parent)) {
                    doomed.insert(post.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        state.forum_posts.retain(|p| !doomed.contains(&p.id));
        Ok(())
    }

    async fn list_topics(&self, limit: i64) -> Result<Vec<ForumPostView>, RepositoryError> {
        let state = self.state.read().await;
        let mut roots: Vec<&ForumPost> =
            state.forum_posts.iter().filter(|p| p.parent_id.is_none()).collect();
        roots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(roots
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .filter_map(|p| state.post_view(p))
            .collect())
    }

    async fn list_replies(
        &self,
        parent: ForumPostId,
    ) -> Result<Vec<ForumPostView>, RepositoryError> {
        let state = self.state.read().await;
        let mut replies: Vec<&ForumPost> = state
            .forum_posts
            .iter()
            .filter(|p| p.parent_id == Some(parent))
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(replies
            .into_iter()
            .filter_map(|p| state.post_view(p))
            .collect())
    }
}

#[async_trait]
impl ProgressRepository for MemoryStore {
    async fn find_progress(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProgress>, RepositoryError> {
        Ok(self.state.read().await.progress.get(&user_id).cloned())
    }

    async fn create_progress(
        &self,
        progress: UserProgress,
    ) -> Result<UserProgress, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state
            .progress
            .entry(progress.user_id)
            .or_insert(progress)
            .clone())
    }

    async fn checklist_for_week(
        &self,
        user_id: UserId,
        week_start: NaiveDate,
    ) -> Result<Vec<ChecklistItem>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .checklist
            .iter()
            .filter(|item| item.user_id == user_id && item.week_start == week_start)
            .cloned()
            .collect())
    }

    async fn save_checklist(
        &self,
        items: Vec<ChecklistItem>,
    ) -> Result<Vec<ChecklistItem>, RepositoryError> {
        self.state.write().await.checklist.extend(items.iter().cloned());
        Ok(items)
    }

    async fn achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, RepositoryError> {
        let state = self.state.read().await;
        let mut achievements: Vec<Achievement> = state
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        achievements.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(achievements)
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn create(&self, contact: Contact) -> Result<Contact, RepositoryError> {
        self.state.write().await.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn list(&self, unread_only: bool) -> Result<Vec<Contact>, RepositoryError> {
        let state = self.state.read().await;
        let mut contacts: Vec<Contact> = state
            .contacts
            .iter()
            .filter(|c| !unread_only || !c.read)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn mark_read(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.contacts.iter_mut().find(|c| c.id == id).map(|contact| {
            contact.mark_read();
            contact.clone()
        }))
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn jobs_with_status(&self, status: &str) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .iter()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn projects_for(&self, owner_id: UserId) -> Result<Vec<Project>, RepositoryError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}

/// 内存中的头像存储，按相对路径保存文件内容
#[derive(Clone, Default)]
pub struct MemoryAvatarStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryAvatarStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, relative_path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(relative_path).cloned()
    }
}

#[async_trait]
impl AvatarStorage for MemoryAvatarStorage {
    async fn store(
        &self,
        directory: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        if directory.contains("..") || file_name.contains('/') {
            return Err(StorageError::InvalidPath(format!("{directory}/{file_name}")));
        }
        let path = format!("{}/{}", directory.trim_end_matches('/'), file_name);
        self.files.write().await.insert(path.clone(), bytes);
        Ok(path)
    }
}
