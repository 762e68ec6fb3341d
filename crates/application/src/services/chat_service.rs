use std::{collections::HashMap, sync::Arc};

use domain::{
    ChatMessage, Conversation, ConversationId, ConversationKind, DomainError, MessageContent,
    MessageId, Participant, RepositoryError, User, UserId,
};
use uuid::Uuid;

use crate::{
    broadcast::{MessageBroadcaster, SubscriberId, Subscription},
    clock::Clock,
    dto::{
        ChatMessageDto, ConversationDto, CreatedConversationDto, LastMessageDto, ParticipantDto,
        UserSummaryDto,
    },
    error::ApplicationError,
    repository::{
        ChatMessageRepository, ChatMessageView, ConversationRepository, ParticipantView,
        UserRepository,
    },
    storage::{AvatarStorage, UploadPolicy},
};

const PREVIEW_CHARS: usize = 60;
const FALLBACK_DISPLAY_NAME: &str = "Conversa";

#[derive(Debug, Clone, Default)]
pub struct CreateGroupRequest {
    pub name: String,
    pub user_ids: Vec<Uuid>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddParticipantOutcome {
    Added,
    AlreadyParticipant,
}

pub struct ChatServiceDependencies {
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub message_repository: Arc<dyn ChatMessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub broadcaster: Arc<dyn MessageBroadcaster>,
    pub avatar_storage: Arc<dyn AvatarStorage>,
    pub upload_policy: UploadPolicy,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 会话存在且调用者是参与者，否则一律视为不存在
    async fn visible_conversation(
        &self,
        viewer: UserId,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ApplicationError> {
        let conversation = self
            .deps
            .conversation_repository
            .find_by_id(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound)?;
        let participant = self
            .deps
            .conversation_repository
            .is_participant(conversation_id, viewer)
            .await?;
        if !participant {
            return Err(DomainError::ConversationNotFound.into());
        }
        Ok(conversation)
    }

    /// 批量读取参与者和最后一条消息后组装响应
    async fn describe(
        &self,
        viewer: UserId,
        conversations: Vec<Conversation>,
    ) -> Result<Vec<ConversationDto>, ApplicationError> {
        let ids: Vec<ConversationId> = conversations.iter().map(|c| c.id).collect();

        let mut participants: HashMap<ConversationId, Vec<ParticipantView>> = HashMap::new();
        for view in self
            .deps
            .conversation_repository
            .list_participants(&ids)
            .await?
        {
            participants.entry(view.conversation_id).or_default().push(view);
        }

        let latest: HashMap<ConversationId, ChatMessage> = self
            .deps
            .message_repository
            .latest_for(&ids)
            .await?
            .into_iter()
            .map(|message| (message.conversation_id, message))
            .collect();

        Ok(conversations
            .into_iter()
            .map(|conversation| {
                let members = participants.remove(&conversation.id).unwrap_or_default();
                let last_message = latest.get(&conversation.id).map(|message| LastMessageDto {
                    preview: message.preview(PREVIEW_CHARS),
                    sender_id: message.sender_id.into(),
                    created_at: message.created_at,
                });
                to_dto(viewer, conversation, members, last_message)
            })
            .collect())
    }

    async fn describe_one(
        &self,
        viewer: UserId,
        conversation: Conversation,
    ) -> Result<ConversationDto, ApplicationError> {
        self.describe(viewer, vec![conversation])
            .await?
            .pop()
            .ok_or_else(|| DomainError::ConversationNotFound.into())
    }

    pub async fn list_conversations(
        &self,
        viewer: &User,
    ) -> Result<Vec<ConversationDto>, ApplicationError> {
        let conversations = self
            .deps
            .conversation_repository
            .list_for_user(viewer.id)
            .await?;
        self.describe(viewer.id, conversations).await
    }

    pub async fn get_conversation(
        &self,
        viewer: &User,
        conversation_id: Uuid,
    ) -> Result<ConversationDto, ApplicationError> {
        let conversation = self
            .visible_conversation(viewer.id, ConversationId::from(conversation_id))
            .await?;
        self.describe_one(viewer.id, conversation).await
    }

    /// 同一对用户之间只保留一个私聊，重复创建返回已有会话
    pub async fn create_direct(
        &self,
        creator: &User,
        other_user_id: Uuid,
    ) -> Result<CreatedConversationDto, ApplicationError> {
        let other_id = UserId::from(other_user_id);
        if other_id == creator.id {
            return Err(DomainError::invalid_argument(
                "otherUserId",
                "cannot start a conversation with yourself",
            )
            .into());
        }
        self.deps
            .user_repository
            .find_by_id(other_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if let Some(existing) = self
            .deps
            .conversation_repository
            .find_direct_between(creator.id, other_id)
            .await?
        {
            return Ok(CreatedConversationDto {
                conversation: self.describe_one(creator.id, existing).await?,
                already_exists: true,
            });
        }

        let now = self.deps.clock.now();
        let conversation = Conversation::direct(ConversationId::generate(), creator.id, now);
        let participants = vec![
            Participant::new(conversation.id, creator.id, now),
            Participant::new(conversation.id, other_id, now),
        ];

        let created = match self
            .deps
            .conversation_repository
            .create(conversation, participants)
            .await
        {
            Ok(created) => created,
            // 并发创建同一对私聊时由唯一约束兜底
            Err(RepositoryError::Conflict) => {
                let existing = self
                    .deps
                    .conversation_repository
                    .find_direct_between(creator.id, other_id)
                    .await?
                    .ok_or(RepositoryError::Conflict)?;
                return Ok(CreatedConversationDto {
                    conversation: self.describe_one(creator.id, existing).await?,
                    already_exists: true,
                });
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(conversation_id = %created.id, "direct conversation created");
        Ok(CreatedConversationDto {
            conversation: self.describe_one(creator.id, created).await?,
            already_exists: false,
        })
    }

    /// 创建群组，创建者总是参与者，未知用户被忽略
    pub async fn create_group(
        &self,
        creator: &User,
        request: CreateGroupRequest,
    ) -> Result<ConversationDto, ApplicationError> {
        let now = self.deps.clock.now();
        let conversation = Conversation::group(
            ConversationId::generate(),
            request.name,
            request.avatar_url,
            creator.id,
            now,
        )?;

        let mut member_ids: Vec<UserId> = vec![creator.id];
        for id in request.user_ids.into_iter().map(UserId::from) {
            if !member_ids.contains(&id) {
                member_ids.push(id);
            }
        }
        let known = self.deps.user_repository.find_many(&member_ids).await?;
        let participants: Vec<Participant> = member_ids
            .iter()
            .filter(|id| **id == creator.id || known.iter().any(|user| user.id == **id))
            .map(|id| Participant::new(conversation.id, *id, now))
            .collect();

        let created = self
            .deps
            .conversation_repository
            .create(conversation, participants)
            .await?;
        tracing::info!(conversation_id = %created.id, creator = %creator.id, "group created");
        self.describe_one(creator.id, created).await
    }

    pub async fn update_group(
        &self,
        actor: &User,
        conversation_id: Uuid,
        request: UpdateGroupRequest,
    ) -> Result<ConversationDto, ApplicationError> {
        let mut conversation = self
            .visible_conversation(actor.id, ConversationId::from(conversation_id))
            .await?;
        conversation.ensure_creator(actor.id, "update the group")?;

        conversation.update_details(request.name, request.avatar_url, self.deps.clock.now());
        let updated = self.deps.conversation_repository.update(conversation).await?;
        self.describe_one(actor.id, updated).await
    }

    pub async fn add_participant(
        &self,
        actor: &User,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<AddParticipantOutcome, ApplicationError> {
        let conversation = self
            .visible_conversation(actor.id, ConversationId::from(conversation_id))
            .await?;
        conversation.ensure_creator(actor.id, "add participants")?;

        let target = self
            .deps
            .user_repository
            .find_by_id(UserId::from(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let repo = &self.deps.conversation_repository;
        if repo.is_participant(conversation.id, target.id).await? {
            return Ok(AddParticipantOutcome::AlreadyParticipant);
        }
        repo.add_participant(Participant::new(
            conversation.id,
            target.id,
            self.deps.clock.now(),
        ))
        .await?;
        tracing::info!(conversation_id = %conversation.id, user_id = %target.id, "participant added");
        Ok(AddParticipantOutcome::Added)
    }

    pub async fn remove_participant(
        &self,
        actor: &User,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let conversation = self
            .visible_conversation(actor.id, ConversationId::from(conversation_id))
            .await?;
        let target = UserId::from(user_id);
        conversation.authorize_removal(actor.id, target)?;

        let removed = self
            .deps
            .conversation_repository
            .remove_participant(conversation.id, target)
            .await?;
        if !removed {
            return Err(DomainError::ParticipantNotFound.into());
        }
        tracing::info!(conversation_id = %conversation.id, user_id = %target, "participant removed");
        Ok(())
    }

    /// 持久化后再广播；更新活跃时间或广播失败只记录日志，不影响写入结果
    pub async fn send_message(
        &self,
        sender: &User,
        conversation_id: Uuid,
        content: String,
    ) -> Result<ChatMessageDto, ApplicationError> {
        let content = MessageContent::new(content)?;
        let conversation = self
            .visible_conversation(sender.id, ConversationId::from(conversation_id))
            .await?;

        let now = self.deps.clock.now();
        let message = ChatMessage::new(MessageId::generate(), conversation.id, sender.id, content, now);
        let stored = self.deps.message_repository.create(message).await?;
        if let Err(err) = self
            .deps
            .conversation_repository
            .touch(conversation.id, now)
            .await
        {
            tracing::warn!(conversation_id = %conversation.id, error = %err, "failed to bump conversation activity");
        }

        let dto = ChatMessageDto::from(ChatMessageView {
            message: stored,
            sender_name: sender.name.as_str().to_owned(),
            sender_avatar_url: sender.avatar_url.clone(),
        });

        match self.deps.broadcaster.publish(dto.clone()).await {
            Ok(delivered) => {
                tracing::debug!(conversation_id = %conversation.id, delivered, "message published")
            }
            Err(err) => {
                tracing::warn!(conversation_id = %conversation.id, error = %err, "message broadcast failed")
            }
        }

        Ok(dto)
    }

    pub async fn list_messages(
        &self,
        viewer: &User,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessageDto>, ApplicationError> {
        let conversation = self
            .visible_conversation(viewer.id, ConversationId::from(conversation_id))
            .await?;
        let views = self
            .deps
            .message_repository
            .list_with_senders(conversation.id)
            .await?;
        Ok(views.into_iter().map(ChatMessageDto::from).collect())
    }

    /// 订阅会话主题，只有参与者可以订阅
    pub async fn subscribe(
        &self,
        viewer: &User,
        conversation_id: Uuid,
    ) -> Result<Subscription, ApplicationError> {
        let conversation = self
            .visible_conversation(viewer.id, ConversationId::from(conversation_id))
            .await?;
        let subscription = self
            .deps
            .broadcaster
            .subscribe(conversation.id)
            .await?;
        tracing::debug!(
            conversation_id = %conversation.id,
            user_id = %viewer.id,
            subscriber_id = subscription.id,
            "subscribed to conversation"
        );
        Ok(subscription)
    }

    pub async fn unsubscribe(&self, conversation_id: ConversationId, subscriber_id: SubscriberId) {
        self.deps
            .broadcaster
            .unsubscribe(conversation_id, subscriber_id)
            .await;
    }

    /// 可以发起聊天的其他用户，按名称排序
    pub async fn list_contacts(&self, viewer: &User) -> Result<Vec<UserSummaryDto>, ApplicationError> {
        let users = self.deps.user_repository.list_except(viewer.id).await?;
        Ok(users.iter().map(UserSummaryDto::from).collect())
    }

    pub async fn upload_group_avatar(
        &self,
        actor: &User,
        conversation_id: Uuid,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<ConversationDto, ApplicationError> {
        let mut conversation = self
            .visible_conversation(actor.id, ConversationId::from(conversation_id))
            .await?;
        conversation.ensure_creator(actor.id, "change the group avatar")?;

        let now = self.deps.clock.now();
        let (_, file_name) = self.deps.upload_policy.accept(content_type, &bytes, now)?;
        let directory = format!("avatars/groups/{}", conversation.id);
        let relative = self
            .deps
            .avatar_storage
            .store(&directory, &file_name, bytes)
            .await?;

        conversation.set_avatar(self.deps.upload_policy.public_url(&relative), now);
        let updated = self.deps.conversation_repository.update(conversation).await?;
        self.describe_one(actor.id, updated).await
    }
}

fn to_dto(
    viewer: UserId,
    conversation: Conversation,
    members: Vec<ParticipantView>,
    last_message: Option<LastMessageDto>,
) -> ConversationDto {
    let display_name = match conversation.kind {
        ConversationKind::Group => conversation.name.clone(),
        ConversationKind::Direct => members
            .iter()
            .find(|member| member.user_id != viewer)
            .map(|member| member.name.clone()),
    }
    .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_owned());

    ConversationDto {
        id: conversation.id.into(),
        kind: conversation.kind,
        name: conversation.name,
        display_name,
        avatar_url: conversation.avatar_url,
        created_by: conversation.created_by.into(),
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        participants: members.into_iter().map(ParticipantDto::from).collect(),
        last_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        broadcast::{BroadcastError, MockMessageBroadcaster},
        repository::MockConversationRepository,
        services::test_support::Fixture,
    };
    use chrono::Duration;
    use mockall::Sequence;

    #[tokio::test]
    async fn direct_conversation_is_created_once_per_pair() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;

        let first = service.create_direct(&alice, bob.id.into()).await.unwrap();
        let second = service.create_direct(&bob, alice.id.into()).await.unwrap();

        assert!(!first.already_exists);
        assert!(second.already_exists);
        assert_eq!(first.conversation.id, second.conversation.id);
        assert_eq!(first.conversation.display_name, "Bob");
        assert_eq!(second.conversation.display_name, "Alice");
        assert_eq!(first.conversation.participants.len(), 2);
    }

    #[tokio::test]
    async fn direct_conversation_validates_other_user() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;

        let with_self = service.create_direct(&alice, alice.id.into()).await.unwrap_err();
        let with_ghost = service.create_direct(&alice, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(
            with_self,
            ApplicationError::Domain(DomainError::InvalidArgument { .. })
        ));
        assert!(matches!(
            with_ghost,
            ApplicationError::Domain(DomainError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn group_includes_creator_and_skips_unknown_users() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;

        let group = service
            .create_group(
                &alice,
                CreateGroupRequest {
                    name: "Squad".into(),
                    user_ids: vec![bob.id.into(), Uuid::new_v4(), bob.id.into()],
                    avatar_url: None,
                },
            )
            .await
            .unwrap();

        let members: Vec<Uuid> = group.participants.iter().map(|p| p.user_id).collect();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&alice.id.into()));
        assert!(members.contains(&bob.id.into()));
        assert_eq!(group.display_name, "Squad");
    }

    #[tokio::test]
    async fn only_creator_can_rename_or_add_but_anyone_can_leave() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let carol = fx.user("carol@orbit.dev", "Carol").await;
        let group = fx.group(&service, &alice, &[&bob]).await;

        let rename = service
            .update_group(
                &bob,
                group,
                UpdateGroupRequest {
                    name: Some("Bob's".into()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            rename,
            ApplicationError::Domain(DomainError::NotGroupCreator { .. })
        ));

        let add = service
            .add_participant(&bob, group, carol.id.into())
            .await
            .unwrap_err();
        assert!(matches!(
            add,
            ApplicationError::Domain(DomainError::NotGroupCreator { .. })
        ));

        let kick = service
            .remove_participant(&bob, group, alice.id.into())
            .await
            .unwrap_err();
        assert!(matches!(
            kick,
            ApplicationError::Domain(DomainError::NotGroupCreator { .. })
        ));

        service
            .remove_participant(&bob, group, bob.id.into())
            .await
            .unwrap();
        let gone = service.get_conversation(&bob, group).await.unwrap_err();
        assert!(matches!(
            gone,
            ApplicationError::Domain(DomainError::ConversationNotFound)
        ));
    }

    #[tokio::test]
    async fn creator_manages_group_membership() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let group = fx.group(&service, &alice, &[]).await;

        assert_eq!(
            service.add_participant(&alice, group, bob.id.into()).await.unwrap(),
            AddParticipantOutcome::Added
        );
        assert_eq!(
            service.add_participant(&alice, group, bob.id.into()).await.unwrap(),
            AddParticipantOutcome::AlreadyParticipant
        );
        assert!(matches!(
            service.add_participant(&alice, group, Uuid::new_v4()).await,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));

        service
            .remove_participant(&alice, group, bob.id.into())
            .await
            .unwrap();
        assert!(matches!(
            service.remove_participant(&alice, group, bob.id.into()).await,
            Err(ApplicationError::Domain(DomainError::ParticipantNotFound))
        ));
    }

    #[tokio::test]
    async fn group_operations_reject_direct_conversations() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let carol = fx.user("carol@orbit.dev", "Carol").await;
        let direct = service.create_direct(&alice, bob.id.into()).await.unwrap();

        let err = service
            .add_participant(&alice, direct.conversation.id, carol.id.into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NotGroupConversation)
        ));
    }

    #[tokio::test]
    async fn messages_are_truncated_listed_in_order_and_published() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let group = fx.group(&service, &alice, &[&bob]).await;
        let mut subscription = service.subscribe(&bob, group).await.unwrap();

        let first = service
            .send_message(&alice, group, "x".repeat(4100))
            .await
            .unwrap();
        fx.clock.advance(Duration::seconds(1));
        service
            .send_message(&bob, group, "  segunda  ".into())
            .await
            .unwrap();

        assert_eq!(first.content.chars().count(), 4000);
        let pushed = subscription.receiver.recv().await.unwrap();
        assert_eq!(pushed.id, first.id);
        assert_eq!(pushed.sender_name, "Alice");

        let listed = service.list_messages(&alice, group).await.unwrap();
        let contents: Vec<&str> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1], "segunda");

        let summary = service.list_conversations(&alice).await.unwrap();
        assert_eq!(
            summary[0].last_message.as_ref().map(|m| m.preview.as_str()),
            Some("segunda")
        );
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let group = fx.group(&service, &alice, &[]).await;

        let err = service
            .send_message(&alice, group, "   ".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_read_send_or_subscribe() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let mallory = fx.user("mallory@orbit.dev", "Mallory").await;
        let group = fx.group(&service, &alice, &[]).await;

        assert!(service.list_messages(&mallory, group).await.is_err());
        assert!(service
            .send_message(&mallory, group, "oi".into())
            .await
            .is_err());
        assert!(matches!(
            service.subscribe(&mallory, group).await,
            Err(ApplicationError::Domain(DomainError::ConversationNotFound))
        ));
    }

    #[tokio::test]
    async fn broadcast_failure_does_not_fail_the_write() {
        let fx = Fixture::new();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let setup = fx.chat_service();
        let group = fx.group(&setup, &alice, &[]).await;

        let mut broadcaster = MockMessageBroadcaster::new();
        broadcaster
            .expect_publish()
            .times(1)
            .returning(|_| Err(BroadcastError::failed("socket layer down")));
        let service = fx.chat_service_with(Arc::new(broadcaster));

        let sent = service.send_message(&alice, group, "oi".into()).await.unwrap();
        let listed = service.list_messages(&alice, group).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, sent.id);
    }

    #[tokio::test]
    async fn group_avatar_upload_is_creator_only() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let group = fx.group(&service, &alice, &[&bob]).await;

        let denied = service
            .upload_group_avatar(&bob, group, Some("image/png"), vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(
            denied,
            ApplicationError::Domain(DomainError::NotGroupCreator { .. })
        ));

        let updated = service
            .upload_group_avatar(&alice, group, Some("image/jpeg"), vec![1, 2, 3])
            .await
            .unwrap();
        let url = updated.avatar_url.unwrap();
        let prefix = format!("http://localhost:8080/api/uploads/avatars/groups/{group}/");
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".jpg"));
        let relative = url.trim_start_matches("http://localhost:8080/api/uploads/");
        assert_eq!(fx.avatars.get(relative).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn contacts_exclude_viewer_and_are_sorted() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let carol = fx.user("carol@orbit.dev", "Carol").await;
        fx.user("bob@orbit.dev", "Bob").await;
        fx.user("alice@orbit.dev", "Alice").await;

        let names: Vec<String> = service
            .list_contacts(&carol)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ApplicationError>) {
        assert!(
            matches!(
                result,
                Err(ApplicationError::Domain(DomainError::ConversationNotFound))
            ),
            "expected ConversationNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn outsiders_cannot_see_group_management() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let mallory = fx.user("mallory@orbit.dev", "Mallory").await;
        let group = fx.group(&service, &alice, &[&bob]).await;

        assert_not_found(
            service
                .update_group(
                    &mallory,
                    group,
                    UpdateGroupRequest {
                        name: Some("Hijack".into()),
                        avatar_url: None,
                    },
                )
                .await,
        );
        assert_not_found(
            service
                .add_participant(&mallory, group, mallory.id.into())
                .await,
        );
        assert_not_found(
            service
                .remove_participant(&mallory, group, bob.id.into())
                .await,
        );
        assert_not_found(
            service
                .upload_group_avatar(&mallory, group, Some("image/png"), vec![1])
                .await,
        );
    }

    #[tokio::test]
    async fn creator_who_left_loses_group_management() {
        let fx = Fixture::new();
        let service = fx.chat_service();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let carol = fx.user("carol@orbit.dev", "Carol").await;
        let group = fx.group(&service, &alice, &[&bob]).await;

        service
            .remove_participant(&alice, group, alice.id.into())
            .await
            .unwrap();

        assert_not_found(
            service
                .update_group(
                    &alice,
                    group,
                    UpdateGroupRequest {
                        name: Some("Hijack".into()),
                        avatar_url: None,
                    },
                )
                .await,
        );
        assert_not_found(service.add_participant(&alice, group, carol.id.into()).await);
        assert_not_found(
            service
                .upload_group_avatar(&alice, group, Some("image/png"), vec![1])
                .await,
        );

        let remaining = service.get_conversation(&bob, group).await.unwrap();
        assert_eq!(remaining.name.as_deref(), Some("Squad"));
        assert_eq!(remaining.participants.len(), 1);
    }

    #[tokio::test]
    async fn racing_direct_insert_returns_the_stored_conversation() {
        let fx = Fixture::new();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let bob = fx.user("bob@orbit.dev", "Bob").await;
        let stored = Conversation::direct(ConversationId::generate(), bob.id, fx.clock.now());
        let expected: Uuid = stored.id.into();

        let mut conversations = MockConversationRepository::new();
        let mut seq = Sequence::new();
        conversations
            .expect_find_direct_between()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(None));
        conversations
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RepositoryError::Conflict));
        conversations
            .expect_find_direct_between()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(Some(stored.clone())));
        conversations
            .expect_list_participants()
            .returning(|_| Ok(Vec::new()));
        let service = fx.chat_service_over(Arc::new(conversations));

        let created = service.create_direct(&alice, bob.id.into()).await.unwrap();
        assert!(created.already_exists);
        assert_eq!(created.conversation.id, expected);
    }

    #[tokio::test]
    async fn activity_bump_failure_keeps_the_message() {
        let fx = Fixture::new();
        let alice = fx.user("alice@orbit.dev", "Alice").await;
        let group = Conversation::group(
            ConversationId::generate(),
            "Squad",
            None,
            alice.id,
            fx.clock.now(),
        )
        .unwrap();
        let group_id = group.id;

        let mut conversations = MockConversationRepository::new();
        conversations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(group.clone())));
        conversations
            .expect_is_participant()
            .returning(|_, _| Ok(true));
        conversations
            .expect_touch()
            .times(1)
            .returning(|_, _| Err(RepositoryError::storage("connection reset")));
        let service = fx.chat_service_over(Arc::new(conversations));
        let mut subscription = fx.registry.subscribe(group_id).await.unwrap();

        let sent = service
            .send_message(&alice, group_id.into(), "oi".into())
            .await
            .unwrap();

        let stored = ChatMessageRepository::list_with_senders(&fx.store, group_id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message.content.as_str(), "oi");
        assert_eq!(subscription.receiver.recv().await.unwrap().id, sent.id);
    }
}
