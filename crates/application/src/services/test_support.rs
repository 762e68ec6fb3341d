use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use config::JwtConfig;
use domain::{DisplayName, PasswordHash, User, UserEmail, UserId, UserRole};
use uuid::Uuid;

use crate::{
    broadcast::{MessageBroadcaster, TopicRegistry},
    clock::{Clock, FixedClock},
    memory::{MemoryAvatarStorage, MemoryStore},
    password::{PasswordHasher, PasswordHasherError},
    profanity::ProfanityFilter,
    repository::{ConversationRepository, UserRepository},
    storage::UploadPolicy,
    token::TokenCodec,
};

use super::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, ContactService,
    CreateGroupRequest, DashboardService, DashboardServiceDependencies, ForumService,
    ForumServiceDependencies, ListingService,
};

/// 测试用的明文哈希器
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{password}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError> {
        Ok(hash.as_str() == format!("plain:{password}"))
    }
}

pub struct Fixture {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub codec: Arc<TokenCodec>,
    pub registry: Arc<TopicRegistry>,
    pub avatars: MemoryAvatarStorage,
    pub policy: UploadPolicy,
}

impl Fixture {
    pub fn new() -> Self {
        // 2024-03-06 是周三
        let start = Utc
            .with_ymd_and_hms(2024, 3, 6, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = Arc::new(FixedClock::new(start));
        let codec = Arc::new(TokenCodec::new(
            &JwtConfig {
                secret: "fixture-secret-with-enough-bytes-000".into(),
                expiration_hours: 24,
            },
            clock.clone(),
        ));
        Self {
            store: MemoryStore::new(),
            clock,
            codec,
            registry: Arc::new(TopicRegistry::new(16)),
            avatars: MemoryAvatarStorage::new(),
            policy: UploadPolicy {
                public_base_url: "http://localhost:8080".into(),
                max_bytes: 1024,
            },
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(AuthServiceDependencies {
            user_repository: Arc::new(self.store.clone()),
            password_hasher: Arc::new(PlainHasher),
            token_codec: self.codec.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn chat_service(&self) -> ChatService {
        self.chat_service_with(self.registry.clone())
    }

    pub fn chat_service_with(&self, broadcaster: Arc<dyn MessageBroadcaster>) -> ChatService {
        self.build_chat_service(Arc::new(self.store.clone()), broadcaster)
    }

    /// 会话仓储替换为给定实现，其余仍走内存仓储
    pub fn chat_service_over(&self, conversations: Arc<dyn ConversationRepository>) -> ChatService {
        self.build_chat_service(conversations, self.registry.clone())
    }

    fn build_chat_service(
        &self,
        conversations: Arc<dyn ConversationRepository>,
        broadcaster: Arc<dyn MessageBroadcaster>,
    ) -> ChatService {
        ChatService::new(ChatServiceDependencies {
            conversation_repository: conversations,
            message_repository: Arc::new(self.store.clone()),
            user_repository: Arc::new(self.store.clone()),
            broadcaster,
            avatar_storage: Arc::new(self.avatars.clone()),
            upload_policy: self.policy.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn forum_service(&self, banned_words: &[&str]) -> ForumService {
        ForumService::new(ForumServiceDependencies {
            forum_repository: Arc::new(self.store.clone()),
            profanity_filter: Arc::new(ProfanityFilter::new(banned_words.iter().copied())),
            clock: self.clock.clone(),
        })
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(DashboardServiceDependencies {
            user_repository: Arc::new(self.store.clone()),
            progress_repository: Arc::new(self.store.clone()),
            avatar_storage: Arc::new(self.avatars.clone()),
            upload_policy: self.policy.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn contact_service(&self) -> ContactService {
        ContactService::new(Arc::new(self.store.clone()), self.clock.clone())
    }

    pub fn listing_service(&self) -> ListingService {
        ListingService::new(Arc::new(self.store.clone()))
    }

    /// 直接写入仓储的用户，密码为 "segredo1"
    pub async fn user(&self, email: &str, name: &str) -> User {
        let user = User::register(
            UserId::generate(),
            UserEmail::parse(email).unwrap(),
            DisplayName::parse(name).unwrap(),
            PasswordHash::new("plain:segredo1").unwrap(),
            UserRole::Student,
            self.clock.now(),
        );
        UserRepository::create(&self.store, user).await.unwrap()
    }

    /// 由 `creator` 创建、包含 `members` 的群组
    pub async fn group(&self, service: &ChatService, creator: &User, members: &[&User]) -> Uuid {
        service
            .create_group(
                creator,
                CreateGroupRequest {
                    name: "Squad".into(),
                    user_ids: members.iter().map(|u| u.id.into()).collect(),
                    avatar_url: None,
                },
            )
            .await
            .unwrap()
            .id
    }
}
