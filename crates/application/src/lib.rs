//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、权限判断、
//! 以及对外部适配器（例如密码哈希、令牌签发、消息广播、文件存储）的抽象。

pub mod broadcast;
pub mod clock;
pub mod dto;
pub mod error;
pub mod identity;
pub mod memory;
pub mod password;
pub mod profanity;
pub mod repository;
pub mod services;
pub mod storage;
pub mod token;

pub use broadcast::{BroadcastError, MessageBroadcaster, SubscriberId, Subscription, TopicRegistry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ApplicationError;
pub use identity::IdentityResolver;
pub use memory::{MemoryAvatarStorage, MemoryStore};
pub use password::{PasswordHasher, PasswordHasherError};
pub use profanity::ProfanityFilter;
pub use repository::{
    CatalogRepository, ChatMessageRepository, ChatMessageView, ContactRepository,
    ConversationRepository, ForumPostView, ForumRepository, ParticipantView, ProgressRepository,
    UserRepository,
};
pub use services::{
    AddParticipantOutcome, AuthService, AuthServiceDependencies, ChatService,
    ChatServiceDependencies, ContactService, CreateGroupRequest, CreatePostRequest,
    DashboardService, DashboardServiceDependencies, ForumService, ForumServiceDependencies,
    ListingService, LoginRequest, RegisterRequest, SubmitContactRequest, UpdateGroupRequest,
};
pub use storage::{AvatarStorage, ImageKind, StorageError, UploadPolicy};
pub use token::{Claims, TokenCodec, TokenError};
