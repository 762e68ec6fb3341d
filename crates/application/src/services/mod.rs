mod auth_service;
mod chat_service;
mod contact_service;
mod dashboard_service;
mod forum_service;
mod listing_service;

#[cfg(test)]
mod test_support;

pub use auth_service::{AuthService, AuthServiceDependencies, LoginRequest, RegisterRequest};
pub use chat_service::{
    AddParticipantOutcome, ChatService, ChatServiceDependencies, CreateGroupRequest,
    UpdateGroupRequest,
};
pub use contact_service::{ContactService, SubmitContactRequest};
pub use dashboard_service::{DashboardService, DashboardServiceDependencies};
pub use forum_service::{CreatePostRequest, ForumService, ForumServiceDependencies};
pub use listing_service::ListingService;
