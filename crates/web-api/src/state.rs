use std::{path::PathBuf, sync::Arc};

use application::{
    AuthService, ChatService, ContactService, DashboardService, ForumService, IdentityResolver,
    ListingService,
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub chat_service: Arc<ChatService>,
    pub forum_service: Arc<ForumService>,
    pub dashboard_service: Arc<DashboardService>,
    pub contact_service: Arc<ContactService>,
    pub listing_service: Arc<ListingService>,
    pub identity: Arc<IdentityResolver>,
    /// 静态文件服务的根目录，与头像存储共用
    pub upload_dir: PathBuf,
    /// multipart 请求体上限
    pub max_upload_bytes: usize,
}
