//! 主应用程序入口
//!
//! 加载配置、连接数据库并启动 Axum Web API 服务。

use std::{path::PathBuf, sync::Arc};

use application::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, Clock,
    ContactService, DashboardService, DashboardServiceDependencies, ForumService,
    ForumServiceDependencies, IdentityResolver, ListingService, ProfanityFilter, SystemClock,
    TokenCodec, UploadPolicy,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.sanitized(), "configuration loaded");

    let infra = Infrastructure::connect(&config).await?;
    let storage = &infra.storage;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_codec = Arc::new(TokenCodec::new(&config.jwt, clock.clone()));
    let upload_policy = UploadPolicy {
        public_base_url: config.server.public_base_url.clone(),
        max_bytes: config.uploads.max_bytes,
    };

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: storage.user_repository.clone(),
        password_hasher: infra.password_hasher.clone(),
        token_codec: token_codec.clone(),
        clock: clock.clone(),
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        conversation_repository: storage.conversation_repository.clone(),
        message_repository: storage.message_repository.clone(),
        user_repository: storage.user_repository.clone(),
        broadcaster: infra.broadcaster.clone(),
        avatar_storage: infra.avatar_storage.clone(),
        upload_policy: upload_policy.clone(),
        clock: clock.clone(),
    });

    let forum_service = ForumService::new(ForumServiceDependencies {
        forum_repository: storage.forum_repository.clone(),
        profanity_filter: Arc::new(ProfanityFilter::new(&config.forum.banned_words)),
        clock: clock.clone(),
    });

    let dashboard_service = DashboardService::new(DashboardServiceDependencies {
        user_repository: storage.user_repository.clone(),
        progress_repository: storage.progress_repository.clone(),
        avatar_storage: infra.avatar_storage.clone(),
        upload_policy,
        clock: clock.clone(),
    });

    let state = AppState {
        auth_service: Arc::new(auth_service),
        chat_service: Arc::new(chat_service),
        forum_service: Arc::new(forum_service),
        dashboard_service: Arc::new(dashboard_service),
        contact_service: Arc::new(ContactService::new(
            storage.contact_repository.clone(),
            clock,
        )),
        listing_service: Arc::new(ListingService::new(storage.catalog_repository.clone())),
        identity: Arc::new(IdentityResolver::new(
            token_codec,
            storage.user_repository.clone(),
        )),
        upload_dir: PathBuf::from(&config.uploads.dir),
        max_upload_bytes: config.uploads.max_bytes,
    };

    // 启动 Web 服务器
    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("orbit api listening on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
