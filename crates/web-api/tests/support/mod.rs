#![allow(dead_code)]

use std::sync::Arc;

use application::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, Clock,
    ContactService, DashboardService, DashboardServiceDependencies, ForumService,
    ForumServiceDependencies, IdentityResolver, ListingService, MemoryStore, ProfanityFilter,
    SystemClock, TokenCodec, TopicRegistry, UploadPolicy,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use config::JwtConfig;
use infrastructure::{BcryptPasswordHasher, LocalAvatarStorage};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use web_api::{router, AppState};

pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// 测试用的完整应用：内存仓储 + 临时上传目录
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub uploads: TempDir,
}

pub async fn build_app() -> TestApp {
    let store = MemoryStore::new();
    let uploads = tempfile::tempdir().expect("upload dir");
    let avatar_storage = Arc::new(
        LocalAvatarStorage::new(uploads.path())
            .await
            .expect("avatar storage"),
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repo = Arc::new(store.clone());
    let token_codec = Arc::new(TokenCodec::new(
        &JwtConfig {
            secret: "web-api-test-secret-with-enough-bytes".to_string(),
            expiration_hours: 24,
        },
        clock.clone(),
    ));
    let upload_policy = UploadPolicy {
        public_base_url: "http://localhost:8080".to_string(),
        max_bytes: MAX_UPLOAD_BYTES,
    };

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: repo.clone(),
        password_hasher: Arc::new(BcryptPasswordHasher::new(Some(4))),
        token_codec: token_codec.clone(),
        clock: clock.clone(),
    });
    let chat_service = ChatService::new(ChatServiceDependencies {
        conversation_repository: repo.clone(),
        message_repository: repo.clone(),
        user_repository: repo.clone(),
        broadcaster: Arc::new(TopicRegistry::new(16)),
        avatar_storage: avatar_storage.clone(),
        upload_policy: upload_policy.clone(),
        clock: clock.clone(),
    });
    let forum_service = ForumService::new(ForumServiceDependencies {
        forum_repository: repo.clone(),
        profanity_filter: Arc::new(ProfanityFilter::new(["idiota"])),
        clock: clock.clone(),
    });
    let dashboard_service = DashboardService::new(DashboardServiceDependencies {
        user_repository: repo.clone(),
        progress_repository: repo.clone(),
        avatar_storage,
        upload_policy,
        clock: clock.clone(),
    });

    let state = AppState {
        auth_service: Arc::new(auth_service),
        chat_service: Arc::new(chat_service),
        forum_service: Arc::new(forum_service),
        dashboard_service: Arc::new(dashboard_service),
        contact_service: Arc::new(ContactService::new(repo.clone(), clock)),
        listing_service: Arc::new(ListingService::new(repo.clone())),
        identity: Arc::new(IdentityResolver::new(token_codec, repo)),
        upload_dir: uploads.path().to_path_buf(),
        max_upload_bytes: MAX_UPLOAD_BYTES,
    };

    TestApp {
        router: router(state),
        store,
        uploads,
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    read(router, request).await
}

pub async fn read(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// 注册并返回 `(token, user_id)`
pub async fn register(router: &Router, email: &str, name: &str) -> (String, String) {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "name": name, "password": "segredo1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    (
        body["token"].as_str().expect("token").to_string(),
        body["id"].as_str().expect("id").to_string(),
    )
}

/// 手写一个只含 `file` 字段的 multipart 请求体
pub fn multipart_file(content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "orbit-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"avatar\"\r\n",
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
