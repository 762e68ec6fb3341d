//! 请求认证
//!
//! 公开路由直接放行；其余路由必须携带 `Authorization: Bearer <token>`，
//! 解析出的用户以 [`CurrentUser`] 的形式挂到请求扩展上。

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use domain::User;

use crate::{error::ApiError, state::AppState};

const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/register",
    "/api/auth/login",
    "/api/health",
    "/api/contact",
    "/api/mentorships",
];

const PUBLIC_PREFIXES: &[&str] = &["/api/uploads/", "/ws/"];

/// 无需令牌即可访问的路径
pub fn is_public(path: &str) -> bool {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// 已认证的请求用户
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let user = state.identity.resolve_header(header.as_deref()).await?;
    tracing::debug!(user_id = %user.id, path = %request.uri().path(), "request authenticated");

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_table() {
        assert!(is_public("/api/auth/login"));
        assert!(is_public("/api/auth/register/"));
        assert!(is_public("/api/health"));
        assert!(is_public("/api/contact"));
        assert!(is_public("/api/mentorships"));
        assert!(is_public("/api/uploads/avatars/1/2.png"));
        assert!(is_public("/ws/chat/42"));

        assert!(!is_public("/api/contacts"));
        assert!(!is_public("/api/contacts/unread"));
        assert!(!is_public("/api/dashboard/me"));
        assert!(!is_public("/api/uploads"));
        assert!(!is_public("/api/auth/loginx"));
    }
}
