//! 请求身份解析
//!
//! 从 `Authorization: Bearer <token>` 中解析出当前用户。状态流转：
//! 无请求头 -> 未认证；非 Bearer -> 未认证；解码失败 -> 未认证；
//! 用户不存在 -> 用户未找到；否则得到用户。

use std::sync::Arc;

use domain::{DomainError, User, UserEmail};

use crate::{error::ApplicationError, repository::UserRepository, token::TokenCodec};

const BEARER_PREFIX: &str = "Bearer ";

pub struct IdentityResolver {
    token_codec: Arc<TokenCodec>,
    user_repository: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(token_codec: Arc<TokenCodec>, user_repository: Arc<dyn UserRepository>) -> Self {
        Self {
            token_codec,
            user_repository,
        }
    }

    /// 解析 Authorization 请求头
    pub async fn resolve_header(
        &self,
        authorization: Option<&str>,
    ) -> Result<User, ApplicationError> {
        let header = authorization
            .ok_or_else(|| ApplicationError::authentication("missing authorization header"))?;
        let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
            ApplicationError::authentication("authorization header must use the Bearer scheme")
        })?;
        self.resolve_token(token.trim()).await
    }

    /// 解析裸令牌（WebSocket 通过查询参数传递）
    pub async fn resolve_token(&self, token: &str) -> Result<User, ApplicationError> {
        let email = self.token_codec.extract_email(token)?;
        let email = UserEmail::parse(email)
            .map_err(|_| ApplicationError::authentication("token subject is not an email"))?;

        match self.user_repository.find_by_email(&email).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(email = %email, "token subject no longer exists");
                Err(DomainError::UserNotFound.into())
            }
        }
    }
}
