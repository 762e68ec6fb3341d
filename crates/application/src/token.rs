//! JWT 令牌签发与校验
//!
//! 令牌使用 HS256 签名，载荷为 `{ sub: email, userId, iat, exp }`。
//! 过期判断基于注入的 [`Clock`]：`now <= exp` 时有效。

use std::sync::Arc;

use chrono::Duration;
use config::JwtConfig;
use domain::{UserEmail, UserId};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;

/// HS256 推荐的最小密钥长度（字节）
pub const MIN_SECRET_BYTES: usize = 32;

/// JWT Claims 结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// 令牌编解码器
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let secret = normalize_secret(&config.secret);

        let mut validation = Validation::new(Algorithm::HS256);
        // 过期由注入的时钟判断
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
            lifetime: Duration::hours(config.expiration_hours),
            clock,
        }
    }

    /// 生成 JWT token
    pub fn issue(&self, email: &UserEmail, user_id: UserId) -> Result<String, TokenError> {
        let iat = self.clock.now().timestamp();
        let claims = Claims {
            sub: email.as_str().to_owned(),
            user_id: user_id.into(),
            iat,
            exp: iat + self.lifetime.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    /// 校验签名和有效期并返回载荷
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;
        if self.clock.now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// 令牌有效且主体与给定邮箱一致
    pub fn verify_subject(&self, token: &str, expected_email: &str) -> bool {
        self.verify(token)
            .map(|claims| claims.sub == expected_email)
            .unwrap_or(false)
    }

    pub fn extract_email(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token).map(|claims| claims.sub)
    }

    pub fn extract_user_id(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify(token).map(|claims| UserId::from(claims.user_id))
    }
}

/// 过短的密钥右侧补 `a` 到 32 字节，保证与旧部署签发的令牌兼容。
fn normalize_secret(secret: &str) -> Vec<u8> {
    let mut bytes = secret.as_bytes().to_vec();
    if bytes.len() < MIN_SECRET_BYTES {
        tracing::warn!(
            length = bytes.len(),
            "jwt secret shorter than {MIN_SECRET_BYTES} bytes, padding it; configure a longer secret"
        );
        bytes.resize(MIN_SECRET_BYTES, b'a');
    }
    bytes
}
