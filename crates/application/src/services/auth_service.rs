use std::sync::Arc;

use domain::{DisplayName, DomainError, RepositoryError, User, UserEmail, UserId, UserRole};

use crate::{
    clock::Clock, dto::AuthResponse, error::ApplicationError, password::PasswordHasher,
    repository::UserRepository, token::TokenCodec,
};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_codec: Arc<TokenCodec>,
    pub clock: Arc<dyn Clock>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ApplicationError> {
        let email = UserEmail::parse(request.email)?;
        let name = DisplayName::parse(request.name)?;
        if request.password.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "must not be blank").into());
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::invalid_argument(
                "password",
                format!("must have at least {MIN_PASSWORD_CHARS} characters"),
            )
            .into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(DomainError::DuplicateEmail.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let role = UserRole::from_requested(request.role.as_deref());
        let user = User::register(
            UserId::generate(),
            email,
            name,
            password_hash,
            role,
            self.deps.clock.now(),
        );

        // 并发注册时由唯一索引兜底
        let stored = match self.deps.user_repository.create(user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict) => return Err(DomainError::DuplicateEmail.into()),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = %stored.id, role = %stored.role, "user registered");
        self.respond(&stored, "registration successful")
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApplicationError> {
        let email =
            UserEmail::parse(request.email).map_err(|_| DomainError::InvalidCredentials)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(DomainError::InvalidCredentials.into());
        }

        self.respond(&user, "login successful")
    }

    fn respond(&self, user: &User, message: &str) -> Result<AuthResponse, ApplicationError> {
        let token = self.deps.token_codec.issue(&user.email, user.id)?;
        Ok(AuthResponse {
            token,
            id: user.id.into(),
            email: user.email.as_str().to_owned(),
            name: user.name.as_str().to_owned(),
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            message: message.to_owned(),
        })
    }
}
