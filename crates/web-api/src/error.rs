use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

fn from_domain(error: DomainError) -> ApiError {
    let message = error.to_string();
    match error {
        DomainError::InvalidArgument { .. } => {
            ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message)
        }
        DomainError::DuplicateEmail => {
            ApiError::new(StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL", message)
        }
        DomainError::InvalidCredentials => {
            ApiError::new(StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS", message)
        }
        DomainError::NotGroupConversation => {
            ApiError::new(StatusCode::BAD_REQUEST, "NOT_GROUP_CONVERSATION", message)
        }
        DomainError::UserNotFound => ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", message),
        DomainError::ConversationNotFound => {
            ApiError::new(StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND", message)
        }
        DomainError::ParticipantNotFound => {
            ApiError::new(StatusCode::NOT_FOUND, "PARTICIPANT_NOT_FOUND", message)
        }
        DomainError::ForumPostNotFound => {
            ApiError::new(StatusCode::NOT_FOUND, "POST_NOT_FOUND", message)
        }
        DomainError::ContactNotFound => {
            ApiError::new(StatusCode::NOT_FOUND, "CONTACT_NOT_FOUND", message)
        }
        DomainError::NotGroupCreator { .. } | DomainError::NotPostAuthor { .. } => {
            ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(err) => from_domain(err),
            AppErr::Repository(RepositoryError::NotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "requested resource not found",
            ),
            AppErr::Repository(RepositoryError::Conflict) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
            }
            AppErr::Token(err) => ApiError::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", err.to_string()),
            AppErr::Authentication(message) => ApiError::unauthorized(message),
            err @ (AppErr::Repository(RepositoryError::Storage { .. })
            | AppErr::Password(_)
            | AppErr::Storage(_)
            | AppErr::Broadcast(_)) => {
                tracing::error!(error = %err, "request failed");
                ApiError::internal_server_error("internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
