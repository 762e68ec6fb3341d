use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ContactId, Timestamp, UserEmail};

/// 官网联系表单提交的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: UserEmail,
    pub message: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Contact {
    pub fn submit(
        id: ContactId,
        name: impl Into<String>,
        email: UserEmail,
        message: impl Into<String>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_owned();
        let message = message.into().trim().to_owned();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        if message.is_empty() {
            return Err(DomainError::invalid_argument("message", "cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            email,
            message,
            read: false,
            created_at: now,
        })
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
