use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{DisplayName, PasswordHash, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Student,
    Freelancer,
}

impl UserRole {
    /// 注册时只有显式请求 FREELANCER（不区分大小写）才会得到该角色。
    pub fn from_requested(requested: Option<&str>) -> Self {
        match requested {
            Some(value) if value.trim().eq_ignore_ascii_case("FREELANCER") => Self::Freelancer,
            _ => Self::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Freelancer => "FREELANCER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "STUDENT" => Ok(Self::Student),
            "FREELANCER" => Ok(Self::Freelancer),
            other => Err(DomainError::invalid_argument(
                "role",
                format!("unknown role {other}"),
            )),
        }
    }
}

/// 可选的个人资料字段。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// 资料更新请求：`None` 表示不修改，空字符串表示清空。
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: UserEmail,
    pub name: DisplayName,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub profile: UserProfile,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn register(
        id: UserId,
        email: UserEmail,
        name: DisplayName,
        password: PasswordHash,
        role: UserRole,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password,
            role,
            avatar_url: None,
            profile: UserProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: Timestamp) {
        if let Some(name) = update.name.and_then(|name| DisplayName::parse(name).ok()) {
            self.name = name;
        }
        if let Some(avatar_url) = update.avatar_url {
            self.avatar_url = blank_to_none(avatar_url);
        }
        if let Some(phone) = update.phone {
            self.profile.phone = blank_to_none(phone);
        }
        if let Some(birth_date) = update.birth_date {
            self.profile.birth_date = Some(birth_date);
        }
        if let Some(address) = update.address {
            self.profile.address = blank_to_none(address);
        }
        if let Some(city) = update.city {
            self.profile.city = blank_to_none(city);
        }
        if let Some(state) = update.state {
            self.profile.state = blank_to_none(state);
        }
        if let Some(zip_code) = update.zip_code {
            self.profile.zip_code = blank_to_none(zip_code);
        }
        self.updated_at = now;
    }

    pub fn set_avatar(&mut self, url: String, now: Timestamp) {
        self.avatar_url = Some(url);
        self.updated_at = now;
    }
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
