use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ForumPostId, Timestamp, UserId};

pub const MAX_FORUM_CONTENT_CHARS: usize = 500;
const MAX_TOPIC_TITLE_CHARS: usize = 120;
const MAX_TOPIC_COLOR_CHARS: usize = 30;
const MAX_TOPIC_EMOJI_CHARS: usize = 10;
const MAX_LOCATION_CHARS: usize = 80;

/// 论坛正文：去除首尾空白后非空，且不超过 500 个字符（超出直接拒绝）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumContent(String);

impl ForumContent {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_argument("content", "cannot be empty"));
        }
        if value.chars().count() > MAX_FORUM_CONTENT_CHARS {
            return Err(DomainError::invalid_argument(
                "content",
                format!("must be at most {MAX_FORUM_CONTENT_CHARS} characters"),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 主题帖的展示样式，回复帖不携带。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStyle {
    pub title: Option<String>,
    pub color: Option<String>,
    pub emoji: Option<String>,
}

impl TopicStyle {
    pub fn new(
        title: Option<String>,
        color: Option<String>,
        emoji: Option<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            title: bounded("topicTitle", title, MAX_TOPIC_TITLE_CHARS)?,
            color: bounded("topicColor", color, MAX_TOPIC_COLOR_CHARS)?,
            emoji: bounded("topicEmoji", emoji, MAX_TOPIC_EMOJI_CHARS)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: ForumPostId,
    pub author_id: UserId,
    pub parent_id: Option<ForumPostId>,
    pub content: ForumContent,
    pub topic: TopicStyle,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ForumPost {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ForumPostId,
        author_id: UserId,
        parent_id: Option<ForumPostId>,
        content: ForumContent,
        topic: TopicStyle,
        city: Option<String>,
        neighborhood: Option<String>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        // 回复帖沿用所属主题的样式
        let topic = if parent_id.is_some() {
            TopicStyle::default()
        } else {
            topic
        };
        Ok(Self {
            id,
            author_id,
            parent_id,
            content,
            topic,
            city: bounded("city", city, MAX_LOCATION_CHARS)?,
            neighborhood: bounded("neighborhood", neighborhood, MAX_LOCATION_CHARS)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn ensure_author(&self, actor: UserId, action: &str) -> DomainResult<()> {
        if self.author_id == actor {
            Ok(())
        } else {
            Err(DomainError::not_post_author(action))
        }
    }

    pub fn edit(&mut self, content: ForumContent, now: Timestamp) {
        self.content = content;
        self.updated_at = now;
    }
}

fn bounded(field: &str, value: Option<String>, max: usize) -> DomainResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > max {
        return Err(DomainError::invalid_argument(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(Some(value))
}
