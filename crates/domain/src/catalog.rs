use serde::{Deserialize, Serialize};

use crate::value_objects::{JobId, ProjectId, Timestamp, UserId};

/// 对外开放的职位状态。
pub const JOB_STATUS_OPEN: &str = "aberta";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub status: String,
    pub created_at: Timestamp,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JOB_STATUS_OPEN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
}
