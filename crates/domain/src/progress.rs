use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AchievementId, ChecklistItemId, Timestamp, UserId};

/// 每周缺失清单时生成的默认条目。
pub const DEFAULT_CHECKLIST: [&str; 4] = [
    "Assistir 2 aulas base",
    "Fazer 1 exercício prático",
    "Postar 1 dúvida na comunidade",
    "Marcar 1 mentoria",
];

const INITIAL_PHASE: &str = "Planeta Terra — Fundação";
const INITIAL_NEXT_GOAL: &str = "Finalizar o Módulo 1 de fundamentos";

/// 返回给定日期所在周的周一（周一当天返回自身）。
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: UserId,
    pub percent: i32,
    pub phase: String,
    pub next_goal: String,
    pub level: i32,
    pub xp: i32,
    pub streak_days: i32,
    pub updated_at: Timestamp,
}

impl UserProgress {
    /// 首次访问仪表盘时创建的初始进度。
    pub fn initial(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            percent: 0,
            phase: INITIAL_PHASE.to_owned(),
            next_goal: INITIAL_NEXT_GOAL.to_owned(),
            level: 1,
            xp: 0,
            streak_days: 0,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub user_id: UserId,
    pub label: String,
    pub done: bool,
    pub week_start: NaiveDate,
}

impl ChecklistItem {
    pub fn new(user_id: UserId, label: impl Into<String>, week_start: NaiveDate) -> Self {
        Self {
            id: ChecklistItemId::generate(),
            user_id,
            label: label.into(),
            done: false,
            week_start,
        }
    }

    pub fn defaults_for_week(user_id: UserId, week_start: NaiveDate) -> Vec<Self> {
        DEFAULT_CHECKLIST
            .iter()
            .map(|label| Self::new(user_id, *label, week_start))
            .collect()
    }
}

/// 成就记录只追加不修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub user_id: UserId,
    pub title: String,
    pub earned_at: Timestamp,
}
