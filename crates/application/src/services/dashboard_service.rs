use std::sync::Arc;

use domain::{
    week_start, ChecklistItem, DomainError, ProfileUpdate, User, UserId, UserProgress,
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{
        ChecklistItemDto, CommunityDto, CurrentProjectDto, DashboardSummaryDto,
        MentorshipStatusDto, NextActionDto, OpportunityDto, ProgressDto, PublicProfileDto, UserDto,
    },
    error::ApplicationError,
    repository::{ProgressRepository, UserRepository},
    storage::{AvatarStorage, UploadPolicy},
};

pub struct DashboardServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub progress_repository: Arc<dyn ProgressRepository>,
    pub avatar_storage: Arc<dyn AvatarStorage>,
    pub upload_policy: UploadPolicy,
    pub clock: Arc<dyn Clock>,
}

/// 仪表盘、个人资料与头像
pub struct DashboardService {
    deps: DashboardServiceDependencies,
}

impl DashboardService {
    pub fn new(deps: DashboardServiceDependencies) -> Self {
        Self { deps }
    }

    pub fn me(&self, user: &User) -> UserDto {
        UserDto::from(user)
    }

    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<UserDto, ApplicationError> {
        let mut updated = user.clone();
        updated.apply_profile(update, self.deps.clock.now());
        let stored = self.deps.user_repository.update(updated).await?;
        tracing::info!(user_id = %stored.id, "profile updated");
        Ok(UserDto::from(&stored))
    }

    pub async fn upload_avatar(
        &self,
        user: &User,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UserDto, ApplicationError> {
        let now = self.deps.clock.now();
        let (_, file_name) = self.deps.upload_policy.accept(content_type, &bytes, now)?;
        let directory = format!("avatars/{}", user.id);
        let relative = self
            .deps
            .avatar_storage
            .store(&directory, &file_name, bytes)
            .await?;

        let mut updated = user.clone();
        updated.set_avatar(self.deps.upload_policy.public_url(&relative), now);
        let stored = self.deps.user_repository.update(updated).await?;
        tracing::info!(user_id = %stored.id, path = %relative, "avatar uploaded");
        Ok(UserDto::from(&stored))
    }

    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicProfileDto, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId::from(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(PublicProfileDto::from(&user))
    }

    /// 仪表盘汇总。首次访问时创建初始进度，每周首次访问时生成默认清单。
    pub async fn summary(&self, user: &User) -> Result<DashboardSummaryDto, ApplicationError> {
        let now = self.deps.clock.now();
        let repo = &self.deps.progress_repository;

        let progress = match repo.find_progress(user.id).await? {
            Some(progress) => progress,
            None => {
                tracing::debug!(user_id = %user.id, "creating initial progress");
                repo.create_progress(UserProgress::initial(user.id, now)).await?
            }
        };

        let week = week_start(now.date_naive());
        let mut checklist = repo.checklist_for_week(user.id, week).await?;
        if checklist.is_empty() {
            checklist = repo
                .save_checklist(ChecklistItem::defaults_for_week(user.id, week))
                .await?;
        }

        let achievements = repo
            .achievements(user.id)
            .await?
            .into_iter()
            .map(|achievement| achievement.title)
            .collect();

        Ok(DashboardSummaryDto {
            user: UserDto::from(user),
            progress: ProgressDto::from(&progress),
            next_action: NextActionDto {
                title: "Continuar o Módulo 1".into(),
                description: "Registrar a primeira dúvida".into(),
                cta: "/orbitacademy".into(),
            },
            weekly_checklist: checklist
                .into_iter()
                .map(|item| ChecklistItemDto {
                    label: item.label,
                    done: item.done,
                })
                .collect(),
            mentorship: MentorshipStatusDto {
                next_session: "A definir".into(),
                total_sessions: 0,
            },
            projects: CurrentProjectDto {
                current: "Landing page pessoal".into(),
                status: "Em planejamento".into(),
            },
            community: CommunityDto {
                unread_messages: 3,
                channel: "#duvidas-iniciais".into(),
            },
            opportunities: opportunities(),
            achievements,
        })
    }
}

fn opportunities() -> Vec<OpportunityDto> {
    [
        ("Estágio Front-end (remoto)", "Estágio"),
        ("Projeto freelancer — landing page", "Freela"),
        ("Vaga de QA Jr (híbrido)", "Júnior"),
    ]
    .into_iter()
    .map(|(title, kind)| OpportunityDto {
        title: title.into(),
        kind: kind.into(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repository::UserRepository, services::test_support::Fixture};
    use chrono::{Duration, NaiveDate};
    use domain::{Achievement, AchievementId, DEFAULT_CHECKLIST};

    #[tokio::test]
    async fn summary_creates_progress_and_weekly_checklist_once() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let first = service.summary(&ana).await.unwrap();
        let second = service.summary(&ana).await.unwrap();

        assert_eq!(first.progress.level, 1);
        assert_eq!(first.progress.phase, "Planeta Terra — Fundação");
        let labels: Vec<&str> = first
            .weekly_checklist
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert_eq!(labels, DEFAULT_CHECKLIST.to_vec());
        assert_eq!(second.weekly_checklist.len(), 4);
        assert_eq!(first.opportunities.len(), 3);
        assert_eq!(first.next_action.cta, "/orbitacademy");

        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let stored = fx
            .store
            .checklist_for_week(ana.id, monday)
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);
    }

    #[tokio::test]
    async fn a_new_week_gets_a_fresh_checklist() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;
        service.summary(&ana).await.unwrap();

        fx.clock.advance(Duration::days(7));
        service.summary(&ana).await.unwrap();

        let next_monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let stored = fx
            .store
            .checklist_for_week(ana.id, next_monday)
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);
    }

    #[tokio::test]
    async fn achievements_are_listed_newest_first() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;
        let now = fx.clock.now();
        for (title, days_ago) in [("Primeiro login", 2), ("Primeira aula", 1)] {
            fx.store
                .seed_achievement(Achievement {
                    id: AchievementId::generate(),
                    user_id: ana.id,
                    title: title.into(),
                    earned_at: now - Duration::days(days_ago),
                })
                .await;
        }

        let summary = service.summary(&ana).await.unwrap();
        assert_eq!(summary.achievements, vec!["Primeira aula", "Primeiro login"]);
    }

    #[tokio::test]
    async fn profile_update_keeps_untouched_fields_and_clears_blank_ones() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let updated = service
            .update_profile(
                &ana,
                ProfileUpdate {
                    city: Some("Recife".into()),
                    phone: Some("81999990000".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Recife"));

        let stored = UserRepository::find_by_id(&fx.store, ana.id)
            .await
            .unwrap()
            .unwrap();
        let cleared = service
            .update_profile(
                &stored,
                ProfileUpdate {
                    name: Some("  ".into()),
                    phone: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.name, "Ana");
        assert_eq!(cleared.city.as_deref(), Some("Recife"));
        assert!(cleared.phone.is_none());
    }

    #[tokio::test]
    async fn avatar_upload_stores_file_and_sets_public_url() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let updated = service
            .upload_avatar(&ana, Some("image/png"), vec![137, 80, 78, 71])
            .await
            .unwrap();
        let url = updated.avatar_url.unwrap();
        let relative = format!(
            "avatars/{}/{}.png",
            ana.id,
            fx.clock.now().timestamp_millis()
        );
        assert_eq!(url, format!("http://localhost:8080/api/uploads/{relative}"));
        assert_eq!(fx.avatars.get(&relative).await, Some(vec![137, 80, 78, 71]));

        let rejected = service
            .upload_avatar(&ana, Some("text/plain"), vec![1])
            .await
            .unwrap_err();
        assert!(matches!(
            rejected,
            ApplicationError::Domain(DomainError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn public_profile_hides_private_fields() {
        let fx = Fixture::new();
        let service = fx.dashboard_service();
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let profile = service.public_profile(ana.id.into()).await.unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Ana");
        assert!(json.get("email").is_none());
        assert!(json.get("phone").is_none());
        assert!(matches!(
            service.public_profile(Uuid::new_v4()).await,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));
    }
}
