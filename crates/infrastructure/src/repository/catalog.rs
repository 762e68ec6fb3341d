use application::CatalogRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Job, JobId, Project, ProjectId, RepositoryError, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_sqlx_err;

#[derive(Debug, FromRow)]
struct JobRecord {
    id: Uuid,
    title: String,
    description: Option<String>,
    kind: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<JobRecord> for Job {
    fn from(value: JobRecord) -> Self {
        Job {
            id: JobId::from(value.id),
            title: value.title,
            description: value.description,
            kind: value.kind,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ProjectRecord> for Project {
    fn from(value: ProjectRecord) -> Self {
        Project {
            id: ProjectId::from(value.id),
            owner_id: UserId::from(value.owner_id),
            title: value.title,
            description: value.description,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

/// 职位与项目目前只由运营直接写库，这里只读
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn jobs_with_status(&self, status: &str) -> Result<Vec<Job>, RepositoryError> {
        let records = sqlx::query_as::<_, JobRecord>(
            r#"
            SELECT id, title, description, kind, status, created_at
            FROM jobs
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Job::from).collect())
    }

    async fn projects_for(&self, owner_id: UserId) -> Result<Vec<Project>, RepositoryError> {
        let records = sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, owner_id, title, description, status, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(owner_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Project::from).collect())
    }
}
