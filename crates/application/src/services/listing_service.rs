use std::sync::Arc;

use domain::{User, JOB_STATUS_OPEN};
use once_cell::sync::Lazy;

use crate::{
    dto::{JobDto, MentorshipDto, ProjectDto},
    error::ApplicationError,
    repository::CatalogRepository,
};

static MENTORSHIPS: Lazy<Vec<MentorshipDto>> = Lazy::new(|| {
    vec![
        MentorshipDto {
            id: 1,
            name: "Mentoria Tech 9 Meses".into(),
            description: "Do zero ao primeiro emprego em tecnologia com acompanhamento semanal."
                .into(),
            duration: "9 meses".into(),
            level: "Iniciante".into(),
            price: "Gratuito".into(),
            spots: 50,
        },
        MentorshipDto {
            id: 2,
            name: "Programa Quebrada Dev".into(),
            description: "Projetos reais com foco em quem vem da periferia.".into(),
            duration: "6 meses".into(),
            level: "Intermediário".into(),
            price: "Gratuito".into(),
            spots: 30,
        },
        MentorshipDto {
            id: 3,
            name: "Orbitamos Academy".into(),
            description: "Trilha avançada de preparação para vagas de mercado.".into(),
            duration: "3 meses".into(),
            level: "Avançado".into(),
            price: "Acessível".into(),
            spots: 20,
        },
    ]
});

/// 只读目录：职位、个人项目和导师计划
pub struct ListingService {
    catalog: Arc<dyn CatalogRepository>,
}

impl ListingService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn open_jobs(&self) -> Result<Vec<JobDto>, ApplicationError> {
        let jobs = self.catalog.jobs_with_status(JOB_STATUS_OPEN).await?;
        Ok(jobs.into_iter().map(JobDto::from).collect())
    }

    pub async fn projects_for(&self, user: &User) -> Result<Vec<ProjectDto>, ApplicationError> {
        let projects = self.catalog.projects_for(user.id).await?;
        Ok(projects.into_iter().map(ProjectDto::from).collect())
    }

    pub fn mentorships(&self) -> Vec<MentorshipDto> {
        MENTORSHIPS.clone()
    }
}
