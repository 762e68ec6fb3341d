use std::sync::Arc;

use domain::{DomainError, ForumContent, ForumPost, ForumPostId, TopicStyle, User};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::ForumPostDto,
    error::ApplicationError,
    profanity::ProfanityFilter,
    repository::{ForumPostView, ForumRepository},
};

const TOPIC_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Default)]
pub struct CreatePostRequest {
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub topic_title: Option<String>,
    pub topic_color: Option<String>,
    pub topic_emoji: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
}

pub struct ForumServiceDependencies {
    pub forum_repository: Arc<dyn ForumRepository>,
    pub profanity_filter: Arc<ProfanityFilter>,
    pub clock: Arc<dyn Clock>,
}

pub struct ForumService {
    deps: ForumServiceDependencies,
}

impl ForumService {
    pub fn new(deps: ForumServiceDependencies) -> Self {
        Self { deps }
    }

    /// 先按原文校验长度，再屏蔽敏感词
    fn clean_content(&self, raw: String) -> Result<ForumContent, DomainError> {
        let checked = ForumContent::new(raw)?;
        ForumContent::new(self.deps.profanity_filter.mask(checked.as_str()))
    }

    async fn existing_post(&self, id: Uuid) -> Result<ForumPost, ApplicationError> {
        self.deps
            .forum_repository
            .find_by_id(ForumPostId::from(id))
            .await?
            .ok_or_else(|| DomainError::ForumPostNotFound.into())
    }

    /// 最新的主题帖，最多 50 条
    pub async fn list_topics(&self) -> Result<Vec<ForumPostDto>, ApplicationError> {
        let topics = self
            .deps
            .forum_repository
            .list_topics(TOPIC_PAGE_SIZE)
            .await?;
        Ok(topics.into_iter().map(ForumPostDto::from).collect())
    }

    pub async fn list_replies(&self, parent_id: Uuid) -> Result<Vec<ForumPostDto>, ApplicationError> {
        let parent = self.existing_post(parent_id).await?;
        let replies = self.deps.forum_repository.list_replies(parent.id).await?;
        Ok(replies.into_iter().map(ForumPostDto::from).collect())
    }

    pub async fn create_post(
        &self,
        author: &User,
        request: CreatePostRequest,
    ) -> Result<ForumPostDto, ApplicationError> {
        let content = self.clean_content(request.content)?;
        let parent_id = match request.parent_id {
            Some(id) => Some(self.existing_post(id).await?.id),
            None => None,
        };
        let topic = TopicStyle::new(request.topic_title, request.topic_color, request.topic_emoji)?;

        let post = ForumPost::new(
            ForumPostId::generate(),
            author.id,
            parent_id,
            content,
            topic,
            request.city,
            request.neighborhood,
            self.deps.clock.now(),
        )?;
        let stored = self.deps.forum_repository.create(post).await?;
        tracing::info!(
            post_id = %stored.id,
            author_id = %author.id,
            reply = stored.is_reply(),
            "forum post created"
        );
        Ok(present(author, stored))
    }

    pub async fn edit_post(
        &self,
        actor: &User,
        post_id: Uuid,
        content: String,
    ) -> Result<ForumPostDto, ApplicationError> {
        let mut post = self.existing_post(post_id).await?;
        post.ensure_author(actor.id, "edit this post")?;

        post.edit(self.clean_content(content)?, self.deps.clock.now());
        let updated = self.deps.forum_repository.update(post).await?;
        Ok(present(actor, updated))
    }

    /// 删除帖子及其全部回复
    pub async fn delete_post(&self, actor: &User, post_id: Uuid) -> Result<(), ApplicationError> {
        let post = self.existing_post(post_id).await?;
        post.ensure_author(actor.id, "delete this post")?;

        self.deps.forum_repository.delete_with_replies(post.id).await?;
        tracing::info!(post_id = %post.id, "forum post deleted");
        Ok(())
    }
}

fn present(author: &User, post: ForumPost) -> ForumPostDto {
    ForumPostDto::from(ForumPostView {
        post,
        author_name: author.name.as_str().to_owned(),
        author_avatar_url: author.avatar_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;
    use chrono::Duration;

    fn topic(content: &str) -> CreatePostRequest {
        CreatePostRequest {
            content: content.into(),
            topic_title: Some("Dúvidas de JS".into()),
            topic_color: Some("#ff8800".into()),
            topic_emoji: Some("💡".into()),
            city: Some("São Paulo".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn banned_words_are_masked_on_create_and_edit() {
        let fx = Fixture::new();
        let service = fx.forum_service(&["bobo"]);
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let created = service.create_post(&ana, topic("Que BOBO isso")).await.unwrap();
        assert_eq!(created.content, "Que **** isso");
        assert_eq!(created.author, "Ana");
        assert_eq!(created.topic_title.as_deref(), Some("Dúvidas de JS"));

        let edited = service
            .edit_post(&ana, created.id, "bobo de novo".into())
            .await
            .unwrap();
        assert_eq!(edited.content, "**** de novo");
    }

    #[tokio::test]
    async fn content_limits_are_enforced() {
        let fx = Fixture::new();
        let service = fx.forum_service(&[]);
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        for content in ["   ".to_owned(), "a".repeat(501)] {
            let err = service.create_post(&ana, topic(&content)).await.unwrap_err();
            assert!(matches!(
                err,
                ApplicationError::Domain(DomainError::InvalidArgument { .. })
            ));
        }
        assert!(service.create_post(&ana, topic(&"a".repeat(500))).await.is_ok());
    }

    #[tokio::test]
    async fn replies_drop_topic_style_and_list_in_order() {
        let fx = Fixture::new();
        let service = fx.forum_service(&[]);
        let ana = fx.user("ana@orbit.dev", "Ana").await;
        let bia = fx.user("bia@orbit.dev", "Bia").await;
        let root = service.create_post(&ana, topic("Como começo?")).await.unwrap();

        fx.clock.advance(Duration::seconds(1));
        let first = service
            .create_post(
                &bia,
                CreatePostRequest {
                    parent_id: Some(root.id),
                    ..topic("Pelo módulo 1")
                },
            )
            .await
            .unwrap();
        fx.clock.advance(Duration::seconds(1));
        service
            .create_post(
                &ana,
                CreatePostRequest {
                    content: "Valeu!".into(),
                    parent_id: Some(root.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.parent_id, Some(root.id));
        assert!(first.topic_title.is_none());

        let replies = service.list_replies(root.id).await.unwrap();
        let authors: Vec<&str> = replies.iter().map(|r| r.author.as_str()).collect();
        assert_eq!(authors, vec!["Bia", "Ana"]);

        let topics = service.list_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, root.id);
    }

    #[tokio::test]
    async fn replying_to_missing_post_fails() {
        let fx = Fixture::new();
        let service = fx.forum_service(&[]);
        let ana = fx.user("ana@orbit.dev", "Ana").await;

        let err = service
            .create_post(
                &ana,
                CreatePostRequest {
                    content: "oi".into(),
                    parent_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ForumPostNotFound)
        ));
        assert!(service.list_replies(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn only_author_can_edit_or_delete_and_delete_cascades() {
        let fx = Fixture::new();
        let service = fx.forum_service(&[]);
        let ana = fx.user("ana@orbit.dev", "Ana").await;
        let bia = fx.user("bia@orbit.dev", "Bia").await;
        let root = service.create_post(&ana, topic("Tópico")).await.unwrap();
        let reply = service
            .create_post(
                &bia,
                CreatePostRequest {
                    content: "Resposta".into(),
                    parent_id: Some(root.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            service.edit_post(&bia, root.id, "hack".into()).await,
            Err(ApplicationError::Domain(DomainError::NotPostAuthor { .. }))
        ));
        assert!(matches!(
            service.delete_post(&bia, root.id).await,
            Err(ApplicationError::Domain(DomainError::NotPostAuthor { .. }))
        ));

        service.delete_post(&ana, root.id).await.unwrap();
        assert!(service.list_topics().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_post(&bia, reply.id).await,
            Err(ApplicationError::Domain(DomainError::ForumPostNotFound))
        ));
    }
}
