use application::{
    ChatMessageRepository, ConversationRepository, ForumRepository, PasswordHasher,
    ProgressRepository, UserRepository,
};
use chrono::{Duration, Utc};
use domain::{
    week_start, ChatMessage, ChecklistItem, Conversation, ConversationId, DisplayName,
    ForumContent, ForumPost, ForumPostId, MessageContent, MessageId, Participant, RepositoryError,
    TopicStyle, User, UserEmail, UserId, UserProgress, UserRole,
};
use infrastructure::{create_pg_pool, BcryptPasswordHasher, PgStorage, MIGRATOR};
use uuid::Uuid;

async fn storage() -> PgStorage {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL");
    let pool = create_pg_pool(&url, 5).await.expect("pool");
    MIGRATOR.run(&pool).await.expect("migrations");
    PgStorage::new(pool)
}

async fn user(storage: &PgStorage, name: &str) -> User {
    let hasher = BcryptPasswordHasher::new(Some(4));
    let email = format!("{}-{}@orbit.dev", name.to_lowercase(), Uuid::new_v4());
    let user = User::register(
        UserId::generate(),
        UserEmail::parse(email).expect("email"),
        DisplayName::parse(name).expect("name"),
        hasher.hash("segredo1").await.expect("hash"),
        UserRole::Student,
        Utc::now(),
    );
    storage
        .user_repository
        .create(user)
        .await
        .expect("store user")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires TEST_DATABASE_URL pointing at a disposable postgres"]
async fn users_and_direct_conversations_round_trip() {
    let storage = storage().await;
    let ana = user(&storage, "Ana").await;
    let bia = user(&storage, "Bia").await;

    let duplicate = storage.user_repository.create(ana.clone()).await;
    assert_eq!(duplicate.unwrap_err(), RepositoryError::Conflict);

    let fetched = storage
        .user_repository
        .find_by_email(&ana.email)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(fetched.id, ana.id);

    let now = Utc::now();
    let direct = Conversation::direct(ConversationId::generate(), ana.id, now);
    let participants = vec![
        Participant::new(direct.id, ana.id, now),
        Participant::new(direct.id, bia.id, now),
    ];
    let stored = storage
        .conversation_repository
        .create(direct, participants)
        .await
        .expect("create direct");

    let again = Conversation::direct(ConversationId::generate(), bia.id, now);
    let again_participants = vec![
        Participant::new(again.id, bia.id, now),
        Participant::new(again.id, ana.id, now),
    ];
    assert_eq!(
        storage
            .conversation_repository
            .create(again, again_participants)
            .await
            .unwrap_err(),
        RepositoryError::Conflict
    );

    let found = storage
        .conversation_repository
        .find_direct_between(bia.id, ana.id)
        .await
        .expect("lookup")
        .expect("exists");
    assert_eq!(found.id, stored.id);

    for text in ["primeira", "segunda"] {
        storage
            .message_repository
            .create(ChatMessage::new(
                MessageId::generate(),
                stored.id,
                ana.id,
                MessageContent::new(text).expect("content"),
                now,
            ))
            .await
            .expect("message");
    }
    let messages = storage
        .message_repository
        .list_with_senders(stored.id)
        .await
        .expect("list");
    let contents: Vec<&str> = messages.iter().map(|m| m.message.content.as_str()).collect();
    assert_eq!(contents, vec!["primeira", "segunda"]);

    let latest = storage
        .message_repository
        .latest_for(&[stored.id])
        .await
        .expect("latest");
    assert_eq!(latest[0].content.as_str(), "segunda");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires TEST_DATABASE_URL pointing at a disposable postgres"]
async fn forum_delete_cascades_and_checklist_keeps_order() {
    let storage = storage().await;
    let ana = user(&storage, "Ana").await;
    let now = Utc::now();

    let root = ForumPost::new(
        ForumPostId::generate(),
        ana.id,
        None,
        ForumContent::new("Tópico").expect("content"),
        TopicStyle::default(),
        None,
        None,
        now,
    )
    .expect("post");
    let root = storage.forum_repository.create(root).await.expect("root");
    let reply = ForumPost::new(
        ForumPostId::generate(),
        ana.id,
        Some(root.id),
        ForumContent::new("Resposta").expect("content"),
        TopicStyle::default(),
        None,
        None,
        now + Duration::seconds(1),
    )
    .expect("reply");
    let reply = storage.forum_repository.create(reply).await.expect("reply");

    storage
        .forum_repository
        .delete_with_replies(root.id)
        .await
        .expect("delete");
    assert!(storage
        .forum_repository
        .find_by_id(reply.id)
        .await
        .expect("find")
        .is_none());

    let progress = storage
        .progress_repository
        .create_progress(UserProgress::initial(ana.id, now))
        .await
        .expect("progress");
    assert_eq!(progress.level, 1);

    let week = week_start(now.date_naive());
    storage
        .progress_repository
        .save_checklist(ChecklistItem::defaults_for_week(ana.id, week))
        .await
        .expect("checklist");
    let labels: Vec<String> = storage
        .progress_repository
        .checklist_for_week(ana.id, week)
        .await
        .expect("read checklist")
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, domain::DEFAULT_CHECKLIST.to_vec());
}
