use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use application::{
    dto::{
        AuthResponse, ChatMessageDto, ContactDto, ConversationDto, CreatedConversationDto,
        DashboardSummaryDto, ForumPostDto, JobDto, MentorshipDto, ProjectDto, PublicProfileDto,
        UserDto, UserSummaryDto,
    },
    AddParticipantOutcome, CreateGroupRequest, CreatePostRequest, LoginRequest, RegisterRequest,
    SubmitContactRequest, UpdateGroupRequest,
};
use domain::{ConversationKind, ProfileUpdate};

use crate::{
    auth::{require_identity, CurrentUser},
    extract::{ApiJson, ApiMultipart, ApiPath},
    error::ApiError,
    response::{keyed, merged, Keyed, Merged},
    state::AppState,
    websocket,
};

/// multipart 边界和字段头的额外开销
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegisterPayload {
    email: String,
    name: String,
    password: String,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactPayload {
    name: String,
    email: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfilePayload {
    name: Option<String>,
    avatar_url: Option<String>,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CreateConversationPayload {
    #[serde(rename = "type")]
    kind: String,
    other_user_id: Option<Uuid>,
    name: Option<String>,
    user_ids: Vec<Uuid>,
    avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UpdateConversationPayload {
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentPayload {
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddParticipantPayload {
    user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ForumPostPayload {
    content: String,
    parent_id: Option<Uuid>,
    topic_title: Option<String>,
    topic_color: Option<String>,
    topic_emoji: Option<String>,
    city: Option<String>,
    neighborhood: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

type Reply<T> = Result<Json<Keyed<T>>, ApiError>;

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .nest("/api", api_routes(&state))
        .route("/ws/chat/{conversation_id}", get(websocket::chat_socket))
        .layer(middleware::from_fn_with_state(state.clone(), require_identity))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/mentorships", get(list_mentorships))
        .route("/contact", post(submit_contact))
        .route("/contacts", get(list_contacts))
        .route("/contacts/unread", get(list_unread_contacts))
        .route("/contacts/{id}/read", put(mark_contact_read))
        .route("/dashboard/me", get(me).put(update_me))
        .route("/dashboard/me/avatar", post(upload_my_avatar))
        .route("/dashboard/summary", get(dashboard_summary))
        .route("/users/{id}/profile", get(public_profile))
        .route("/jobs", get(list_jobs))
        .route("/projects", get(list_projects))
        .route(
            "/chat/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/chat/conversations/{id}",
            get(get_conversation).patch(update_conversation),
        )
        .route(
            "/chat/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route(
            "/chat/conversations/{id}/participants",
            post(add_participant),
        )
        .route(
            "/chat/conversations/{id}/participants/{user_id}",
            delete(remove_participant),
        )
        .route(
            "/chat/conversations/{id}/avatar",
            post(upload_conversation_avatar),
        )
        .route("/chat/users", get(list_chat_users))
        .route("/forum/messages", get(list_topics).post(create_post))
        .route(
            "/forum/messages/{id}",
            put(edit_post).delete(delete_post),
        )
        .route("/forum/messages/{id}/replies", get(list_replies))
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
}

async fn health() -> Json<Merged<Health>> {
    Json(merged(Health {
        status: "UP",
        timestamp: Utc::now(),
    }))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<Json<Merged<AuthResponse>>, ApiError> {
    let response = state
        .auth_service
        .register(RegisterRequest {
            email: payload.email,
            name: payload.name,
            password: payload.password,
            role: payload.role,
        })
        .await?;

    Ok(Json(merged(response)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Json<Merged<AuthResponse>>, ApiError> {
    let response = state
        .auth_service
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(merged(response)))
}

async fn list_mentorships(State(state): State<AppState>) -> Json<Keyed<Vec<MentorshipDto>>> {
    Json(keyed("mentorships", state.listing_service.mentorships()))
}

async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ContactPayload>,
) -> Reply<ContactDto> {
    let contact = state
        .contact_service
        .submit(SubmitContactRequest {
            name: payload.name,
            email: payload.email,
            message: payload.message,
        })
        .await?;
    Ok(Json(keyed("contact", contact)))
}

async fn list_contacts(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Reply<Vec<ContactDto>> {
    let contacts = state.contact_service.list(false).await?;
    Ok(Json(keyed("contacts", contacts)))
}

async fn list_unread_contacts(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Reply<Vec<ContactDto>> {
    let contacts = state.contact_service.list(true).await?;
    Ok(Json(keyed("contacts", contacts)))
}

async fn mark_contact_read(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<ContactDto> {
    let contact = state.contact_service.mark_read(id).await?;
    Ok(Json(keyed("contact", contact)))
}

async fn me(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Json<Keyed<UserDto>> {
    Json(keyed("user", state.dashboard_service.me(&user)))
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Reply<UserDto> {
    let update = ProfileUpdate {
        name: payload.name,
        avatar_url: payload.avatar_url,
        phone: payload.phone,
        birth_date: payload.birth_date,
        address: payload.address,
        city: payload.city,
        state: payload.state,
        zip_code: payload.zip_code,
    };
    let updated = state.dashboard_service.update_profile(&user, update).await?;
    Ok(Json(keyed("user", updated)))
}

async fn upload_my_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Reply<UserDto> {
    let (content_type, bytes) = read_file_field(multipart).await?;
    let updated = state
        .dashboard_service
        .upload_avatar(&user, content_type.as_deref(), bytes)
        .await?;
    Ok(Json(keyed("user", updated)))
}

async fn dashboard_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Merged<DashboardSummaryDto>>, ApiError> {
    let summary = state.dashboard_service.summary(&user).await?;
    Ok(Json(merged(summary)))
}

async fn public_profile(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<PublicProfileDto> {
    let profile = state.dashboard_service.public_profile(id).await?;
    Ok(Json(keyed("profile", profile)))
}

async fn list_jobs(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Reply<Vec<JobDto>> {
    let jobs = state.listing_service.open_jobs().await?;
    Ok(Json(keyed("jobs", jobs)))
}

async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Reply<Vec<ProjectDto>> {
    let projects = state.listing_service.projects_for(&user).await?;
    Ok(Json(keyed("projects", projects)))
}

async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Reply<Vec<ConversationDto>> {
    let conversations = state.chat_service.list_conversations(&user).await?;
    Ok(Json(keyed("conversations", conversations)))
}

async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateConversationPayload>,
) -> Result<Json<Merged<CreatedConversationDto>>, ApiError> {
    let kind: ConversationKind = payload
        .kind
        .parse()
        .map_err(|_| ApiError::bad_request("type must be DIRECT or GROUP"))?;

    let created = match kind {
        ConversationKind::Direct => {
            let other = payload
                .other_user_id
                .ok_or_else(|| ApiError::bad_request("otherUserId is required"))?;
            state.chat_service.create_direct(&user, other).await?
        }
        ConversationKind::Group => {
            let conversation = state
                .chat_service
                .create_group(
                    &user,
                    CreateGroupRequest {
                        name: payload.name.unwrap_or_default(),
                        user_ids: payload.user_ids,
                        avatar_url: payload.avatar_url,
                    },
                )
                .await?;
            CreatedConversationDto {
                conversation,
                already_exists: false,
            }
        }
    };
    Ok(Json(merged(created)))
}

async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<ConversationDto> {
    let conversation = state.chat_service.get_conversation(&user, id).await?;
    Ok(Json(keyed("conversation", conversation)))
}

async fn update_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateConversationPayload>,
) -> Reply<ConversationDto> {
    let conversation = state
        .chat_service
        .update_group(
            &user,
            id,
            UpdateGroupRequest {
                name: payload.name,
                avatar_url: payload.avatar_url,
            },
        )
        .await?;
    Ok(Json(keyed("conversation", conversation)))
}

async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Vec<ChatMessageDto>> {
    let messages = state.chat_service.list_messages(&user, id).await?;
    Ok(Json(keyed("messages", messages)))
}

async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ContentPayload>,
) -> Reply<ChatMessageDto> {
    let message = state
        .chat_service
        .send_message(&user, id, payload.content)
        .await?;
    Ok(Json(keyed("message", message)))
}

async fn add_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddParticipantPayload>,
) -> Reply<&'static str> {
    let outcome = state
        .chat_service
        .add_participant(&user, id, payload.user_id)
        .await?;
    let message = match outcome {
        AddParticipantOutcome::Added => "participant added",
        AddParticipantOutcome::AlreadyParticipant => "already a participant",
    };
    Ok(Json(keyed("message", message)))
}

async fn remove_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> Reply<&'static str> {
    state
        .chat_service
        .remove_participant(&user, id, user_id)
        .await?;
    Ok(Json(keyed("message", "participant removed")))
}

async fn upload_conversation_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> Reply<ConversationDto> {
    let (content_type, bytes) = read_file_field(multipart).await?;
    let conversation = state
        .chat_service
        .upload_group_avatar(&user, id, content_type.as_deref(), bytes)
        .await?;
    Ok(Json(keyed("conversation", conversation)))
}

async fn list_chat_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Reply<Vec<UserSummaryDto>> {
    let users = state.chat_service.list_contacts(&user).await?;
    Ok(Json(keyed("users", users)))
}

async fn list_topics(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Reply<Vec<ForumPostDto>> {
    let posts = state.forum_service.list_topics().await?;
    Ok(Json(keyed("messages", posts)))
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ForumPostPayload>,
) -> Reply<ForumPostDto> {
    let post = state
        .forum_service
        .create_post(
            &user,
            CreatePostRequest {
                content: payload.content,
                parent_id: payload.parent_id,
                topic_title: payload.topic_title,
                topic_color: payload.topic_color,
                topic_emoji: payload.topic_emoji,
                city: payload.city,
                neighborhood: payload.neighborhood,
            },
        )
        .await?;
    Ok(Json(keyed("message", post)))
}

async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ContentPayload>,
) -> Reply<ForumPostDto> {
    let post = state
        .forum_service
        .edit_post(&user, id, payload.content)
        .await?;
    Ok(Json(keyed("message", post)))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<&'static str> {
    state.forum_service.delete_post(&user, id).await?;
    Ok(Json(keyed("message", "post deleted")))
}

async fn list_replies(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Vec<ForumPostDto>> {
    let replies = state.forum_service.list_replies(id).await?;
    Ok(Json(keyed("replies", replies)))
}

/// 读取名为 `file` 的 multipart 字段
async fn read_file_field(mut multipart: Multipart) -> Result<(Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("multipart error: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("multipart error: {err}")))?;
        return Ok((content_type, bytes.to_vec()));
    }
    Err(ApiError::bad_request("multipart field 'file' is required"))
}
