//! 会话实时推送
//!
//! `GET /ws/chat/{conversation_id}?token=<jwt>`：握手前校验令牌和参与者身份，
//! 之后把会话主题上的新消息以 JSON 文本帧推给客户端，断开时取消订阅。

use application::Subscription;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, extract::ApiPath, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ApiPath(conversation_id): ApiPath<Uuid>,
    Query(query): Query<SocketQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("missing token query parameter"))?;

    let user = state.identity.resolve_token(token.trim()).await?;
    let subscription = state.chat_service.subscribe(&user, conversation_id).await?;
    tracing::info!(user_id = %user.id, conversation_id = %conversation_id, "websocket connected");

    Ok(ws.on_upgrade(move |socket| relay(socket, state, subscription)))
}

async fn relay(socket: WebSocket, state: AppState, subscription: Subscription) {
    let Subscription {
        id,
        conversation_id,
        mut receiver,
    } = subscription;
    let (mut sender, mut incoming) = socket.split();

    // 发送任务：把主题上的消息写到 socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize websocket payload");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // 接收任务：客户端只读，收到关闭帧或连接出错即结束
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if let WsMessage::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.chat_service.unsubscribe(conversation_id, id).await;
    tracing::info!(conversation_id = %conversation_id, subscriber_id = id, "websocket disconnected");
}
