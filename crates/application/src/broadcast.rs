//! 会话主题广播
//!
//! 每个会话对应一个主题。消息持久化成功后发布到主题，
//! 对每个订阅者做一次非阻塞投递：队列已满则丢弃该条，队列已关闭则移除订阅者。
//! 仅在单进程内有效。

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use domain::ConversationId;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

use crate::dto::ChatMessageDto;

pub type SubscriberId = u64;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 一个会话主题上的订阅
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub conversation_id: ConversationId,
    pub receiver: mpsc::Receiver<ChatMessageDto>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBroadcaster: Send + Sync {
    /// 返回成功投递的订阅者数量
    async fn publish(&self, message: ChatMessageDto) -> Result<usize, BroadcastError>;
    async fn subscribe(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Subscription, BroadcastError>;
    async fn unsubscribe(&self, conversation_id: ConversationId, subscriber_id: SubscriberId);
}

type Topics = HashMap<ConversationId, HashMap<SubscriberId, mpsc::Sender<ChatMessageDto>>>;

/// 进程内的主题注册表
pub struct TopicRegistry {
    topics: RwLock<Topics>,
    next_id: AtomicU64,
    capacity: usize,
}

impl TopicRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscriber_count(&self, conversation_id: ConversationId) -> usize {
        self.topics
            .read()
            .await
            .get(&conversation_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    async fn prune(&self, conversation_id: ConversationId, closed: &[SubscriberId]) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(&conversation_id) {
            for id in closed {
                subscribers.remove(id);
            }
            if subscribers.is_empty() {
                topics.remove(&conversation_id);
            }
        }
    }
}

#[async_trait]
impl MessageBroadcaster for TopicRegistry {
    async fn publish(&self, message: ChatMessageDto) -> Result<usize, BroadcastError> {
        let conversation_id = ConversationId::from(message.conversation_id);
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let topics = self.topics.read().await;
            let Some(subscribers) = topics.get(&conversation_id) else {
                return Ok(0);
            };
            for (id, sender) in subscribers {
                match sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            subscriber_id = *id,
                            "subscriber queue full, dropping message"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            tracing::debug!(
                conversation_id = %conversation_id,
                count = closed.len(),
                "pruning closed subscribers"
            );
            self.prune(conversation_id, &closed).await;
        }

        Ok(delivered)
    }

    async fn subscribe(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Subscription, BroadcastError> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.topics
            .write()
            .await
            .entry(conversation_id)
            .or_default()
            .insert(id, sender);

        Ok(Subscription {
            id,
            conversation_id,
            receiver,
        })
    }

    async fn unsubscribe(&self, conversation_id: ConversationId, subscriber_id: SubscriberId) {
        self.prune(conversation_id, &[subscriber_id]).await;
    }
}
