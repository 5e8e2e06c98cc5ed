//! Message queue seam. The broker itself is external; this crate only defines the
//! contract and an in-process FIFO for tests and local runs.

use crate::error::QueueError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish one JSON message to `queue` (declared on demand).
    async fn publish(&self, queue: &str, message: &Value) -> Result<(), QueueError>;

    /// Take and acknowledge one message; `Ok(None)` when the queue is empty.
    async fn consume_one(&self, queue: &str) -> Result<Option<Value>, QueueError>;
}

/// Serialize `message` and publish it.
pub async fn publish_json<Q, M>(q: &Q, queue: &str, message: &M) -> Result<(), QueueError>
where
    Q: MessageQueue + ?Sized,
    M: Serialize + ?Sized,
{
    let value = serde_json::to_value(message).map_err(QueueError::Encode)?;
    q.publish(queue, &value).await.inspect_err(|e| {
        tracing::warn!(queue, error = %e, "failed to publish message");
    })
}

/// Consume one message and decode it into `M`.
pub async fn consume_json<Q, M>(q: &Q, queue: &str) -> Result<Option<M>, QueueError>
where
    Q: MessageQueue + ?Sized,
    M: DeserializeOwned,
{
    let value = q.consume_one(queue).await.inspect_err(|e| {
        tracing::warn!(queue, error = %e, "failed to consume message");
    })?;
    value
        .map(|v| serde_json::from_value(v).map_err(QueueError::Decode))
        .transpose()
}

/// In-process queues keyed by name.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, VecDeque<Value>>>,
    offline: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the broker going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn depth(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .map(|q| q.get(queue).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<(), QueueError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(QueueError::Unavailable("broker offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn publish(&self, queue: &str, message: &Value) -> Result<(), QueueError> {
        self.check_online()?;
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| QueueError::Unavailable("queue lock poisoned".into()))?;
        queues.entry(queue.to_string()).or_default().push_back(message.clone());
        Ok(())
    }

    async fn consume_one(&self, queue: &str) -> Result<Option<Value>, QueueError> {
        self.check_online()?;
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| QueueError::Unavailable("queue lock poisoned".into()))?;
        Ok(queues.get_mut(queue).and_then(VecDeque::pop_front))
    }
}
