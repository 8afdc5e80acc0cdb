/// In-process message bus
///
/// Mirrors NATS queue-group semantics: for each group on a subject, one
/// live member receives the message, chosen round-robin. Requests with no
/// subscribed group fail immediately with [`BusError::NoResponders`].
use crate::{BusError, BusResult, InboundMessage, MessageBus, ReplySink, Subscription};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

const MEMBER_CAPACITY: usize = 64;

#[derive(Default)]
struct Group {
    members: Vec<mpsc::Sender<InboundMessage>>,
    next: usize,
}

impl Group {
    fn pick(&mut self) -> Option<mpsc::Sender<InboundMessage>> {
        self.members.retain(|member| !member.is_closed());
        if self.members.is_empty() {
            return None;
        }
        let index = self.next % self.members.len();
        self.next = self.next.wrapping_add(1);
        Some(self.members[index].clone())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryBus {
    subjects: Arc<Mutex<HashMap<String, HashMap<String, Group>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live members of `group` on `subject`
    pub fn member_count(&self, subject: &str, group: &str) -> usize {
        self.subjects
            .lock()
            .get(subject)
            .and_then(|groups| groups.get(group))
            .map(|g| g.members.iter().filter(|m| !m.is_closed()).count())
            .unwrap_or(0)
    }

    fn group_names(&self, subject: &str) -> Vec<String> {
        self.subjects
            .lock()
            .get(subject)
            .map(|groups| groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn pick(&self, subject: &str, group: &str) -> Option<mpsc::Sender<InboundMessage>> {
        self.subjects
            .lock()
            .get_mut(subject)
            .and_then(|groups| groups.get_mut(group))
            .and_then(Group::pick)
    }

    /// Hand one copy to each group. Returns the number of groups reached.
    async fn deliver(&self, subject: &str, payload: Bytes, reply: Option<LocalReply>) -> usize {
        let mut delivered = 0;

        for group in self.group_names(subject) {
            // A member can close between pick and send; retry with the next one
            while let Some(member) = self.pick(subject, &group) {
                let reply = reply
                    .clone()
                    .map(|r| Box::new(r) as Box<dyn ReplySink>);
                let message = InboundMessage::new(subject.to_string(), payload.clone(), reply);
                if member.send(message).await.is_ok() {
                    delivered += 1;
                    break;
                }
            }
        }

        delivered
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Bytes) -> BusResult<()> {
        let delivered = self.deliver(subject, payload, None).await;
        debug!(subject = %subject, groups = delivered, "Published");
        Ok(())
    }

    async fn request(&self, subject: &str, payload: Bytes, timeout: Duration) -> BusResult<Bytes> {
        let (tx, rx) = oneshot::channel();
        let reply = LocalReply {
            tx: Arc::new(Mutex::new(Some(tx))),
        };

        if self.deliver(subject, payload, Some(reply)).await == 0 {
            return Err(BusError::NoResponders(subject.to_string()));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(_)) => Err(BusError::ReplyDropped(subject.to_string())),
            Err(_) => Err(BusError::Timeout {
                subject: subject.to_string(),
                timeout,
            }),
        }
    }

    async fn queue_subscribe(&self, subject: &str, group: &str) -> BusResult<Subscription> {
        let (tx, rx) = mpsc::channel(MEMBER_CAPACITY);
        self.subjects
            .lock()
            .entry(subject.to_string())
            .or_default()
            .entry(group.to_string())
            .or_default()
            .members
            .push(tx);

        debug!(subject = %subject, group = %group, "Joined queue group");
        Ok(Subscription::new(ReceiverStream::new(rx)))
    }
}

/// Reply slot shared by every group that received a request; first send wins
#[derive(Clone)]
struct LocalReply {
    tx: Arc<Mutex<Option<oneshot::Sender<Bytes>>>>,
}

#[async_trait]
impl ReplySink for LocalReply {
    async fn send(self: Box<Self>, payload: Bytes) -> BusResult<()> {
        let tx = self.tx.lock().take();
        if let Some(tx) = tx {
            // The requester may have timed out already
            let _ = tx.send(payload);
        }
        Ok(())
    }
}
