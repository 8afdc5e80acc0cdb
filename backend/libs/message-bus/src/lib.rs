//! Message bus for the picture pipeline
//!
//! Two delivery shapes:
//! - fire-and-forget [`MessageBus::publish`]
//! - [`MessageBus::request`]: payload plus a reply awaited within a timeout
//!
//! Subscribers join a named queue group; each message goes to exactly one
//! member of every group subscribed to its subject.
//!
//! Backends:
//! - [`NatsBus`] for multi-process deployments
//! - [`InMemoryBus`] for tests and single-process runs
//!
//! Replies follow one convention: [`ServiceResponse`] for commands and
//! [`DataResponse`] for queries, both JSON encoded.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::time::Duration;
use thiserror::Error;

pub mod client;
pub mod config;
pub mod consumer;
pub mod memory;
pub mod nats;
pub mod response;

pub use client::{request_command, request_data, RequestError};
pub use config::{worker_slots_from_env, NatsConfig, Timeouts};
pub use consumer::{QueueConsumer, QueueConsumerConfig, RequestHandler};
pub use memory::InMemoryBus;
pub use nats::NatsBus;
pub use response::{DataResponse, ServiceResponse};

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no responders for subject {0}")]
    NoResponders(String),

    #[error("request on {subject} timed out after {timeout:?}")]
    Timeout { subject: String, timeout: Duration },

    #[error("responder on {0} dropped the request without replying")]
    ReplyDropped(String),

    #[error("bus connection error: {0}")]
    Connection(String),
}

impl BusError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BusError::Timeout { .. })
    }
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Fire-and-forget delivery to every group subscribed to `subject`
    async fn publish(&self, subject: &str, payload: Bytes) -> BusResult<()>;

    /// Send `payload` and wait for the first reply, at most `timeout`
    async fn request(&self, subject: &str, payload: Bytes, timeout: Duration) -> BusResult<Bytes>;

    /// Join the load-balanced group `group` on `subject`
    async fn queue_subscribe(&self, subject: &str, group: &str) -> BusResult<Subscription>;
}

/// Where a reply to an inbound request goes
#[async_trait]
pub trait ReplySink: Send {
    async fn send(self: Box<Self>, payload: Bytes) -> BusResult<()>;
}

/// A message delivered to a subscriber
pub struct InboundMessage {
    pub subject: String,
    pub payload: Bytes,
    reply: Option<Box<dyn ReplySink>>,
}

impl InboundMessage {
    pub fn new(subject: String, payload: Bytes, reply: Option<Box<dyn ReplySink>>) -> Self {
        Self {
            subject,
            payload,
            reply,
        }
    }

    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Answer the sender. A published (non-request) message is a no-op.
    pub async fn respond(self, payload: Bytes) -> BusResult<()> {
        match self.reply {
            Some(reply) => reply.send(payload).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("subject", &self.subject)
            .field("payload_len", &self.payload.len())
            .field("expects_reply", &self.reply.is_some())
            .finish()
    }
}

/// Stream of messages for one group member. Dropping it leaves the group.
pub struct Subscription {
    stream: BoxStream<'static, InboundMessage>,
}

impl Subscription {
    pub fn new(stream: impl Stream<Item = InboundMessage> + Send + 'static) -> Self {
        Self {
            stream: stream.boxed(),
        }
    }

    pub async fn next(&mut self) -> Option<InboundMessage> {
        self.stream.next().await
    }
}
