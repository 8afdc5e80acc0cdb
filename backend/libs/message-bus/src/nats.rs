/// NATS-backed message bus
///
/// Request/reply uses NATS inboxes; queue groups map one-to-one to NATS
/// queue subscriptions.
use crate::config::NatsConfig;
use crate::{BusError, BusResult, InboundMessage, MessageBus, ReplySink, Subscription};
use async_nats::{Client, RequestErrorKind, Subject};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct NatsBus {
    client: Client,
}

impl NatsBus {
    pub async fn connect(config: &NatsConfig) -> BusResult<Self> {
        let client = async_nats::ConnectOptions::new()
            .name(&config.client_name)
            .connect(&config.url)
            .await
            .map_err(|e| BusError::Connection(format!("connect {}: {e}", config.url)))?;

        info!(url = %config.url, client = %config.client_name, "Connected to NATS");
        Ok(Self { client })
    }

    /// Push buffered publishes out before shutdown
    pub async fn flush(&self) -> BusResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Bytes) -> BusResult<()> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| BusError::Connection(format!("publish {subject}: {e}")))
    }

    async fn request(&self, subject: &str, payload: Bytes, timeout: Duration) -> BusResult<Bytes> {
        let request = async_nats::Request::new()
            .payload(payload)
            .timeout(Some(timeout));

        match self.client.send_request(subject.to_string(), request).await {
            Ok(message) => Ok(message.payload),
            Err(e) => Err(match e.kind() {
                RequestErrorKind::TimedOut => BusError::Timeout {
                    subject: subject.to_string(),
                    timeout,
                },
                RequestErrorKind::NoResponders => BusError::NoResponders(subject.to_string()),
                RequestErrorKind::Other => {
                    BusError::Connection(format!("request {subject}: {e}"))
                }
            }),
        }
    }

    async fn queue_subscribe(&self, subject: &str, group: &str) -> BusResult<Subscription> {
        let subscriber = self
            .client
            .queue_subscribe(subject.to_string(), group.to_string())
            .await
            .map_err(|e| BusError::Connection(format!("subscribe {subject}/{group}: {e}")))?;

        let client = self.client.clone();
        let stream = subscriber.map(move |message| {
            let reply = message.reply.map(|reply_to| {
                Box::new(NatsReply {
                    client: client.clone(),
                    reply_to,
                }) as Box<dyn ReplySink>
            });
            InboundMessage::new(message.subject.to_string(), message.payload, reply)
        });

        Ok(Subscription::new(stream))
    }
}

struct NatsReply {
    client: Client,
    reply_to: Subject,
}

#[async_trait]
impl ReplySink for NatsReply {
    async fn send(self: Box<Self>, payload: Bytes) -> BusResult<()> {
        let NatsReply { client, reply_to } = *self;
        client
            .publish(reply_to, payload)
            .await
            .map_err(|e| BusError::Connection(format!("reply: {e}")))
    }
}
