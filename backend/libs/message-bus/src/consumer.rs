//! Queue-group consumer
//!
//! Joins a queue group with a fixed number of slots. Each slot is one group
//! member that handles its messages one at a time, so at most `slots`
//! requests are in flight per process.

use crate::{BusResult, InboundMessage, MessageBus, Subscription};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Turns a request payload into a reply payload.
///
/// Handlers never fail at this level: every failure is encoded into the
/// reply so the requester sees it before its timeout.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, subject: &str, payload: Bytes) -> Bytes;
}

#[derive(Clone, Debug)]
pub struct QueueConsumerConfig {
    pub subject: String,
    pub group: String,
    pub slots: usize,
}

impl QueueConsumerConfig {
    pub fn new(subject: &str, group: &str, slots: usize) -> Self {
        Self {
            subject: subject.to_string(),
            group: group.to_string(),
            slots: slots.max(1),
        }
    }
}

pub struct QueueConsumer<H> {
    bus: Arc<dyn MessageBus>,
    config: QueueConsumerConfig,
    handler: Arc<H>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<H: RequestHandler> QueueConsumer<H> {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        config: QueueConsumerConfig,
        handler: Arc<H>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            bus,
            config,
            handler,
            shutdown_rx,
        }
    }

    /// Subscribe every slot, then serve until shutdown or until all
    /// subscriptions end.
    pub async fn run(self) -> BusResult<()> {
        let mut slots = JoinSet::new();

        for slot in 0..self.config.slots {
            let subscription = self
                .bus
                .queue_subscribe(&self.config.subject, &self.config.group)
                .await?;
            slots.spawn(run_slot(
                slot,
                self.config.subject.clone(),
                subscription,
                self.handler.clone(),
                self.shutdown_rx.clone(),
            ));
        }

        info!(
            subject = %self.config.subject,
            group = %self.config.group,
            slots = self.config.slots,
            "Queue consumer started"
        );

        while let Some(joined) = slots.join_next().await {
            if let Err(e) = joined {
                error!(subject = %self.config.subject, error = %e, "Consumer slot panicked");
            }
        }

        info!(subject = %self.config.subject, "Queue consumer stopped");
        Ok(())
    }
}

async fn run_slot<H: RequestHandler>(
    slot: usize,
    subject: String,
    mut subscription: Subscription,
    handler: Arc<H>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(subject = %subject, slot, "Shutdown signal received, stopping slot");
                    break;
                }
            }

            message = subscription.next() => {
                match message {
                    Some(message) => process_message(&*handler, message).await,
                    None => {
                        warn!(subject = %subject, slot, "Subscription ended unexpectedly");
                        break;
                    }
                }
            }
        }
    }
}

async fn process_message<H: RequestHandler>(handler: &H, message: InboundMessage) {
    let reply = handler.handle(&message.subject, message.payload.clone()).await;

    if !message.expects_reply() {
        debug!(subject = %message.subject, "No reply subject, dropping reply");
        return;
    }

    let subject = message.subject.clone();
    if let Err(e) = message.respond(reply).await {
        error!(subject = %subject, error = %e, "Failed to send reply");
    }
}
