//! Async message bus between chat transports and the episode pipeline.
//!
//! Transports push into the inbound `mpsc` channel, the bridge drains it.
//! Replies go out through the outbound channel to per-channel subscribers.
//! Subscribers live in a shared `Arc<RwLock>` map so the dispatch loop runs
//! without holding the bus itself.

pub mod events;

use events::{InboundMessage, OutboundMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Callback type for outbound message subscribers.
type OutboundCallback =
    Box<dyn Fn(OutboundMessage) -> futures::future::BoxFuture<'static, ()> + Send + Sync>;

/// Shared subscriber map, keyed by channel name.
pub type SubscriberMap = Arc<RwLock<HashMap<String, Vec<OutboundCallback>>>>;

pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    subscribers: SubscriberMap,
}

pub struct MessageBusReceivers {
    pub inbound_rx: mpsc::Receiver<InboundMessage>,
    pub outbound_rx: mpsc::Receiver<OutboundMessage>,
}

impl MessageBus {
    /// Create a new message bus with the given channel capacity.
    pub fn new(capacity: usize) -> (Self, MessageBusReceivers) {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);

        (
            Self {
                inbound_tx,
                outbound_tx,
                subscribers: Arc::new(RwLock::new(HashMap::new())),
            },
            MessageBusReceivers {
                inbound_rx,
                outbound_rx,
            },
        )
    }

    /// Get a cloneable sender for publishing inbound messages.
    pub fn inbound_sender(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    pub async fn publish_outbound(&self, msg: OutboundMessage) {
        if let Err(e) = self.outbound_tx.send(msg).await {
            error!("Failed to publish outbound message: {}", e);
        }
    }

    pub fn subscribers(&self) -> SubscriberMap {
        Arc::clone(&self.subscribers)
    }

    /// Subscribe to outbound messages for a specific channel.
    ///
    /// Safe to call after dispatch has started.
    pub async fn subscribe_outbound<F, Fut>(&self, channel: &str, callback: F)
    where
        F: Fn(OutboundMessage) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let boxed: OutboundCallback = Box::new(move |msg| Box::pin(callback(msg)));
        let mut subs = self.subscribers.write().await;
        subs.entry(channel.to_string()).or_default().push(boxed);
    }
}

/// Deliver outbound messages to subscribers until every sender is gone.
///
/// Each delivery is bounded by a 10 s timeout. Run as a background task.
pub async fn dispatch_outbound(
    subscribers: SubscriberMap,
    mut outbound_rx: mpsc::Receiver<OutboundMessage>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let subs = subscribers.read().await;
        let Some(callbacks) = subs.get(msg.channel()) else {
            debug!(channel = msg.channel(), "No subscribers for outbound message");
            continue;
        };

        for callback in callbacks {
            if let Err(e) = tokio::time::timeout(DELIVERY_TIMEOUT, callback(msg.clone())).await {
                error!(channel = msg.channel(), "Outbound dispatch timed out: {}", e);
            }
        }
    }
}
