use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bus::events::{InboundMessage, OutboundMessage};
use crate::bus::MessageBus;
use crate::pipeline::EpisodePipeline;

/// Connects the message bus to the episode pipeline.
///
/// Every inbound message gets its own task. Messages share nothing but
/// the pipeline, so a slow backend call for one chat never holds up
/// another, and replies may go out in any order.
pub struct EpisodeBridge {
    bus: Arc<MessageBus>,
    pipeline: Arc<EpisodePipeline>,
    cancel: CancellationToken,
}

impl EpisodeBridge {
    pub fn new(bus: Arc<MessageBus>, pipeline: Arc<EpisodePipeline>, cancel: CancellationToken) -> Self {
        Self {
            bus,
            pipeline,
            cancel,
        }
    }

    /// Run until the bus closes or the token is cancelled.
    pub async fn run(self, mut inbound_rx: mpsc::Receiver<InboundMessage>) -> Result<()> {
        info!("Episode bridge started, waiting for inbound messages...");

        loop {
            let msg = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Episode bridge cancelled");
                    break;
                }
                msg = inbound_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => {
                        info!("Episode bridge shutting down (bus closed)");
                        break;
                    }
                },
            };

            debug!(
                channel = msg.channel,
                chat_id = msg.chat_id,
                kind = ?msg.kind,
                "Bridge received message"
            );

            tokio::spawn(handle_message(
                Arc::clone(&self.bus),
                Arc::clone(&self.pipeline),
                msg,
            ));
        }

        Ok(())
    }
}

async fn handle_message(bus: Arc<MessageBus>, pipeline: Arc<EpisodePipeline>, msg: InboundMessage) {
    if !pipeline.accepts(&msg) {
        return;
    }

    bus.publish_outbound(OutboundMessage::typing(&msg.channel, &msg.chat_id))
        .await;

    for reply in pipeline.handle(&msg).await {
        bus.publish_outbound(OutboundMessage::addressed(&msg.channel, &msg.chat_id, reply))
            .await;
    }
}
