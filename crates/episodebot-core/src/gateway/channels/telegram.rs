use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::{debug, error, info, warn};

use crate::bus::events::{Button, InboundKind, InboundMessage, OutboundMessage, TextFormat};
use crate::bus::MessageBus;
use crate::gateway::utils::{chunk_message, TELEGRAM_MAX_LEN};

const CHANNEL: &str = "telegram";

/// Long-polling Telegram transport.
///
/// Text messages and button presses go to the bus as inbound messages;
/// outbound replies come back through a bus subscription.
pub struct TelegramTransport {
    token: String,
    bus: Arc<MessageBus>,
    allow_from: Vec<String>,
}

impl TelegramTransport {
    pub fn new(token: String, bus: Arc<MessageBus>, allow_from: Vec<String>) -> Self {
        Self {
            token,
            bus,
            allow_from,
        }
    }

    pub async fn run(self) -> Result<()> {
        let bot = Bot::new(&self.token);

        info!("Telegram transport started");

        // Polling fails with TerminatedByOtherGetUpdates while a webhook is set.
        if let Err(e) = bot.delete_webhook().drop_pending_updates(true).send().await {
            warn!("Failed to delete webhook: {}", e);
        }

        // Subscribe before the dispatcher starts so no reply is dropped.
        let bot_out = bot.clone();
        self.bus
            .subscribe_outbound(CHANNEL, move |msg| deliver(bot_out.clone(), msg))
            .await;

        let message_handler = Update::filter_message().endpoint(
            |msg: Message, bus: Arc<MessageBus>, allow_from: Arc<Vec<String>>| async move {
                let user_id = msg
                    .from
                    .as_ref()
                    .map(|u| u.id.to_string())
                    .unwrap_or_else(|| "unknown".to_owned());

                if !is_allowed(&allow_from, &user_id) {
                    warn!(
                        user_id,
                        chat_id = msg.chat.id.to_string(),
                        "Rejected message from user not in allowFrom list"
                    );
                    return respond(());
                }

                if let Some(text) = msg.text() {
                    let inbound = InboundMessage {
                        channel: CHANNEL.to_owned(),
                        chat_id: msg.chat.id.to_string(),
                        user_id,
                        content: text.to_owned(),
                        kind: InboundKind::Text,
                    };
                    if let Err(e) = bus.inbound_sender().send(inbound).await {
                        error!("Failed to send inbound message to bus: {}", e);
                    }
                }
                respond(())
            },
        );

        let callback_handler = Update::filter_callback_query().endpoint(
            |bot: Bot, q: CallbackQuery, bus: Arc<MessageBus>, allow_from: Arc<Vec<String>>| async move {
                let user_id = q.from.id.to_string();

                if !is_allowed(&allow_from, &user_id) {
                    warn!(user_id, "Rejected callback query from user not in allowFrom list");
                    return respond(());
                }

                // Clear the client-side spinner whatever happens next.
                if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                    debug!("Failed to answer callback query: {}", e);
                }

                if let (Some(data), Some(msg)) = (q.data, q.message) {
                    debug!(user_id, data, "Received callback query");

                    let inbound = InboundMessage {
                        channel: CHANNEL.to_owned(),
                        chat_id: msg.chat().id.to_string(),
                        user_id,
                        content: data,
                        kind: InboundKind::Callback,
                    };
                    if let Err(e) = bus.inbound_sender().send(inbound).await {
                        error!("Failed to send callback inbound to bus: {}", e);
                    }
                }
                respond(())
            },
        );

        let handler = dptree::entry()
            .branch(message_handler)
            .branch(callback_handler);

        let allow_from = Arc::new(self.allow_from);
        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![Arc::clone(&self.bus), allow_from])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

fn is_allowed(allow_from: &[String], user_id: &str) -> bool {
    allow_from.is_empty() || allow_from.iter().any(|id| id == user_id)
}

async fn deliver(bot: Bot, msg: OutboundMessage) {
    match msg {
        OutboundMessage::Reply {
            chat_id,
            content,
            format,
            buttons,
            ..
        } => {
            let Ok(id) = chat_id.parse::<i64>() else {
                warn!(chat_id, "Dropping reply for non-numeric chat id");
                return;
            };

            let chunks = chunk_message(&content, TELEGRAM_MAX_LEN);
            let last = chunks.len().saturating_sub(1);

            for (i, chunk) in chunks.into_iter().enumerate() {
                let mut send = bot.send_message(ChatId(id), chunk);
                if format == TextFormat::Html {
                    send = send.parse_mode(ParseMode::Html);
                }
                // Buttons go on the last chunk only.
                if i == last && !buttons.is_empty() {
                    send = send.reply_markup(keyboard(&buttons));
                }
                if let Err(e) = send.await {
                    error!("Failed to send Telegram message: {}", e);
                }
            }
        }
        OutboundMessage::Typing { chat_id, .. } => {
            if let Ok(id) = chat_id.parse::<i64>() {
                let _ = bot.send_chat_action(ChatId(id), ChatAction::Typing).await;
            }
        }
    }
}

/// One button per row.
fn keyboard(buttons: &[Button]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .map(|b| vec![InlineKeyboardButton::callback(b.text.clone(), b.data.clone())])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_from() {
        assert!(is_allowed(&[], "1"));
        assert!(is_allowed(&["1".to_string(), "2".to_string()], "2"));
        assert!(!is_allowed(&["1".to_string()], "3"));
    }

    #[test]
    fn test_keyboard_one_button_per_row() {
        let markup = keyboard(&[
            Button::callback("Next Episode", "Next:1:1:2"),
            Button::callback("Previous Episode", "Prev:1:1:0"),
        ]);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));
        assert_eq!(markup.inline_keyboard[0][0].text, "Next Episode");
    }
}
