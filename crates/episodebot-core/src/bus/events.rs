//! Message bus event types.
//!
//! Defines the messages that flow between transports and the episode pipeline.

/// What produced an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// Free text typed or forwarded by the user.
    Text,
    /// A button press; `content` is the button payload.
    Callback,
}

/// An inbound message from a chat transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Source channel identifier (e.g., "telegram", "cli").
    pub channel: String,
    /// Chat identifier within the channel.
    pub chat_id: String,
    /// User identifier.
    pub user_id: String,
    /// Message text or button payload.
    pub content: String,
    pub kind: InboundKind,
}

impl InboundMessage {
    /// Create a text message from the command line.
    pub fn cli(content: &str) -> Self {
        Self {
            channel: "cli".into(),
            chat_id: "direct".into(),
            user_id: "user".into(),
            content: content.into(),
            kind: InboundKind::Text,
        }
    }

    /// Create a button press from the command line.
    pub fn cli_callback(payload: &str) -> Self {
        Self {
            kind: InboundKind::Callback,
            ..Self::cli(payload)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// A UI button that can be attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    /// Callback payload sent back when the button is pressed.
    pub data: String,
}

impl Button {
    /// A button that sends `data` back as a callback.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// A rendered reply, not yet addressed to any chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub format: TextFormat,
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: TextFormat::Plain,
            buttons: Vec::new(),
        }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self {
            format: TextFormat::Html,
            ..Self::plain(content)
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// An outbound message from the pipeline to a chat transport.
///
/// Transports should handle all variants:
/// - `Reply`: text response, always rendered.
/// - `Typing`: show a "typing…" indicator, best-effort.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Reply {
        channel: String,
        chat_id: String,
        content: String,
        format: TextFormat,
        buttons: Vec<Button>,
    },
    Typing {
        channel: String,
        chat_id: String,
    },
}

impl OutboundMessage {
    /// Convenience: create a plain `Reply` message without buttons.
    pub fn reply(channel: impl Into<String>, chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::addressed(channel, chat_id, Reply::plain(content))
    }

    /// Address a rendered reply to a chat.
    pub fn addressed(channel: impl Into<String>, chat_id: impl Into<String>, reply: Reply) -> Self {
        Self::Reply {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: reply.content,
            format: reply.format,
            buttons: reply.buttons,
        }
    }

    /// Convenience: create a `Typing` message.
    pub fn typing(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::Typing {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Extract the channel name regardless of variant.
    pub fn channel(&self) -> &str {
        match self {
            Self::Reply { channel, .. } => channel,
            Self::Typing { channel, .. } => channel,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_variant() {
        let msg = OutboundMessage::reply("telegram", "chat123", "Not found");
        assert_eq!(msg.channel(), "telegram");
        match msg {
            OutboundMessage::Reply { chat_id, buttons, format, .. } => {
                assert_eq!(chat_id, "chat123");
                assert!(buttons.is_empty());
                assert_eq!(format, TextFormat::Plain);
            }
            _ => panic!("Expected Reply variant"),
        }
    }

    #[test]
    fn test_addressed_keeps_buttons() {
        let reply = Reply::html("<b>hi</b>").with_buttons(vec![Button::callback("Next", "Next:1:1:2")]);
        match OutboundMessage::addressed("telegram", "42", reply) {
            OutboundMessage::Reply { format, buttons, .. } => {
                assert_eq!(format, TextFormat::Html);
                assert_eq!(buttons[0].data, "Next:1:1:2");
            }
            _ => panic!("Expected Reply variant"),
        }
    }

    #[test]
    fn test_typing_variant() {
        let msg = OutboundMessage::typing("telegram", "chat123");
        assert_eq!(msg.channel(), "telegram");
        assert!(matches!(msg, OutboundMessage::Typing { .. }));
    }

    #[test]
    fn test_cli_callback() {
        let msg = InboundMessage::cli_callback("Next:1:2:3");
        assert_eq!(msg.kind, InboundKind::Callback);
        assert_eq!(msg.content, "Next:1:2:3");
    }
}
