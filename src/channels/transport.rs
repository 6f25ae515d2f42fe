//! Transport abstraction — the outbound Bot API surface the bot depends on,
//! plus the inbound event shape every transport produces.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;

use crate::error::ChannelError;

/// Telegram chat identifier. For private chats this is the user id.
pub type ChatId = i64;

/// Telegram message identifier, unique within a chat.
pub type MessageId = i64;

/// Stream of inbound events produced by a polling transport.
pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// An inbound event the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    /// A plain text message (commands included).
    Text {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    /// An inline keyboard button press.
    ButtonPress {
        callback_id: String,
        chat_id: ChatId,
        message_id: MessageId,
        data: String,
    },
}

impl IncomingEvent {
    /// Chat the event originated from.
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. } | Self::ButtonPress { chat_id, .. } => *chat_id,
        }
    }
}

/// Markup dialect for formatted messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
}

/// A single inline keyboard button carrying callback data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Inline keyboard, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons.
    pub fn row(mut self, buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        self.inline_keyboard.push(buttons.into_iter().collect());
        self
    }

    /// All callback payloads, in display order.
    pub fn callback_data(&self) -> Vec<&str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}

/// Optional formatting for an outbound message or photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    /// Photo caption; ignored for text messages.
    pub caption: Option<String>,
    pub keyboard: Option<InlineKeyboard>,
    /// Never resend without `parse_mode`. Set for text whose markup hides
    /// secrets, where a plain copy would expose them.
    pub strict_markup: bool,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_strict_markup(mut self) -> Self {
        self.strict_markup = true;
        self
    }
}

/// Outbound operations of a messaging transport.
///
/// Every call is a single attempt. Callers decide whether a failure matters;
/// the bot treats all of them as best-effort.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Send a text message.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), ChannelError>;

    /// Upload and send a photo from disk.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        options: &SendOptions,
    ) -> Result<(), ChannelError>;

    /// Delete a message from a chat.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
    -> Result<(), ChannelError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError>;
}
