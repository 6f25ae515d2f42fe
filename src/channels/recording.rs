//! In-memory transport that records every call, for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{ChatId, MessageId, SendOptions, Transport};
use crate::error::ChannelError;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        options: SendOptions,
    },
    Photo {
        chat_id: ChatId,
        photo: PathBuf,
        options: SendOptions,
    },
    Deleted {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Answered {
        callback_id: String,
    },
}

/// Records calls; can be told to fail for given chats or for all photos.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    failing_chats: Mutex<HashSet<ChatId>>,
    fail_photos: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call addressed to `chat_id` fail. Failed calls are still recorded.
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    pub fn fail_photos(&self) {
        self.fail_photos.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts (and photo captions) delivered to one chat, in order.
    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text {
                    chat_id: c, text, ..
                } if c == chat_id => Some(text),
                Sent::Photo {
                    chat_id: c,
                    options,
                    ..
                } if c == chat_id => options.caption,
                _ => None,
            })
            .collect()
    }

    pub fn deleted_in(&self, chat_id: ChatId) -> Vec<MessageId> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Deleted {
                    chat_id: c,
                    message_id,
                } if c == chat_id => Some(message_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, chat_id: Option<ChatId>, call: Sent, method: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(call);
        let failing = chat_id.is_some_and(|c| self.failing_chats.lock().unwrap().contains(&c));
        if failing {
            return Err(ChannelError::SendFailed {
                name: "recording".into(),
                method: method.into(),
                reason: "Forbidden: bot was blocked by the user".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), ChannelError> {
        let call = Sent::Text {
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        };
        self.record(Some(chat_id), call, "sendMessage")
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        options: &SendOptions,
    ) -> Result<(), ChannelError> {
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(ChannelError::Attachment {
                path: photo.display().to_string(),
                reason: "No such file or directory".into(),
            });
        }
        let call = Sent::Photo {
            chat_id,
            photo: photo.to_path_buf(),
            options: options.clone(),
        };
        self.record(Some(chat_id), call, "sendPhoto")
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.record(
            Some(chat_id),
            Sent::Deleted {
                chat_id,
                message_id,
            },
            "deleteMessage",
        )
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let call = Sent::Answered {
            callback_id: callback_id.to_string(),
        };
        self.record(None, call, "answerCallbackQuery")
    }
}
