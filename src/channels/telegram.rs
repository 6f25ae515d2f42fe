//! Telegram transport — Bot API over HTTPS.
//!
//! Outbound calls go through [`Transport`]; inbound updates arrive either via
//! the webhook server (see [`parse_update`]) or via [`TelegramChannel::start`],
//! which long-polls `getUpdates`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{ChatId, EventStream, IncomingEvent, MessageId, SendOptions, Transport};
use crate::error::ChannelError;

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: [&str; 2] = ["message", "callback_query"];

/// Telegram channel — talks to the Bot API with a shared HTTP client.
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    fn send_failed(method: &str, reason: impl Into<String>) -> ChannelError {
        ChannelError::SendFailed {
            name: "telegram".into(),
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// POST a JSON body to a Bot API method and return the `result` field.
    async fn call(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| Self::send_failed(method, e.to_string()))?;

        Self::read_result(method, resp).await
    }

    async fn read_result(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<serde_json::Value, ChannelError> {
        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Self::send_failed(method, format!("{status}: {e}")))?;

        let ok = data
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if !status.is_success() || !ok {
            let description = data
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no description");
            return Err(Self::send_failed(method, format!("{status}: {description}")));
        }

        Ok(data.get("result").cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Verify the token with `getMe`.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        self.call("getMe", &serde_json::json!({}))
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "url": url,
            "allowed_updates": ALLOWED_UPDATES,
        });
        self.call("setWebhook", &body)
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;
        tracing::info!(url, "Telegram webhook registered");
        Ok(())
    }

    /// Remove any webhook so `getUpdates` is allowed.
    pub async fn delete_webhook(&self) -> Result<(), ChannelError> {
        self.call("deleteWebhook", &serde_json::json!({}))
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })
    }

    /// Start long-polling. Events are yielded in arrival order.
    pub fn start(&self) -> EventStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ALLOWED_UPDATES,
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(serde_json::Value::as_array)
                else {
                    tracing::warn!(
                        description = data.get("description").and_then(|d| d.as_str()),
                        "Telegram getUpdates returned no result"
                    );
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64)
                    {
                        offset = uid + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        continue;
                    };

                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Box::pin(stream)
    }
}

// ── Transport implementation ────────────────────────────────────────

#[async_trait]
impl Transport for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Formatted sends fall back to plain text when Telegram rejects the
    /// markup, unless the options ask for strict markup. Any other failure is
    /// returned as is: the message may already have been delivered.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(ref keyboard) = options.keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| Self::send_failed("sendMessage", e.to_string()))?;
        }

        let Some(mode) = options.parse_mode else {
            return self.call("sendMessage", &body).await.map(|_| ());
        };

        let mut formatted = body.clone();
        formatted["parse_mode"] = serde_json::json!(mode);
        match self.call("sendMessage", &formatted).await {
            Ok(_) => Ok(()),
            Err(err) if plain_retry_allowed(options, &err) => {
                tracing::warn!(
                    chat_id,
                    error = %err,
                    "Telegram rejected {mode:?} markup; retrying without parse_mode"
                );
                self.call("sendMessage", &body).await.map(|_| ())
            }
            Err(err) => Err(err),
        }
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        options: &SendOptions,
    ) -> Result<(), ChannelError> {
        let file_name = photo
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.png");

        let file_bytes =
            tokio::fs::read(photo)
                .await
                .map_err(|e| ChannelError::Attachment {
                    path: photo.display().to_string(),
                    reason: e.to_string(),
                })?;
        let part = Part::bytes(file_bytes).file_name(file_name.to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        if let Some(ref caption) = options.caption {
            form = form.text("caption", caption.clone());
        }
        if let Some(mode) = options.parse_mode {
            form = form.text("parse_mode", format!("{mode:?}"));
        }
        if let Some(ref keyboard) = options.keyboard {
            let markup = serde_json::to_string(keyboard)
                .map_err(|e| Self::send_failed("sendPhoto", e.to_string()))?;
            form = form.text("reply_markup", markup);
        }

        let resp = self
            .client
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::send_failed("sendPhoto", e.to_string()))?;

        Self::read_result("sendPhoto", resp).await?;
        tracing::debug!(chat_id, file_name, "Telegram photo sent");
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        self.call("deleteMessage", &body).await.map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        self.call("answerCallbackQuery", &body).await.map(|_| ())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Bot API description prefix for malformed `parse_mode` markup.
const ENTITY_PARSE_ERROR: &str = "can't parse entities";

/// Whether a failed formatted send may be repeated without `parse_mode`.
fn plain_retry_allowed(options: &SendOptions, err: &ChannelError) -> bool {
    if options.strict_markup {
        return false;
    }
    matches!(err, ChannelError::SendFailed { reason, .. } if reason.contains(ENTITY_PARSE_ERROR))
}

/// Turn a raw Bot API update into an [`IncomingEvent`].
///
/// Returns `None` for update kinds the bot does not handle (edits, stickers,
/// channel posts, button presses on messages too old to carry a `message`).
pub fn parse_update(update: &serde_json::Value) -> Option<IncomingEvent> {
    if let Some(message) = update.get("message") {
        let text = message.get("text").and_then(serde_json::Value::as_str)?;
        let chat_id = message
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(serde_json::Value::as_i64)?;
        let message_id = message
            .get("message_id")
            .and_then(serde_json::Value::as_i64)?;

        return Some(IncomingEvent::Text {
            chat_id,
            message_id,
            text: text.to_string(),
        });
    }

    let query = update.get("callback_query")?;
    let callback_id = query.get("id").and_then(serde_json::Value::as_str)?;
    let data = query.get("data").and_then(serde_json::Value::as_str)?;
    let message = query.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?;
    let message_id = message
        .get("message_id")
        .and_then(serde_json::Value::as_i64)?;

    Some(IncomingEvent::ButtonPress {
        callback_id: callback_id.to_string(),
        chat_id,
        message_id,
        data: data.to_string(),
    })
}

// ── Tests ───────────────────────────────────────────────────────────
