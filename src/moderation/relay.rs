//! ModerationRelay — posts submissions for review and tells users the verdict.

use std::sync::Arc;

use super::model::{DecisionKind, ModerationDecision, SubmissionRecord};
use super::render::{decision_keyboard, render_submission};
use crate::channels::{ChatId, ParseMode, SendOptions, Transport};

/// Sent to the user when the moderator approves.
pub const ACCEPTED_TEXT: &str = "✅ Ваш запит було прийнято! \nВітаємо у команді!";

/// Sent to the user when the moderator rejects.
pub const REJECTED_TEXT: &str = "❌ Ваш запит було відхилено. Ви можете звернутись пізніше.";

/// Forwards completed forms to a fixed moderation chat.
pub struct ModerationRelay {
    transport: Arc<dyn Transport>,
    moderation_chat_id: ChatId,
}

impl ModerationRelay {
    pub fn new(transport: Arc<dyn Transport>, moderation_chat_id: ChatId) -> Self {
        Self {
            transport,
            moderation_chat_id,
        }
    }

    pub fn moderation_chat_id(&self) -> ChatId {
        self.moderation_chat_id
    }

    /// Post a submission with approve / reject buttons. Not deduplicated:
    /// submitting twice posts twice. The record is dropped afterwards.
    pub async fn submit(&self, record: SubmissionRecord) {
        let options = SendOptions::new()
            .with_parse_mode(ParseMode::MarkdownV2)
            .with_keyboard(decision_keyboard(record.user_id))
            .with_strict_markup();
        let text = render_submission(&record);

        match self
            .transport
            .send_text(self.moderation_chat_id, &text, &options)
            .await
        {
            Ok(()) => tracing::info!(
                chat_id = record.user_id,
                moderation_chat_id = self.moderation_chat_id,
                "Submission sent for review"
            ),
            Err(e) => tracing::error!(
                chat_id = record.user_id,
                moderation_chat_id = self.moderation_chat_id,
                error = %e,
                "Failed to send submission for review"
            ),
        }
    }

    /// Interpret a button token. `None` means it is not a moderation action.
    pub fn resolve(token: &str) -> Option<ModerationDecision> {
        ModerationDecision::from_token(token)
    }

    /// Tell the user the verdict. Failures (e.g. the user blocked the bot)
    /// are logged and swallowed.
    pub async fn notify(&self, decision: ModerationDecision) {
        let text = match decision.kind {
            DecisionKind::Accepted => ACCEPTED_TEXT,
            DecisionKind::Rejected => REJECTED_TEXT,
        };

        match self
            .transport
            .send_text(decision.user_id, text, &SendOptions::new())
            .await
        {
            Ok(()) => tracing::info!(
                chat_id = decision.user_id,
                decision = %decision.kind,
                "User notified of moderation decision"
            ),
            Err(e) => tracing::warn!(
                chat_id = decision.user_id,
                decision = %decision.kind,
                error = %e,
                "Failed to notify user"
            ),
        }
    }
}
