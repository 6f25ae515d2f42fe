//! Rendering of moderation requests (Telegram MarkdownV2).

use secrecy::ExposeSecret;

use super::model::{ModerationDecision, SubmissionRecord};
use crate::channels::{ChatId, InlineButton, InlineKeyboard};

/// Characters with special meaning in MarkdownV2.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Backslash-escape every MarkdownV2 special character so the text renders
/// literally, whatever entity it is placed in.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Body of the message posted to the moderation chat. The password is a
/// spoiler so it only shows on click.
pub fn render_submission(record: &SubmissionRecord) -> String {
    format!(
        "📝 *Новий запит на доступ до Паблішер Центру:*\n\
         👤 *Ім'я:* {name}\n\
         📧 *Email:* `{email}`\n\
         🔐 *Пароль:* ||{password}||\n\
         🆔 *Telegram ID:* `{id}`",
        name = escape_markdown_v2(&record.name),
        email = escape_markdown_v2(&record.email),
        password = escape_markdown_v2(record.password.expose_secret()),
        id = escape_markdown_v2(&record.user_id.to_string()),
    )
}

/// Approve / reject buttons for a user's submission.
pub fn decision_keyboard(user_id: ChatId) -> InlineKeyboard {
    InlineKeyboard::new().row([
        InlineButton::new("✅ Прийняти", ModerationDecision::accepted(user_id).token()),
        InlineButton::new("❌ Відхилити", ModerationDecision::rejected(user_id).token()),
    ])
}
