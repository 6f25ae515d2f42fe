//! IntakeBot — routes inbound events to the intake flow, the main menu or
//! the moderation relay, and performs every user-facing side effect.
//!
//! All outbound calls are best-effort: failures are logged and the event
//! handling carries on. Only session store failures abort an event.

pub mod menu;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;

use self::menu::MenuAction;
use crate::channels::{
    ChatId, EventStream, IncomingEvent, MessageId, ParseMode, SendOptions, Transport,
};
use crate::error::Result;
use crate::intake::{IntakeFlow, Outcome, SessionStore, prompts};
use crate::moderation::{ModerationRelay, SubmissionRecord};

/// Shows the welcome menu.
const START_COMMAND: &str = "/start";
/// Abandons an unfinished form.
const CANCEL_COMMAND: &str = "/cancel";

/// Whether `text` invokes `command`, allowing `/cmd@botname` and arguments.
fn is_command(text: &str, command: &str) -> bool {
    let Some(rest) = text.strip_prefix(command) else {
        return false;
    };
    rest.is_empty() || rest.starts_with('@') || rest.starts_with(char::is_whitespace)
}

/// The bot. Cheap to share behind an `Arc`.
pub struct IntakeBot {
    transport: Arc<dyn Transport>,
    flow: IntakeFlow,
    relay: ModerationRelay,
    assets_dir: PathBuf,
}

impl IntakeBot {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        moderation_chat_id: ChatId,
        assets_dir: PathBuf,
    ) -> Self {
        Self {
            relay: ModerationRelay::new(Arc::clone(&transport), moderation_chat_id),
            flow: IntakeFlow::new(store),
            transport,
            assets_dir,
        }
    }

    pub fn flow(&self) -> &IntakeFlow {
        &self.flow
    }

    /// Handle one inbound event to completion.
    pub async fn handle(&self, event: IncomingEvent) -> Result<()> {
        match event {
            IncomingEvent::Text {
                chat_id,
                message_id,
                text,
            } => self.on_text(chat_id, message_id, &text).await,
            IncomingEvent::ButtonPress {
                callback_id,
                chat_id,
                message_id,
                data,
            } => {
                self.on_button(&callback_id, chat_id, message_id, &data)
                    .await
            }
        }
    }

    /// Consume a polled event stream, one event at a time.
    pub async fn run(&self, mut events: EventStream) {
        while let Some(event) = events.next().await {
            let chat_id = event.chat_id();
            if let Err(e) = self.handle(event).await {
                tracing::error!(chat_id, error = %e, "Failed to handle event");
            }
        }
        tracing::info!("Event stream ended");
    }

    async fn on_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if is_command(text, START_COMMAND) {
            self.send_welcome(chat_id).await;
            return Ok(());
        }

        if is_command(text, CANCEL_COMMAND) {
            if self.flow.cancel(chat_id).await? {
                self.say(chat_id, prompts::CANCELLED, &SendOptions::new())
                    .await;
            }
            return Ok(());
        }

        if let Some(action) = MenuAction::from_label(text) {
            return self.run_action(chat_id, action).await;
        }

        match self.flow.handle_text(chat_id, message_id, text).await? {
            Outcome::Ignored => {}
            Outcome::NameAccepted { name } => {
                self.say(chat_id, &prompts::ask_email(&name), &SendOptions::new())
                    .await;
            }
            Outcome::InvalidEmail => {
                self.say(chat_id, prompts::INVALID_EMAIL, &SendOptions::new())
                    .await;
            }
            Outcome::EmailAccepted => {
                self.say(chat_id, prompts::ASK_PASSWORD, &SendOptions::new())
                    .await;
            }
            Outcome::Completed(record) => self.complete(record).await,
        }
        Ok(())
    }

    async fn on_button(
        &self,
        callback_id: &str,
        chat_id: ChatId,
        message_id: MessageId,
        data: &str,
    ) -> Result<()> {
        // The pressed message has served its purpose, moderation requests included.
        self.delete_quietly(chat_id, message_id).await;

        let outcome = self.route_button(chat_id, data).await;

        if let Err(e) = self.transport.answer_callback(callback_id).await {
            tracing::debug!(
                chat_id,
                transport = self.transport.name(),
                error = %e,
                "Failed to answer callback query"
            );
        }
        outcome
    }

    async fn route_button(&self, chat_id: ChatId, data: &str) -> Result<()> {
        if let Some(decision) = ModerationRelay::resolve(data) {
            if chat_id == self.relay.moderation_chat_id() {
                tracing::info!(
                    target_chat_id = decision.user_id,
                    decision = %decision.kind,
                    "Moderation decision received"
                );
                self.relay.notify(decision).await;
            } else {
                tracing::warn!(chat_id, "Moderation action outside the moderation chat ignored");
                self.say(chat_id, menu::UNKNOWN_OPTION, &SendOptions::new())
                    .await;
            }
            return Ok(());
        }

        match MenuAction::from_callback(data) {
            Some(action) => self.run_action(chat_id, action).await,
            None => {
                tracing::debug!(chat_id, data, "Unknown callback data");
                self.say(chat_id, menu::UNKNOWN_OPTION, &SendOptions::new())
                    .await;
                Ok(())
            }
        }
    }

    async fn run_action(&self, chat_id: ChatId, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Join => {
                self.say(chat_id, menu::JOIN_TEXT, &SendOptions::new())
                    .await
            }
            MenuAction::BecomePublisher => {
                self.flow.begin(chat_id).await?;
                self.say(chat_id, prompts::ASK_NAME, &SendOptions::new())
                    .await;
            }
            MenuAction::About => {
                self.say(chat_id, menu::ABOUT_TEXT, &SendOptions::new())
                    .await
            }
            MenuAction::Support => {
                self.say(chat_id, menu::SUPPORT_TEXT, &SendOptions::new())
                    .await
            }
            MenuAction::Home => self.send_welcome(chat_id).await,
        }
        Ok(())
    }

    /// The session is already gone when this runs.
    async fn complete(&self, record: SubmissionRecord) {
        let chat_id = record.user_id;
        let caption = prompts::submitted(&record.name);

        for message_id in &record.sensitive_messages {
            self.delete_quietly(chat_id, *message_id).await;
        }

        self.relay.submit(record).await;

        let options = SendOptions::new()
            .with_caption(caption)
            .with_keyboard(menu::home_keyboard());
        self.send_photo_or_text(chat_id, &self.assets_dir.join(menu::THANKS_PHOTO), options)
            .await;
    }

    async fn send_welcome(&self, chat_id: ChatId) {
        let options = SendOptions::new()
            .with_caption(menu::WELCOME_CAPTION)
            .with_parse_mode(ParseMode::Markdown)
            .with_keyboard(menu::main_menu());
        self.send_photo_or_text(chat_id, &self.assets_dir.join(menu::WELCOME_PHOTO), options)
            .await;
    }

    /// Send a captioned photo; if that fails, send the caption as text.
    async fn send_photo_or_text(&self, chat_id: ChatId, photo: &Path, options: SendOptions) {
        let Err(e) = self.transport.send_photo(chat_id, photo, &options).await else {
            return;
        };
        tracing::warn!(
            chat_id,
            transport = self.transport.name(),
            photo = %photo.display(),
            error = %e,
            "Failed to send photo; falling back to text"
        );

        let mut text_options = options;
        let text = text_options.caption.take().unwrap_or_default();
        self.say(chat_id, &text, &text_options).await;
    }

    async fn say(&self, chat_id: ChatId, text: &str, options: &SendOptions) {
        if let Err(e) = self.transport.send_text(chat_id, text, options).await {
            tracing::warn!(
                chat_id,
                transport = self.transport.name(),
                error = %e,
                "Failed to send message"
            );
        }
    }

    async fn delete_quietly(&self, chat_id: ChatId, message_id: MessageId) {
        if let Err(e) = self.transport.delete_message(chat_id, message_id).await {
            tracing::debug!(
                chat_id,
                message_id,
                transport = self.transport.name(),
                error = %e,
                "Failed to delete message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::recording::{RecordingTransport, Sent};
    use crate::intake::{InMemorySessionStore, IntakePhase};
    use crate::moderation::relay::{ACCEPTED_TEXT, REJECTED_TEXT};

    const MODERATORS: ChatId = -100;

    fn bot() -> (IntakeBot, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let bot = IntakeBot::new(
            transport.clone(),
            Arc::new(InMemorySessionStore::new()),
            MODERATORS,
            PathBuf::from("assets"),
        );
        (bot, transport)
    }

    fn text(chat_id: ChatId, message_id: MessageId, text: &str) -> IncomingEvent {
        IncomingEvent::Text {
            chat_id,
            message_id,
            text: text.into(),
        }
    }

    fn press(chat_id: ChatId, message_id: MessageId, data: &str) -> IncomingEvent {
        IncomingEvent::ButtonPress {
            callback_id: format!("cb-{message_id}"),
            chat_id,
            message_id,
            data: data.into(),
        }
    }

    #[test]
    fn command_matching() {
        assert!(is_command("/start", "/start"));
        assert!(is_command("/start@intake_bot", "/start"));
        assert!(is_command("/start ref42", "/start"));
        assert!(!is_command("/started", "/start"));
        assert!(!is_command("start", "/start"));
    }

    #[tokio::test]
    async fn start_sends_welcome_photo_with_menu() {
        let (bot, transport) = bot();
        bot.handle(text(1, 1, "/start")).await.unwrap();

        let sent = transport.sent();
        let [Sent::Photo {
            chat_id,
            photo,
            options,
        }] = sent.as_slice()
        else {
            panic!("expected one photo, got {sent:?}");
        };
        assert_eq!(*chat_id, 1);
        assert_eq!(photo, &PathBuf::from("assets").join(menu::WELCOME_PHOTO));
        assert_eq!(options.parse_mode, Some(ParseMode::Markdown));
        assert_eq!(options.caption.as_deref(), Some(menu::WELCOME_CAPTION));
        assert_eq!(options.keyboard, Some(menu::main_menu()));
    }

    #[tokio::test]
    async fn welcome_falls_back_to_text_without_photo() {
        let (bot, transport) = bot();
        transport.fail_photos();
        bot.handle(text(1, 1, "/start")).await.unwrap();

        let sent = transport.sent();
        let [Sent::Text { text, options, .. }] = sent.as_slice() else {
            panic!("expected one text, got {sent:?}");
        };
        assert_eq!(text, menu::WELCOME_CAPTION);
        assert_eq!(options.keyboard, Some(menu::main_menu()));
        assert_eq!(options.caption, None);
    }

    #[tokio::test]
    async fn full_intake_flow() {
        let (bot, transport) = bot();

        bot.handle(press(42, 5, "publisher")).await.unwrap();
        bot.handle(text(42, 6, "Olena")).await.unwrap();
        bot.handle(text(42, 7, "olena@example.com")).await.unwrap();
        bot.handle(text(42, 8, "secret123")).await.unwrap();

        assert_eq!(
            transport.texts_to(42),
            vec![
                prompts::ASK_NAME.to_string(),
                prompts::ask_email("Olena"),
                prompts::ASK_PASSWORD.to_string(),
                prompts::submitted("Olena"),
            ]
        );

        // Button message, then the email and password messages.
        assert_eq!(transport.deleted_in(42), vec![5, 7, 8]);

        let review = transport.texts_to(MODERATORS);
        assert_eq!(review.len(), 1);
        assert!(review[0].contains("Olena"));
        assert!(review[0].contains("`olena@example\\.com`"));
        assert!(review[0].contains("||secret123||"));

        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::Idle);
    }

    #[tokio::test]
    async fn confirmation_carries_home_button() {
        let (bot, transport) = bot();
        bot.handle(text(42, 1, menu::PUBLISHER_LABEL)).await.unwrap();
        bot.handle(text(42, 2, "Olena")).await.unwrap();
        bot.handle(text(42, 3, "olena@example.com")).await.unwrap();
        bot.handle(text(42, 4, "pw")).await.unwrap();

        let last = transport.sent().pop().unwrap();
        let Sent::Photo { photo, options, .. } = last else {
            panic!("expected the thanks photo last");
        };
        assert!(photo.ends_with(menu::THANKS_PHOTO));
        assert_eq!(options.keyboard, Some(menu::home_keyboard()));
    }

    #[tokio::test]
    async fn invalid_email_reprompts_once() {
        let (bot, transport) = bot();
        bot.handle(press(42, 5, "publisher")).await.unwrap();
        bot.handle(text(42, 6, "Olena")).await.unwrap();
        bot.handle(text(42, 7, "not-an-email")).await.unwrap();
        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::AwaitingEmail);
        bot.handle(text(42, 8, "olena@example.com")).await.unwrap();

        let texts = transport.texts_to(42);
        assert_eq!(
            texts.iter().filter(|t| *t == prompts::INVALID_EMAIL).count(),
            1
        );
        assert_eq!(texts.last().unwrap(), prompts::ASK_PASSWORD);
        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::AwaitingPassword);
    }

    #[tokio::test]
    async fn idle_text_gets_no_reply() {
        let (bot, transport) = bot();
        bot.handle(text(42, 1, "hello?")).await.unwrap();
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn start_mid_form_does_not_become_an_answer() {
        let (bot, _transport) = bot();
        bot.handle(press(42, 1, "publisher")).await.unwrap();
        bot.handle(text(42, 2, "/start")).await.unwrap();
        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::AwaitingName);
    }

    #[tokio::test]
    async fn cancel_drops_the_form() {
        let (bot, transport) = bot();
        bot.handle(press(42, 1, "publisher")).await.unwrap();
        bot.handle(text(42, 2, "Olena")).await.unwrap();
        bot.handle(text(42, 3, "/cancel")).await.unwrap();

        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::Idle);
        assert_eq!(transport.texts_to(42).last().unwrap(), prompts::CANCELLED);

        transport.clear();
        bot.handle(text(42, 4, "/cancel")).await.unwrap();
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn menu_labels_and_buttons() {
        let (bot, transport) = bot();
        bot.handle(text(1, 1, menu::ABOUT_LABEL)).await.unwrap();
        bot.handle(text(1, 2, menu::SUPPORT_LABEL)).await.unwrap();
        bot.handle(press(1, 3, "join")).await.unwrap();
        bot.handle(press(1, 4, "info")).await.unwrap();

        assert_eq!(
            transport.texts_to(1),
            vec![
                menu::ABOUT_TEXT.to_string(),
                menu::SUPPORT_TEXT.to_string(),
                menu::JOIN_TEXT.to_string(),
                menu::ABOUT_TEXT.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_button_is_answered_not_fatal() {
        let (bot, transport) = bot();
        bot.handle(press(1, 9, "bogus")).await.unwrap();

        assert_eq!(transport.texts_to(1), vec![menu::UNKNOWN_OPTION.to_string()]);
        assert!(transport.sent().contains(&Sent::Answered {
            callback_id: "cb-9".into()
        }));
    }

    #[tokio::test]
    async fn accept_notifies_user_and_removes_request() {
        let (bot, transport) = bot();
        bot.handle(press(MODERATORS, 77, "accept_publisher_42"))
            .await
            .unwrap();

        assert_eq!(transport.deleted_in(MODERATORS), vec![77]);
        assert_eq!(transport.texts_to(42), vec![ACCEPTED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn reject_notifies_user() {
        let (bot, transport) = bot();
        bot.handle(press(MODERATORS, 78, "cancel_publisher_42"))
            .await
            .unwrap();
        assert_eq!(transport.texts_to(42), vec![REJECTED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn decision_from_other_chat_is_ignored() {
        let (bot, transport) = bot();
        bot.handle(press(42, 1, "accept_publisher_42")).await.unwrap();
        assert_eq!(transport.texts_to(42), vec![menu::UNKNOWN_OPTION.to_string()]);
    }

    #[tokio::test]
    async fn blocked_user_does_not_break_moderation() {
        let (bot, transport) = bot();
        transport.fail_for(42);
        bot.handle(press(MODERATORS, 1, "accept_publisher_42"))
            .await
            .unwrap();
        bot.handle(press(MODERATORS, 2, "cancel_publisher_43"))
            .await
            .unwrap();
        assert_eq!(transport.texts_to(43), vec![REJECTED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn send_failures_do_not_corrupt_the_session() {
        let (bot, transport) = bot();
        transport.fail_for(42);

        bot.handle(press(42, 1, "publisher")).await.unwrap();
        bot.handle(text(42, 2, "Olena")).await.unwrap();
        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::AwaitingEmail);
        bot.handle(text(42, 3, "olena@example.com")).await.unwrap();
        bot.handle(text(42, 4, "pw")).await.unwrap();

        assert_eq!(bot.flow().phase(42).await.unwrap(), IntakePhase::Idle);
        assert_eq!(transport.texts_to(MODERATORS).len(), 1);
    }

    #[tokio::test]
    async fn concurrent_users_do_not_interfere() {
        let (bot, transport) = bot();
        bot.handle(press(1, 100, "publisher")).await.unwrap();
        bot.handle(press(2, 200, "publisher")).await.unwrap();
        bot.handle(text(1, 101, "Olena")).await.unwrap();
        bot.handle(text(2, 201, "Taras")).await.unwrap();
        bot.handle(text(2, 202, "taras@example.com")).await.unwrap();
        bot.handle(text(1, 102, "olena@example.com")).await.unwrap();
        bot.handle(text(1, 103, "pw-one")).await.unwrap();
        bot.handle(text(2, 203, "pw-two")).await.unwrap();

        let review = transport.texts_to(MODERATORS);
        assert_eq!(review.len(), 2);
        assert!(review[0].contains("Olena") && review[0].contains("pw\\-one"));
        assert!(!review[0].contains("Taras") && !review[0].contains("pw\\-two"));
        assert!(review[1].contains("Taras") && review[1].contains("taras@example\\.com"));
        assert!(!review[1].contains("Olena"));

        assert_eq!(transport.deleted_in(1), vec![100, 102, 103]);
        assert_eq!(transport.deleted_in(2), vec![200, 202, 203]);
    }
}
