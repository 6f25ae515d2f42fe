//! IntakeFlow — applies user input to a session and commits the result.
//!
//! The flow only decides and stores; it never talks to the transport. The
//! returned [`Outcome`] tells the caller what to say, and by the time the
//! caller says it the session change is already committed.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;

use super::state::{IntakePhase, Session, phase_of};
use super::store::SessionStore;
use super::validation::is_valid_email;
use crate::channels::{ChatId, MessageId};
use crate::error::StoreError;
use crate::moderation::SubmissionRecord;

/// What happened to a piece of user input.
#[derive(Debug)]
pub enum Outcome {
    /// The user has no active session, or the text was blank.
    Ignored,
    /// Name stored; ask for the email.
    NameAccepted { name: String },
    /// Email rejected; ask again.
    InvalidEmail,
    /// Email stored; ask for the password.
    EmailAccepted,
    /// Form finished. The session is gone and the record is ready for review.
    Completed(SubmissionRecord),
}

/// Compute the next session for one input. `None` means the user is idle.
fn transition(
    session: Session,
    user: ChatId,
    message_id: MessageId,
    text: &str,
) -> (Option<Session>, Outcome) {
    match session {
        Session::AwaitingName => {
            let name = text.to_string();
            (
                Some(Session::AwaitingEmail { name: name.clone() }),
                Outcome::NameAccepted { name },
            )
        }
        Session::AwaitingEmail { name } => {
            if is_valid_email(text) {
                (
                    Some(Session::AwaitingPassword {
                        name,
                        email: text.to_string(),
                        email_message_id: message_id,
                    }),
                    Outcome::EmailAccepted,
                )
            } else {
                (Some(Session::AwaitingEmail { name }), Outcome::InvalidEmail)
            }
        }
        Session::AwaitingPassword {
            name,
            email,
            email_message_id,
        } => {
            let record = SubmissionRecord {
                user_id: user,
                name,
                email,
                password: SecretString::from(text.to_string()),
                sensitive_messages: vec![email_message_id, message_id],
            };
            (None, Outcome::Completed(record))
        }
    }
}

/// Drives every user's intake through a shared [`SessionStore`].
///
/// Webhook updates are served concurrently, so every read-modify-write of a
/// session runs under `turn`. Two answers racing for the same session see
/// it one after the other, and a form completes exactly once.
pub struct IntakeFlow {
    store: Arc<dyn SessionStore>,
    turn: Mutex<()>,
}

impl IntakeFlow {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            turn: Mutex::new(()),
        }
    }

    /// Current phase for a user.
    pub async fn phase(&self, user: ChatId) -> Result<IntakePhase, StoreError> {
        Ok(phase_of(self.store.get(user).await?.as_ref()))
    }

    /// Start (or restart) the form. Any partial answers are discarded.
    pub async fn begin(&self, user: ChatId) -> Result<(), StoreError> {
        let _turn = self.turn.lock().await;
        let previous = self.store.delete(user).await?;
        if let Some(ref old) = previous {
            tracing::info!(chat_id = user, phase = %old.phase(), "Restarting intake");
        }
        self.store.set(user, Session::AwaitingName).await?;
        tracing::info!(chat_id = user, "Intake started");
        Ok(())
    }

    /// Abandon the form. Returns whether there was anything to cancel.
    pub async fn cancel(&self, user: ChatId) -> Result<bool, StoreError> {
        let _turn = self.turn.lock().await;
        let removed = self.store.delete(user).await?;
        if let Some(ref old) = removed {
            tracing::info!(chat_id = user, phase = %old.phase(), "Intake cancelled");
        }
        Ok(removed.is_some())
    }

    /// Apply a text message to the user's session.
    pub async fn handle_text(
        &self,
        user: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<Outcome, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Ignored);
        }

        let turn = self.turn.lock().await;
        let Some(session) = self.store.get(user).await? else {
            return Ok(Outcome::Ignored);
        };

        let from = session.phase();
        let (next, outcome) = transition(session, user, message_id, text);
        let to = phase_of(next.as_ref());
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");

        match next {
            Some(session) => self.store.set(user, session).await?,
            None => {
                self.store.delete(user).await?;
            }
        }
        drop(turn);

        match outcome {
            Outcome::InvalidEmail => {
                tracing::debug!(chat_id = user, "Rejected malformed email");
            }
            Outcome::Completed(_) => {
                tracing::info!(chat_id = user, "Intake completed");
            }
            _ => {
                tracing::debug!(chat_id = user, from = %from, to = %to, "Intake advanced");
            }
        }

        Ok(outcome)
    }
}
