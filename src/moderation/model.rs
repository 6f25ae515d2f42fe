//! Moderation data: the submission handed over by the intake flow and the
//! decision a moderator makes about it.

use secrecy::SecretString;

use crate::channels::{ChatId, MessageId};

/// Callback prefix of the approve button.
pub const ACCEPT_PREFIX: &str = "accept_publisher_";

/// Callback prefix of the reject button.
pub const REJECT_PREFIX: &str = "cancel_publisher_";

/// A completed intake form. Produced once per finished session and moved
/// into the relay; nothing keeps a copy.
#[derive(Debug)]
pub struct SubmissionRecord {
    pub user_id: ChatId,
    pub name: String,
    pub email: String,
    pub password: SecretString,
    /// Messages in the user's chat that carried the email and password.
    pub sensitive_messages: Vec<MessageId>,
}

/// Outcome chosen by a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Accepted,
    Rejected,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// A decision about one user's submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationDecision {
    pub kind: DecisionKind,
    pub user_id: ChatId,
}

impl ModerationDecision {
    pub fn accepted(user_id: ChatId) -> Self {
        Self {
            kind: DecisionKind::Accepted,
            user_id,
        }
    }

    pub fn rejected(user_id: ChatId) -> Self {
        Self {
            kind: DecisionKind::Rejected,
            user_id,
        }
    }

    /// Parse a button callback token.
    ///
    /// Returns `None` when the token is not a moderation action: unknown
    /// prefix, or a suffix that is not a user id.
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(id) = token.strip_prefix(ACCEPT_PREFIX) {
            return id.parse().ok().map(Self::accepted);
        }
        if let Some(id) = token.strip_prefix(REJECT_PREFIX) {
            return id.parse().ok().map(Self::rejected);
        }
        None
    }

    /// Callback token for this decision; inverse of [`Self::from_token`].
    pub fn token(&self) -> String {
        let prefix = match self.kind {
            DecisionKind::Accepted => ACCEPT_PREFIX,
            DecisionKind::Rejected => REJECT_PREFIX,
        };
        format!("{prefix}{}", self.user_id)
    }
}
