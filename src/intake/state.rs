//! Intake state machine — which question the user is answering and the
//! answers collected so far.

use serde::{Deserialize, Serialize};

use crate::channels::MessageId;

/// Coarse phase of a user's intake, used for logging and inspection.
///
/// Progresses linearly: Idle → AwaitingName → AwaitingEmail →
/// AwaitingPassword → Idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakePhase {
    #[default]
    Idle,
    AwaitingName,
    AwaitingEmail,
    AwaitingPassword,
}

impl IntakePhase {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Restarting from any phase and cancelling back to idle are allowed;
    /// an invalid email keeps the user where they are.
    pub fn can_transition_to(&self, target: IntakePhase) -> bool {
        use IntakePhase::*;
        matches!(
            (self, target),
            (_, AwaitingName)
                | (_, Idle)
                | (AwaitingName, AwaitingEmail)
                | (AwaitingEmail, AwaitingEmail)
                | (AwaitingEmail, AwaitingPassword)
        )
    }
}

impl std::fmt::Display for IntakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingEmail => "awaiting_email",
            Self::AwaitingPassword => "awaiting_password",
        };
        write!(f, "{s}")
    }
}

/// An in-progress intake. Each variant owns exactly the answers collected
/// before it, so a password can never sit next to a missing email.
///
/// A user with no session is idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    AwaitingName,
    AwaitingEmail {
        name: String,
    },
    AwaitingPassword {
        name: String,
        email: String,
        /// Message that carried the email, deleted once the form completes.
        email_message_id: MessageId,
    },
}

impl Session {
    pub fn phase(&self) -> IntakePhase {
        match self {
            Self::AwaitingName => IntakePhase::AwaitingName,
            Self::AwaitingEmail { .. } => IntakePhase::AwaitingEmail,
            Self::AwaitingPassword { .. } => IntakePhase::AwaitingPassword,
        }
    }
}

/// Phase of an optional session; `None` is idle.
pub fn phase_of(session: Option<&Session>) -> IntakePhase {
    session.map(Session::phase).unwrap_or_default()
}
