//! Intake — the name → email → password form each user fills in.
//!
//! Sessions live in a [`SessionStore`]; [`IntakeFlow`] applies input to them
//! and hands back an [`Outcome`] describing what the bot should say. A
//! finished form becomes a [`SubmissionRecord`](crate::moderation::SubmissionRecord).

pub mod flow;
pub mod prompts;
pub mod state;
pub mod store;
pub mod validation;

pub use flow::{IntakeFlow, Outcome};
pub use state::{IntakePhase, Session};
pub use store::{InMemorySessionStore, SessionStore};
pub use validation::is_valid_email;
