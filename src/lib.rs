//! Publisher intake — a Telegram bot that collects access requests and
//! routes them through a moderation chat.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod moderation;
pub mod server;

pub use error::{Error, Result};
