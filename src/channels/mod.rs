//! Messaging transports.

#[cfg(test)]
pub(crate) mod recording;
pub mod telegram;
pub mod transport;

pub use telegram::{TelegramChannel, parse_update};
pub use transport::*;
