//! Telegram Bot API client
//!
//! A minimal client for the slice of the Bot API the bot uses: getUpdates
//! long polling, sendMessage with reply keyboards, and webhook reset at
//! startup.

mod client;
mod types;

pub use client::{TelegramClient, TelegramError, TelegramErrorKind};
pub use types::*;
