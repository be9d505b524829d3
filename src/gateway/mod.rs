//! Chat gateway - the transport boundary
//!
//! The core treats the messaging transport purely as: send a text with an
//! optional button layout, delete a message, and an inbound stream of
//! message/callback events. [`ChatGateway`] is that boundary; the Telegram
//! Bot API implementation lives in [`telegram`], and tests use recording
//! stubs.

pub mod dispatch;
pub mod telegram;

use async_trait::async_trait;

use crate::nav::Menu;
use crate::types::Result;

pub use dispatch::{Dispatcher, Texts};
pub use telegram::TelegramGateway;

/// Shared contact payload from an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
}

/// One inbound user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Plain message: text, a shared contact, or anything else
    Message {
        chat_id: i64,
        from_id: i64,
        text: Option<String>,
        contact: Option<Contact>,
    },
    /// Button press carrying an action token
    Callback {
        chat_id: i64,
        from_id: i64,
        message_id: i64,
        data: String,
    },
}

/// Outbound operations and the inbound event stream
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a text with an inline button menu
    async fn send_menu(&self, chat_id: i64, text: &str, menu: &Menu) -> Result<()>;

    /// Send a plain text (any reply keyboard is withdrawn)
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a text with a reply keyboard requesting the user's contact
    async fn request_contact(&self, chat_id: i64, text: &str, button_label: &str) -> Result<()>;

    /// Delete a previously sent message
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    /// Wait for the next batch of inbound events (long poll)
    async fn poll_events(&self) -> Result<Vec<InboundEvent>>;
}
