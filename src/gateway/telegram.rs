//! Telegram Bot API gateway
//!
//! Thin long-poll client over the Bot API HTTP surface: `getUpdates` for
//! the inbound stream, `sendMessage`/`deleteMessage` for the outbound
//! side. Menus become `inline_keyboard` markup; navigation buttons carry
//! their action token as `callback_data`, link buttons carry a bare `url`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::gateway::{ChatGateway, Contact, InboundEvent};
use crate::nav::{Button, ButtonAction, Menu};
use crate::types::{Result, SignpostError};

const LONG_POLL_SECS: u64 = 25;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    from: Option<User>,
    chat: Chat,
    text: Option<String>,
    contact: Option<WireContact>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WireContact {
    phone_number: String,
    #[serde(default)]
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    from: User,
    message: Option<Message>,
    data: Option<String>,
}

// ============================================================================
// Gateway
// ============================================================================

/// Long-polling Telegram Bot API client
pub struct TelegramGateway {
    client: reqwest::Client,
    /// `<api base>/bot<token>`
    base: String,
    /// Next update id to request; advances past every delivered update
    offset: AtomicI64,
    send_timeout: Duration,
}

impl TelegramGateway {
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        token: &str,
        send_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            offset: AtomicI64::new(0),
            send_timeout,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base, method);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SignpostError::Delivery(format!("{method} request failed: {e}")))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| SignpostError::Delivery(format!("{method} decode failed: {e}")))?;

        if !body.ok {
            return Err(SignpostError::Delivery(format!(
                "{method} rejected: {}",
                body.description.unwrap_or_else(|| "no description".into())
            )));
        }

        body.result
            .ok_or_else(|| SignpostError::Delivery(format!("{method} returned no result")))
    }

    fn convert(update: Update) -> Option<InboundEvent> {
        if let Some(callback) = update.callback_query {
            let message = callback.message?;
            return Some(InboundEvent::Callback {
                chat_id: message.chat.id,
                from_id: callback.from.id,
                message_id: message.message_id,
                data: callback.data?,
            });
        }

        if let Some(message) = update.message {
            let from_id = message.from.as_ref()?.id;
            return Some(InboundEvent::Message {
                chat_id: message.chat.id,
                from_id,
                text: message.text,
                contact: message.contact.map(|c| Contact {
                    phone_number: c.phone_number,
                    first_name: c.first_name.unwrap_or_default(),
                }),
            });
        }

        None
    }
}

/// Menu rows as Bot API `inline_keyboard` markup
fn inline_keyboard(menu: &Menu) -> Value {
    let rows: Vec<Vec<Value>> = menu
        .rows
        .iter()
        .map(|row| row.iter().map(button_json).collect())
        .collect();
    json!({ "inline_keyboard": rows })
}

fn button_json(button: &Button) -> Value {
    match &button.action {
        ButtonAction::Navigate(token) => json!({
            "text": button.label,
            "callback_data": token,
        }),
        ButtonAction::Open(url) => json!({
            "text": button.label,
            "url": url,
        }),
    }
}

#[async_trait::async_trait]
impl ChatGateway for TelegramGateway {
    async fn send_menu(&self, chat_id: i64, text: &str, menu: &Menu) -> Result<()> {
        self.call::<Value>(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": inline_keyboard(menu),
            }),
            self.send_timeout,
        )
        .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call::<Value>(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": { "remove_keyboard": true },
            }),
            self.send_timeout,
        )
        .await?;
        Ok(())
    }

    async fn request_contact(&self, chat_id: i64, text: &str, button_label: &str) -> Result<()> {
        self.call::<Value>(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": {
                    "keyboard": [[ { "text": button_label, "request_contact": true } ]],
                    "resize_keyboard": true,
                },
            }),
            self.send_timeout,
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.call::<Value>(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
            self.send_timeout,
        )
        .await?;
        Ok(())
    }

    async fn poll_events(&self) -> Result<Vec<InboundEvent>> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": LONG_POLL_SECS,
                    "allowed_updates": ["message", "callback_query"],
                }),
                // The HTTP wait must outlive the server-side long poll
                Duration::from_secs(LONG_POLL_SECS) + self.send_timeout,
            )
            .await?;

        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(max_id + 1, Ordering::SeqCst);
        }

        let events: Vec<InboundEvent> = updates.into_iter().filter_map(Self::convert).collect();
        if !events.is_empty() {
            debug!(events = events.len(), "Inbound events received");
        }
        Ok(events)
    }
}
