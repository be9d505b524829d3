//! Inbound event dispatcher
//!
//! Routes every user action through the same strictly sequential steps:
//! resolve authorization, then render or act. Events from different users
//! are handled on their own tasks with no ordering between them. Delivery
//! failures are logged and swallowed per action; the receiver loop never
//! aborts on a bad event.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::Authorizer;
use crate::gateway::{ChatGateway, Contact, InboundEvent};
use crate::nav::Navigator;
use crate::types::{Result, SignpostError};

/// User-facing reply texts
#[derive(Debug, Clone)]
pub struct Texts {
    /// Shown with the contact-request keyboard
    pub greeting: String,
    /// Above the root menu
    pub menu: String,
    /// Above non-root menus
    pub section: String,
    /// Stale or foreign action token
    pub expired: String,
    /// Label on the share-contact button
    pub share_contact: String,
}

/// Receiver loop: polls the gateway and fans events out to handler tasks
pub struct Dispatcher<G: ChatGateway + 'static> {
    gateway: Arc<G>,
    navigator: Arc<Navigator>,
    auth: Arc<Authorizer>,
    texts: Texts,
}

impl<G: ChatGateway + 'static> Dispatcher<G> {
    pub fn new(
        gateway: Arc<G>,
        navigator: Arc<Navigator>,
        auth: Arc<Authorizer>,
        texts: Texts,
    ) -> Self {
        Self {
            gateway,
            navigator,
            auth,
            texts,
        }
    }

    /// Run until the shutdown signal flips.
    ///
    /// Each event is handled on its own task, so one slow external call
    /// never serializes other users' actions.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("Dispatcher started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Dispatcher stopping");
                    break;
                }
                polled = self.gateway.poll_events() => match polled {
                    Ok(events) => {
                        for event in events {
                            let dispatcher = Arc::clone(&self);
                            tokio::spawn(async move {
                                dispatcher.handle_event(event).await;
                            });
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Event poll failed, backing off");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }

    /// Handle one inbound event; failures are logged, never propagated
    pub async fn handle_event(&self, event: InboundEvent) {
        let outcome = match event {
            InboundEvent::Message {
                chat_id,
                from_id,
                text,
                contact,
            } => self.handle_message(chat_id, from_id, text, contact).await,
            InboundEvent::Callback {
                chat_id,
                from_id,
                message_id,
                data,
            } => self.handle_callback(chat_id, from_id, message_id, &data).await,
        };

        if let Err(e) = outcome {
            match e {
                SignpostError::Delivery(_) => warn!(error = %e, "Outgoing message dropped"),
                other => warn!(error = %other, "Event handling failed"),
            }
        }
    }

    async fn handle_message(
        &self,
        chat_id: i64,
        from_id: i64,
        text: Option<String>,
        contact: Option<Contact>,
    ) -> Result<()> {
        if self.auth.is_authorized(from_id).await? {
            debug!(identity = from_id, text = text.as_deref().unwrap_or(""), "Authorized message");
            return self.send_root(chat_id).await;
        }

        if let Some(contact) = contact {
            info!(identity = from_id, "Contact shared by unauthorized user");
            if self
                .auth
                .link_phone_to_identity(&contact.phone_number, from_id)
                .await?
            {
                let welcome = format!("Hello, {}", contact.first_name);
                self.gateway.send_text(chat_id, &welcome).await?;
                return self.send_root(chat_id).await;
            }
            info!(identity = from_id, "Contact did not match any membership record");
        } else {
            debug!(identity = from_id, "Unauthorized message");
        }

        self.gateway
            .request_contact(chat_id, &self.texts.greeting, &self.texts.share_contact)
            .await
    }

    async fn handle_callback(
        &self,
        chat_id: i64,
        from_id: i64,
        message_id: i64,
        data: &str,
    ) -> Result<()> {
        if !self.auth.is_authorized(from_id).await? {
            return self
                .gateway
                .request_contact(chat_id, &self.texts.greeting, &self.texts.share_contact)
                .await;
        }

        debug!(identity = from_id, token = data, "Callback received");

        // Drop the pressed menu and answer concurrently; a failed delete
        // only costs screen clutter
        let (deleted, answered) = tokio::join!(
            self.gateway.delete_message(chat_id, message_id),
            self.answer_callback(chat_id, data),
        );
        if let Err(e) = deleted {
            debug!(error = %e, "Menu message delete failed");
        }
        answered
    }

    async fn answer_callback(&self, chat_id: i64, data: &str) -> Result<()> {
        let rendered = self
            .navigator
            .decode(data)
            .and_then(|id| self.navigator.render(id));

        match rendered {
            Ok(menu) => self.gateway.send_menu(chat_id, &self.texts.section, &menu).await,
            Err(e) if e.is_stale_navigation() => {
                info!(token = data, error = %e, "Stale navigation, prompting restart");
                self.gateway.send_text(chat_id, &self.texts.expired).await
            }
            Err(e) => Err(e),
        }
    }

    async fn send_root(&self, chat_id: i64) -> Result<()> {
        let menu = self.navigator.render_root()?;
        self.gateway.send_menu(chat_id, &self.texts.menu, &menu).await
    }
}
