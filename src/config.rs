//! Configuration for Signpost
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::time::Duration;

/// Signpost - knowledge-base navigation bot gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "signpost")]
#[command(about = "Serves a remotely-hosted knowledge base as a stateless button-menu bot")]
pub struct Args {
    /// Bot API token for the chat transport
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: String,

    /// Base URL of the Bot API (override for self-hosted gateways and tests)
    #[arg(long, env = "BOT_API_URL", default_value = "https://api.telegram.org")]
    pub bot_api_url: String,

    /// Remote content source URL (returns the {status, data, errors} envelope)
    #[arg(long, env = "SOURCE_URL")]
    pub source_url: String,

    /// HTTP Basic login for the content source
    #[arg(long, env = "SOURCE_LOGIN")]
    pub source_login: String,

    /// HTTP Basic password for the content source
    #[arg(long, env = "SOURCE_PASSWORD")]
    pub source_password: String,

    /// Document key of the knowledge-base root folder
    #[arg(long, env = "ROOT_KEY", default_value = "2523")]
    pub root_key: String,

    /// Prefix distinguishing this bot's action tokens from any other callback payload
    #[arg(long, env = "TOKEN_PREFIX", default_value = "kb:")]
    pub token_prefix: String,

    /// Refresh interval for the content source, in seconds
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "3600")]
    pub refresh_interval_secs: u64,

    /// Timeout for content source and authorization service requests, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// MongoDB connection URI for the membership store
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "signpost")]
    pub mongodb_db: String,

    /// External authorization service base URL (optional; consulted after a store miss)
    #[arg(long, env = "AUTH_SERVICE_URL")]
    pub auth_service_url: Option<String>,

    /// Label for the "back" control
    #[arg(long, env = "BACK_LABEL", default_value = "\u{2B05}")]
    pub back_label: String,

    /// Label for the "home" control
    #[arg(long, env = "HOME_LABEL", default_value = "\u{1F3E0}")]
    pub home_label: String,

    /// Greeting shown to unauthorized users along with the contact-request keyboard
    #[arg(
        long,
        env = "GREETING_TEXT",
        default_value = "This bot serves the knowledge base. Please share your contact details to continue."
    )]
    pub greeting_text: String,

    /// Label on the "share contact" reply-keyboard button
    #[arg(long, env = "SHARE_CONTACT_LABEL", default_value = "Share contact details")]
    pub share_contact_label: String,

    /// Prompt shown above the root menu
    #[arg(long, env = "MENU_TEXT", default_value = "Knowledge base. Choose a section")]
    pub menu_text: String,

    /// Prompt shown above non-root menus
    #[arg(long, env = "SECTION_TEXT", default_value = "Open a link to view, or keep navigating")]
    pub section_text: String,

    /// Reply sent when an action token is stale or invalid
    #[arg(
        long,
        env = "EXPIRED_TEXT",
        default_value = "This menu has expired. Clear the history and start again"
    )]
    pub expired_text: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Refresh interval as a Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token_prefix.is_empty() {
            return Err("TOKEN_PREFIX must not be empty".to_string());
        }
        if self.root_key.is_empty() {
            return Err("ROOT_KEY must not be empty".to_string());
        }
        if self.refresh_interval_secs == 0 {
            return Err("REFRESH_INTERVAL_SECS must be positive".to_string());
        }
        Ok(())
    }
}
