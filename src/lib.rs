//! Signpost - knowledge-base navigation bot gateway
//!
//! Serves a remotely-hosted, hierarchically organized knowledge base
//! (folders containing sub-folders and links) as a stateless button-menu
//! bot. All navigational state rides in the action token a pressed button
//! carries back; the catalog is rebuilt from the remote source on an
//! interval and swapped in atomically under live traffic.
//!
//! ## Components
//!
//! - **Catalog**: source document parsing, generation lifecycle, refresh
//! - **Nav**: action-token codec and menu rendering
//! - **Auth**: two-tier membership checks with phone-contact linking
//! - **Gateway**: chat transport boundary, Telegram implementation,
//!   inbound event dispatch

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod gateway;
pub mod nav;
pub mod types;

pub use config::Args;
pub use types::{Result, SignpostError};
