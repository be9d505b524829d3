//! Authorization for Signpost
//!
//! Provides:
//! - Two-tier membership checks (local confirmed set, then the store)
//! - Phone-suffix contact linking for first-time users
//! - An optional external authorization HTTP service

pub mod cache;
pub mod remote;

pub use cache::Authorizer;
pub use remote::RemoteAuthClient;
