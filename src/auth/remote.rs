//! External authorization service client
//!
//! Optional second source of truth after a membership-store miss:
//! `GET <base>/<identity>` answering `{"authorization": "authorized"}`
//! for members and anything else otherwise.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::types::{Result, SignpostError};

const AUTHORIZED: &str = "authorized";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    authorization: String,
}

/// HTTP client for the authorization service
pub struct RemoteAuthClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteAuthClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Query the service for one identity; bounded wait, transient on expiry
    pub async fn is_authorized(&self, identity: i64) -> Result<bool> {
        let url = format!("{}/{}", self.base_url, identity);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SignpostError::Fetch(format!("authorization request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SignpostError::Fetch(format!(
                "authorization service returned HTTP {}",
                response.status()
            )));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| SignpostError::Fetch(format!("authorization decode failed: {e}")))?;

        let authorized = body.authorization == AUTHORIZED;
        debug!(identity = identity, authorized = authorized, "Remote authorization checked");
        Ok(authorized)
    }
}
