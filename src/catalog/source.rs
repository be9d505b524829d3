//! Remote content source
//!
//! The knowledge base lives behind a single HTTP GET that returns an
//! envelope `{status, data, errors}` where `data` is itself a JSON-encoded
//! string holding the nested folder document, so the payload is decoded
//! twice. Authentication is HTTP Basic.
//!
//! The fetch sits behind a [`ContentSource`] trait so refresh logic can be
//! exercised against stubs without a network.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::{Result, SignpostError};

/// Source of the raw nested knowledge-base document
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch and decode the current document
    async fn fetch(&self) -> Result<Value>;
}

/// Response envelope of the remote source
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    /// JSON-encoded nested document, decoded a second time
    data: String,
    #[serde(default)]
    errors: Vec<Value>,
}

/// Decode the envelope body into the nested document
fn decode_envelope(body: &str) -> Result<Value> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| SignpostError::Fetch(format!("envelope decode failed: {e}")))?;

    if envelope.status != "success" {
        return Err(SignpostError::Fetch(format!(
            "source reported status '{}' with {} error(s)",
            envelope.status,
            envelope.errors.len()
        )));
    }

    serde_json::from_str(&envelope.data)
        .map_err(|e| SignpostError::Fetch(format!("document decode failed: {e}")))
}

/// HTTP content source with Basic auth and a bounded request timeout
pub struct HttpContentSource {
    client: reqwest::Client,
    url: String,
    login: String,
    password: String,
    timeout: Duration,
}

impl HttpContentSource {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            login: login.into(),
            password: password.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.login, Some(&self.password))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SignpostError::Fetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SignpostError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SignpostError::Fetch(format!("body read failed: {e}")))?;

        debug!(url = %self.url, bytes = body.len(), "Source document fetched");
        decode_envelope(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_decoded_twice() {
        let inner = r#"{"2523":{"name":"Root","subfolders":{}}}"#;
        let body = serde_json::json!({
            "status": "success",
            "data": inner,
            "errors": []
        })
        .to_string();

        let document = decode_envelope(&body).expect("envelope should decode");
        assert_eq!(document["2523"]["name"], "Root");
    }

    #[test]
    fn non_success_status_is_a_fetch_error() {
        let body = serde_json::json!({
            "status": "error",
            "data": "{}",
            "errors": ["boom"]
        })
        .to_string();

        assert!(matches!(
            decode_envelope(&body),
            Err(SignpostError::Fetch(_))
        ));
    }

    #[test]
    fn garbage_data_is_a_fetch_error() {
        let body = serde_json::json!({
            "status": "success",
            "data": "not json at all {"
        })
        .to_string();

        assert!(matches!(
            decode_envelope(&body),
            Err(SignpostError::Fetch(_))
        ));
    }
}
