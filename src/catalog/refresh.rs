//! Catalog refresh - fetch, build, install
//!
//! A refresh builds a brand-new generation from a fresh fetch and installs
//! it only on full success; a failure at any step leaves the previous
//! generation current, so navigation keeps serving stale-but-valid data
//! through transient source outages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::builder;
use crate::catalog::index::CatalogIndex;
use crate::catalog::source::ContentSource;
use crate::types::Result;

/// Runs the fetch -> build -> install pipeline against a content source
pub struct Refresher {
    source: Arc<dyn ContentSource>,
    index: Arc<CatalogIndex>,
    root_key: String,
}

impl Refresher {
    pub fn new(source: Arc<dyn ContentSource>, index: Arc<CatalogIndex>, root_key: impl Into<String>) -> Self {
        Self {
            source,
            index,
            root_key: root_key.into(),
        }
    }

    /// Fetch the document and publish a new generation.
    ///
    /// Nothing is installed unless both the fetch and the build succeed,
    /// so a cancelled or failed refresh cannot corrupt the live tree.
    pub async fn refresh(&self) -> Result<()> {
        let document = self.source.fetch().await?;
        let generation = builder::build(&document, &self.root_key)?;
        self.index.install(generation);
        Ok(())
    }
}

/// Spawn the periodic refresh loop.
///
/// Ticks at `interval` (the first tick fires after one full interval; the
/// startup fetch is the caller's job) and exits when the shutdown signal
/// flips.
pub fn spawn_refresh_task(
    refresher: Arc<Refresher>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Catalog refresh task started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick duplicates the startup fetch; skip it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match refresher.refresh().await {
                        Ok(()) => info!("Catalog refreshed"),
                        Err(e) => warn!(error = %e, "Catalog refresh failed, previous generation stays current"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Catalog refresh task stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignpostError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Stub source that serves a queue of canned results
    struct ScriptedSource {
        responses: Mutex<Vec<Result<Value>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ContentSource for ScriptedSource {
        async fn fetch(&self) -> Result<Value> {
            self.responses
                .lock()
                .unwrap()
                .remove(0)
        }
    }

    fn document() -> Value {
        json!({
            "1": {
                "name": "Root",
                "subfolders": {
                    "2": { "name": "Child", "subfolders": {} }
                }
            }
        })
    }

    #[tokio::test]
    async fn successful_refresh_installs_a_generation() {
        let index = Arc::new(CatalogIndex::new());
        let source = Arc::new(ScriptedSource::new(vec![Ok(document())]));
        let refresher = Refresher::new(source, Arc::clone(&index), "1");

        refresher.refresh().await.expect("refresh should succeed");
        assert!(index.resolve("2").is_ok());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_previous_generation_current() {
        let index = Arc::new(CatalogIndex::new());
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(document()),
            Err(SignpostError::Fetch("connection refused".into())),
        ]));
        let refresher = Refresher::new(source, Arc::clone(&index), "1");

        refresher.refresh().await.unwrap();
        let err = refresher.refresh().await.unwrap_err();
        assert!(matches!(err, SignpostError::Fetch(_)));

        // No downtime: the earlier tree still resolves
        assert!(index.resolve("1").is_ok());
        assert!(index.resolve("2").is_ok());
    }

    #[tokio::test]
    async fn malformed_document_never_installs_partially() {
        let index = Arc::new(CatalogIndex::new());
        let bad = json!({
            "1": {
                "name": "Root",
                "subfolders": {
                    "2": { "url": "https://x", "subfolders": {} }
                }
            }
        });
        let source = Arc::new(ScriptedSource::new(vec![Ok(document()), Ok(bad)]));
        let refresher = Refresher::new(source, Arc::clone(&index), "1");

        refresher.refresh().await.unwrap();
        assert!(matches!(
            refresher.refresh().await.unwrap_err(),
            SignpostError::Build(_)
        ));

        // The malformed rebuild did not touch the published tree
        assert!(index.resolve("2").is_ok());
    }
}
