//! Catalog index - the published-generation holder
//!
//! Exactly one generation is current at any instant. A rebuild constructs
//! an isolated [`Generation`] and publishes it with a single swap; readers
//! that grabbed a snapshot before the swap finish against the old tree,
//! which is freed by `Arc` ownership once the last snapshot drops. The
//! index is never mutated in place while readers may be resolving.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::catalog::builder::{Folder, Generation};
use crate::types::{Result, SignpostError};

/// Holder for the currently published catalog generation
#[derive(Default)]
pub struct CatalogIndex {
    current: RwLock<Option<Arc<Generation>>>,
}

impl CatalogIndex {
    /// Create an index with no generation installed yet
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Atomically replace the published generation.
    ///
    /// Every `snapshot`/`resolve` call that starts after this returns
    /// observes the new generation.
    pub fn install(&self, generation: Generation) {
        let folders = generation.folder_count();
        let root_id = generation.root_id().to_string();
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(Arc::new(generation));
        drop(guard);
        info!(root_id = %root_id, folders = folders, "Catalog generation installed");
    }

    /// Grab the generation that is current right now.
    ///
    /// Callers must not hold the snapshot across an await point when they
    /// intend "current at the moment of use" semantics; re-snapshot instead.
    pub fn snapshot(&self) -> Result<Arc<Generation>> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .ok_or_else(|| SignpostError::Internal("no catalog generation installed".into()))
    }

    /// Resolve a folder id against the current generation
    pub fn resolve(&self, id: &str) -> Result<(Arc<Generation>, Folder)> {
        let generation = self.snapshot()?;
        let folder = generation.folder(id)?.clone();
        Ok((generation, folder))
    }

    /// Whether any generation has been installed
    pub fn is_ready(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }
}
