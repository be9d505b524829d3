//! Catalog - the knowledge-base tree and its lifecycle
//!
//! A generation is one complete, immutable tree + id index built from a
//! single fetch of the source document. Rebuilds construct an isolated
//! generation and publish it atomically; readers always resolve against
//! whichever generation is current at the moment of use.

pub mod builder;
pub mod index;
pub mod refresh;
pub mod source;

pub use builder::{build, Folder, Generation, Link};
pub use index::CatalogIndex;
pub use refresh::{spawn_refresh_task, Refresher};
pub use source::{ContentSource, HttpContentSource};
