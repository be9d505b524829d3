//! Catalog builder - parses the nested source document into a generation
//!
//! The source document is a JSON map keyed by folder id. Each folder entry
//! carries a `name`, an optional `url`, and a `subfolders` map whose entries
//! are either a child folder (keyed by its id) or an array of link
//! descriptors belonging to the *current* folder:
//!
//! ```json
//! {
//!   "2523": {
//!     "name": "Knowledge_base",
//!     "url": null,
//!     "subfolders": {
//!       "2524": { "name": "Onboarding", "url": null, "subfolders": {} },
//!       "files": [ { "id": "9001", "name": "Intro", "url": "https://..." } ]
//!     }
//!   }
//! }
//! ```
//!
//! A build either produces a complete [`Generation`] or fails as a whole;
//! partial trees are never handed to the index.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Result, SignpostError};

// ============================================================================
// Tree nodes
// ============================================================================

/// Terminal, directly openable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Internal navigable node
///
/// Child and parent edges are plain folder ids; ownership of every folder
/// lives in the generation's id map, so no reference cycles arise. The
/// `BTreeMap` keys give the lexicographic-by-name ordering the menu
/// renderer relies on.
#[derive(Debug, Clone)]
pub struct Folder {
    pub id: String,
    /// Display label, underscores already normalized to spaces
    pub name: String,
    /// Direct destination when the folder itself is openable
    pub url: Option<String>,
    /// Owning folder id, `None` for the root
    pub parent: Option<String>,
    /// Display name -> child folder id
    pub subfolders: BTreeMap<String, String>,
    /// Display name -> link
    pub links: BTreeMap<String, Link>,
}

/// One complete, immutable tree + id index built from a single fetch
#[derive(Debug)]
pub struct Generation {
    root_id: String,
    folders: HashMap<String, Folder>,
}

impl Generation {
    /// Id of the root folder
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Look up a folder by id
    pub fn folder(&self, id: &str) -> Result<&Folder> {
        self.folders
            .get(id)
            .ok_or_else(|| SignpostError::NotFound(id.to_string()))
    }

    /// Number of folders in this generation
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Parse `document[root_key]` into a complete generation.
///
/// Folder ids are the document's own keys, so an id stays stable across
/// rebuilds as long as its source key is unchanged.
pub fn build(document: &Value, root_key: &str) -> Result<Generation> {
    let root = document
        .get(root_key)
        .and_then(Value::as_object)
        .ok_or_else(|| {
            SignpostError::Build(format!("root key '{root_key}' missing from document"))
        })?;

    let mut folders = HashMap::new();
    build_folder(root, root_key, None, &mut folders)?;

    debug!(
        root_key = root_key,
        folders = folders.len(),
        "Catalog generation built"
    );

    Ok(Generation {
        root_id: root_key.to_string(),
        folders,
    })
}

/// Depth-first folder construction.
///
/// The folder is registered in the index before its children are visited,
/// which makes a duplicate key collide deterministically instead of
/// silently overwriting an earlier entry.
fn build_folder(
    source: &serde_json::Map<String, Value>,
    key: &str,
    parent: Option<&str>,
    folders: &mut HashMap<String, Folder>,
) -> Result<()> {
    if folders.contains_key(key) {
        return Err(SignpostError::Build(format!(
            "duplicate folder id '{key}' in source document"
        )));
    }

    let name = source
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SignpostError::Build(format!("folder '{key}' is missing 'name'")))?
        .replace('_', " ");
    let url = source
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string);

    // Register before recursing so children see a complete ancestor chain
    folders.insert(
        key.to_string(),
        Folder {
            id: key.to_string(),
            name,
            url,
            parent: parent.map(str::to_string),
            subfolders: BTreeMap::new(),
            links: BTreeMap::new(),
        },
    );

    let entries = source
        .get("subfolders")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            SignpostError::Build(format!("folder '{key}' is missing the 'subfolders' map"))
        })?;

    let mut subfolders = BTreeMap::new();
    let mut links = BTreeMap::new();

    for (entry_key, entry) in entries {
        match entry {
            // An array entry is the current folder's direct links, not a child
            Value::Array(items) => {
                for item in items {
                    let link = parse_link(key, item)?;
                    if let Some(prior) = links.insert(link.name.clone(), link) {
                        warn!(
                            folder = key,
                            name = %prior.name,
                            "Duplicate link name in sibling set, keeping the later entry"
                        );
                    }
                }
            }
            Value::Object(child) => {
                build_folder(child, entry_key, Some(key), folders)?;
                // Child name was normalized during its own build
                let child_name = folders[entry_key.as_str()].name.clone();
                if let Some(prior) = subfolders.insert(child_name, entry_key.to_string()) {
                    warn!(
                        folder = key,
                        child = %prior,
                        "Duplicate subfolder name in sibling set, keeping the later entry"
                    );
                }
            }
            other => {
                return Err(SignpostError::Build(format!(
                    "folder '{key}' entry '{entry_key}' has unexpected shape: {other}"
                )));
            }
        }
    }

    // The placeholder registered above is still in place; fill in its edges
    let folder = folders
        .get_mut(key)
        .ok_or_else(|| SignpostError::Internal(format!("folder '{key}' vanished during build")))?;
    folder.subfolders = subfolders;
    folder.links = links;

    Ok(())
}

fn parse_link(folder_key: &str, item: &Value) -> Result<Link> {
    let obj = item.as_object().ok_or_else(|| {
        SignpostError::Build(format!("folder '{folder_key}' has a non-object link entry"))
    })?;

    let field = |name: &str| -> Result<String> {
        obj.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SignpostError::Build(format!(
                    "link in folder '{folder_key}' is missing '{name}'"
                ))
            })
    };

    Ok(Link {
        id: field("id")?,
        name: field("name")?,
        url: field("url")?,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "2523": {
                "name": "Knowledge_base",
                "url": null,
                "subfolders": {
                    "2530": {
                        "name": "B_section",
                        "url": "https://kb.example/2530",
                        "subfolders": {
                            "files": [
                                { "id": "9001", "name": "Z guide", "url": "https://kb.example/z" }
                            ]
                        }
                    },
                    "2524": {
                        "name": "Alpha",
                        "url": null,
                        "subfolders": {}
                    },
                    "files": [
                        { "id": "9000", "name": "Intro video", "url": "https://kb.example/intro" }
                    ]
                }
            }
        })
    }

    #[test]
    fn every_reachable_node_is_indexed() {
        let gen = build(&sample_document(), "2523").expect("build should succeed");

        assert_eq!(gen.root_id(), "2523");
        assert_eq!(gen.folder_count(), 3);
        for id in ["2523", "2524", "2530"] {
            assert!(gen.folder(id).is_ok(), "folder {id} should be indexed");
        }
        assert!(gen.folder("2523").unwrap().parent.is_none());
        assert_eq!(gen.folder("2524").unwrap().parent.as_deref(), Some("2523"));
    }

    #[test]
    fn underscores_become_spaces() {
        let gen = build(&sample_document(), "2523").unwrap();
        assert_eq!(gen.folder("2523").unwrap().name, "Knowledge base");
        assert_eq!(gen.folder("2530").unwrap().name, "B section");
    }

    #[test]
    fn link_arrays_belong_to_the_current_folder() {
        let gen = build(&sample_document(), "2523").unwrap();

        let root = gen.folder("2523").unwrap();
        assert_eq!(root.links.len(), 1);
        assert!(root.links.contains_key("Intro video"));
        // The array entry did not become a child folder
        assert_eq!(root.subfolders.len(), 2);

        let b = gen.folder("2530").unwrap();
        assert_eq!(b.links["Z guide"].url, "https://kb.example/z");
    }

    #[test]
    fn subfolder_names_are_ordered_lexicographically() {
        let gen = build(&sample_document(), "2523").unwrap();
        let names: Vec<&String> = gen.folder("2523").unwrap().subfolders.keys().collect();
        assert_eq!(names, ["Alpha", "B section"]);
    }

    #[test]
    fn missing_name_fails_the_whole_build() {
        let doc = json!({
            "1": {
                "name": "Root",
                "subfolders": {
                    "2": { "url": null, "subfolders": {} }
                }
            }
        });
        let err = build(&doc, "1").unwrap_err();
        assert!(matches!(err, SignpostError::Build(_)), "got {err:?}");
    }

    #[test]
    fn malformed_link_fails_the_whole_build() {
        let doc = json!({
            "1": {
                "name": "Root",
                "subfolders": {
                    "files": [ { "id": "9", "name": "No url" } ]
                }
            }
        });
        assert!(matches!(
            build(&doc, "1"),
            Err(SignpostError::Build(_))
        ));
    }

    #[test]
    fn duplicate_folder_key_is_reported() {
        // The same key appearing twice along one path collides deterministically
        let doc = json!({
            "1": {
                "name": "Root",
                "subfolders": {
                    "1": { "name": "Self", "subfolders": {} }
                }
            }
        });
        assert!(matches!(
            build(&doc, "1"),
            Err(SignpostError::Build(_))
        ));
    }

    #[test]
    fn missing_root_key_fails() {
        let doc = json!({ "other": { "name": "x", "subfolders": {} } });
        assert!(matches!(
            build(&doc, "2523"),
            Err(SignpostError::Build(_))
        ));
    }
}
