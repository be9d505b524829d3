//! Navigation protocol - stateless action tokens and menu rendering
//!
//! All navigational state lives in the action token a pressed button
//! carries back: `prefix + folder id`. There is no server-side session;
//! every render resolves the id against whichever catalog generation is
//! current at that moment, so navigation stays correct under concurrent
//! rebuilds. A token whose id vanished in a refresh resolves `NotFound`
//! and the caller prompts the user to restart.

use std::sync::Arc;

use crate::catalog::CatalogIndex;
use crate::types::{Result, SignpostError};

/// What pressing a button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Callback carrying an action token back to the bot
    Navigate(String),
    /// Open a URL directly; terminal, no token
    Open(String),
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

/// A rendered menu: one button row per subfolder, one per link, and a
/// trailing back/home row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub rows: Vec<Vec<Button>>,
}

/// Encodes/decodes action tokens and renders folder menus
pub struct Navigator {
    index: Arc<CatalogIndex>,
    prefix: String,
    back_label: String,
    home_label: String,
}

impl Navigator {
    pub fn new(
        index: Arc<CatalogIndex>,
        prefix: impl Into<String>,
        back_label: impl Into<String>,
        home_label: impl Into<String>,
    ) -> Self {
        Self {
            index,
            prefix: prefix.into(),
            back_label: back_label.into(),
            home_label: home_label.into(),
        }
    }

    /// Encode a folder id into an action token
    pub fn encode(&self, folder_id: &str) -> String {
        format!("{}{}", self.prefix, folder_id)
    }

    /// Decode an action token back into a folder id.
    ///
    /// A missing prefix means the payload was never ours (or predates a
    /// prefix change); the caller answers with a restart prompt.
    pub fn decode<'t>(&self, token: &'t str) -> Result<&'t str> {
        token
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| SignpostError::InvalidToken(token.to_string()))
    }

    /// Render the root menu
    pub fn render_root(&self) -> Result<Menu> {
        let root_id = self.index.snapshot()?.root_id().to_string();
        self.render(&root_id)
    }

    /// Render the menu for a folder id against the current generation
    pub fn render(&self, folder_id: &str) -> Result<Menu> {
        let (generation, folder) = self.index.resolve(folder_id)?;

        let mut rows = Vec::with_capacity(folder.subfolders.len() + folder.links.len() + 1);

        // Subfolder rows, lexicographic by display name
        for (name, child_id) in &folder.subfolders {
            rows.push(vec![Button {
                label: name.clone(),
                action: ButtonAction::Navigate(self.encode(child_id)),
            }]);
        }

        // Link rows, lexicographic by display name
        for (name, link) in &folder.links {
            rows.push(vec![Button {
                label: name.clone(),
                action: ButtonAction::Open(link.url.clone()),
            }]);
        }

        // Trailing controls; back and home coincide at the root
        let back_id = folder.parent.as_deref().unwrap_or(generation.root_id());
        rows.push(vec![
            Button {
                label: self.back_label.clone(),
                action: ButtonAction::Navigate(self.encode(back_id)),
            },
            Button {
                label: self.home_label.clone(),
                action: ButtonAction::Navigate(self.encode(generation.root_id())),
            },
        ]);

        Ok(Menu { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build, CatalogIndex};
    use serde_json::json;

    fn navigator() -> Navigator {
        let doc = json!({
            "A": {
                "name": "Area",
                "url": null,
                "subfolders": {
                    "b1": { "name": "B", "subfolders": {} },
                    "a1": { "name": "Alpha", "subfolders": {} },
                    "files": [
                        { "id": "z1", "name": "Z", "url": "https://kb.example/z" }
                    ]
                }
            }
        });
        let index = Arc::new(CatalogIndex::new());
        index.install(build(&doc, "A").unwrap());
        Navigator::new(index, "kb:", "<", "^")
    }

    #[test]
    fn token_round_trip() {
        let nav = navigator();
        for id in ["A", "a1", "2523"] {
            let token = nav.encode(id);
            assert!(token.starts_with("kb:"));
            assert_eq!(nav.decode(&token).unwrap(), id);
        }
    }

    #[test]
    fn foreign_payload_is_an_invalid_token() {
        let nav = navigator();
        assert!(matches!(
            nav.decode("other-bot:A"),
            Err(SignpostError::InvalidToken(_))
        ));
        assert!(matches!(nav.decode(""), Err(SignpostError::InvalidToken(_))));
    }

    #[test]
    fn menu_rows_are_ordered_with_one_trailing_control_row() {
        let nav = navigator();
        let menu = nav.render("A").unwrap();

        // Alpha, B, then the Z link, then exactly one back/home row
        assert_eq!(menu.rows.len(), 4);
        assert_eq!(menu.rows[0][0].label, "Alpha");
        assert_eq!(menu.rows[0][0].action, ButtonAction::Navigate("kb:a1".into()));
        assert_eq!(menu.rows[1][0].label, "B");
        assert_eq!(
            menu.rows[2][0].action,
            ButtonAction::Open("https://kb.example/z".into())
        );

        let controls = &menu.rows[3];
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].label, "<");
        assert_eq!(controls[1].label, "^");
    }

    #[test]
    fn root_back_equals_home() {
        let nav = navigator();
        let menu = nav.render_root().unwrap();
        let controls = menu.rows.last().unwrap();
        assert_eq!(controls[0].action, controls[1].action);
        assert_eq!(controls[1].action, ButtonAction::Navigate("kb:A".into()));
    }

    #[test]
    fn child_back_points_at_parent() {
        let nav = navigator();
        let menu = nav.render("a1").unwrap();
        let controls = menu.rows.last().unwrap();
        assert_eq!(controls[0].action, ButtonAction::Navigate("kb:A".into()));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let nav = navigator();
        assert!(matches!(
            nav.render("missing"),
            Err(SignpostError::NotFound(_))
        ));
    }
}
