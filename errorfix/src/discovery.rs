//! Dialog discovery over UI snapshots.
//!
//! The frontend ships a serialized snapshot of the subtree it just saw appear;
//! discovery decides which part of it is the error dialog. Host page layouts
//! vary between editor builds, so the strategy is a swappable seam rather than
//! a fixed heuristic.

use serde::{Deserialize, Serialize};

/// Snapshot of a rendered UI subtree.
///
/// The crate never touches the editor's live widget tree; discovery and
/// scraping run against these snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiNode {
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiNode>,
}

/// Strategy for locating the error dialog inside a snapshot.
pub trait DialogDiscovery: Send + Sync {
    /// Return the dialog subtree, or `None` when the snapshot holds no
    /// recognizable error dialog.
    fn find_dialog<'a>(&self, root: &'a UiNode) -> Option<&'a UiNode>;
}

/// Default strategy: the innermost dialog container holding a button or link
/// whose caption matches one of the anchor labels.
#[derive(Debug, Clone)]
pub struct AnchorButtonDiscovery {
    /// Captions of the report button the editor renders in its error dialog.
    pub anchor_labels: Vec<String>,
    /// Classes that mark a node as a dialog container, in addition to the
    /// `dialog` role.
    pub dialog_classes: Vec<String>,
}

impl AnchorButtonDiscovery {
    pub fn new(anchor_labels: Vec<String>, dialog_classes: Vec<String>) -> Self {
        Self {
            anchor_labels,
            dialog_classes,
        }
    }

    fn is_anchor(&self, node: &UiNode) -> bool {
        if !node.role.eq_ignore_ascii_case("button") && !node.role.eq_ignore_ascii_case("link") {
            return false;
        }
        node.text
            .as_deref()
            .map(str::trim)
            .is_some_and(|caption| self.anchor_labels.iter().any(|label| label == caption))
    }

    fn is_dialog(&self, node: &UiNode) -> bool {
        node.role.eq_ignore_ascii_case("dialog")
            || node
                .classes
                .iter()
                .any(|class| self.dialog_classes.contains(class))
    }

    fn contains_anchor(&self, node: &UiNode) -> bool {
        self.is_anchor(node) || node.children.iter().any(|child| self.contains_anchor(child))
    }
}

impl DialogDiscovery for AnchorButtonDiscovery {
    fn find_dialog<'a>(&self, root: &'a UiNode) -> Option<&'a UiNode> {
        // Children first, so nested overlays resolve to the container actually
        // holding the anchor.
        for child in &root.children {
            if let Some(found) = self.find_dialog(child) {
                return Some(found);
            }
        }
        if self.is_dialog(root) && self.contains_anchor(root) {
            return Some(root);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> AnchorButtonDiscovery {
        AnchorButtonDiscovery::new(
            vec!["Show Report".to_string(), "显示报告".to_string()],
            vec!["comfy-modal".to_string()],
        )
    }

    fn button(caption: &str) -> UiNode {
        UiNode {
            role: "button".to_string(),
            classes: vec![],
            text: Some(caption.to_string()),
            children: vec![],
        }
    }

    fn dialog(children: Vec<UiNode>) -> UiNode {
        UiNode {
            role: "dialog".to_string(),
            classes: vec![],
            text: None,
            children,
        }
    }

    #[test]
    fn test_finds_dialog_with_anchor() {
        let root = UiNode {
            role: "body".to_string(),
            classes: vec![],
            text: None,
            children: vec![dialog(vec![button("Show Report")])],
        };
        let found = discovery().find_dialog(&root).expect("dialog");
        assert_eq!(found.role, "dialog");
    }

    #[test]
    fn test_matches_anchor_caption_with_surrounding_whitespace() {
        let root = dialog(vec![button("  显示报告  ")]);
        assert!(discovery().find_dialog(&root).is_some());
    }

    #[test]
    fn test_no_anchor_means_no_dialog() {
        let root = dialog(vec![button("Close")]);
        assert!(discovery().find_dialog(&root).is_none());
    }

    #[test]
    fn test_dialog_recognized_by_class() {
        let root = UiNode {
            role: "div".to_string(),
            classes: vec!["comfy-modal".to_string()],
            text: None,
            children: vec![button("Show Report")],
        };
        assert!(discovery().find_dialog(&root).is_some());
    }

    #[test]
    fn test_prefers_innermost_dialog() {
        let inner = dialog(vec![button("Show Report")]);
        let outer = dialog(vec![inner]);
        let found = discovery().find_dialog(&outer).expect("dialog");
        // The inner dialog has one child (the button), the outer has one
        // child (the inner dialog).
        assert_eq!(found.children[0].role, "button");
    }

    #[test]
    fn test_anchor_alone_is_not_a_dialog() {
        let root = UiNode {
            role: "body".to_string(),
            classes: vec![],
            text: None,
            children: vec![button("Show Report")],
        };
        assert!(discovery().find_dialog(&root).is_none());
    }
}
