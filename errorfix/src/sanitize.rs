//! Dialog text cleanup.
//!
//! The editor's error dialogs mix the error description with dialog chrome:
//! title bars, footer button rows, and any UI a previous triage pass injected.
//! Scraping walks a snapshot of the dialog, drops the chrome, and bounds the
//! result so it stays transmittable as a URL parameter.

use crate::discovery::UiNode;

/// Hard cap on a scraped or resolved error message, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Collapse whitespace runs to single spaces, trim, and hard-truncate to
/// [`MAX_MESSAGE_LEN`] characters.
pub fn clean_message(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(collapsed, MAX_MESSAGE_LEN)
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

/// Remove dialog-chrome captions that survive into scraped text.
pub fn strip_labels(text: &str, labels: &[String]) -> String {
    let mut out = text.to_string();
    for label in labels {
        if label.is_empty() {
            continue;
        }
        out = out.replace(label.as_str(), " ");
    }
    out
}

/// Subtrees to drop while scraping, plus captions to strip from the result.
#[derive(Debug, Clone, Default)]
pub struct ScrapeFilter {
    /// Classes whose subtree is dialog chrome (headers, footers, button rows).
    pub skip_classes: Vec<String>,
    /// Roles whose subtree never carries the error description.
    pub skip_roles: Vec<String>,
    /// Captions stripped from the collected text.
    pub strip_labels: Vec<String>,
}

impl ScrapeFilter {
    fn skips(&self, node: &UiNode) -> bool {
        if self
            .skip_roles
            .iter()
            .any(|role| role.eq_ignore_ascii_case(&node.role))
        {
            return true;
        }
        node.classes
            .iter()
            .any(|class| self.skip_classes.contains(class))
    }
}

/// Extract the error description from a dialog snapshot.
///
/// Chrome subtrees are skipped whole, so a caption inside a filtered header
/// never leaks into the message even when it is not in `strip_labels`.
pub fn scrape_dialog_text(dialog: &UiNode, filter: &ScrapeFilter) -> String {
    let mut buf = String::new();
    collect_text(dialog, filter, &mut buf);
    clean_message(&strip_labels(&buf, &filter.strip_labels))
}

fn collect_text(node: &UiNode, filter: &ScrapeFilter, buf: &mut String) {
    if filter.skips(node) {
        return;
    }
    if let Some(text) = &node.text {
        if !text.trim().is_empty() {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(text);
        }
    }
    for child in &node.children {
        collect_text(child, filter, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(role: &str, text: &str) -> UiNode {
        UiNode {
            role: role.to_string(),
            classes: vec![],
            text: Some(text.to_string()),
            children: vec![],
        }
    }

    #[test]
    fn test_clean_message_collapses_whitespace() {
        assert_eq!(
            clean_message("raw dialog text \n  with \t spaces  "),
            "raw dialog text with spaces"
        );
        assert_eq!(clean_message(""), "");
        assert_eq!(clean_message("   \n\t  "), "");
    }

    #[test]
    fn test_clean_message_hard_truncation_boundary() {
        let raw = "a".repeat(2001);
        let cleaned = clean_message(&raw);
        assert_eq!(cleaned.chars().count(), 2000);

        let exact = "b".repeat(2000);
        assert_eq!(clean_message(&exact), exact);
    }

    #[test]
    fn test_clean_message_truncates_on_char_boundary() {
        let raw = "错".repeat(2001);
        let cleaned = clean_message(&raw);
        assert_eq!(cleaned.chars().count(), 2000);
        assert!(cleaned.chars().all(|c| c == '错'));
    }

    #[test]
    fn test_strip_labels() {
        let labels = vec!["提示执行失败".to_string(), "查找问题".to_string()];
        let stripped = strip_labels("提示执行失败 RuntimeError: boom 查找问题", &labels);
        assert_eq!(clean_message(&stripped), "RuntimeError: boom");
    }

    #[test]
    fn test_scrape_skips_chrome_subtrees() {
        let header = UiNode {
            role: "div".to_string(),
            classes: vec!["litemodal-header".to_string()],
            text: None,
            children: vec![leaf("span", "Execution failed")],
        };
        let body = UiNode {
            role: "div".to_string(),
            classes: vec![],
            text: None,
            children: vec![
                leaf("p", "RuntimeError: Tensor size"),
                leaf("p", "mismatch at dim 0"),
            ],
        };
        let footer = UiNode {
            role: "div".to_string(),
            classes: vec!["litemodal-buttons".to_string()],
            text: None,
            children: vec![leaf("button", "Show Report")],
        };
        let dialog = UiNode {
            role: "dialog".to_string(),
            classes: vec!["litemodal-dialog".to_string()],
            text: None,
            children: vec![header, body, footer],
        };

        let filter = ScrapeFilter {
            skip_classes: vec![
                "litemodal-header".to_string(),
                "litemodal-buttons".to_string(),
            ],
            skip_roles: vec!["button".to_string()],
            strip_labels: vec![],
        };
        assert_eq!(
            scrape_dialog_text(&dialog, &filter),
            "RuntimeError: Tensor size mismatch at dim 0"
        );
    }

    #[test]
    fn test_scrape_skips_button_roles_outside_chrome() {
        let dialog = UiNode {
            role: "dialog".to_string(),
            classes: vec![],
            text: None,
            children: vec![leaf("button", "Show Report"), leaf("p", "boom")],
        };
        let filter = ScrapeFilter {
            skip_classes: vec![],
            skip_roles: vec!["button".to_string()],
            strip_labels: vec![],
        };
        assert_eq!(scrape_dialog_text(&dialog, &filter), "boom");
    }
}
