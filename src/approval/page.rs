//! In-memory host document.
//!
//! `StaticPage` is a small element tree that implements `HostPage`. It can be
//! built in code or loaded from JSON (the `replay` command takes one), and it
//! records every click so callers can check what was pressed.

use crate::approval::control::{HostPage, NodeId};
use crate::error::ControlError;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One element as written in a page description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageNode {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub children: Vec<PageNode>,
}

impl PageNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn child(mut self, child: PageNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: HashMap<String, String>,
    text: String,
    disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn is_button(&self) -> bool {
        self.tag.eq_ignore_ascii_case("button")
            || self.attrs.get("role").is_some_and(|r| r == "button")
    }
}

/// A flattened, clickable element tree.
#[derive(Debug)]
pub struct StaticPage {
    elements: Vec<Element>,
    clicks: Mutex<Vec<NodeId>>,
}

impl StaticPage {
    pub fn new(root: PageNode) -> Self {
        let mut elements = Vec::new();
        flatten(root, None, &mut elements);
        Self {
            elements,
            clicks: Mutex::new(Vec::new()),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let root: PageNode = serde_json::from_str(text).context("Invalid page description")?;
        Ok(Self::new(root))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page file: {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Elements clicked so far, in order.
    pub fn clicks(&self) -> Vec<NodeId> {
        self.clicks.lock().clone()
    }

    pub fn click_count(&self) -> usize {
        self.clicks.lock().len()
    }

    fn descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.elements[node].children {
            out.push(child);
            self.descendants(child, out);
        }
    }
}

fn flatten(node: PageNode, parent: Option<NodeId>, out: &mut Vec<Element>) -> NodeId {
    let id = out.len();
    out.push(Element {
        tag: node.tag,
        classes: node.classes,
        attrs: node.attrs,
        text: node.text,
        disabled: node.disabled,
        parent,
        children: Vec::new(),
    });
    for child in node.children {
        let child_id = flatten(child, Some(id), out);
        out[id].children.push(child_id);
    }
    id
}

impl HostPage for StaticPage {
    fn provider_icons(&self, provider: &str) -> Vec<NodeId> {
        let needle = provider.to_lowercase();
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e.tag.to_lowercase().as_str(), "img" | "svg"))
            .filter(|(_, e)| {
                ["alt", "title", "aria-label", "src"].iter().any(|a| {
                    e.attrs
                        .get(*a)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.elements.get(node)?.parent
    }

    fn is_flex_container(&self, node: NodeId) -> bool {
        let Some(e) = self.elements.get(node) else {
            return false;
        };
        e.classes.iter().any(|c| c == "flex" || c == "inline-flex")
            || e.attrs.get("style").is_some_and(|s| {
                let s = s.replace(' ', "");
                s.contains("display:flex") || s.contains("display:inline-flex")
            })
    }

    fn buttons_within(&self, node: NodeId) -> Vec<NodeId> {
        if node >= self.elements.len() {
            return Vec::new();
        }
        let mut all = Vec::new();
        self.descendants(node, &mut all);
        all.retain(|&n| self.elements[n].is_button());
        all
    }

    fn buttons(&self) -> Vec<NodeId> {
        (0..self.elements.len())
            .filter(|&n| self.elements[n].is_button())
            .collect()
    }

    fn text(&self, node: NodeId) -> String {
        let Some(e) = self.elements.get(node) else {
            return String::new();
        };
        let mut text = e.text.clone();
        for &child in &e.children {
            let child_text = self.text(child);
            if !child_text.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&child_text);
            }
        }
        text.trim().to_string()
    }

    fn click(&self, node: NodeId) -> Result<(), ControlError> {
        let e = self
            .elements
            .get(node)
            .ok_or(ControlError::NotClickable { node })?;
        if e.disabled {
            return Err(ControlError::ClickFailed {
                node,
                reason: "element is disabled".to_string(),
            });
        }
        self.clicks.lock().push(node);
        tracing::info!("Clicked <{}> '{}'", e.tag, self.text(node));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let page = StaticPage::from_json(
            r#"{
                "tag": "body",
                "children": [
                    {"tag": "div", "attrs": {"style": "display: flex"}, "children": [
                        {"tag": "svg", "attrs": {"aria-label": "GitHub"}},
                        {"tag": "button", "text": "Approve"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let icons = page.provider_icons("github");
        assert_eq!(icons.len(), 1);
        let container = page.parent(icons[0]).unwrap();
        assert!(page.is_flex_container(container));
        assert_eq!(page.buttons_within(container).len(), 1);
    }

    #[test]
    fn test_text_content_includes_descendants() {
        let page = StaticPage::new(
            PageNode::new("button")
                .child(PageNode::new("span").text("Approve"))
                .child(PageNode::new("kbd").text("⏎")),
        );
        assert_eq!(page.text(0), "Approve ⏎");
    }

    #[test]
    fn test_click_records_and_respects_disabled() {
        let page = StaticPage::new(
            PageNode::new("body")
                .child(PageNode::new("button").text("Approve"))
                .child(PageNode::new("button").text("Approve").disabled()),
        );
        page.click(1).unwrap();
        assert!(page.click(2).is_err());
        assert!(page.click(99).is_err());
        assert_eq!(page.clicks(), vec![1]);
    }

    #[test]
    fn test_role_button() {
        let page = StaticPage::new(
            PageNode::new("body").child(PageNode::new("div").attr("role", "button").text("Approve")),
        );
        assert_eq!(page.buttons(), vec![1]);
    }
}
