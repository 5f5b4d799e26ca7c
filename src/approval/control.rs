//! Locating the host page's approval button.
//!
//! Discovery is an ordered list of strategies behind one entry point,
//! `ControlLocator::find_approval_control`. The first strategy that finds a
//! labelled button wins. Matching is best-effort: the host's markup can
//! change at any time, which is why there is more than one strategy.

use crate::error::ControlError;

/// Index of an element in a host page.
pub type NodeId = usize;

/// The slice of a host document the strategies need.
pub trait HostPage: Send + Sync {
    /// Logo/icon elements that identify `provider` (by alt text, title,
    /// aria-label or source), in document order.
    fn provider_icons(&self, provider: &str) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the element lays out its children as a flex row/column.
    fn is_flex_container(&self, node: NodeId) -> bool;

    /// Buttons inside `node`, in document order.
    fn buttons_within(&self, node: NodeId) -> Vec<NodeId>;

    /// Every button in the document, in document order.
    fn buttons(&self) -> Vec<NodeId>;

    /// The element's text content.
    fn text(&self, node: NodeId) -> String;

    fn click(&self, node: NodeId) -> Result<(), ControlError>;
}

/// What to look for.
#[derive(Debug, Clone)]
pub struct ControlTarget {
    /// Provider whose icon anchors the search (e.g. "github")
    pub provider: String,
    /// Accepted button labels, in any of the host's UI languages
    pub labels: Vec<String>,
}

impl ControlTarget {
    pub fn new(provider: impl Into<String>, labels: &[String]) -> Self {
        Self {
            provider: provider.into(),
            labels: labels.to_vec(),
        }
    }

    pub fn label_matches(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && self.labels.iter().any(|l| text.contains(l.as_str()))
    }

    fn first_labelled(&self, page: &dyn HostPage, candidates: Vec<NodeId>) -> Option<NodeId> {
        candidates
            .into_iter()
            .find(|&b| self.label_matches(&page.text(b)))
    }
}

/// One way of finding the approval button.
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn locate(&self, page: &dyn HostPage, target: &ControlTarget) -> Option<NodeId>;
}

/// From the provider icon, go up to the nearest flex container and look
/// for a labelled button inside it.
pub struct IconAnchored;

impl DiscoveryStrategy for IconAnchored {
    fn name(&self) -> &'static str {
        "icon-anchored"
    }

    fn locate(&self, page: &dyn HostPage, target: &ControlTarget) -> Option<NodeId> {
        for icon in page.provider_icons(&target.provider) {
            let mut current = page.parent(icon);
            while let Some(node) = current {
                if page.is_flex_container(node) {
                    if let Some(button) = target.first_labelled(page, page.buttons_within(node)) {
                        return Some(button);
                    }
                    break;
                }
                current = page.parent(node);
            }
        }
        None
    }
}

/// Scan every button in the document for the label.
pub struct LabelScan;

impl DiscoveryStrategy for LabelScan {
    fn name(&self) -> &'static str {
        "label-scan"
    }

    fn locate(&self, page: &dyn HostPage, target: &ControlTarget) -> Option<NodeId> {
        target.first_labelled(page, page.buttons())
    }
}

/// A located approval button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalControl {
    pub node: NodeId,
    /// Which strategy found it
    pub strategy: &'static str,
}

impl ApprovalControl {
    pub fn click(&self, page: &dyn HostPage) -> Result<(), ControlError> {
        page.click(self.node)
    }
}

/// Ordered discovery strategies.
pub struct ControlLocator {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Default for ControlLocator {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(IconAnchored), Box::new(LabelScan)],
        }
    }
}

impl ControlLocator {
    pub fn new(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy, tried after the existing ones.
    pub fn with_strategy(mut self, strategy: Box<dyn DiscoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn find_approval_control(
        &self,
        page: &dyn HostPage,
        target: &ControlTarget,
    ) -> Option<ApprovalControl> {
        self.strategies.iter().find_map(|s| {
            s.locate(page, target).map(|node| {
                tracing::debug!("Approval control found by {} at element {}", s.name(), node);
                ApprovalControl {
                    node,
                    strategy: s.name(),
                }
            })
        })
    }
}
