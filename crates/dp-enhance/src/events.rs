//! Click listeners attached by the enhancer.

use std::collections::BTreeMap;

use dp_dom::Document;
use dp_dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    /// Show the clicked image in a fresh overlay.
    OpenLightbox,
    /// Remove the overlay the listener sits on.
    CloseOverlay,
}

/// Listeners keyed by the node they were added to, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    by_node: BTreeMap<NodeId, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adding the same listener twice to one node is a no-op, like `addEventListener`.
    pub fn add(&mut self, node: NodeId, listener: Listener) -> bool {
        let listeners = self.by_node.entry(node).or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn listeners(&self, node: NodeId) -> &[Listener] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drops every listener registered on `node` or its descendants.
    pub fn remove_subtree(&mut self, document: &Document, node: NodeId) {
        self.by_node.remove(&node);
        for descendant in document.descendants(node) {
            self.by_node.remove(&descendant);
        }
    }

    pub fn len(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    /// Listeners a click on `target` reaches, nearest node first.
    pub fn bubble_path(&self, document: &Document, target: NodeId) -> Vec<(NodeId, Listener)> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            for listener in self.listeners(node) {
                path.push((node, *listener));
            }
            cursor = document.parent(node);
        }
        path
    }
}
