//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Removing a node only detaches it from its parent; the slot
//! stays allocated so outstanding ids never dangle.

mod selector;

use dp_core::DpError;
use dp_core::DpResult;

pub use selector::SelectorList;

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|candidate| candidate == class_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeSlot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeSlot {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of allocated slots, detached nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeKind::Doctype(name.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|slot| &slot.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(node.0).map(|slot| &mut slot.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|slot| slot.parent)
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|parent| self.is_element(*parent))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|slot| slot.children.as_slice())
            .unwrap_or_default()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(node)?);
        let position = siblings.iter().position(|candidate| *candidate == node)?;
        position.checked_sub(1).map(|before| siblings[before])
    }

    /// Previous sibling that is an element, skipping text and comments.
    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = self.previous_sibling(node);
        while let Some(candidate) = cursor {
            if self.is_element(candidate) {
                return Some(candidate);
            }
            cursor = self.previous_sibling(candidate);
        }
        None
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DpResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. An attached `child` is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DpResult<()> {
        self.check_insertion(parent, child)?;
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DpError::new(
                    "dom.insert.reference_not_child",
                    format!(
                        "node {} is not a child of node {}",
                        reference.0, parent.0
                    ),
                ));
            }
        }

        self.detach(child);
        let position = match reference {
            Some(reference) => self.nodes[parent.0]
                .children
                .iter()
                .position(|candidate| *candidate == reference)
                .unwrap_or(self.nodes[parent.0].children.len()),
            None => self.nodes[parent.0].children.len(),
        };
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> DpResult<()> {
        let (Some(parent_slot), Some(child_slot)) = (self.nodes.get(parent.0), self.nodes.get(child.0))
        else {
            return Err(DpError::new("dom.node.unknown", "node id is out of range"));
        };

        if !matches!(parent_slot.kind, NodeKind::Document | NodeKind::Element(_)) {
            return Err(DpError::new(
                "dom.insert.not_container",
                format!("node {} cannot have children", parent.0),
            ));
        }

        if matches!(child_slot.kind, NodeKind::Document) {
            return Err(DpError::new(
                "dom.insert.document_child",
                "the document node cannot be inserted",
            ));
        }

        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(DpError::new(
                    "dom.insert.cycle",
                    format!("node {} is an ancestor of node {}", child.0, parent.0),
                ));
            }
            cursor = self.parent(ancestor);
        }

        Ok(())
    }

    /// Removes `node` from its parent. Detached nodes keep their own subtree.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.nodes[parent.0]
            .children
            .retain(|candidate| *candidate != node);
        self.nodes[node.0].parent = None;
    }

    /// True when `node` is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = node;
        loop {
            if cursor == self.root() {
                return true;
            }
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attr(name))
    }

    /// Sets an attribute, keeping its original position when it already exists.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match element.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => element.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn has_class(&self, node: NodeId, class_name: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_class(class_name))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(text)) = self.kind(node) {
            out.push_str(text);
            return out;
        }
        for descendant in self.descendants(node) {
            if let Some(NodeKind::Text(text)) = self.kind(descendant) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replaces all children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(NodeKind::Text(existing)) = self.nodes.get_mut(node.0).map(|slot| &mut slot.kind)
        {
            *existing = text.into();
            return;
        }
        if !self.is_element(node) {
            return;
        }

        for child in self.children(node).to_vec() {
            self.detach(child);
        }
        let text = text.into();
        if text.is_empty() {
            return;
        }
        let text_node = self.create_text(text);
        self.nodes[text_node.0].parent = Some(node);
        self.nodes[node.0].children.push(text_node);
    }

    /// Descendants of `node` in document (pre-)order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.tag_name(*node) == Some(tag))
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|node| self.is_element(*node))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_element_by_tag("body")
    }

    /// Elements under `scope` matched by `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }
}
