//! In-memory document tree.
//!
//! A minimal stand-in for a browser DOM: an arena of element and text nodes
//! addressed by [`NodeId`]. Views mutate it through structural operations
//! (insert after a sibling, detach, remove a subtree) and presentational
//! ones (classes, visibility, inner markup).
//!
//! Node ids are never reused. A removed node keeps its slot so stale handles
//! stay valid to query, but it can no longer be inserted anywhere.
//! Passing an id that this document never issued is a programming error
//! and panics.

pub mod markup;

pub use markup::MarkupError;

use markup::Token;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes other than `class`, keyed by lowercase name.
    pub attributes: BTreeMap<String, String>,
    /// Class list in insertion order.
    pub classes: Vec<String>,
    /// Set by [`Document::set_hidden`]; printed as `(hidden)` in outlines.
    pub hidden: bool,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with attributes and children.
    Element(Element),
    /// A text run.
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    removed: bool,
}

/// Arena-backed document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Construction =====

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            hidden: false,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Parse markup into detached top-level nodes.
    pub fn parse_fragment(&mut self, html: &str) -> Result<Vec<NodeId>, MarkupError> {
        let tokens = markup::tokenize(html)?;
        let mut roots = Vec::new();
        let mut open: Vec<NodeId> = Vec::new();

        for token in tokens {
            match token {
                Token::Open {
                    tag,
                    attributes,
                    self_closing,
                } => {
                    let node = self.create_element(&tag);
                    for (name, value) in attributes {
                        if name == "class" {
                            for class in value.split_whitespace() {
                                self.toggle_class(node, class, true);
                            }
                        } else {
                            self.set_attribute(node, &name, &value);
                        }
                    }
                    self.attach_parsed(&mut roots, &open, node);
                    if !self_closing && !Token::is_void(&tag) {
                        open.push(node);
                    }
                }
                Token::Close { tag, position } => {
                    if Token::is_void(&tag) {
                        continue;
                    }
                    let Some(current) = open.pop() else {
                        return Err(MarkupError::UnexpectedClose { tag, position });
                    };
                    let expected = self.tag(current).unwrap_or_default().to_string();
                    if expected != tag {
                        return Err(MarkupError::MismatchedClose {
                            expected,
                            found: tag,
                            position,
                        });
                    }
                }
                Token::Text(text) => {
                    let node = self.create_text(&text);
                    self.attach_parsed(&mut roots, &open, node);
                }
            }
        }

        if let Some(unclosed) = open.pop() {
            return Err(MarkupError::UnclosedTag {
                tag: self.tag(unclosed).unwrap_or_default().to_string(),
            });
        }
        Ok(roots)
    }

    fn attach_parsed(&mut self, roots: &mut Vec<NodeId>, open: &[NodeId], node: NodeId) {
        match open.last() {
            Some(&parent) => self.append_child(parent, node),
            None => roots.push(node),
        }
    }

    // ===== Structure =====

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.assert_insertable(child);
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Insert `child` as the first child of `parent`, moving it if attached.
    pub fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        self.assert_insertable(child);
        self.detach(child);
        self.node_mut(parent).children.insert(0, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Insert `node` immediately after `anchor`. The anchor must have a parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        assert_ne!(anchor, node, "cannot insert a node after itself");
        self.assert_insertable(node);
        self.detach(node);
        let parent = self
            .parent(anchor)
            .unwrap_or_else(|| panic!("insert_after anchor {anchor:?} is not attached"));
        let siblings = &mut self.node_mut(parent).children;
        let index = siblings
            .iter()
            .position(|&id| id == anchor)
            .unwrap_or_else(|| panic!("anchor {anchor:?} missing from its parent"));
        siblings.insert(index + 1, node);
        self.node_mut(node).parent = Some(parent);
    }

    /// Take `node` out of its parent, keeping the subtree intact.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        self.node_mut(parent).children.retain(|&id| id != node);
        self.node_mut(node).parent = None;
    }

    /// Detach `node` and mark its whole subtree as removed.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let entry = self.node_mut(id);
            entry.removed = true;
            stack.extend(entry.children.iter().copied());
        }
    }

    /// Replace all children of `node` with the parsed markup.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), MarkupError> {
        let fragment = self.parse_fragment(html)?;
        self.clear_children(node);
        for child in fragment {
            self.append_child(node, child);
        }
        Ok(())
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        let text = self.create_text(text);
        self.append_child(node, text);
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.node_mut(child).parent = None;
            self.remove(child);
        }
    }

    // ===== Presentation =====

    /// Add (`on`) or remove a class. Text nodes are ignored.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        let present = element.classes.iter().any(|c| c == class);
        if on && !present {
            element.classes.push(class.to_string());
        } else if !on && present {
            element.classes.retain(|c| c != class);
        }
    }

    /// Whether `node` is an element carrying `class`.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.classes.iter().any(|c| c == class))
    }

    /// Mark an element hidden or visible. Text nodes are ignored.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(element) = self.element_mut(node) {
            element.hidden = hidden;
        }
    }

    /// Whether `node` is a hidden element.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|element| element.hidden)
    }

    /// Set an attribute; the name is lowercased.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element
                .attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)
            .and_then(|element| element.attributes.remove(name))
    }

    /// Value of attribute `name`, if `node` is an element that has it.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|element| element.attributes.get(name))
            .map(String::as_str)
    }

    // ===== Queries =====

    /// Payload of `node`.
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.node(node).kind
    }

    /// Tag name of an element; `None` for text.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    /// Parent of an attached node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Children of `node`, in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Whether `node` has no children.
    pub fn is_empty(&self, node: NodeId) -> bool {
        self.node(node).children.is_empty()
    }

    /// Whether `node` was removed from the document.
    pub fn is_removed(&self, node: NodeId) -> bool {
        self.node(node).removed
    }

    /// Sibling right after `node` under the same parent.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&id| id == node)?;
        siblings.get(index + 1).copied()
    }

    /// First element child of `node` with the given tag.
    pub fn find_child(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|&child| self.tag(child) == Some(tag))
    }

    /// Every element below `node` (excluding it) with the given tag, in
    /// document order.
    pub fn descendants_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Whether `node` is `root` or lies below it.
    pub fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of every text node below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.node(node).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for &child in self.children(node) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // ===== Output =====

    /// Serialize `node` and its subtree back to markup.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let element = match &self.node(node).kind {
            NodeKind::Text(text) => {
                out.push_str(text);
                return;
            }
            NodeKind::Element(element) => element,
        };
        let _ = write!(out, "<{}", element.tag);
        if !element.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", element.classes.join(" "));
        }
        for (name, value) in &element.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if element.hidden {
            out.push_str(" style=\"display: none\"");
        }
        out.push('>');
        if Token::is_void(&element.tag) {
            return;
        }
        for &child in self.children(node) {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", element.tag);
    }

    /// Indented outline of `node`, one line per node.
    ///
    /// Elements print as `tag#id.class[attr=value]`, with ` (hidden)` when
    /// hidden; text nodes print quoted.
    pub fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_outline(node, 0, &mut out);
        out.truncate(out.trim_end().len());
        out
    }

    fn write_outline(&self, node: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match &self.node(node).kind {
            NodeKind::Text(text) => {
                let _ = writeln!(out, "{indent}{:?}", text.trim());
            }
            NodeKind::Element(element) => {
                let _ = write!(out, "{indent}{}", element.tag);
                if let Some(id) = element.attributes.get("id") {
                    let _ = write!(out, "#{id}");
                }
                for class in &element.classes {
                    let _ = write!(out, ".{class}");
                }
                for (name, value) in element.attributes.iter().filter(|(name, _)| *name != "id") {
                    let _ = write!(out, "[{name}={value}]");
                }
                if element.hidden {
                    out.push_str(" (hidden)");
                }
                out.push('\n');
                for &child in self.children(node) {
                    self.write_outline(child, depth + 1, out);
                }
            }
        }
    }

    // ===== Internals =====

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            removed: false,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    fn assert_insertable(&self, node: NodeId) {
        assert!(!self.node(node).removed, "node {node:?} was removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(doc: &mut Document) -> (NodeId, NodeId, NodeId, NodeId) {
        let root = doc.create_element("div");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("i");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);
        (root, a, b, c)
    }

    #[test]
    fn insert_after_places_node_next_to_anchor() {
        let mut doc = Document::new();
        let (root, a, b, c) = list(&mut doc);

        doc.insert_after(a, c);

        assert_eq!(doc.children(root), &[a, c, b]);
        assert_eq!(doc.next_sibling(a), Some(c));
    }

    #[test]
    fn insert_first_moves_attached_node() {
        let mut doc = Document::new();
        let (root, a, b, c) = list(&mut doc);

        doc.insert_first(root, c);

        assert_eq!(doc.children(root), &[c, a, b]);
    }

    #[test]
    fn detach_keeps_subtree() {
        let mut doc = Document::new();
        let (root, a, b, c) = list(&mut doc);
        let inner = doc.create_text("x");
        doc.append_child(b, inner);

        doc.detach(b);

        assert_eq!(doc.parent(b), None);
        assert!(!doc.children(root).contains(&b));
        assert_eq!(doc.text_content(b), "x");
        assert!(!doc.is_removed(b));
        assert_eq!(doc.next_sibling(a), Some(c));
    }

    #[test]
    fn remove_marks_subtree_removed() {
        let mut doc = Document::new();
        let (root, _, b, _) = list(&mut doc);
        let inner = doc.create_element("span");
        doc.append_child(b, inner);

        doc.remove(b);

        assert!(doc.is_removed(b));
        assert!(doc.is_removed(inner));
        assert!(!doc.is_within(b, root));
    }

    #[test]
    #[should_panic(expected = "was removed")]
    fn removed_node_cannot_be_reinserted() {
        let mut doc = Document::new();
        let (root, a, _, _) = list(&mut doc);
        doc.remove(a);
        doc.append_child(root, a);
    }

    #[test]
    fn parse_fragment_builds_tree() {
        let mut doc = Document::new();
        let roots = doc
            .parse_fragment(r#"<section id="p1" class="a b"><blockquote>hi <b>there</b></blockquote><hr></section><hr>"#)
            .expect("valid markup");

        assert_eq!(roots.len(), 2);
        let section = roots[0];
        assert_eq!(doc.attribute(section, "id"), Some("p1"));
        assert!(doc.has_class(section, "a") && doc.has_class(section, "b"));
        let quote = doc.find_child(section, "blockquote").expect("blockquote child");
        assert_eq!(doc.text_content(quote), "hi there");
        assert_eq!(doc.descendants_by_tag(section, "hr").len(), 1);
    }

    #[test]
    fn parse_fragment_rejects_mismatched_close() {
        let mut doc = Document::new();
        let err = doc.parse_fragment("<section><b></section>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::MismatchedClose { ref expected, ref found, .. }
                if expected == "b" && found == "section"
        ));
    }

    #[test]
    fn parse_fragment_rejects_unclosed_element() {
        let mut doc = Document::new();
        assert_eq!(
            doc.parse_fragment("<section><blockquote></blockquote>"),
            Err(MarkupError::UnclosedTag {
                tag: "section".to_string()
            })
        );
    }

    #[test]
    fn parse_fragment_rejects_stray_close() {
        let mut doc = Document::new();
        assert_eq!(
            doc.parse_fragment("</section>"),
            Err(MarkupError::UnexpectedClose {
                tag: "section".to_string(),
                position: 0
            })
        );
    }

    #[test]
    fn set_inner_html_replaces_children() {
        let mut doc = Document::new();
        let (root, a, _, _) = list(&mut doc);

        doc.set_inner_html(root, "<em>new</em>").expect("valid markup");

        assert_eq!(doc.children(root).len(), 1);
        assert!(doc.is_removed(a));
        assert_eq!(doc.to_html(root), "<div><em>new</em></div>");
    }

    #[test]
    fn toggle_class_is_idempotent() {
        let mut doc = Document::new();
        let node = doc.create_element("section");

        doc.toggle_class(node, "locked", true);
        doc.toggle_class(node, "locked", true);
        assert_eq!(doc.to_html(node), r#"<section class="locked"></section>"#);

        doc.toggle_class(node, "locked", false);
        assert!(!doc.has_class(node, "locked"));
    }

    #[test]
    fn outline_lists_structure() {
        let mut doc = Document::new();
        let roots = doc
            .parse_fragment(r#"<div id="threads"><aside class="act">New</aside><hr></div>"#)
            .expect("valid markup");
        doc.set_hidden(doc.children(roots[0])[1], true);

        insta::assert_snapshot!(doc.outline(roots[0]), @r#"
        div#threads
          aside.act
            "New"
          hr (hidden)
        "#);
    }
}
