//! Arena-based XML document tree.
//!
//! All nodes are stored in a contiguous vector; parent/child/sibling links are
//! indices into it. Nodes are never freed: detaching a subtree only unlinks it.

use std::collections::HashMap;

use crate::model::{ElementKind, XML_NS, is_reserved_id};
use crate::util;

/// Unique identifier for a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document node (always 0). The root element is its child.
    pub const DOCUMENT: NodeId = NodeId(0);
}

/// Namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    /// Namespace URI, `None` for names outside any namespace.
    pub ns: Option<String>,
    pub local: String,
}

impl QualName {
    pub fn new(ns: Option<&str>, local: &str) -> Self {
        Self {
            ns: ns.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// A name in no namespace.
    pub fn local(local: &str) -> Self {
        Self::new(None, local)
    }
}

/// XML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QualName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document node.
    Document,
    /// Element with name, attributes in source order, and its pre-computed
    /// classification.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        kind: ElementKind,
    },
    Text(String),
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// An XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// Source line of elements created by the loader.
    lines: HashMap<NodeId, u32>,
    /// Name of the source the document was loaded from, used in messages.
    source_name: Option<String>,
}

impl Document {
    /// Create an empty document (just the document node).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            lines: HashMap::new(),
            source_name: None,
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Total number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no root element.
    pub fn is_empty(&self) -> bool {
        self.root_element().is_none()
    }

    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.source_name = Some(name.into());
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub(crate) fn set_line(&mut self, id: NodeId, line: u32) {
        self.lines.insert(id, line);
    }

    /// Source line of an element, when it came from the loader.
    pub fn line(&self, id: NodeId) -> Option<u32> {
        self.lines.get(&id).copied()
    }

    // --- construction ---

    /// Create a detached element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let kind = ElementKind::classify(name.ns.as_deref(), &name.local);
        self.alloc(Node::new(NodeData::Element { name, attrs, kind }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text.into())))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).and_then(|n| n.last_child);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = Some(parent);
            child_node.prev_sibling = last_child;
            child_node.next_sibling = None;
        }

        if let Some(last) = last_child
            && let Some(last_node) = self.get_mut(last)
        {
            last_node.next_sibling = Some(child);
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = Some(child);
            }
            parent_node.last_child = Some(child);
        }
    }

    /// Append text to the last child if it is a text node, or add a new text
    /// node otherwise.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).and_then(|n| n.last_child);

        if let Some(last) = last_child.and_then(|id| self.get_mut(id))
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Insert `new_node` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, new_node: NodeId) {
        match self.get(parent).and_then(|n| n.first_child) {
            Some(first) => self.insert_before(first, new_node),
            None => self.append(parent, new_node),
        }
    }

    /// Insert `new_node` right before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.get(sibling).and_then(|n| n.parent);
        let prev = self.get(sibling).and_then(|n| n.prev_sibling);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = Some(sibling);
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = Some(new_node);
        }

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.get_mut(p) {
                    prev_node.next_sibling = Some(new_node);
                }
            }
            None => {
                if let Some(par) = parent.and_then(|p| self.get_mut(p)) {
                    par.first_child = Some(new_node);
                }
            }
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.get_mut(p) {
                    prev_node.next_sibling = next;
                }
            }
            None => {
                if let Some(par) = parent.and_then(|p| self.get_mut(p)) {
                    par.first_child = next;
                }
            }
        }
        match next {
            Some(n) => {
                if let Some(next_node) = self.get_mut(n) {
                    next_node.prev_sibling = prev;
                }
            }
            None => {
                if let Some(par) = parent.and_then(|p| self.get_mut(p)) {
                    par.last_child = prev;
                }
            }
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    // --- navigation ---

    /// The document element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(NodeId::DOCUMENT).find(|&c| self.is_element(c))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Parent, if it is an element (the root element's parent is the
    /// document node, which isn't).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Whether the node is the document element.
    pub fn is_root_element(&self, id: NodeId) -> bool {
        self.is_element(id) && self.parent(id) == Some(NodeId::DOCUMENT)
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            current: self.get(parent).and_then(|n| n.first_child),
        }
    }

    /// Iterate over the element children of a node.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// Iterate over the proper ancestors of a node, nearest first, stopping
    /// before the document node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(id), |&p| self.parent_element(p))
    }

    /// Iterate over all nodes of a subtree in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    // --- element accessors ---

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Element classification; `Other` for non-element nodes.
    pub fn kind(&self, id: NodeId) -> ElementKind {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { kind, .. }) => *kind,
            _ => ElementKind::Other,
        }
    }

    pub fn name(&self, id: NodeId) -> Option<&QualName> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|n| n.local.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Value of an attribute in no namespace.
    pub fn attr(&self, id: NodeId, local: &str) -> Option<&str> {
        self.attr_ns(id, None, local)
    }

    /// Value of a namespaced attribute.
    pub fn attr_ns(&self, id: NodeId, ns: Option<&str>, local: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local == local && a.name.ns.as_deref() == ns)
            .map(|a| a.value.as_str())
    }

    /// The `xml:id` attribute.
    pub fn xml_id(&self, id: NodeId) -> Option<&str> {
        self.attr_ns(id, Some(XML_NS), "id")
    }

    /// First child element of the given kind.
    pub fn child_of_kind(&self, parent: NodeId, kind: ElementKind) -> Option<NodeId> {
        self.element_children(parent).find(|&c| self.kind(c) == kind)
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                result.push_str(text);
            }
        }
        result
    }

    /// Human-readable reference to an element for error messages, like
    /// `the "chapter" element with xml:id="intro" (line 12)` or
    /// `a(n) "section" element (line 40)`.
    ///
    /// Reserved ids (`autoid_`, `docgen_`) are not shown.
    pub fn describe(&self, id: NodeId) -> String {
        let local = self.local_name(id).unwrap_or("?");
        let xml_id = self
            .xml_id(id)
            .filter(|v| !is_reserved_id(v));

        let mut sb = String::new();
        if xml_id.is_some() || self.is_root_element(id) {
            sb.push_str("the \"");
        } else {
            sb.push_str("a(n) \"");
        }
        sb.push_str(local);
        sb.push_str("\" element");
        if let Some(xml_id) = xml_id {
            sb.push_str(" with xml:id=\"");
            sb.push_str(xml_id);
            sb.push('"');
        }
        match (self.source_name(), self.line(id)) {
            (Some(source), Some(line)) => {
                sb.push_str(&format!(" (location: {source}:{line})"));
            }
            (None, Some(line)) => sb.push_str(&format!(" (line {line})")),
            _ => {}
        }
        sb
    }

    /// [`describe`](Self::describe) with the first letter capitalized, for the
    /// start of a sentence.
    pub fn describe_cap(&self, id: NodeId) -> String {
        util::capitalize_first(&self.describe(id))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildIter<'a> {
    doc: &'a Document,
    current: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.doc.next_sibling(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        let mut children: Vec<_> = self.doc.children(id).collect();
        children.reverse();
        self.stack.extend(children);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DOCBOOK_NS, DocKind};

    fn db(local: &str) -> QualName {
        QualName::new(Some(DOCBOOK_NS), local)
    }

    #[test]
    fn test_create_and_classify() {
        let mut doc = Document::new();
        let book = doc.create_element(db("book"), vec![]);
        doc.append(NodeId::DOCUMENT, book);

        assert_eq!(doc.root_element(), Some(book));
        assert!(doc.is_root_element(book));
        assert_eq!(doc.kind(book), ElementKind::Structure(DocKind::Book));
        assert_eq!(doc.local_name(book), Some("book"));
    }

    #[test]
    fn test_append_and_siblings() {
        let mut doc = Document::new();
        let parent = doc.create_element(db("chapter"), vec![]);
        let a = doc.create_element(db("para"), vec![]);
        let b = doc.create_element(db("para"), vec![]);
        doc.append(NodeId::DOCUMENT, parent);
        doc.append(parent, a);
        doc.append(parent, b);

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![a, b]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.prev_sibling(b), Some(a));
        assert_eq!(doc.parent_element(a), Some(parent));
        assert_eq!(doc.parent_element(parent), None);
    }

    #[test]
    fn test_prepend_and_detach() {
        let mut doc = Document::new();
        let parent = doc.create_element(db("preface"), vec![]);
        let para = doc.create_element(db("para"), vec![]);
        doc.append(NodeId::DOCUMENT, parent);
        doc.append(parent, para);

        let title = doc.create_element(db("title"), vec![]);
        doc.prepend(parent, title);
        assert_eq!(doc.children(parent).collect::<Vec<_>>(), vec![title, para]);

        doc.detach(title);
        assert_eq!(doc.children(parent).collect::<Vec<_>>(), vec![para]);
        assert_eq!(doc.parent(title), None);

        doc.detach(para);
        assert_eq!(doc.children(parent).count(), 0);
        assert!(doc.get(parent).unwrap().last_child.is_none());
    }

    #[test]
    fn test_attributes_and_describe() {
        let mut doc = Document::new();
        let root = doc.create_element(db("book"), vec![]);
        doc.append(NodeId::DOCUMENT, root);
        let chapter = doc.create_element(
            db("chapter"),
            vec![Attribute::new(QualName::new(Some(XML_NS), "id"), "intro")],
        );
        let section = doc.create_element(db("section"), vec![]);
        let auto = doc.create_element(
            db("section"),
            vec![Attribute::new(QualName::new(Some(XML_NS), "id"), "autoid_3")],
        );
        doc.append(root, chapter);
        doc.append(chapter, section);
        doc.append(chapter, auto);
        doc.set_line(section, 7);

        assert_eq!(doc.xml_id(chapter), Some("intro"));
        assert_eq!(doc.attr(chapter, "id"), None);
        assert_eq!(
            doc.describe(chapter),
            "the \"chapter\" element with xml:id=\"intro\""
        );
        assert_eq!(doc.describe(section), "a(n) \"section\" element (line 7)");
        assert_eq!(doc.describe(auto), "a(n) \"section\" element");
        assert_eq!(doc.describe(root), "the \"book\" element");
        assert_eq!(doc.describe_cap(section), "A(n) \"section\" element (line 7)");
    }

    #[test]
    fn test_text_content_and_descendants() {
        let mut doc = Document::new();
        let title = doc.create_element(db("title"), vec![]);
        doc.append(NodeId::DOCUMENT, title);
        let t1 = doc.create_text("Hello, ");
        let em = doc.create_element(db("emphasis"), vec![]);
        let t2 = doc.create_text("World");
        doc.append(title, t1);
        doc.append(title, em);
        doc.append(em, t2);

        assert_eq!(doc.text_content(title), "Hello, World");
        assert_eq!(
            doc.descendants(title).collect::<Vec<_>>(),
            vec![title, t1, em, t2]
        );
        assert_eq!(doc.ancestors(t2).collect::<Vec<_>>(), vec![em, title]);
    }
}
