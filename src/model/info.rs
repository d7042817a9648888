//! Per-element structural annotations.
//!
//! The passes never write attributes into the document tree. Everything they
//! derive lives in [`Annotations`], a side table keyed by [`NodeId`], and in
//! [`IdRegistry`].

use std::collections::HashMap;

use super::rank::Rank;
use crate::dom::NodeId;

/// Prefix of synthesized ids.
pub const AUTO_ID_PREFIX: &str = "autoid_";
/// Prefix reserved for ids docgen itself introduces in generated pages.
pub const DOCGEN_ID_PREFIX: &str = "docgen_";

/// Whether an id uses one of the reserved prefixes.
pub fn is_reserved_id(id: &str) -> bool {
    id.starts_with(AUTO_ID_PREFIX) || id.starts_with(DOCGEN_ID_PREFIX)
}

/// What the passes derived for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralInfo {
    /// Set by rank assignment on document-structure elements.
    pub rank: Option<Rank>,
    /// The element's `xml:id`, or a synthesized `autoid_N`.
    pub id: Option<String>,
    /// Numbering shown before the title, such as "2.4" or "IV".
    pub title_prefix: Option<String>,
    /// 1-based ordinal among the document-structure siblings of any kind.
    pub united_numbering: Option<u32>,
    /// The document element.
    pub is_root: bool,
    /// Gets its own output file.
    pub file_element: bool,
    /// Listed in the "page contents" of the file it lives in.
    pub page_toc_element: bool,
    /// Shown in the detailed table of contents.
    pub detailed_toc_element: bool,
    /// No link can point to it (simple navigation mode dropped its file).
    pub not_addressable: bool,
}

/// Side table of [`StructuralInfo`] records.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    infos: HashMap<NodeId, StructuralInfo>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a node, if any pass annotated it.
    pub fn get(&self, node: NodeId) -> Option<&StructuralInfo> {
        self.infos.get(&node)
    }

    /// Get the record for a node, creating an empty one if needed.
    pub fn entry(&mut self, node: NodeId) -> &mut StructuralInfo {
        self.infos.entry(node).or_default()
    }

    pub fn rank(&self, node: NodeId) -> Option<Rank> {
        self.get(node).and_then(|i| i.rank)
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.get(node).and_then(|i| i.id.as_deref())
    }

    pub fn title_prefix(&self, node: NodeId) -> Option<&str> {
        self.get(node).and_then(|i| i.title_prefix.as_deref())
    }

    pub fn united_numbering(&self, node: NodeId) -> Option<u32> {
        self.get(node).and_then(|i| i.united_numbering)
    }

    pub fn is_file_element(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|i| i.file_element)
    }

    pub fn is_page_toc_element(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|i| i.page_toc_element)
    }

    pub fn is_not_addressable(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|i| i.not_addressable)
    }

    /// Number of annotated nodes.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterate all ranked nodes.
    pub fn ranked(&self) -> impl Iterator<Item = (NodeId, Rank)> + '_ {
        self.infos
            .iter()
            .filter_map(|(&node, info)| info.rank.map(|r| (node, r)))
    }
}

/// Global id → element table.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    by_id: HashMap<String, NodeId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an id. Returns the element that already had it, if any; the
    /// existing entry is kept in that case.
    pub fn register(&mut self, id: &str, node: NodeId) -> Option<NodeId> {
        if let Some(&existing) = self.by_id.get(id) {
            return Some(existing);
        }
        self.by_id.insert(id.to_string(), node);
        None
    }

    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.by_id.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
