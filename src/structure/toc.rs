//! Table of contents tree.
//!
//! The TOC mirrors the document-structure elements whose rank reaches the
//! page-TOC threshold. Nodes are stored flat in document order; a node's
//! [`TocId`] is its traversal index, and parent, sibling and child links are
//! ids into the same tree. The TOC decides page boundaries: file nodes are
//! rendered as their own output file, the others are listed in the page
//! contents of the file they live in.

use std::collections::HashMap;

use super::has_preface_like_ancestor;
use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::model::{AUTO_ID_PREFIX, Annotations, ElementKind, Rank, XLINK_NS};

/// Output file of the document element.
pub const ROOT_FILE_NAME: &str = "index.html";
/// File name stems docgen writes itself.
pub const RESERVED_FILE_STEMS: [&str; 2] = ["index", "search-results"];
/// Extension of generated pages.
pub const PAGE_EXTENSION: &str = ".html";

/// Index of a [`TocNode`] in its [`TocTree`], equal to its position in
/// document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TocId(pub u32);

impl TocId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A document-structure element listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocNode {
    pub id: TocId,
    pub element: NodeId,
    pub parent: Option<TocId>,
    pub prev_sibling: Option<TocId>,
    pub next_sibling: Option<TocId>,
    pub first_child: Option<TocId>,
    pub last_child: Option<TocId>,
    /// Rendered as a page of its own (or, for external links, as a link to
    /// one).
    pub file_element: bool,
    /// Name of the output file, like `getting-started.html`.
    pub output_file: Option<String>,
    /// Target URL when the title is nothing but a link.
    pub external_link: Option<String>,
}

impl TocNode {
    fn new(id: TocId, element: NodeId) -> Self {
        Self {
            id,
            element,
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            file_element: false,
            output_file: None,
            external_link: None,
        }
    }

    pub fn is_external_link(&self) -> bool {
        self.external_link.is_some()
    }
}

/// Arena of [`TocNode`]s. The root, if any, is the first node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocTree {
    nodes: Vec<TocNode>,
    by_element: HashMap<NodeId, TocId>,
}

impl TocTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// An empty tree is valid: the document has no structure to paginate.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<TocId> {
        self.nodes.first().map(|n| n.id)
    }

    pub fn get(&self, id: TocId) -> Option<&TocNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: TocId) -> Option<&mut TocNode> {
        self.nodes.get_mut(id.index())
    }

    /// Nodes in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, TocNode> {
        self.nodes.iter()
    }

    /// The TOC node of an element, file node or not.
    pub fn node_of(&self, element: NodeId) -> Option<TocId> {
        self.by_element.get(&element).copied()
    }

    /// Children of a node, in order.
    pub fn children(&self, id: TocId) -> impl Iterator<Item = &TocNode> + '_ {
        std::iter::successors(
            self.get(id).and_then(|n| n.first_child).and_then(|c| self.get(c)),
            |n| n.next_sibling.and_then(|s| self.get(s)),
        )
    }

    fn push(&mut self, element: NodeId) -> TocId {
        let id = TocId(self.nodes.len() as u32);
        self.nodes.push(TocNode::new(id, element));
        self.by_element.insert(element, id);
        id
    }

    /// Append `child` to the child chain of `parent`.
    fn link_child(&mut self, parent: TocId, child: TocId) {
        let last = self.get(parent).and_then(|p| p.last_child);
        if let Some(last) = last
            && let Some(prev) = self.get_mut(last)
        {
            prev.next_sibling = Some(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = last;
        }
        if let Some(p) = self.get_mut(parent) {
            if p.first_child.is_none() {
                p.first_child = Some(child);
            }
            p.last_child = Some(child);
        }
    }
}

/// Build the TOC of an annotated document, marking file and page-TOC
/// elements in `annotations`.
pub fn build_toc(doc: &Document, annotations: &mut Annotations, settings: &Settings) -> Result<TocTree> {
    let mut builder = Builder {
        annotations,
        settings,
        file_rank: settings.lowest_file_element_rank,
        page_rank: settings.page_toc_rank(),
        tree: TocTree::default(),
    };
    builder.visit(doc, NodeId::DOCUMENT, None)?;
    let tree = builder.tree;

    if !settings.simple_navigation_mode {
        check_auto_id_file_names(doc, &tree, settings)?;
    }

    log::debug!(
        "Built ToC: {} node(s), {} file(s)",
        tree.len(),
        tree.iter().filter(|n| n.output_file.is_some()).count()
    );
    Ok(tree)
}

struct Builder<'a> {
    annotations: &'a mut Annotations,
    settings: &'a Settings,
    file_rank: Rank,
    page_rank: Rank,
    tree: TocTree,
}

impl Builder<'_> {
    fn visit(&mut self, doc: &Document, node: NodeId, parent: Option<TocId>) -> Result<Option<TocId>> {
        let current = self.toc_node_for(doc, node)?;
        let parent = current.or(parent);

        for child in doc.children(node) {
            if let Some(child_toc) = self.visit(doc, child, parent)?
                && let Some(parent) = parent
            {
                self.tree.link_child(parent, child_toc);
            }
        }
        Ok(current)
    }

    fn toc_node_for(&mut self, doc: &Document, node: NodeId) -> Result<Option<TocId>> {
        if !doc.kind(node).is_structure() {
            return Ok(None);
        }
        let Some(rank) = self.annotations.rank(node) else {
            return Err(Error::Bug(format!("{} has no rank", doc.describe(node))));
        };
        let is_root = doc.is_root_element(node);
        if !is_root && rank < self.page_rank {
            return Ok(None);
        }

        let toc_id = self.tree.push(node);
        let file_element =
            (is_root || rank >= self.file_rank) && !has_preface_like_ancestor(doc, node);

        let mut output_file = None;
        let mut external_link = None;
        if file_element {
            if is_root {
                output_file = Some(ROOT_FILE_NAME.to_string());
            } else if let Some(url) = external_link_url(doc, node, self.settings)? {
                external_link = Some(url);
            } else {
                output_file = Some(self.file_name(doc, node)?);
            }
        }

        if let Some(toc) = self.tree.get_mut(toc_id) {
            toc.file_element = file_element;
            toc.output_file = output_file;
            toc.external_link = external_link;
        }
        let info = self.annotations.entry(node);
        info.is_root = is_root;
        info.file_element = file_element;
        info.page_toc_element = !file_element;
        info.detailed_toc_element = true;
        Ok(Some(toc_id))
    }

    fn file_name(&self, doc: &Document, node: NodeId) -> Result<String> {
        let Some(id) = self.annotations.id(node) else {
            return Err(Error::Bug(format!("{} has no id", doc.describe(node))));
        };
        let stem = file_stem(id);
        if RESERVED_FILE_STEMS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(stem))
        {
            return Err(Error::structure(format!(
                "{} has an xml:id that is deduced to a reserved output file name, \"{}{}\". \
                 (Hint: Change the xml:id.)",
                doc.describe_cap(node),
                stem,
                PAGE_EXTENSION
            )));
        }
        Ok(format!("{id}{PAGE_EXTENSION}"))
    }
}

/// The id without a trailing page extension, matched case-insensitively.
fn file_stem(id: &str) -> &str {
    id.len()
        .checked_sub(PAGE_EXTENSION.len())
        .and_then(|at| Some((id.get(..at)?, id.get(at..)?)))
        .filter(|(_, extension)| extension.eq_ignore_ascii_case(PAGE_EXTENSION))
        .map_or(id, |(stem, _)| stem)
}

/// URL of an element whose title is a single `link` or `olink`. Such an
/// element is listed in the TOC as a link and gets no page.
pub fn external_link_url(doc: &Document, element: NodeId, settings: &Settings) -> Result<Option<String>> {
    if doc.is_root_element(element) {
        return Ok(None);
    }
    let Some(title) = doc.child_of_kind(element, ElementKind::Title) else {
        return Ok(None);
    };
    let mut children = doc.element_children(title);
    let (Some(only), None) = (children.next(), children.next()) else {
        return Ok(None);
    };

    match doc.kind(only) {
        ElementKind::Link => match doc.attr_ns(only, Some(XLINK_NS), "href") {
            Some(href) => Ok(Some(href.to_string())),
            None => Err(Error::structure(format!(
                "{} inside a title has no xlink:href attribute, thus it can't be used as ToC link.",
                doc.describe_cap(only)
            ))),
        },
        ElementKind::Olink => {
            let Some(target) = doc.attr(only, "targetdoc") else {
                return Err(Error::structure(format!(
                    "{} has no targetdoc attribute.",
                    doc.describe_cap(only)
                )));
            };
            match settings.olinks.get(target) {
                Some(url) => Ok(Some(url.clone())),
                None => Err(Error::structure(format!(
                    "{} refers to undefined olink name \"{target}\"; check the \"olinks\" setting.",
                    doc.describe_cap(only)
                ))),
            }
        }
        _ => Ok(None),
    }
}

/// Reject output file names derived from synthesized ids, unless allowed.
/// Such names change whenever the document is edited.
pub fn check_auto_id_file_names(doc: &Document, tree: &TocTree, settings: &Settings) -> Result<()> {
    if settings.output_files_can_use_auto_id {
        return Ok(());
    }
    for node in tree.iter() {
        if let Some(file) = &node.output_file
            && file.starts_with(AUTO_ID_PREFIX)
        {
            return Err(Error::structure(format!(
                "{} has an automatically generated ID that is not allowed as the ID is used for \
                 generating a file name. (Add an xml:id, or review the \
                 \"outputFilesCanUseAutoID\" setting.)",
                doc.describe_cap(node.element)
            )));
        }
    }
    Ok(())
}
