//! TOC topology checks.
//!
//! The TOC must be a faithful projection of the document structure, and
//! file elements must form a prefix of it: the rendering of navigation
//! links assumes both. Thresholds that fit one document can produce a
//! broken TOC for another, so the errors point at the setting to review.

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use super::toc::{TocId, TocNode, TocTree};

const TOC_TOPOLOGY_HINT: &str = " (Hint: Review the \"lowestPageTOCElementRank\" setting. Maybe \
                                 it's incompatible with the structure of this document.)";
const FILE_TOPOLOGY_HINT: &str = " (Hint: Review the \"lowestFileElementRank\" setting. Maybe \
                                  it's incompatible with the structure of this document.)";

/// Check the TOC against the document. An empty TOC is always valid.
pub fn validate(doc: &Document, tree: &TocTree) -> Result<()> {
    let Some(root) = tree.root() else {
        return Ok(());
    };
    check_toc_topology(doc, tree, root)?;

    if !tree.get(root).is_some_and(|n| n.file_element) {
        return Err(Error::Bug("The root ToC node must be a file element.".to_string()));
    }
    check_file_topology(doc, tree, root)?;

    log::debug!("ToC topology is valid");
    Ok(())
}

fn node(tree: &TocTree, id: TocId) -> Result<&TocNode> {
    tree.get(id)
        .ok_or_else(|| Error::Bug(format!("dangling ToC link to node {}", id.0)))
}

fn check_toc_topology(doc: &Document, tree: &TocTree, id: TocId) -> Result<()> {
    let current = node(tree, id)?;
    let element = current.element;

    if let Some(parent) = current.parent {
        let parent_element = node(tree, parent)?.element;
        if doc.parent(element) != Some(parent_element) {
            return Err(Error::structure(format!(
                "Bad ToC-element topology: In the ToC {} is the parent of {}, yet they are not in \
                 parent-child relation in the XML document (but maybe in grandparent-nephew \
                 relation or like).{TOC_TOPOLOGY_HINT}",
                doc.describe(parent_element),
                doc.describe(element)
            )));
        }
    }

    let following = structure_sibling(doc, element, Direction::Next);
    match (current.next_sibling, following) {
        (Some(next), None) => {
            return Err(Error::structure(format!(
                "Bad ToC-element topology: In the ToC {} is the following sibling of {}, yet they \
                 are not siblings in the XML document.{TOC_TOPOLOGY_HINT}",
                doc.describe(node(tree, next)?.element),
                doc.describe(element)
            )));
        }
        (Some(next), Some(sibling)) => {
            let next_element = node(tree, next)?.element;
            if sibling != next_element {
                return Err(Error::structure(format!(
                    "Bad ToC-element topology: In the ToC {} is the immediate following sibling \
                     of {}, but in the XML document there is a \"{}\" element between them, or \
                     they aren't siblings at all.{TOC_TOPOLOGY_HINT}",
                    doc.describe(next_element),
                    doc.describe(element),
                    doc.local_name(sibling).unwrap_or("?")
                )));
            }
        }
        (None, Some(sibling)) => {
            return Err(Error::structure(format!(
                "Bad ToC-element topology: In the ToC hierarchy {} is a last-child, but in the XML \
                 document it has a \"{}\" element as its following sibling.{TOC_TOPOLOGY_HINT}",
                doc.describe(element),
                doc.local_name(sibling).unwrap_or("?")
            )));
        }
        (None, None) => {}
    }

    if current.prev_sibling.is_none()
        && let Some(sibling) = structure_sibling(doc, element, Direction::Previous)
    {
        return Err(Error::structure(format!(
            "Bad ToC-element topology: In the ToC hierarchy {} is a first-child, but in the XML \
             document it has a \"{}\" element as its preceding sibling.{TOC_TOPOLOGY_HINT}",
            doc.describe(element),
            doc.local_name(sibling).unwrap_or("?")
        )));
    }

    let children: Vec<_> = tree.children(id).map(|c| c.id).collect();
    for child in children {
        check_toc_topology(doc, tree, child)?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

/// Nearest document-structure sibling element in the given direction.
fn structure_sibling(doc: &Document, element: NodeId, direction: Direction) -> Option<NodeId> {
    let step = |n: &NodeId| match direction {
        Direction::Next => doc.next_sibling(*n),
        Direction::Previous => doc.prev_sibling(*n),
    };
    std::iter::successors(step(&element), step).find(|&n| doc.kind(n).is_structure())
}

fn check_file_topology(doc: &Document, tree: &TocTree, id: TocId) -> Result<()> {
    let current = node(tree, id)?;
    let Some(first_id) = current.first_child else {
        return Ok(());
    };
    let first = node(tree, first_id)?;

    for child in tree.children(id) {
        if child.file_element != first.file_element {
            let (is, isnt) = if first.file_element {
                ("a", "isn't")
            } else {
                ("not a", "is")
            };
            return Err(Error::structure(format!(
                "Bad file-element topology: The first child element of {}, {}, is {is} \
                 file-element, while another child, {} {isnt}. Either all relevant children \
                 elements must be file-elements or neither can be.{FILE_TOPOLOGY_HINT}",
                doc.describe(current.element),
                doc.describe(first.element),
                doc.describe(child.element)
            )));
        }
        check_file_topology(doc, tree, child.id)?;
    }

    if first.file_element && !current.file_element {
        return Err(Error::structure(format!(
            "Bad file-element topology: {} is not a file-element, yet it has file-element \
             children, {}. Only file-elements can have children that are file-elements.\
             {FILE_TOPOLOGY_HINT}",
            doc.describe_cap(current.element),
            doc.describe(first.element)
        )));
    }
    Ok(())
}
