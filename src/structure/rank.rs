//! Rank assignment.
//!
//! Ranks are assigned top-down from the document element:
//!
//! - `book` is [`Rank::Book`]; its document-structure children share one
//!   rank, [`Rank::Part`] if any of them is a `part`, else [`Rank::Chapter`].
//! - `article` as document element is [`Rank::Chapter`].
//! - Below a chapter-ranked element each level of nesting is one section
//!   level deeper, down to [`Rank::Section3`]. `simplesect` is always a
//!   [`Rank::Simplesect`] leaf.

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::model::{Annotations, DocKind, ElementKind, MAX_SECTION_NESTING_LEVEL, Rank};

/// Assign a rank to every document-structure element.
pub fn assign_ranks(doc: &Document, annotations: &mut Annotations) -> Result<()> {
    let Some(root) = doc.root_element() else {
        return Err(Error::structure("The document has no root element."));
    };

    match doc.kind(root).doc_kind() {
        Some(DocKind::Book) => {
            set_rank(annotations, root, Rank::Book);
            under_book(doc, annotations, root)?;
        }
        Some(DocKind::Article) => {
            set_rank(annotations, root, Rank::Chapter);
            under_chapter_or_deeper(doc, annotations, root, 0)?;
        }
        _ => {
            return Err(Error::structure(format!(
                "The \"{}\" element is unsupported as root element.",
                doc.local_name(root).unwrap_or("?")
            )));
        }
    }

    check_all_ranked(doc, annotations, root)?;
    log::debug!("Ranked {} document-structure element(s)", annotations.ranked().count());
    Ok(())
}

fn set_rank(annotations: &mut Annotations, node: NodeId, rank: Rank) {
    annotations.entry(node).rank = Some(rank);
}

fn structure_children(doc: &Document, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    doc.element_children(parent)
        .filter(move |&c| doc.kind(c).is_structure())
}

fn under_book(doc: &Document, annotations: &mut Annotations, book: NodeId) -> Result<()> {
    let mut common: Option<Rank> = None;
    for child in doc.element_children(book) {
        let (rank, other) = match doc.kind(child).doc_kind() {
            Some(DocKind::Part) => (Rank::Part, DocKind::Chapter),
            Some(DocKind::Chapter) => (Rank::Chapter, DocKind::Part),
            _ => continue,
        };
        if common.is_some_and(|c| c != rank) {
            return Err(Error::structure(format!(
                "Bad document structure: {} is on the same ToC level with a \"{}\" element.",
                doc.describe(child),
                other
            )));
        }
        common = Some(rank);
    }
    let common = common.unwrap_or(Rank::Chapter);

    let children: Vec<_> = structure_children(doc, book).collect();
    for child in children {
        set_rank(annotations, child, common);
        // A preface in a book of parts gets the part rank, but its children
        // are still chapter-level content.
        if doc.kind(child) == ElementKind::Structure(DocKind::Part) {
            under_true_part(doc, annotations, child)?;
        } else {
            under_chapter_or_deeper(doc, annotations, child, 0)?;
        }
    }
    Ok(())
}

fn under_true_part(doc: &Document, annotations: &mut Annotations, part: NodeId) -> Result<()> {
    let children: Vec<_> = structure_children(doc, part).collect();
    for child in children {
        set_rank(annotations, child, Rank::Chapter);
        under_chapter_or_deeper(doc, annotations, child, 0)?;
    }
    Ok(())
}

fn under_chapter_or_deeper(
    doc: &Document,
    annotations: &mut Annotations,
    parent: NodeId,
    level: u8,
) -> Result<()> {
    let children: Vec<_> = structure_children(doc, parent).collect();
    for child in children {
        if doc.kind(child) == ElementKind::Structure(DocKind::Simplesect) {
            set_rank(annotations, child, Rank::Simplesect);
            continue;
        }

        let Some(rank) = Rank::section(level + 1) else {
            return Err(Error::structure(format!(
                "Too deep ToC nesting for {}: rank below section{}",
                doc.describe(child),
                MAX_SECTION_NESTING_LEVEL
            )));
        };
        set_rank(annotations, child, rank);
        under_chapter_or_deeper(doc, annotations, child, level + 1)?;
    }
    Ok(())
}

/// Document-structure elements the hierarchy can't reach: inside a
/// `simplesect`, or wrapped in a non-structural element.
fn check_all_ranked(doc: &Document, annotations: &Annotations, root: NodeId) -> Result<()> {
    for node in doc.descendants(root) {
        if doc.kind(node).is_structure() && annotations.rank(node).is_none() {
            let parent = doc
                .parent_element(node)
                .map(|p| doc.describe(p))
                .unwrap_or_else(|| "the document".to_string());
            return Err(Error::structure(format!(
                "Bad document structure: {} can't be placed in the ToC hierarchy, as its parent, \
                 {}, isn't a document-structure element that can have such children.",
                doc.describe_cap(node),
                parent
            )));
        }
    }
    Ok(())
}
