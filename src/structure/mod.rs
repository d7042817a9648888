//! Structural inference passes.
//!
//! The passes run in a fixed order over one document:
//!
//! 1. [`prune`]: drop nodes excluded from online builds
//! 2. [`rank`]: assign a [`Rank`](crate::model::Rank) to every
//!    document-structure element
//! 3. [`annotate`]: ids, default titles, numbering, index terms, image checks
//! 4. [`toc`]: build the table of contents and decide page boundaries
//! 5. [`topology`]: check the TOC against the document
//! 6. [`navigation`]: simple navigation mode, and the queries the rendering
//!    side uses to link pages
//!
//! Each pass only reads what the earlier ones wrote. [`crate::analyze`] runs
//! them all.

pub mod annotate;
pub mod index_terms;
pub mod navigation;
pub mod numbering;
pub mod outline;
pub mod prune;
pub mod rank;
pub mod toc;
pub mod topology;

pub use annotate::{Annotator, KeepTables, TableNormalizer};
pub use index_terms::{Collator, IndexTermIndex, SecondaryTerm};
pub use outline::{Outline, OutlineEntry};
pub use toc::{TocId, TocNode, TocTree};

use crate::dom::{Document, NodeId};
use crate::model::DocKind;

/// Whether the node sits inside a preface-like element, whose descendants
/// are never numbered and never get files of their own.
pub(crate) fn has_preface_like_ancestor(doc: &Document, node: NodeId) -> bool {
    doc.ancestors(node)
        .any(|a| doc.kind(a).doc_kind().is_some_and(DocKind::is_preface_like))
}
