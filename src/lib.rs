//! # docgen
//!
//! Structural analysis of DocBook 5 documents for paginated HTML output.
//!
//! Given a parsed DocBook tree, docgen works out everything a page renderer
//! needs to know about the document's structure:
//!
//! - the rank of every book, part, chapter, section and the like
//! - stable ids, and a registry from id to element
//! - title prefixes ("2.1", "IV", "B") and per-parent united numbering
//! - a table of contents deciding which elements get their own page
//! - a back-of-book index term lookup
//!
//! The tree is checked along the way: a document whose structure can't be
//! paginated with the configured thresholds is rejected with an error naming
//! the element and the setting to review.
//!
//! ## Quick Start
//!
//! ```
//! use docgen::{Settings, analyze, dom};
//!
//! let mut doc = dom::parse_str(r#"<book xmlns="http://docbook.org/ns/docbook">
//!     <title>Manual</title>
//!     <chapter xml:id="intro"><title>Introduction</title><para>Hello</para></chapter>
//! </book>"#)?;
//!
//! let model = analyze(&mut doc, &Settings::default())?;
//! let intro = model.element_by_id("intro").unwrap();
//! assert_eq!(model.title_prefix(intro), Some("1"));
//! assert_eq!(model.toc.containing_file(&doc, intro), Some("intro.html"));
//! # Ok::<(), docgen::Error>(())
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod structure;
pub(crate) mod util;

pub use config::Settings;
pub use error::{Error, Result};
pub use model::{Annotations, IdRegistry, Rank, StructuralInfo};
pub use structure::{IndexTermIndex, Outline, TableNormalizer, TocId, TocNode, TocTree};

use dom::{Document, NodeId};
use structure::{annotate::Annotator, navigation, prune, rank, toc, topology};

/// Everything the passes derived from one document.
#[derive(Debug, Clone)]
pub struct StructuralModel {
    pub annotations: Annotations,
    pub ids: IdRegistry,
    pub index_terms: IndexTermIndex,
    pub toc: TocTree,
}

impl StructuralModel {
    pub fn rank(&self, element: NodeId) -> Option<Rank> {
        self.annotations.rank(element)
    }

    /// The element's `xml:id`, or its synthesized id.
    pub fn id(&self, element: NodeId) -> Option<&str> {
        self.annotations.id(element)
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id)
    }

    pub fn title_prefix(&self, element: NodeId) -> Option<&str> {
        self.annotations.title_prefix(element)
    }

    pub fn united_numbering(&self, element: NodeId) -> Option<u32> {
        self.annotations.united_numbering(element)
    }

    /// Nested table of contents with resolved titles.
    pub fn outline(&self, doc: &Document) -> Outline {
        Outline::build(doc, &self.annotations, &self.toc)
    }
}

/// Run every pass over the document, leaving tables as they are.
///
/// The document is modified: nodes excluded from online builds are removed
/// and missing default titles are added.
pub fn analyze(doc: &mut Document, settings: &Settings) -> Result<StructuralModel> {
    analyze_with_tables(doc, settings, &structure::KeepTables)
}

/// Run every pass over the document, normalizing tables with `tables`.
pub fn analyze_with_tables(
    doc: &mut Document,
    settings: &Settings,
    tables: &dyn TableNormalizer,
) -> Result<StructuralModel> {
    prune::remove_nodes_when_online(doc, settings)?;

    let mut annotations = Annotations::new();
    rank::assign_ranks(doc, &mut annotations)?;

    let (ids, index_terms) = Annotator::new(settings)
        .with_table_normalizer(tables)
        .run(doc, &mut annotations)?;

    let mut toc = toc::build_toc(doc, &mut annotations, settings)?;
    topology::validate(doc, &toc)?;
    navigation::apply_simple_navigation(doc, &mut annotations, &mut toc, settings)?;

    log::info!(
        "Analyzed {}: {} ranked element(s), {} ToC node(s), {} output file(s)",
        doc.source_name().unwrap_or("document"),
        annotations.ranked().count(),
        toc.len(),
        toc.iter().filter(|n| n.output_file.is_some()).count()
    );

    Ok(StructuralModel {
        annotations,
        ids,
        index_terms,
        toc,
    })
}
