//! Nested view of the table of contents.
//!
//! [`TocTree`] is a flat arena built for link queries. An [`Outline`] is the
//! same tree as owned, nested entries with their titles resolved, for
//! printing or serializing.

use super::toc::{TocId, TocTree};
use crate::dom::{Document, NodeId};
use crate::model::{Annotations, ElementKind, Rank};

/// The table of contents as a nested tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Outline {
    /// Output file of the document element, unless simple navigation
    /// dropped it.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub root_file: Option<String>,
    pub entries: Vec<OutlineEntry>,
}

/// A TOC node with its title.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct OutlineEntry {
    /// Element name, like "chapter".
    pub element: String,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub id: Option<String>,
    pub rank: Option<Rank>,
    /// Title text, whitespace collapsed. Empty for untitled elements.
    pub title: String,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub prefix: Option<String>,
    pub file_element: bool,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub file: Option<String>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub external_link: Option<String>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<OutlineEntry>,
}

impl Outline {
    /// Build the outline of an analyzed document. The root node's children
    /// become the top-level entries.
    pub fn build(doc: &Document, annotations: &Annotations, tree: &TocTree) -> Self {
        let Some(root) = tree.root() else {
            return Outline {
                root_file: None,
                entries: Vec::new(),
            };
        };
        Outline {
            root_file: tree.get(root).and_then(|n| n.output_file.clone()),
            entries: children_of(doc, annotations, tree, root),
        }
    }

    /// Number of entries at any depth.
    pub fn len(&self) -> usize {
        fn count(entries: &[OutlineEntry]) -> usize {
            entries.iter().map(|e| 1 + count(&e.children)).sum()
        }
        count(&self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn children_of(doc: &Document, annotations: &Annotations, tree: &TocTree, id: TocId) -> Vec<OutlineEntry> {
    tree.children(id)
        .map(|node| {
            let info = annotations.get(node.element);
            OutlineEntry {
                element: doc.local_name(node.element).unwrap_or_default().to_string(),
                id: info.and_then(|i| i.id.clone()),
                rank: info.and_then(|i| i.rank),
                title: title_text(doc, node.element),
                prefix: info.and_then(|i| i.title_prefix.clone()),
                file_element: node.file_element,
                file: node.output_file.clone(),
                external_link: node.external_link.clone(),
                children: children_of(doc, annotations, tree, node.id),
            }
        })
        .collect()
}

/// Text of the element's `title`, or of `info/title`.
pub fn title_text(doc: &Document, element: NodeId) -> String {
    let title = doc.child_of_kind(element, ElementKind::Title).or_else(|| {
        doc.child_of_kind(element, ElementKind::Info)
            .and_then(|info| doc.child_of_kind(info, ElementKind::Title))
    });
    title
        .map(|t| {
            doc.text_content(t)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dom::parse_str;
    use crate::structure::annotate::Annotator;
    use crate::structure::rank::assign_ranks;
    use crate::structure::toc::build_toc;

    fn outline_of(xml: &str, settings: &Settings) -> Outline {
        let mut doc = parse_str(xml).unwrap();
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations).unwrap();
        Annotator::new(settings).run(&mut doc, &mut annotations).unwrap();
        let tree = build_toc(&doc, &mut annotations, settings).unwrap();
        Outline::build(&doc, &annotations, &tree)
    }

    #[test]
    fn test_nested_entries() {
        let outline = outline_of(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <title>Manual</title>
                <preface xml:id="pre"/>
                <chapter xml:id="start">
                    <info><title>Getting
                        <emphasis>started</emphasis></title></info>
                    <section xml:id="install"><title>Install</title></section>
                </chapter>
            </book>"#,
            &Settings::default(),
        );

        assert_eq!(outline.root_file.as_deref(), Some("index.html"));
        assert_eq!(outline.len(), 3);
        let [preface, chapter] = outline.entries.as_slice() else {
            panic!("expected two top-level entries, got {:?}", outline.entries);
        };
        assert_eq!(preface.title, "Preface");
        assert_eq!(preface.prefix, None);
        assert_eq!(chapter.title, "Getting started");
        assert_eq!(chapter.prefix.as_deref(), Some("1"));
        assert_eq!(chapter.rank, Some(Rank::Chapter));
        assert_eq!(chapter.file.as_deref(), Some("start.html"));
        assert_eq!(chapter.children[0].id.as_deref(), Some("install"));
        assert_eq!(chapter.children[0].rank, Some(Rank::Section1));
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::build(&Document::new(), &Annotations::new(), &TocTree::default());
        assert!(outline.is_empty());
        assert_eq!(outline.root_file, None);
    }
}
