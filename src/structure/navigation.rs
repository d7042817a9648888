//! Navigation between output files.

use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::model::{Annotations, ElementKind};

use super::toc::{self, TocId, TocTree};

impl TocTree {
    /// The TOC node of an element that is a file element.
    pub fn file_node_for(&self, element: NodeId) -> Option<TocId> {
        self.node_of(element)
            .filter(|&id| self.get(id).is_some_and(|n| n.file_element))
    }

    /// Output file the element is rendered into: that of the nearest
    /// ancestor-or-self file element that has one.
    pub fn containing_file(&self, doc: &Document, element: NodeId) -> Option<&str> {
        std::iter::once(element)
            .chain(doc.ancestors(element))
            .filter_map(|e| self.file_node_for(e))
            .find_map(|id| self.get(id).and_then(|n| n.output_file.as_deref()))
    }

    /// Nearest file node after `id` in document order.
    pub fn next_file(&self, id: TocId) -> Option<TocId> {
        self.iter()
            .skip(id.0 as usize + 1)
            .find(|n| n.file_element)
            .map(|n| n.id)
    }

    /// Nearest file node before `id` in document order.
    pub fn previous_file(&self, id: TocId) -> Option<TocId> {
        self.iter()
            .take(id.0 as usize)
            .rev()
            .find(|n| n.file_element)
            .map(|n| n.id)
    }

    pub fn parent_of(&self, id: TocId) -> Option<TocId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Number of file nodes listed in the page contents of `id`, looking
    /// `depth` levels down. 0 means the whole document fits on one page.
    pub fn count_page_contents_entries(&self, id: TocId, depth: u32) -> usize {
        self.children(id)
            .filter(|c| c.file_element)
            .map(|c| {
                1 + if depth > 1 {
                    self.count_page_contents_entries(c.id, depth - 1)
                } else {
                    0
                }
            })
            .sum()
    }
}

/// Whether a document-structure element renders anything into its own file.
/// Children with files of their own don't count; titles don't either.
/// Page-TOC children do, as they are rendered into this element's file.
pub fn has_content_in_same_file(doc: &Document, annotations: &Annotations, element: NodeId) -> bool {
    doc.element_children(element).any(|child| {
        let kind = doc.kind(child);
        !annotations.is_file_element(child)
            && kind.is_visible_top_level()
            && !matches!(
                kind,
                ElementKind::Title | ElementKind::Subtitle | ElementKind::Info
            )
    })
}

/// Drop the pages of file elements with nothing of their own to show, and
/// of the document element. Their elements become not addressable; the
/// navigation links straight to their children. Returns the number of
/// dropped pages.
pub fn apply_simple_navigation(
    doc: &Document,
    annotations: &mut Annotations,
    tree: &mut TocTree,
    settings: &Settings,
) -> Result<usize> {
    if !settings.simple_navigation_mode {
        return Ok(0);
    }

    let dropped: Vec<_> = tree
        .iter()
        .filter(|n| {
            n.file_element
                && (n.parent.is_none() || !has_content_in_same_file(doc, annotations, n.element))
        })
        .map(|n| (n.id, n.element))
        .collect();

    for &(id, element) in &dropped {
        if let Some(node) = tree.get_mut(id) {
            node.output_file = None;
        }
        annotations.entry(element).not_addressable = true;
    }

    toc::check_auto_id_file_names(doc, tree, settings)?;
    log::debug!("Simple navigation mode dropped {} page(s)", dropped.len());
    Ok(dropped.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_str;
    use crate::model::Rank;
    use crate::structure::annotate::Annotator;
    use crate::structure::rank::assign_ranks;
    use crate::structure::toc::build_toc;

    const BOOK: &str = r#"<book xmlns="http://docbook.org/ns/docbook">
        <chapter xml:id="c1">
            <title>One</title>
            <section xml:id="s11"><para xml:id="p11">Text</para></section>
            <section xml:id="s12"/>
        </chapter>
        <chapter xml:id="c2">
            <para>Intro</para>
            <section xml:id="s21"><section xml:id="s211"/></section>
        </chapter>
        <chapter xml:id="c3"/>
    </book>"#;

    fn build(settings: &Settings) -> (Document, Annotations, TocTree) {
        let mut doc = parse_str(BOOK).unwrap();
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations).unwrap();
        Annotator::new(settings).run(&mut doc, &mut annotations).unwrap();
        let tree = build_toc(&doc, &mut annotations, settings).unwrap();
        (doc, annotations, tree)
    }

    fn element(doc: &Document, id: &str) -> NodeId {
        doc.descendants(doc.root_element().unwrap())
            .find(|&n| doc.xml_id(n) == Some(id))
            .unwrap()
    }

    #[test]
    fn test_file_navigation() {
        let (doc, _, tree) = build(&Settings::default());
        // book, c1, s11, s12, c2, s21, s211, c3
        assert_eq!(tree.len(), 8);
        let c1 = tree.file_node_for(element(&doc, "c1")).unwrap();
        let s12 = tree.file_node_for(element(&doc, "s12")).unwrap();
        assert_eq!(tree.next_file(c1), Some(TocId(2)));
        assert_eq!(tree.previous_file(c1), Some(TocId(0)));
        assert_eq!(tree.previous_file(TocId(0)), None);
        assert_eq!(tree.next_file(s12), Some(TocId(4)));
        assert_eq!(tree.next_file(TocId(7)), None);
        assert_eq!(tree.parent_of(s12), Some(c1));
        assert_eq!(tree.parent_of(TocId(0)), None);

        // section2 is below the file threshold
        assert_eq!(tree.file_node_for(element(&doc, "s211")), None);
        assert_eq!(tree.next_file(TocId(5)), Some(TocId(7)));
    }

    #[test]
    fn test_containing_file() {
        let (doc, _, tree) = build(&Settings::default());
        assert_eq!(tree.containing_file(&doc, element(&doc, "p11")), Some("s11.html"));
        assert_eq!(tree.containing_file(&doc, element(&doc, "s211")), Some("s21.html"));
        assert_eq!(tree.containing_file(&doc, element(&doc, "c3")), Some("c3.html"));
        assert_eq!(
            tree.containing_file(&doc, doc.root_element().unwrap()),
            Some("index.html")
        );
    }

    #[test]
    fn test_count_page_contents_entries() {
        let (_, _, tree) = build(&Settings::default());
        let root = tree.root().unwrap();
        assert_eq!(tree.count_page_contents_entries(root, 1), 3);
        assert_eq!(tree.count_page_contents_entries(root, 2), 6);
        assert_eq!(tree.count_page_contents_entries(root, 9), 6);
        assert_eq!(tree.count_page_contents_entries(TocId(7), 3), 0);

        let single_page = Settings::new().with_file_element_rank(Rank::Book);
        let (_, _, tree) = build(&single_page);
        assert_eq!(tree.count_page_contents_entries(TocId(0), 3), 0);
    }

    #[test]
    fn test_has_content_in_same_file() {
        let (doc, annotations, _) = build(&Settings::default());
        assert!(!has_content_in_same_file(&doc, &annotations, element(&doc, "c1")));
        assert!(has_content_in_same_file(&doc, &annotations, element(&doc, "c2")));
        assert!(!has_content_in_same_file(&doc, &annotations, element(&doc, "c3")));
        assert!(has_content_in_same_file(&doc, &annotations, element(&doc, "s11")));
        // s211 is only listed in the page contents, so it renders into s21
        assert!(has_content_in_same_file(&doc, &annotations, element(&doc, "s21")));
    }

    #[test]
    fn test_content_after_file_children_counts() {
        let xml = r#"<book xmlns="http://docbook.org/ns/docbook">
            <chapter xml:id="c1">
                <title>One</title>
                <section xml:id="s1"><para>Text</para></section>
                <para>Trailing</para>
            </chapter>
        </book>"#;
        let settings = Settings::default();
        let mut doc = parse_str(xml).unwrap();
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations).unwrap();
        Annotator::new(&settings).run(&mut doc, &mut annotations).unwrap();
        build_toc(&doc, &mut annotations, &settings).unwrap();

        assert!(has_content_in_same_file(&doc, &annotations, element(&doc, "c1")));
    }

    #[test]
    fn test_simple_navigation_keeps_pages_of_page_toc_sections() {
        let settings = Settings::new()
            .with_file_element_rank(Rank::Chapter)
            .with_page_toc_element_rank(Rank::Section1)
            .with_simple_navigation_mode(true);
        let mut doc = parse_str(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <chapter xml:id="c1">
                    <title>One</title>
                    <section xml:id="s1"><para xml:id="body">Text</para></section>
                </chapter>
            </book>"#,
        )
        .unwrap();
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations).unwrap();
        Annotator::new(&settings).run(&mut doc, &mut annotations).unwrap();
        let mut tree = build_toc(&doc, &mut annotations, &settings).unwrap();
        let dropped = apply_simple_navigation(&doc, &mut annotations, &mut tree, &settings).unwrap();

        // Only the root page goes
        assert_eq!(dropped, 1);
        assert!(!annotations.is_not_addressable(element(&doc, "c1")));
        assert_eq!(tree.containing_file(&doc, element(&doc, "body")), Some("c1.html"));
    }

    #[test]
    fn test_simple_navigation_mode() {
        let settings = Settings::new().with_simple_navigation_mode(true);
        let (doc, mut annotations, mut tree) = build(&settings);
        let dropped = apply_simple_navigation(&doc, &mut annotations, &mut tree, &settings).unwrap();

        // The root, c1 (title only) and the empty c3 and s12
        assert_eq!(dropped, 4);
        assert_eq!(tree.get(TocId(0)).unwrap().output_file, None);
        assert!(annotations.is_not_addressable(element(&doc, "c1")));
        assert!(!annotations.is_not_addressable(element(&doc, "c2")));
        assert_eq!(tree.containing_file(&doc, element(&doc, "c2")), Some("c2.html"));
        assert_eq!(tree.containing_file(&doc, element(&doc, "c3")), None);
    }

    #[test]
    fn test_simple_navigation_off() {
        let settings = Settings::default();
        let (doc, mut annotations, mut tree) = build(&settings);
        let before = tree.clone();
        assert_eq!(apply_simple_navigation(&doc, &mut annotations, &mut tree, &settings).unwrap(), 0);
        assert_eq!(tree, before);
    }
}
