//! Structure annotation.
//!
//! A single depth-first pass over the ranked document that:
//! - promotes `xml:id` to the element's id and synthesizes `autoid_N` for
//!   elements that must be addressable
//! - adds default titles to prefaces, glossaries and indexes
//! - hands tables to a [`TableNormalizer`]
//! - collects index terms
//! - checks that local image references exist
//! - computes title prefixes and united numbering

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use super::has_preface_like_ancestor;
use super::index_terms::{self, Collator, IndexTermIndex};
use super::numbering::{NumberingState, join_prefix};
use crate::config::Settings;
use crate::dom::{Document, NodeId, QualName};
use crate::error::{Error, Result};
use crate::model::{
    AUTO_ID_PREFIX, Annotations, DOCBOOK_NS, DOCGEN_ID_PREFIX, ElementKind, IdRegistry,
};

/// Rewrites DocBook tables into the shape the renderer expects.
pub trait TableNormalizer {
    /// Normalize one `table` or `informaltable` element in place.
    fn normalize(&self, doc: &mut Document, table: NodeId) -> Result<()>;
}

/// Leaves tables untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepTables;

impl TableNormalizer for KeepTables {
    fn normalize(&self, _doc: &mut Document, _table: NodeId) -> Result<()> {
        Ok(())
    }
}

/// Runs the annotation pass.
pub struct Annotator<'a> {
    settings: &'a Settings,
    tables: &'a dyn TableNormalizer,
}

impl<'a> Annotator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            tables: &KeepTables,
        }
    }

    pub fn with_table_normalizer(mut self, tables: &'a dyn TableNormalizer) -> Self {
        self.tables = tables;
        self
    }

    /// Annotate a ranked document. Returns the id registry and the index
    /// term lookup.
    pub fn run(
        &self,
        doc: &mut Document,
        annotations: &mut Annotations,
    ) -> Result<(IdRegistry, IndexTermIndex)> {
        let collator = Collator::for_locale(&self.settings.locale)?;
        let mut pass = Pass {
            settings: self.settings,
            tables: self.tables,
            annotations,
            ids: IdRegistry::new(),
            index_terms: IndexTermIndex::new(collator),
            last_auto_id: 0,
        };

        pass.visit(doc, NodeId::DOCUMENT, &mut NumberingState::new())?;
        pass.index_terms.finish();

        log::debug!(
            "Annotated document: {} id(s), {} synthesized, {} index term(s)",
            pass.ids.len(),
            pass.last_auto_id,
            pass.index_terms.len()
        );
        Ok((pass.ids, pass.index_terms))
    }
}

struct Pass<'a> {
    settings: &'a Settings,
    tables: &'a dyn TableNormalizer,
    annotations: &'a mut Annotations,
    ids: IdRegistry,
    index_terms: IndexTermIndex,
    last_auto_id: u32,
}

impl Pass<'_> {
    fn visit(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        numbering: &mut NumberingState,
    ) -> Result<()> {
        let mut own_numbering;
        let mut child_numbering = numbering;

        if doc.is_element(node) {
            self.assign_id(doc, node)?;
            self.element_content(doc, node)?;

            if doc.kind(node).is_structure() {
                self.number(doc, node, child_numbering)?;
                // Children of a document-structure element count from 1
                own_numbering = NumberingState::new();
                child_numbering = &mut own_numbering;
            }
        }

        let children: Vec<_> = doc.children(node).collect();
        for child in children {
            self.visit(doc, child, child_numbering)?;
        }
        Ok(())
    }

    fn assign_id(&mut self, doc: &Document, node: NodeId) -> Result<()> {
        let id = match doc.xml_id(node) {
            Some(id) => {
                for reserved in [AUTO_ID_PREFIX, DOCGEN_ID_PREFIX] {
                    if id.starts_with(reserved) {
                        return Err(Error::structure(format!(
                            "{} uses a reserved xml:id, \"{id}\". All ID-s starting with \
                             \"{reserved}\" are reserved for docgen.",
                            doc.describe_cap(node)
                        )));
                    }
                }
                id.to_string()
            }
            None if doc.kind(node).guarantees_id() => {
                self.last_auto_id += 1;
                format!("{AUTO_ID_PREFIX}{}", self.last_auto_id)
            }
            None => return Ok(()),
        };

        if let Some(owner) = self.ids.register(&id, node) {
            return Err(Error::structure(format!(
                "Duplicate xml:id \"{id}\": used by {} and by {}.",
                doc.describe(owner),
                doc.describe(node)
            )));
        }
        self.annotations.entry(node).id = Some(id);
        Ok(())
    }

    fn element_content(&mut self, doc: &mut Document, node: NodeId) -> Result<()> {
        let kind = doc.kind(node);
        if let Some(title) = kind.doc_kind().and_then(|k| k.default_title()) {
            ensure_title(doc, node, &title);
        } else if kind.is_table() {
            self.tables.normalize(doc, node)?;
        } else if kind == ElementKind::Indexterm {
            let (primary, secondary) = index_terms::term_texts(doc, node)?;
            self.index_terms.add(&primary, secondary.as_deref(), node);
        } else if kind == ElementKind::Imagedata {
            self.check_image(doc, node)?;
        }
        Ok(())
    }

    fn check_image(&self, doc: &Document, node: NodeId) -> Result<()> {
        let Some(fileref) = doc.attr(node, "fileref") else {
            return Err(Error::structure(format!(
                "{} has no \"fileref\" attribute.",
                doc.describe_cap(node)
            )));
        };

        let lower = fileref.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || fileref.starts_with('/')
        {
            return Ok(());
        }

        if !self.content_file_exists(fileref) {
            return Err(Error::structure(format!(
                "{} refers to a missing file: \"{}\"",
                doc.describe_cap(node),
                fileref.replace('"', "&quot;")
            )));
        }

        if let Some(stem) = fileref
            .len()
            .checked_sub(4)
            .filter(|_| lower.ends_with(".svg"))
            .and_then(|end| fileref.get(..end))
        {
            let png = format!("{stem}.png");
            if !self.content_file_exists(&png) {
                return Err(Error::structure(format!(
                    "{} refers to an SVG file for which the fallback PNG file is missing: \"{}\"",
                    doc.describe_cap(node),
                    png.replace('"', "&quot;")
                )));
            }
        }
        Ok(())
    }

    fn content_file_exists(&self, reference: &str) -> bool {
        let decoded = percent_decode_str(reference)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(reference));
        self.settings.content_path(&decoded).is_file()
    }

    fn number(
        &mut self,
        doc: &Document,
        node: NodeId,
        numbering: &mut NumberingState,
    ) -> Result<()> {
        let Some(kind) = doc.kind(node).doc_kind() else {
            return Ok(());
        };

        let numbered = !doc.is_root_element(node) && !has_preface_like_ancestor(doc, node);
        let prefix = match kind.number_style(self.settings.numbered_sections) {
            Some(style) if numbered => {
                let Some(local) = numbering.next_prefix(style) else {
                    return Err(Error::structure(format!(
                        "{} can't be numbered: it has too many preceding \"{}\" siblings.",
                        doc.describe_cap(node),
                        kind
                    )));
                };
                let inherited = doc
                    .parent_element(node)
                    .filter(|&p| {
                        doc.kind(p)
                            .doc_kind()
                            .is_none_or(|k| k.passes_prefix_to_children())
                    })
                    .and_then(|p| self.annotations.title_prefix(p));
                Some(join_prefix(inherited, &local))
            }
            _ => None,
        };

        let united = numbering.next_united();
        let info = self.annotations.entry(node);
        info.title_prefix = prefix;
        info.united_numbering = Some(united);
        Ok(())
    }
}

/// Insert a `title` as first child unless the element already has one,
/// directly or in its `info`.
fn ensure_title(doc: &mut Document, node: NodeId, text: &str) {
    let has_title = doc.child_of_kind(node, ElementKind::Title).is_some()
        || doc
            .child_of_kind(node, ElementKind::Info)
            .is_some_and(|info| doc.child_of_kind(info, ElementKind::Title).is_some());
    if has_title {
        return;
    }
    let title = doc.create_element(QualName::new(Some(DOCBOOK_NS), "title"), Vec::new());
    doc.append_text(title, text);
    doc.prepend(node, title);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::parse_str;
    use crate::structure::rank::assign_ranks;

    #[derive(Debug)]
    struct Annotated {
        doc: Document,
        annotations: Annotations,
        ids: IdRegistry,
        index_terms: IndexTermIndex,
    }

    impl Annotated {
        fn node(&self, id: &str) -> NodeId {
            self.ids.get(id).unwrap()
        }

        fn prefix(&self, id: &str) -> Option<&str> {
            self.annotations.title_prefix(self.node(id))
        }

        fn united(&self, id: &str) -> Option<u32> {
            self.annotations.united_numbering(self.node(id))
        }
    }

    fn annotate_with(xml: &str, settings: &Settings) -> Result<Annotated> {
        let mut doc = parse_str(xml)?;
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations)?;
        let (ids, index_terms) = Annotator::new(settings).run(&mut doc, &mut annotations)?;
        Ok(Annotated {
            doc,
            annotations,
            ids,
            index_terms,
        })
    }

    fn annotate(xml: &str) -> Result<Annotated> {
        annotate_with(xml, &Settings::default())
    }

    #[test]
    fn test_prefixes_and_united_numbering() {
        let settings = Settings::new().with_numbered_sections(true);
        let a = annotate_with(
            r#"<book xmlns="http://docbook.org/ns/docbook" xml:id="b">
                <chapter xml:id="c1"/>
                <chapter xml:id="c2">
                    <section xml:id="s1"/>
                    <section xml:id="s2"><section xml:id="s21"/></section>
                </chapter>
            </book>"#,
            &settings,
        )
        .unwrap();
        assert_eq!(a.prefix("b"), None);
        assert_eq!(a.prefix("c1"), Some("1"));
        assert_eq!(a.prefix("c2"), Some("2"));
        assert_eq!(a.prefix("s1"), Some("2.1"));
        assert_eq!(a.prefix("s2"), Some("2.2"));
        assert_eq!(a.prefix("s21"), Some("2.2.1"));
        assert_eq!(a.united("c1"), Some(1));
        assert_eq!(a.united("c2"), Some(2));
        assert_eq!(a.united("s1"), Some(1));
        assert_eq!(a.united("s2"), Some(2));
        assert_eq!(a.united("s21"), Some(1));
    }

    #[test]
    fn test_sections_unnumbered_by_default() {
        let a = annotate(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <chapter xml:id="c"><section xml:id="s"/></chapter>
            </book>"#,
        )
        .unwrap();
        assert_eq!(a.prefix("c"), Some("1"));
        assert_eq!(a.prefix("s"), None);
        assert_eq!(a.united("s"), Some(1));
    }

    #[test]
    fn test_styles_per_kind() {
        let a = annotate(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <preface xml:id="pre"><section xml:id="pre-s"/></preface>
                <part xml:id="p1"><chapter xml:id="p1c1"/><chapter xml:id="p1c2"/></part>
                <part xml:id="p2"><chapter xml:id="p2c1"/><appendix xml:id="p2a"/></part>
                <appendix xml:id="a1"/>
                <appendix xml:id="a2"/>
            </book>"#,
        )
        .unwrap();
        assert_eq!(a.prefix("pre"), None);
        assert_eq!(a.prefix("pre-s"), None);
        assert_eq!(a.prefix("p1"), Some("I"));
        assert_eq!(a.prefix("p2"), Some("II"));
        // Parts don't pass their prefix down
        assert_eq!(a.prefix("p1c2"), Some("2"));
        assert_eq!(a.prefix("p2c1"), Some("1"));
        assert_eq!(a.prefix("p2a"), Some("A"));
        assert_eq!(a.prefix("a1"), Some("A"));
        assert_eq!(a.prefix("a2"), Some("B"));
        assert_eq!(a.united("pre"), Some(1));
        assert_eq!(a.united("a2"), Some(5));
    }

    #[test]
    fn test_appendix_sections_inherit_latin_prefix() {
        let settings = Settings::new().with_numbered_sections(true);
        let a = annotate_with(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <appendix xml:id="a"><section xml:id="s"/></appendix>
            </book>"#,
            &settings,
        )
        .unwrap();
        assert_eq!(a.prefix("s"), Some("A.1"));
    }

    #[test]
    fn test_auto_ids() {
        let a = annotate(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <chapter xml:id="given"><section/></chapter>
                <glossary><glossentry/></glossary>
                <para/>
            </book>"#,
        )
        .unwrap();
        let book = a.doc.root_element().unwrap();
        assert_eq!(a.annotations.id(book), Some("autoid_1"));
        assert!(a.ids.contains("given"));
        assert!(a.ids.contains("autoid_2"));
        assert!(a.ids.contains("autoid_3"));
        assert!(a.ids.contains("autoid_4"));
        assert_eq!(a.ids.len(), 5);
        let para = a
            .doc
            .descendants(book)
            .find(|&n| a.doc.kind(n) == ElementKind::Para)
            .unwrap();
        assert_eq!(a.annotations.id(para), None);
    }

    #[test]
    fn test_reserved_ids_rejected() {
        for id in ["autoid_7", "docgen_nav"] {
            let xml = format!(
                r#"<book xmlns="http://docbook.org/ns/docbook"><chapter xml:id="{id}"/></book>"#
            );
            let err = annotate(&xml).unwrap_err();
            assert!(err.to_string().contains("uses a reserved xml:id"), "{err}");
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = annotate(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <chapter xml:id="x"/><chapter><para xml:id="x"/></chapter>
            </book>"#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Duplicate xml:id \"x\""));
    }

    #[test]
    fn test_default_titles() {
        let a = annotate(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <preface xml:id="p"><para/></preface>
                <chapter xml:id="c"/>
                <glossary xml:id="g"><title>Terms</title></glossary>
                <index xml:id="i"><info><title>Keywords</title></info></index>
            </book>"#,
        )
        .unwrap();
        let preface = a.node("p");
        let first = a.doc.element_children(preface).next().unwrap();
        assert_eq!(a.doc.kind(first), ElementKind::Title);
        assert_eq!(a.doc.text_content(first), "Preface");

        let title_count = |id: &str| {
            a.doc
                .descendants(a.node(id))
                .filter(|&n| a.doc.kind(n) == ElementKind::Title)
                .count()
        };
        assert_eq!(title_count("c"), 0);
        assert_eq!(title_count("g"), 1);
        assert_eq!(title_count("i"), 1);
    }

    #[test]
    fn test_index_terms_collected() {
        let a = annotate(
            r#"<article xmlns="http://docbook.org/ns/docbook">
                <para><indexterm><primary>Cache</primary></indexterm></para>
                <para><indexterm><primary>Cache</primary><secondary>eviction</secondary></indexterm></para>
                <para><indexterm><primary>Array</primary></indexterm></para>
            </article>"#,
        )
        .unwrap();
        assert_eq!(a.index_terms.occurrences("Cache").len(), 2);
        assert_eq!(a.index_terms.secondary_occurrences("Cache", "eviction").len(), 1);
        assert_eq!(a.index_terms.primary_terms(), ["Array", "Cache"]);
    }

    #[test]
    fn test_image_references() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/logo.png"), b"png").unwrap();
        std::fs::write(dir.path().join("img/my chart.svg"), b"svg").unwrap();
        std::fs::write(dir.path().join("img/my chart.png"), b"png").unwrap();
        std::fs::write(dir.path().join("img/lonely.svg"), b"svg").unwrap();
        let settings = Settings::new().with_content_dir(dir.path());

        let image = |fileref: &str| {
            format!(
                r#"<article xmlns="http://docbook.org/ns/docbook">
                    <mediaobject><imageobject><imagedata fileref="{fileref}"/></imageobject></mediaobject>
                </article>"#
            )
        };

        for ok in [
            "img/logo.png",
            "img/my%20chart.svg",
            "HTTPS://example.com/x.png",
            "http://example.com/x.svg",
            "/static/x.png",
        ] {
            assert!(annotate_with(&image(ok), &settings).is_ok(), "{ok}");
        }

        let err = annotate_with(&image("img/missing.png"), &settings).unwrap_err();
        assert!(err.to_string().contains("refers to a missing file: \"img/missing.png\""));

        let err = annotate_with(&image("img/lonely.svg"), &settings).unwrap_err();
        assert!(err.to_string().contains("fallback PNG file is missing: \"img/lonely.png\""));
    }

    #[test]
    fn test_table_normalizer_sees_docbook_tables() {
        struct Recorder(RefCell<Vec<NodeId>>);

        impl TableNormalizer for Recorder {
            fn normalize(&self, _doc: &mut Document, table: NodeId) -> Result<()> {
                self.0.borrow_mut().push(table);
                Ok(())
            }
        }

        let mut doc = parse_str(
            r#"<article xmlns="http://docbook.org/ns/docbook" xmlns:h="http://www.w3.org/1999/xhtml">
                <table/><informaltable/><h:table/>
            </article>"#,
        )
        .unwrap();
        let mut annotations = Annotations::new();
        assign_ranks(&doc, &mut annotations).unwrap();

        let settings = Settings::default();
        let recorder = Recorder(RefCell::new(Vec::new()));
        Annotator::new(&settings)
            .with_table_normalizer(&recorder)
            .run(&mut doc, &mut annotations)
            .unwrap();
        assert_eq!(recorder.0.borrow().len(), 2);
    }

    #[test]
    fn test_rerun_keeps_given_ids() {
        let mut doc = parse_str(
            r#"<book xmlns="http://docbook.org/ns/docbook">
                <preface/><chapter xml:id="intro"><section/></chapter>
            </book>"#,
        )
        .unwrap();
        let settings = Settings::default();

        let mut first = Annotations::new();
        assign_ranks(&doc, &mut first).unwrap();
        let (ids1, _) = Annotator::new(&settings).run(&mut doc, &mut first).unwrap();

        let mut second = Annotations::new();
        assign_ranks(&doc, &mut second).unwrap();
        let (ids2, _) = Annotator::new(&settings).run(&mut doc, &mut second).unwrap();

        let intro = ids1.get("intro").unwrap();
        assert_eq!(ids2.get("intro"), Some(intro));
        assert_eq!(first.get(intro), second.get(intro));
        assert_eq!(doc.xml_id(intro), Some("intro"));
    }
}
