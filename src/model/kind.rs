//! Element classification.
//!
//! Every element is classified once, when it is created in the
//! [`Document`](crate::dom::Document) arena. The passes dispatch on
//! [`ElementKind`] instead of comparing element names, and the numbering
//! style of each document-structure kind is declared on [`DocKind`].

use std::fmt;

use crate::util;

/// Namespace of DocBook 5 elements.
pub const DOCBOOK_NS: &str = "http://docbook.org/ns/docbook";
/// Namespace of the `xml:` prefix (`xml:id`, `xml:lang`).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace of `xlink:href` on DocBook links.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Kinds taking part in the book/part/chapter/section hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Book,
    Part,
    Chapter,
    Article,
    Section,
    Simplesect,
    Appendix,
    Preface,
    Glossary,
    Index,
}

impl DocKind {
    /// The DocBook element name.
    pub fn name(self) -> &'static str {
        match self {
            DocKind::Book => "book",
            DocKind::Part => "part",
            DocKind::Chapter => "chapter",
            DocKind::Article => "article",
            DocKind::Section => "section",
            DocKind::Simplesect => "simplesect",
            DocKind::Appendix => "appendix",
            DocKind::Preface => "preface",
            DocKind::Glossary => "glossary",
            DocKind::Index => "index",
        }
    }

    /// How the title prefix of this kind is formatted, if it has one.
    ///
    /// Sections are only numbered when `numbered_sections` is enabled.
    pub fn number_style(self, numbered_sections: bool) -> Option<NumberStyle> {
        match self {
            DocKind::Chapter => Some(NumberStyle::Decimal),
            DocKind::Section if numbered_sections => Some(NumberStyle::Decimal),
            DocKind::Part => Some(NumberStyle::UpperRoman),
            DocKind::Appendix => Some(NumberStyle::UpperLatin),
            DocKind::Article => Some(NumberStyle::LowerRoman),
            _ => None,
        }
    }

    /// Whether all descendants render into this element's file, unnumbered.
    pub fn is_preface_like(self) -> bool {
        matches!(self, DocKind::Preface)
    }

    /// Title synthesized when the element has none.
    pub fn default_title(self) -> Option<String> {
        match self {
            DocKind::Preface | DocKind::Glossary | DocKind::Index => {
                Some(util::capitalize_first(self.name()))
            }
            _ => None,
        }
    }

    /// Whether a child title prefix may be appended to this element's prefix.
    pub fn passes_prefix_to_children(self) -> bool {
        !matches!(self, DocKind::Part | DocKind::Article)
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counter a document-structure kind draws its title prefix from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberStyle {
    /// 1, 2, 3
    Decimal,
    /// I, II, III
    UpperRoman,
    /// A, B, ..., Z, AA
    UpperLatin,
    /// i, ii, iii
    LowerRoman,
}

impl NumberStyle {
    /// Format `n` in this style. `None` when the style can't express `n`
    /// (roman numbers stop at 3999).
    pub fn format(self, n: u32) -> Option<String> {
        match self {
            NumberStyle::Decimal => Some(n.to_string()),
            NumberStyle::UpperRoman => util::to_upper_roman(n),
            NumberStyle::LowerRoman => util::to_lower_roman(n),
            NumberStyle::UpperLatin => util::to_upper_latin(n),
        }
    }
}

/// Classification of an element node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementKind {
    Structure(DocKind),
    Glossentry,
    Title,
    Subtitle,
    Info,
    Indexterm,
    Primary,
    Secondary,
    Imagedata,
    Table,
    InformalTable,
    Link,
    Olink,
    Footnote,
    Para,
    OrderedList,
    ItemizedList,
    MediaObject,
    Figure,
    InformalFigure,
    ProgramListing,
    Note,
    Warning,
    /// Anything else, including every element outside the DocBook namespace.
    #[default]
    Other,
}

impl ElementKind {
    /// Classify an element by namespace URI and local name.
    pub fn classify(ns: Option<&str>, local: &str) -> Self {
        if ns != Some(DOCBOOK_NS) {
            return ElementKind::Other;
        }
        match local {
            "book" => ElementKind::Structure(DocKind::Book),
            "part" => ElementKind::Structure(DocKind::Part),
            "chapter" => ElementKind::Structure(DocKind::Chapter),
            "article" => ElementKind::Structure(DocKind::Article),
            "section" => ElementKind::Structure(DocKind::Section),
            "simplesect" => ElementKind::Structure(DocKind::Simplesect),
            "appendix" => ElementKind::Structure(DocKind::Appendix),
            "preface" => ElementKind::Structure(DocKind::Preface),
            "glossary" => ElementKind::Structure(DocKind::Glossary),
            "index" => ElementKind::Structure(DocKind::Index),
            "glossentry" => ElementKind::Glossentry,
            "title" => ElementKind::Title,
            "subtitle" => ElementKind::Subtitle,
            "info" => ElementKind::Info,
            "indexterm" => ElementKind::Indexterm,
            "primary" => ElementKind::Primary,
            "secondary" => ElementKind::Secondary,
            "imagedata" => ElementKind::Imagedata,
            "table" => ElementKind::Table,
            "informaltable" => ElementKind::InformalTable,
            "link" => ElementKind::Link,
            "olink" => ElementKind::Olink,
            "footnote" => ElementKind::Footnote,
            "para" => ElementKind::Para,
            "orderedlist" => ElementKind::OrderedList,
            "itemizedlist" => ElementKind::ItemizedList,
            "mediaobject" => ElementKind::MediaObject,
            "figure" => ElementKind::Figure,
            "informalfigure" => ElementKind::InformalFigure,
            "programlisting" => ElementKind::ProgramListing,
            "note" => ElementKind::Note,
            "warning" => ElementKind::Warning,
            _ => ElementKind::Other,
        }
    }

    /// The document-structure kind, if this is one.
    pub fn doc_kind(self) -> Option<DocKind> {
        match self {
            ElementKind::Structure(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_structure(self) -> bool {
        matches!(self, ElementKind::Structure(_))
    }

    /// Elements that always end up with an id, synthesized if needed.
    pub fn guarantees_id(self) -> bool {
        matches!(self, ElementKind::Structure(_) | ElementKind::Glossentry)
    }

    /// Elements handed to the table normalizer.
    pub fn is_table(self) -> bool {
        matches!(self, ElementKind::Table | ElementKind::InformalTable)
    }

    /// Elements that produce visible output directly under a
    /// document-structure element.
    pub fn is_visible_top_level(self) -> bool {
        !matches!(
            self,
            ElementKind::Other
                | ElementKind::Glossentry
                | ElementKind::Indexterm
                | ElementKind::Primary
                | ElementKind::Secondary
                | ElementKind::Imagedata
                | ElementKind::Link
                | ElementKind::Olink
                | ElementKind::Footnote
        )
    }
}
