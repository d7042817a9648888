//! Back-of-book index terms.
//!
//! `indexterm` markers are collected into a two-level lookup: primary term to
//! occurrences, and primary term to secondary term to occurrences. Terms are
//! ordered with a [`Collator`].

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::model::ElementKind;

/// Multi-level string comparison for index terms.
///
/// Levels, from strongest to weakest:
/// 1. base characters: case and Latin diacritics ignored; whitespace and
///    punctuation sort before digits, digits before letters
/// 2. diacritics: unaccented before accented
/// 3. case: lower before upper
/// 4. code points, so distinct strings never compare equal
///
/// The language of the locale picks the alphabet: in Swedish "ä" is a letter
/// of its own after "z", in Spanish "ñ" follows "n".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collator {
    locale: String,
    alphabet: Alphabet,
}

impl Default for Collator {
    fn default() -> Self {
        Self {
            locale: "und".to_string(),
            alphabet: Alphabet::Latin,
        }
    }
}

impl Collator {
    /// Collator for a BCP 47 language tag such as `en-US` or `de`.
    pub fn for_locale(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if !is_language_tag(tag) {
            return Err(Error::Config(format!(
                "invalid locale {tag:?}; expected a language tag like \"en-US\""
            )));
        }
        let language = tag.split(['-', '_']).next().unwrap_or_default();
        Ok(Self {
            locale: tag.replace('_', "-"),
            alphabet: Alphabet::for_language(language),
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = |s: &str| s.chars().map(|c| self.primary_weight(c)).collect::<Vec<_>>();
        let accents = |s: &str| s.chars().map(|c| self.is_accented(c)).collect::<Vec<_>>();
        primary(a)
            .cmp(&primary(b))
            .then_with(|| accents(a).cmp(&accents(b)))
            .then_with(|| {
                a.chars()
                    .map(char::is_uppercase)
                    .cmp(b.chars().map(char::is_uppercase))
            })
            .then_with(|| a.cmp(b))
    }

    /// Character class, base letter, and position among the letters the
    /// alphabet sorts right after that base letter.
    fn primary_weight(&self, c: char) -> (u8, char, u8) {
        let class = if c.is_whitespace() {
            0
        } else if c.is_alphabetic() {
            3
        } else if c.is_numeric() {
            2
        } else {
            1
        };
        match self.alphabet.extra_letter(lower(c)) {
            Some(letter) => (class, letter.after, letter.position),
            None => (class, fold(c), 0),
        }
    }

    fn is_accented(&self, c: char) -> bool {
        match self.alphabet.extra_letter(lower(c)) {
            Some(letter) => letter.variant,
            None => fold(c) != lower(c),
        }
    }
}

/// Letters an alphabet has beyond the basic Latin ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alphabet {
    Latin,
    /// Swedish and Finnish: å ä ö after z.
    Swedish,
    /// Danish and Norwegian: æ ø å after z.
    Danish,
    /// Spanish: ñ after n.
    Spanish,
}

struct ExtraLetter {
    after: char,
    position: u8,
    /// Spelling variant of the letter, like Danish "ä" for "æ".
    variant: bool,
}

impl Alphabet {
    fn for_language(language: &str) -> Self {
        match language.to_ascii_lowercase().as_str() {
            "sv" | "fi" => Alphabet::Swedish,
            "da" | "nb" | "nn" | "no" => Alphabet::Danish,
            "es" => Alphabet::Spanish,
            _ => Alphabet::Latin,
        }
    }

    /// `c` must be lower case.
    fn extra_letter(self, c: char) -> Option<ExtraLetter> {
        let (after, position, variant) = match (self, c) {
            (Alphabet::Swedish, 'å') => ('z', 1, false),
            (Alphabet::Swedish, 'ä') => ('z', 2, false),
            (Alphabet::Swedish, 'æ') => ('z', 2, true),
            (Alphabet::Swedish, 'ö') => ('z', 3, false),
            (Alphabet::Swedish, 'ø') => ('z', 3, true),
            (Alphabet::Danish, 'æ') => ('z', 1, false),
            (Alphabet::Danish, 'ä') => ('z', 1, true),
            (Alphabet::Danish, 'ø') => ('z', 2, false),
            (Alphabet::Danish, 'ö') => ('z', 2, true),
            (Alphabet::Danish, 'å') => ('z', 3, false),
            (Alphabet::Spanish, 'ñ') => ('n', 1, false),
            _ => return None,
        };
        Some(ExtraLetter {
            after,
            position,
            variant,
        })
    }
}

/// Language subtag of 2-3 letters (or `und`), then alphanumeric subtags of up
/// to 8 characters.
fn is_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split(['-', '_']);
    let Some(language) = subtags.next() else {
        return false;
    };
    (2..=3).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_alphabetic())
        && subtags.all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Lower-case base letter of Latin-1 and Latin Extended-A letters.
fn fold(c: char) -> char {
    match lower(c) {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Secondary term under a primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTerm {
    pub text: String,
    /// `indexterm` elements, in document order.
    pub occurrences: Vec<NodeId>,
}

/// Two-level index term lookup.
#[derive(Debug, Clone, Default)]
pub struct IndexTermIndex {
    collator: Collator,
    primary: HashMap<String, Vec<NodeId>>,
    /// Kept in collation order.
    secondary: HashMap<String, Vec<SecondaryTerm>>,
    sorted_primary: Vec<String>,
}

impl IndexTermIndex {
    pub fn new(collator: Collator) -> Self {
        Self {
            collator,
            ..Self::default()
        }
    }

    /// Record an occurrence of a term.
    ///
    /// The occurrence is added to the primary list even when it has a
    /// secondary term, so the primary list holds every occurrence.
    pub fn add(&mut self, primary: &str, secondary: Option<&str>, occurrence: NodeId) {
        self.primary
            .entry(primary.to_string())
            .or_default()
            .push(occurrence);

        let Some(secondary) = secondary else {
            return;
        };
        let terms = self.secondary.entry(primary.to_string()).or_default();
        match terms.binary_search_by(|t| self.collator.compare(&t.text, secondary)) {
            Ok(i) => terms[i].occurrences.push(occurrence),
            Err(i) => terms.insert(
                i,
                SecondaryTerm {
                    text: secondary.to_string(),
                    occurrences: vec![occurrence],
                },
            ),
        }
    }

    /// Sort the primary terms. Called once all terms are added.
    pub fn finish(&mut self) {
        let mut terms: Vec<String> = self.primary.keys().cloned().collect();
        terms.sort_by(|a, b| self.collator.compare(a, b));
        self.sorted_primary = terms;
    }

    /// Primary terms in collation order.
    pub fn primary_terms(&self) -> &[String] {
        &self.sorted_primary
    }

    /// Every occurrence of a primary term, in document order.
    pub fn occurrences(&self, primary: &str) -> &[NodeId] {
        self.primary.get(primary).map_or(&[], Vec::as_slice)
    }

    /// Secondary terms of a primary term, in collation order.
    pub fn secondary_terms(&self, primary: &str) -> &[SecondaryTerm] {
        self.secondary.get(primary).map_or(&[], Vec::as_slice)
    }

    pub fn secondary_occurrences(&self, primary: &str, secondary: &str) -> &[NodeId] {
        self.secondary_terms(primary)
            .iter()
            .find(|t| t.text == secondary)
            .map_or(&[], |t| t.occurrences.as_slice())
    }

    pub fn contains(&self, primary: &str) -> bool {
        self.primary.contains_key(primary)
    }

    /// Number of distinct primary terms.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn collator(&self) -> &Collator {
        &self.collator
    }
}

/// Primary and optional secondary text of an `indexterm` element.
pub fn term_texts(doc: &Document, indexterm: NodeId) -> Result<(String, Option<String>)> {
    let Some(primary) = doc.child_of_kind(indexterm, ElementKind::Primary) else {
        return Err(Error::structure(format!(
            "{} has no \"primary\" child element.",
            doc.describe_cap(indexterm)
        )));
    };
    let primary_text = leading_text(doc, primary);
    if primary_text.is_empty() {
        return Err(Error::structure(format!(
            "{} has an empty \"primary\" element.",
            doc.describe_cap(indexterm)
        )));
    }

    let secondary_text = doc
        .child_of_kind(indexterm, ElementKind::Secondary)
        .map(|s| leading_text(doc, s))
        .filter(|s| !s.is_empty());
    Ok((primary_text, secondary_text))
}

/// The first child's text, trimmed. Falls back to the whole text content
/// when markup comes first.
fn leading_text(doc: &Document, element: NodeId) -> String {
    match doc.children(element).next().and_then(|c| doc.text(c)) {
        Some(text) => text.trim().to_string(),
        None => doc.text_content(element).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_str;

    fn sorted(words: &[&str]) -> Vec<String> {
        sorted_for(&Collator::default(), words)
    }

    fn sorted_for(collator: &Collator, words: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| collator.compare(a, b));
        v
    }

    #[test]
    fn test_collation_ignores_case_and_accents_first() {
        assert_eq!(
            sorted(&["zebra", "Apple", "éclair", "banana", "apple", "Eclair"]),
            ["apple", "Apple", "banana", "Eclair", "éclair", "zebra"]
        );
    }

    #[test]
    fn test_collation_puts_symbols_and_digits_first() {
        assert_eq!(sorted(&["beta", "2nd", "#include", "alpha"]), ["#include", "2nd", "alpha", "beta"]);
    }

    #[test]
    fn test_collation_never_ties_distinct_strings() {
        let collator = Collator::default();
        assert_eq!(collator.compare("a", "a"), Ordering::Equal);
        assert_ne!(collator.compare("ǆ", "dž"), Ordering::Equal);
    }

    #[test]
    fn test_locale_alphabets() {
        let words = ["zebra", "Äpple", "apfel", "ödla", "ost"];
        let german = Collator::for_locale("de-DE").unwrap();
        let swedish = Collator::for_locale("sv-SE").unwrap();
        assert_eq!(sorted_for(&german, &words), ["apfel", "Äpple", "ödla", "ost", "zebra"]);
        assert_eq!(sorted_for(&swedish, &words), ["apfel", "ost", "zebra", "Äpple", "ödla"]);

        let danish = Collator::for_locale("da").unwrap();
        assert_eq!(sorted_for(&danish, &["å", "ø", "æ", "z"]), ["z", "æ", "ø", "å"]);
        assert_eq!(sorted_for(&swedish, &["ö", "ä", "å", "z"]), ["z", "å", "ä", "ö"]);

        let spanish = Collator::for_locale("es").unwrap();
        assert_eq!(sorted_for(&spanish, &["oso", "ñandú", "nube"]), ["nube", "ñandú", "oso"]);
        assert_eq!(sorted_for(&german, &["oso", "ñandú", "nube"]), ["ñandú", "nube", "oso"]);
    }

    #[test]
    fn test_locale_tags() {
        assert_eq!(Collator::for_locale("en_US").unwrap().locale(), "en-US");
        assert!(Collator::for_locale("de").is_ok());
        assert!(Collator::for_locale("zh-Hant-TW").is_ok());
        assert!(Collator::for_locale("").is_err());
        assert!(Collator::for_locale("english").is_err());
        assert!(Collator::for_locale("en US").is_err());
    }

    #[test]
    fn test_primary_list_holds_all_occurrences() {
        let mut index = IndexTermIndex::default();
        index.add("Cache", None, NodeId(5));
        index.add("Cache", Some("eviction"), NodeId(9));
        index.add("Buffer", Some("ring"), NodeId(12));
        index.finish();

        assert_eq!(index.occurrences("Cache"), [NodeId(5), NodeId(9)]);
        assert_eq!(index.secondary_occurrences("Cache", "eviction"), [NodeId(9)]);
        assert_eq!(index.primary_terms(), ["Buffer", "Cache"]);
        assert_eq!(index.len(), 2);
        assert!(index.occurrences("Missing").is_empty());
    }

    #[test]
    fn test_secondary_terms_in_collation_order() {
        let mut index = IndexTermIndex::default();
        for (i, term) in ["writes", "Reads", "eviction", "reads"].iter().enumerate() {
            index.add("Cache", Some(term), NodeId(i as u32));
        }
        let texts: Vec<_> = index
            .secondary_terms("Cache")
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, ["eviction", "reads", "Reads", "writes"]);
    }

    #[test]
    fn test_term_texts() {
        let doc = parse_str(
            r#"<para xmlns="http://docbook.org/ns/docbook">
                <indexterm><primary>  Cache </primary><secondary>eviction</secondary></indexterm>
                <indexterm><secondary>orphan</secondary></indexterm>
            </para>"#,
        )
        .unwrap();
        let para = doc.root_element().unwrap();
        let terms: Vec<_> = doc.element_children(para).collect();

        let (primary, secondary) = term_texts(&doc, terms[0]).unwrap();
        assert_eq!(primary, "Cache");
        assert_eq!(secondary.as_deref(), Some("eviction"));

        let err = term_texts(&doc, terms[1]).unwrap_err();
        assert!(err.to_string().contains("no \"primary\""));
    }
}
