//! XML loading into the [`Document`] arena.
//!
//! The input is expected to be schema-valid DocBook 5; the loader only checks
//! well-formedness. Namespace prefixes are resolved while reading so every
//! element and attribute carries its namespace URI.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::arena::{Attribute, Document, NodeId, QualName};
use crate::error::{Error, Result};
use crate::model::XML_NS;
use crate::util::{decode_text, extract_xml_encoding, strip_bom};

/// Parse a document from a string.
pub fn parse_str(content: &str) -> Result<Document> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new();
    let mut open: Vec<NodeId> = vec![NodeId::DOCUMENT];
    let mut scopes = NamespaceScopes::default();

    let bytes = content.as_bytes();
    let mut line: u32 = 1;
    let mut counted_to = 0usize;

    loop {
        // The reader sits at the start of the next event
        let pos = (reader.buffer_position() as usize).min(bytes.len());
        if pos > counted_to {
            line += memchr::memchr_iter(b'\n', &bytes[counted_to..pos]).count() as u32;
            counted_to = pos;
        }

        let parent = *open.last().unwrap_or(&NodeId::DOCUMENT);
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let elem = start_element(&mut doc, &mut scopes, &e)?;
                doc.set_line(elem, line);
                doc.append(parent, elem);
                open.push(elem);
            }
            Ok(Event::Empty(e)) => {
                let elem = start_element(&mut doc, &mut scopes, &e)?;
                scopes.pop();
                doc.set_line(elem, line);
                doc.append(parent, elem);
            }
            Ok(Event::End(_)) => {
                if open.len() <= 1 {
                    return Err(Error::Malformed(format!(
                        "unexpected closing tag at line {line}"
                    )));
                }
                open.pop();
                scopes.pop();
            }
            Ok(Event::Text(e)) => {
                if parent != NodeId::DOCUMENT {
                    doc.append_text(parent, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                let data: &[u8] = &e;
                doc.append_text(parent, &String::from_utf8_lossy(data));
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let Some(resolved) = resolve_entity(&entity) else {
                    return Err(Error::Malformed(format!(
                        "unknown entity reference &{entity}; at line {line}"
                    )));
                };
                doc.append_text(parent, &resolved);
            }
            Ok(Event::Comment(e)) => {
                if parent != NodeId::DOCUMENT {
                    let comment = doc.create_comment(String::from_utf8_lossy(e.as_ref()));
                    doc.append(parent, comment);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    if open.len() > 1 {
        let unclosed = open[open.len() - 1];
        return Err(Error::Malformed(format!(
            "{} is never closed",
            doc.describe_cap(unclosed)
        )));
    }
    if doc.root_element().is_none() {
        return Err(Error::Malformed("document has no root element".to_string()));
    }

    Ok(doc)
}

/// Parse a document from raw bytes, honoring the encoding named in the XML
/// declaration when the input isn't UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    let bytes = strip_bom(bytes);
    let content = decode_text(bytes, extract_xml_encoding(bytes));
    parse_str(&content)
}

/// Load a document from a file.
pub fn load(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let mut doc = parse_bytes(&bytes)?;
    doc.set_source_name(path.display().to_string());
    log::debug!("loaded {} ({} nodes)", path.display(), doc.len());
    Ok(doc)
}

/// Create an element from a start tag, opening its namespace scope.
fn start_element(
    doc: &mut Document,
    scopes: &mut NamespaceScopes,
    e: &BytesStart<'_>,
) -> Result<NodeId> {
    let mut declarations = Vec::new();
    let mut raw_attrs = Vec::new();

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw_value = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw_value)
            .map_err(|err| Error::Malformed(format!("attribute {key}: {err}")))?
            .into_owned();

        if key == "xmlns" {
            declarations.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((Some(prefix.to_string()), value));
        } else {
            raw_attrs.push((key, value));
        }
    }
    scopes.push(declarations);

    let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let (prefix, local) = split_qname(&raw_name);
    let ns = scopes.resolve(prefix).map_err(Error::Malformed)?;
    let name = QualName::new(ns.as_deref(), local);

    let mut attrs = Vec::with_capacity(raw_attrs.len());
    for (key, value) in raw_attrs {
        let (prefix, local) = split_qname(&key);
        // Unprefixed attributes are in no namespace
        let ns = match prefix {
            Some(_) => scopes.resolve(prefix).map_err(Error::Malformed)?,
            None => None,
        };
        attrs.push(Attribute::new(QualName::new(ns.as_deref(), local), value));
    }

    Ok(doc.create_element(name, attrs))
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Stack of in-scope namespace declarations, one frame per open element.
#[derive(Default)]
struct NamespaceScopes {
    frames: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceScopes {
    fn push(&mut self, declarations: Vec<(Option<String>, String)>) {
        self.frames.push(declarations);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolve a prefix (`None` for the default namespace) to its URI.
    fn resolve(&self, prefix: Option<&str>) -> std::result::Result<Option<String>, String> {
        if prefix == Some("xml") {
            return Ok(Some(XML_NS.to_string()));
        }
        for frame in self.frames.iter().rev() {
            if let Some((_, uri)) = frame.iter().find(|(p, _)| p.as_deref() == prefix) {
                // xmlns="" undeclares the default namespace
                return Ok(if uri.is_empty() { None } else { Some(uri.clone()) });
            }
        }
        match prefix {
            None => Ok(None),
            Some(p) => Err(format!("undeclared namespace prefix \"{p}\"")),
        }
    }
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
