//! XML document tree.
//!
//! [`Document`] is an arena of nodes with index links; [`parse_str`],
//! [`parse_bytes`] and [`load`] build one from XML text.
//!
//! # Example
//!
//! ```
//! use docgen::dom::parse_str;
//!
//! let doc = parse_str(r#"<book xmlns="http://docbook.org/ns/docbook"><title>T</title></book>"#)
//!     .unwrap();
//! let book = doc.root_element().unwrap();
//! assert_eq!(doc.local_name(book), Some("book"));
//! ```

mod arena;
mod loader;

pub use arena::{Attribute, ChildIter, Descendants, Document, Node, NodeData, NodeId, QualName};
pub use loader::{load, parse_bytes, parse_str};
