//! Structural data model.
//!
//! This module contains:
//! - Element classification and per-kind numbering styles
//! - Structural ranks
//! - The side table of per-element annotations and the id registry

mod info;
mod kind;
mod rank;

pub use info::{
    AUTO_ID_PREFIX, Annotations, DOCGEN_ID_PREFIX, IdRegistry, StructuralInfo, is_reserved_id,
};
pub use kind::{DOCBOOK_NS, DocKind, ElementKind, NumberStyle, XLINK_NS, XML_NS};
pub use rank::{MAX_SECTION_NESTING_LEVEL, Rank};
