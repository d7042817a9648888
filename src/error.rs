//! Error types for docgen operations.

use thiserror::Error;

/// Errors that can occur while loading or analyzing a document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML: {0}")]
    Malformed(String),

    /// The document's structure can't be turned into pages. The message names
    /// the offending element(s) and, where it applies, the setting to review.
    #[error("{0}")]
    Structure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An internal invariant was broken. This is a bug in docgen, not in the
    /// input document.
    #[error("Internal error (bug): {0}")]
    Bug(String),
}

impl Error {
    pub(crate) fn structure(message: impl Into<String>) -> Self {
        Error::Structure(message.into())
    }

    /// Whether this error reports a defect in docgen itself.
    pub fn is_bug(&self) -> bool {
        matches!(self, Error::Bug(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
