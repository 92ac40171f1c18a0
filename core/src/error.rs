//! Error type shared by every retrieval operation.
//!
//! Unknown query terms are never an error: they simply match nothing.

use crate::DocId;

/// Errors raised by index construction, query parsing and evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// An index was requested over a collection with no documents.
    #[error("cannot build an index over an empty collection")]
    EmptyCollection,

    /// A pipeline selector did not name one of the four pipelines.
    #[error("unknown pipeline: {name}")]
    UnknownPipeline { name: String },

    /// Recall is undefined because the relevant set is empty.
    #[error("recall is undefined for an empty relevant set")]
    UndefinedRecall,

    /// A Boolean expression could not be parsed.
    #[error("malformed query: {reason}")]
    MalformedQuery { reason: String },

    /// A document id was added twice to the same collection.
    #[error("duplicate document id: {id}")]
    DuplicateDocument { id: DocId },

    /// Frequency stopword thresholds were out of range or inverted.
    #[error("invalid stopword threshold: {reason}")]
    InvalidThreshold { reason: String },
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedQuery { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
