//! In-memory Boolean and Vector Space retrieval over four normalization
//! pipelines, with precision/recall evaluation.

pub mod boolean;
pub mod collection;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod stemmer;
pub mod stopwords;
pub mod tokenizer;
pub mod vector;

pub use collection::Collection;
pub use error::{Error, Result};
pub use index::{DocId, Document, InvertedIndex, Postings};
pub use pipeline::{Normalizer, Pipeline};
pub use query::BooleanQuery;
