//! Normalization pipelines.
//!
//! Every pipeline starts with [`tokenize`]; stopword filtering always runs
//! before stemming when both are selected.

use crate::error::{Error, Result};
use crate::stemmer::stem;
use crate::stopwords::StopwordFilter;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pipeline {
    #[default]
    Raw,
    Filtered,
    Stemmed,
    FilteredStemmed,
}

impl Pipeline {
    pub const ALL: [Pipeline; 4] = [Pipeline::Raw, Pipeline::Filtered, Pipeline::Stemmed, Pipeline::FilteredStemmed];

    pub fn filters(self) -> bool {
        matches!(self, Pipeline::Filtered | Pipeline::FilteredStemmed)
    }

    pub fn stems(self) -> bool {
        matches!(self, Pipeline::Stemmed | Pipeline::FilteredStemmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pipeline::Raw => "raw",
            Pipeline::Filtered => "filtered",
            Pipeline::Stemmed => "stemmed",
            Pipeline::FilteredStemmed => "filtered-stemmed",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pipeline {
    type Err = Error;

    /// Accepts the kebab-case names plus the numeric menu choices `1`..`4`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "original" | "1" => Ok(Pipeline::Raw),
            "filtered" | "2" => Ok(Pipeline::Filtered),
            "stemmed" | "3" => Ok(Pipeline::Stemmed),
            "filtered-stemmed" | "filtered+stemmed" | "filtered_stemmed" | "4" => Ok(Pipeline::FilteredStemmed),
            _ => Err(Error::UnknownPipeline { name: s.to_string() }),
        }
    }
}

/// Turns raw text into terms under a [`Pipeline`], using one resolved
/// stopword filter.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    stopwords: StopwordFilter,
}

impl Normalizer {
    pub fn new(stopwords: StopwordFilter) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &StopwordFilter {
        &self.stopwords
    }

    pub fn normalize(&self, text: &str, pipeline: Pipeline) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter_map(|token| self.apply(token, pipeline))
            .collect()
    }

    /// Normalize one already-tokenized query word. `None` when the pipeline
    /// filters it out.
    pub fn normalize_query_term(&self, token: &str, pipeline: Pipeline) -> Option<String> {
        self.apply(token.to_lowercase(), pipeline)
    }

    fn apply(&self, token: String, pipeline: Pipeline) -> Option<String> {
        if token.is_empty() {
            return None;
        }
        if pipeline.filters() && self.stopwords.is_stopword(&token) {
            return None;
        }
        if pipeline.stems() {
            Some(stem(&token))
        } else {
            Some(token)
        }
    }
}
