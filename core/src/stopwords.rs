//! Stopword policies.
//!
//! A [`StopwordStrategy`] is what the caller configures. It is resolved against
//! a concrete document set into a [`StopwordFilter`], which answers
//! `is_stopword` for the normalizer. The frequency strategy depends on the
//! collection, so a filter must be resolved again whenever documents change.

use crate::error::{Error, Result};
use crate::tokenizer::tokenize;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref ENGLISH: Vec<&'static str> = vec![
        "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
        "be","because","been","before","being","below","between","both","but","by",
        "can","can't","cannot","could","couldn't",
        "did","didn't","do","does","doesn't","doing","don't","down","during",
        "each","few","for","from","further",
        "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
        "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
        "let's","me","more","most","mustn't","my","myself",
        "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
        "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
        "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
        "under","until","up","very",
        "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
        "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
    ];
}

/// A fixed, case-folded set of stopwords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwordList {
    words: HashSet<String>,
}

impl StopwordList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Parse a stopword file body: one word per line, blank lines ignored.
    pub fn parse(body: &str) -> Self {
        Self::new(body.lines())
    }

    /// The built-in English list.
    pub fn english() -> Self {
        Self::new(ENGLISH.iter())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.words.contains(term)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Document-frequency cut-offs, as fractions of the collection size.
///
/// A term whose document frequency ratio exceeds `common` is a stopword.
/// `rare` is an optional lower bound: when set, terms whose ratio is at or
/// below it are dropped as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyThresholds {
    pub common: f64,
    #[serde(default)]
    pub rare: Option<f64>,
}

impl FrequencyThresholds {
    pub fn new(common: f64) -> Self {
        Self { common, rare: None }
    }

    pub fn with_rare(mut self, rare: f64) -> Self {
        self.rare = Some(rare);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.common) {
            return Err(Error::InvalidThreshold {
                reason: format!("common threshold {} is outside [0, 1]", self.common),
            });
        }
        if let Some(rare) = self.rare {
            if !(0.0..=1.0).contains(&rare) {
                return Err(Error::InvalidThreshold {
                    reason: format!("rare threshold {rare} is outside [0, 1]"),
                });
            }
            if rare >= self.common {
                return Err(Error::InvalidThreshold {
                    reason: format!("rare threshold {rare} must be below common threshold {}", self.common),
                });
            }
        }
        Ok(())
    }

    fn is_stopword_ratio(&self, ratio: f64) -> bool {
        ratio > self.common || self.rare.is_some_and(|rare| ratio <= rare)
    }
}

/// How stopwords are chosen for a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StopwordStrategy {
    /// Nothing is a stopword; the filtered pipelines equal their unfiltered twins.
    #[default]
    None,
    List(StopwordList),
    Frequency(FrequencyThresholds),
}

/// A stopword policy resolved against a concrete collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum StopwordFilter {
    #[default]
    None,
    List(StopwordList),
    /// Terms selected by document-frequency thresholding.
    Frequency(HashSet<String>),
}

impl StopwordFilter {
    /// Resolve `strategy` over the raw texts of a collection.
    pub fn resolve<'a, I>(strategy: &StopwordStrategy, texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match strategy {
            StopwordStrategy::None => Ok(StopwordFilter::None),
            StopwordStrategy::List(list) => Ok(StopwordFilter::List(list.clone())),
            StopwordStrategy::Frequency(thresholds) => Self::from_frequencies(texts, *thresholds),
        }
    }

    /// Count raw-token document frequencies over `texts` and keep the terms
    /// that fall outside `thresholds`.
    pub fn from_frequencies<'a, I>(texts: I, thresholds: FrequencyThresholds) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        thresholds.validate()?;
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut num_docs = 0u32;
        for text in texts {
            num_docs += 1;
            let unique: HashSet<String> = tokenize(text).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }
        if num_docs == 0 {
            return Ok(StopwordFilter::Frequency(HashSet::new()));
        }
        let n = num_docs as f64;
        let stopwords: HashSet<String> = df
            .into_iter()
            .filter(|(_, count)| thresholds.is_stopword_ratio(*count as f64 / n))
            .map(|(term, _)| term)
            .collect();
        tracing::debug!(num_docs, stopwords = stopwords.len(), common = thresholds.common, "resolved frequency stopwords");
        Ok(StopwordFilter::Frequency(stopwords))
    }

    pub fn is_stopword(&self, term: &str) -> bool {
        match self {
            StopwordFilter::None => false,
            StopwordFilter::List(list) => list.contains(term),
            StopwordFilter::Frequency(set) => set.contains(term),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_case_folded() {
        let list = StopwordList::parse("The\n  AND \n\nof\n");
        assert_eq!(list.len(), 3);
        assert!(list.contains("the"));
        assert!(list.contains("and"));
        assert!(!list.contains("cat"));
    }

    #[test]
    fn english_list_covers_common_words() {
        let list = StopwordList::english();
        assert!(list.contains("the"));
        assert!(list.contains("don't"));
        assert!(!list.contains("rust"));
    }

    #[test]
    fn frequency_drops_terms_above_threshold() {
        let texts = ["the cat sat", "the dog ran", "the cats and dogs", "a bird"];
        let filter = StopwordFilter::from_frequencies(texts, FrequencyThresholds::new(0.5)).unwrap();
        // "the" appears in 3 of 4 documents
        assert!(filter.is_stopword("the"));
        assert!(!filter.is_stopword("cat"));
        assert!(!filter.is_stopword("bird"));
    }

    #[test]
    fn frequency_threshold_is_strict() {
        let texts = ["alpha beta", "alpha gamma"];
        let filter = StopwordFilter::from_frequencies(texts, FrequencyThresholds::new(1.0)).unwrap();
        assert!(!filter.is_stopword("alpha"));
        let filter = StopwordFilter::from_frequencies(texts, FrequencyThresholds::new(0.99)).unwrap();
        assert!(filter.is_stopword("alpha"));
    }

    #[test]
    fn rare_bound_is_opt_in() {
        let texts = ["alpha beta", "alpha gamma", "alpha beta delta", "omega"];
        let upper_only = StopwordFilter::from_frequencies(texts, FrequencyThresholds::new(0.9)).unwrap();
        assert!(!upper_only.is_stopword("delta"));
        let both = StopwordFilter::from_frequencies(texts, FrequencyThresholds::new(0.9).with_rare(0.25)).unwrap();
        assert!(both.is_stopword("delta"));
        assert!(!both.is_stopword("beta"));
    }

    #[test]
    fn rejects_bad_thresholds() {
        assert!(FrequencyThresholds::new(1.5).validate().is_err());
        assert!(FrequencyThresholds::new(0.5).with_rare(0.5).validate().is_err());
        assert!(FrequencyThresholds::new(0.5).with_rare(-0.1).validate().is_err());
        assert!(FrequencyThresholds::new(0.5).with_rare(0.1).validate().is_ok());
    }

    #[test]
    fn empty_collection_has_no_stopwords() {
        let filter = StopwordFilter::from_frequencies(std::iter::empty(), FrequencyThresholds::new(0.1)).unwrap();
        assert!(!filter.is_stopword("anything"));
    }

    #[test]
    fn never_errors_on_odd_input() {
        let filter = StopwordFilter::List(StopwordList::english());
        assert!(!filter.is_stopword(""));
        assert!(!filter.is_stopword("!!!"));
        assert!(!StopwordFilter::None.is_stopword("the"));
    }
}
