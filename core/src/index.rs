use crate::error::{Error, Result};
use crate::pipeline::{Normalizer, Pipeline};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = u32;

/// Postings for one term: document id → in-document term frequency.
pub type Postings = BTreeMap<DocId, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self { id, title: String::new(), text: text.into() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl<S: Into<String>> From<(DocId, S)> for Document {
    fn from((id, text): (DocId, S)) -> Self {
        Document::new(id, text)
    }
}

/// Inverted index over one normalization pipeline.
///
/// Ordered maps everywhere, so two builds over the same documents serialize
/// to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub pipeline: Option<Pipeline>,
    pub postings: BTreeMap<String, Postings>,
    pub df: BTreeMap<String, u32>,
    /// Number of terms each document contributes under this pipeline.
    pub doc_lengths: BTreeMap<DocId, u32>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Normalize every document under `pipeline` and index the resulting terms.
    pub fn build<'a, I>(documents: I, pipeline: Pipeline, normalizer: &Normalizer) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let sequences: Vec<(DocId, Vec<String>)> = documents
            .into_iter()
            .map(|doc| (doc.id, normalizer.normalize(&doc.text, pipeline)))
            .collect();
        Self::from_terms(pipeline, sequences.iter().map(|(id, terms)| (*id, terms.as_slice())))
    }

    /// Index term sequences that were already normalized under `pipeline`.
    pub fn from_terms<'a, I>(pipeline: Pipeline, sequences: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, &'a [String])>,
    {
        let mut index = InvertedIndex { pipeline: Some(pipeline), ..Self::default() };
        for (doc_id, terms) in sequences {
            index.insert(doc_id, terms)?;
        }
        if index.num_docs == 0 {
            return Err(Error::EmptyCollection);
        }
        tracing::debug!(%pipeline, num_docs = index.num_docs, num_terms = index.postings.len(), "built inverted index");
        Ok(index)
    }

    fn insert(&mut self, doc_id: DocId, terms: &[String]) -> Result<()> {
        if self.doc_lengths.contains_key(&doc_id) {
            return Err(Error::DuplicateDocument { id: doc_id });
        }
        let mut tf_counts: BTreeMap<&str, u32> = BTreeMap::new();
        for term in terms {
            *tf_counts.entry(term.as_str()).or_insert(0) += 1;
        }
        let doc_len: u32 = tf_counts.values().sum();
        for (term, tf) in tf_counts {
            let postings = self.postings.entry(term.to_string()).or_default();
            if postings.insert(doc_id, tf).is_none() {
                *self.df.entry(term.to_string()).or_insert(0) += 1;
            }
        }
        self.doc_lengths.insert(doc_id, doc_len);
        self.num_docs += 1;
        Ok(())
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.postings.get(term)
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.df.get(term).copied().unwrap_or(0)
    }

    pub fn term_frequency(&self, term: &str, doc_id: DocId) -> u32 {
        self.postings(term).and_then(|p| p.get(&doc_id)).copied().unwrap_or(0)
    }

    pub fn doc_length(&self, doc_id: DocId) -> Option<u32> {
        self.doc_lengths.get(&doc_id).copied()
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn contains(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// Indexed terms in ascending order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> + '_ {
        self.postings.keys().map(String::as_str)
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.doc_lengths.keys().copied()
    }

    pub fn total_terms(&self) -> u64 {
        self.doc_lengths.values().map(|&len| len as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stopwords::{StopwordFilter, StopwordList};

    fn docs() -> Vec<Document> {
        vec![
            Document::new(1, "the cat sat on the mat"),
            Document::new(2, "the dog ran"),
            Document::new(3, "cats and dogs"),
        ]
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(StopwordFilter::List(StopwordList::new(["the", "and", "on"])))
    }

    #[test]
    fn counts_term_frequencies() {
        let index = InvertedIndex::build(&docs(), Pipeline::Raw, &normalizer()).unwrap();
        assert_eq!(index.num_docs(), 3);
        assert_eq!(index.term_frequency("the", 1), 2);
        assert_eq!(index.document_frequency("the"), 2);
        assert_eq!(index.doc_length(1), Some(6));
        assert_eq!(index.document_frequency("unicorn"), 0);
        assert!(index.postings("unicorn").is_none());
    }

    #[test]
    fn df_matches_postings_and_lengths_match_tf() {
        let docs = docs();
        let n = normalizer();
        for pipeline in Pipeline::ALL {
            let index = InvertedIndex::build(&docs, pipeline, &n).unwrap();
            for term in index.vocabulary() {
                assert_eq!(index.document_frequency(term) as usize, index.postings(term).unwrap().len());
            }
            for doc in &docs {
                let sum: u32 = index.postings.values().filter_map(|p| p.get(&doc.id)).sum();
                assert_eq!(Some(sum), index.doc_length(doc.id));
                assert_eq!(sum as usize, n.normalize(&doc.text, pipeline).len());
            }
        }
    }

    #[test]
    fn empty_collection_is_an_error() {
        let none: Vec<Document> = Vec::new();
        assert_eq!(InvertedIndex::build(&none, Pipeline::Raw, &normalizer()), Err(Error::EmptyCollection));
    }

    #[test]
    fn documents_without_terms_still_count() {
        let docs = vec![Document::new(7, "the and the"), Document::new(8, "!!!")];
        let index = InvertedIndex::build(&docs, Pipeline::Filtered, &normalizer()).unwrap();
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.vocabulary().count(), 0);
        assert_eq!(index.doc_length(7), Some(0));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let docs = vec![Document::new(1, "a b"), Document::new(1, "c d")];
        assert_eq!(
            InvertedIndex::build(&docs, Pipeline::Raw, &normalizer()),
            Err(Error::DuplicateDocument { id: 1 })
        );
    }

    #[test]
    fn rebuilds_are_byte_identical() {
        let docs = docs();
        let a = InvertedIndex::build(&docs, Pipeline::FilteredStemmed, &normalizer()).unwrap();
        let b = InvertedIndex::build(&docs, Pipeline::FilteredStemmed, &normalizer()).unwrap();
        assert_eq!(bincode::serialize(&a).unwrap(), bincode::serialize(&b).unwrap());
    }

    #[test]
    fn prenormalized_terms_build_the_same_index() {
        let docs = docs();
        let n = normalizer();
        let built = InvertedIndex::build(&docs, Pipeline::Stemmed, &n).unwrap();
        let terms: Vec<(DocId, Vec<String>)> =
            docs.iter().map(|d| (d.id, n.normalize(&d.text, Pipeline::Stemmed))).collect();
        let from_terms =
            InvertedIndex::from_terms(Pipeline::Stemmed, terms.iter().map(|(id, t)| (*id, t.as_slice()))).unwrap();
        assert_eq!(from_terms, built);
    }
}
