//! Vector Space Model retrieval: tf-idf weights ranked by cosine similarity.

use crate::index::{DocId, InvertedIndex};
use crate::pipeline::{Normalizer, Pipeline};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Term-frequency transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TfWeighting {
    /// `tf`
    #[default]
    Raw,
    /// `1 + ln(tf)`
    LogScaled,
}

impl TfWeighting {
    pub fn weight(self, tf: u32) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        match self {
            TfWeighting::Raw => tf as f64,
            TfWeighting::LogScaled => 1.0 + (tf as f64).ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSpaceConfig {
    #[serde(default)]
    pub tf: TfWeighting,
    /// Use `ln(1 + N/df)` instead of `ln(N/df)`.
    #[serde(default)]
    pub smoothed_idf: bool,
}

/// Inverse document frequency of `term`; zero for terms the index lacks.
pub fn idf(index: &InvertedIndex, term: &str, smoothed: bool) -> f64 {
    let df = index.document_frequency(term);
    if df == 0 || index.num_docs() == 0 {
        return 0.0;
    }
    let ratio = index.num_docs() as f64 / df as f64;
    if smoothed { (1.0 + ratio).ln() } else { ratio.ln() }
}

/// Document norms precomputed over one index, for repeated queries.
#[derive(Debug, Clone)]
pub struct VectorSpaceModel<'a> {
    index: &'a InvertedIndex,
    config: VectorSpaceConfig,
    norms: BTreeMap<DocId, f64>,
}

impl<'a> VectorSpaceModel<'a> {
    pub fn new(index: &'a InvertedIndex, config: VectorSpaceConfig) -> Self {
        let mut norms: BTreeMap<DocId, f64> = index.doc_ids().map(|id| (id, 0.0)).collect();
        for (term, postings) in &index.postings {
            let idf = idf(index, term, config.smoothed_idf);
            for (doc_id, &tf) in postings {
                let w = config.tf.weight(tf) * idf;
                *norms.entry(*doc_id).or_insert(0.0) += w * w;
            }
        }
        for norm in norms.values_mut() {
            *norm = norm.sqrt();
        }
        Self { index, config, norms }
    }

    /// tf-idf weight of `term` in document `doc_id`.
    pub fn weight(&self, term: &str, doc_id: DocId) -> f64 {
        let tf = self.index.term_frequency(term, doc_id);
        self.config.tf.weight(tf) * idf(self.index, term, self.config.smoothed_idf)
    }

    pub fn norm(&self, doc_id: DocId) -> f64 {
        self.norms.get(&doc_id).copied().unwrap_or(0.0)
    }

    /// Rank documents by cosine similarity to the bag of `query_terms`.
    ///
    /// Terms must already be normalized. Documents scoring zero, including
    /// zero-norm documents, are left out. Ties are broken by ascending id.
    pub fn search<S: AsRef<str>>(&self, query_terms: &[S], top_k: Option<usize>) -> Vec<(DocId, f64)> {
        let mut query_tf: BTreeMap<&str, u32> = BTreeMap::new();
        for term in query_terms {
            let term = term.as_ref();
            if self.index.contains(term) {
                *query_tf.entry(term).or_insert(0) += 1;
            }
        }

        let query_weights: Vec<(&str, f64)> = query_tf
            .into_iter()
            .map(|(term, tf)| (term, self.config.tf.weight(tf) * idf(self.index, term, self.config.smoothed_idf)))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        let query_norm = query_weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut dots: BTreeMap<DocId, f64> = BTreeMap::new();
        for (term, q_w) in &query_weights {
            let Some(postings) = self.index.postings(term) else { continue };
            let idf = idf(self.index, term, self.config.smoothed_idf);
            for (doc_id, &tf) in postings {
                *dots.entry(*doc_id).or_insert(0.0) += q_w * self.config.tf.weight(tf) * idf;
            }
        }

        let mut scored: Vec<(DocId, f64)> = dots
            .into_iter()
            .filter_map(|(doc_id, dot)| {
                let doc_norm = self.norm(doc_id);
                if doc_norm == 0.0 {
                    return None;
                }
                let score = (dot / (doc_norm * query_norm)).clamp(0.0, 1.0);
                (score > 0.0).then_some((doc_id, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        if let Some(k) = top_k {
            scored.truncate(k);
        }
        scored
    }

    /// Normalize free text under the index's pipeline, then rank.
    pub fn search_text(&self, text: &str, normalizer: &Normalizer, top_k: Option<usize>) -> Vec<(DocId, f64)> {
        let pipeline = self.index.pipeline.unwrap_or(Pipeline::Raw);
        let terms = normalizer.normalize(text, pipeline);
        let hits = self.search(&terms, top_k);
        tracing::debug!(%pipeline, terms = terms.len(), hits = hits.len(), "vector search");
        hits
    }
}

/// Rank `index`'s documents against already-normalized `query_terms`.
pub fn search<S: AsRef<str>>(
    query_terms: &[S],
    index: &InvertedIndex,
    top_k: Option<usize>,
    config: VectorSpaceConfig,
) -> Vec<(DocId, f64)> {
    VectorSpaceModel::new(index, config).search(query_terms, top_k)
}

/// Normalize free text under the index's pipeline, then rank.
pub fn search_text(
    text: &str,
    index: &InvertedIndex,
    normalizer: &Normalizer,
    top_k: Option<usize>,
    config: VectorSpaceConfig,
) -> Vec<(DocId, f64)> {
    VectorSpaceModel::new(index, config).search_text(text, normalizer, top_k)
}
