//! Exact-match Boolean retrieval over one inverted index.

use crate::index::{DocId, InvertedIndex};
use crate::pipeline::{Normalizer, Pipeline};
use crate::query::BooleanQuery;
use std::collections::BTreeSet;

/// Evaluate `query` against `index`.
///
/// Leaf terms go through the index's own pipeline before lookup. A term the
/// index has never seen, or one the pipeline filters away, matches nothing.
pub fn evaluate(query: &BooleanQuery, index: &InvertedIndex, normalizer: &Normalizer) -> BTreeSet<DocId> {
    let pipeline = index.pipeline.unwrap_or(Pipeline::Raw);
    eval(query, index, normalizer, pipeline)
}

fn eval(query: &BooleanQuery, index: &InvertedIndex, normalizer: &Normalizer, pipeline: Pipeline) -> BTreeSet<DocId> {
    match query {
        BooleanQuery::Term(term) => normalizer
            .normalize_query_term(term, pipeline)
            .and_then(|t| index.postings(&t))
            .map(|postings| postings.keys().copied().collect())
            .unwrap_or_default(),
        BooleanQuery::And(l, r) => {
            let left = eval(l, index, normalizer, pipeline);
            if left.is_empty() {
                return left;
            }
            let right = eval(r, index, normalizer, pipeline);
            left.intersection(&right).copied().collect()
        }
        BooleanQuery::Or(l, r) => {
            let mut left = eval(l, index, normalizer, pipeline);
            left.extend(eval(r, index, normalizer, pipeline));
            left
        }
        BooleanQuery::Not(l, r) => {
            let left = eval(l, index, normalizer, pipeline);
            if left.is_empty() {
                return left;
            }
            let right = eval(r, index, normalizer, pipeline);
            left.difference(&right).copied().collect()
        }
    }
}

/// Parse `input` and evaluate it.
pub fn search(input: &str, index: &InvertedIndex, normalizer: &Normalizer) -> crate::Result<BTreeSet<DocId>> {
    let query = BooleanQuery::parse(input)?;
    let hits = evaluate(&query, index, normalizer);
    tracing::debug!(query = %query, hits = hits.len(), "boolean search");
    Ok(hits)
}
