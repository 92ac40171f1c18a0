//! Retrieval quality metrics against ground-truth relevance judgments.
//!
//! Precision is `|retrieved ∩ relevant| / |retrieved|`, defined as 0 when
//! nothing was retrieved. Recall is `|retrieved ∩ relevant| / |relevant|` and
//! has no value when the relevant set is empty; every function that needs it
//! returns [`Error::UndefinedRecall`] instead of dividing by zero.

use crate::error::{Error, Result};
use crate::index::{DocId, Document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A relevant document as written in a ground-truth file: a numeric id or a
/// document name matched against titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocRef {
    Id(DocId),
    Name(String),
}

/// Ground truth as read from disk, before names are resolved to ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruthFile {
    queries: BTreeMap<String, Vec<DocRef>>,
}

impl GroundTruthFile {
    /// Resolve names against document titles. Both sides are compared by
    /// [`title_key`]; names matching no title are logged and skipped.
    pub fn resolve<'a, I>(&self, documents: I) -> GroundTruth
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut by_title: BTreeMap<String, Vec<DocId>> = BTreeMap::new();
        for doc in documents {
            let key = title_key(&doc.title);
            if !key.is_empty() {
                by_title.entry(key).or_default().push(doc.id);
            }
        }

        let mut queries = BTreeMap::new();
        for (query, refs) in &self.queries {
            let mut relevant = BTreeSet::new();
            for r in refs {
                match r {
                    DocRef::Id(id) => {
                        relevant.insert(*id);
                    }
                    DocRef::Name(name) => match by_title.get(&title_key(name)) {
                        Some(ids) => relevant.extend(ids.iter().copied()),
                        None => tracing::warn!(query = %query, name = %name, "no document with this title"),
                    },
                }
            }
            queries.insert(query.clone(), relevant);
        }
        GroundTruth { queries }
    }
}

/// Canonical form of a document name: lowercase, whitespace and hyphens
/// become `_`, anything else that is not a letter, digit or `_` is dropped.
pub fn title_key(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() || c == '-' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Relevant document ids per query. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth {
    queries: BTreeMap<String, BTreeSet<DocId>>,
}

impl GroundTruth {
    pub fn relevant(&self, query: &str) -> Option<&BTreeSet<DocId>> {
        self.queries.get(query)
    }

    pub fn queries(&self) -> impl Iterator<Item = (&str, &BTreeSet<DocId>)> + '_ {
        self.queries.iter().map(|(q, ids)| (q.as_str(), ids))
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<Q, I> FromIterator<(Q, I)> for GroundTruth
where
    Q: Into<String>,
    I: IntoIterator<Item = DocId>,
{
    fn from_iter<T: IntoIterator<Item = (Q, I)>>(iter: T) -> Self {
        let queries = iter
            .into_iter()
            .map(|(q, ids)| (q.into(), ids.into_iter().collect()))
            .collect();
        Self { queries }
    }
}

pub fn precision(retrieved: &BTreeSet<DocId>, relevant: &BTreeSet<DocId>) -> f64 {
    if retrieved.is_empty() {
        return 0.0;
    }
    retrieved.intersection(relevant).count() as f64 / retrieved.len() as f64
}

pub fn recall(retrieved: &BTreeSet<DocId>, relevant: &BTreeSet<DocId>) -> Result<f64> {
    if relevant.is_empty() {
        return Err(Error::UndefinedRecall);
    }
    Ok(retrieved.intersection(relevant).count() as f64 / relevant.len() as f64)
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Metrics for an unordered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetEvaluation {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub hits: usize,
    pub retrieved: usize,
    pub relevant: usize,
}

pub fn evaluate_set(retrieved: &BTreeSet<DocId>, relevant: &BTreeSet<DocId>) -> Result<SetEvaluation> {
    let recall = recall(retrieved, relevant)?;
    let precision = precision(retrieved, relevant);
    Ok(SetEvaluation {
        precision,
        recall,
        f1: f1(precision, recall),
        hits: retrieved.intersection(relevant).count(),
        retrieved: retrieved.len(),
        relevant: relevant.len(),
    })
}

/// Metrics for a ranked list, cut off at some rank `k`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEvaluation {
    pub precision: f64,
    pub recall: f64,
    /// `precision_at_k[i]` is the precision of the top `i + 1` results.
    pub precision_at_k: Vec<f64>,
    pub average_precision: f64,
    pub hits: usize,
}

impl RankedEvaluation {
    /// Precision of the top `k` results, if the list reached rank `k`.
    pub fn precision_at(&self, k: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|i| self.precision_at_k.get(i)).copied()
    }
}

/// Evaluate the top `k` entries of `ranked` (all of them when `k` is `None`)
/// in a single scan. Repeated ids only count at their first rank.
pub fn evaluate_ranked(ranked: &[DocId], relevant: &BTreeSet<DocId>, k: Option<usize>) -> Result<RankedEvaluation> {
    if relevant.is_empty() {
        return Err(Error::UndefinedRecall);
    }
    let mut seen = BTreeSet::new();
    let cutoff = k.unwrap_or(usize::MAX);
    let mut precision_at_k = Vec::new();
    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for &doc_id in ranked {
        if precision_at_k.len() >= cutoff {
            break;
        }
        if !seen.insert(doc_id) {
            continue;
        }
        let rank = precision_at_k.len() + 1;
        if relevant.contains(&doc_id) {
            hits += 1;
            precision_sum += hits as f64 / rank as f64;
        }
        precision_at_k.push(hits as f64 / rank as f64);
    }
    let precision = precision_at_k.last().copied().unwrap_or(0.0);
    Ok(RankedEvaluation {
        precision,
        recall: hits as f64 / relevant.len() as f64,
        precision_at_k,
        average_precision: precision_sum / relevant.len() as f64,
        hits,
    })
}

/// Per-query results plus means over every query whose recall was defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub per_query: BTreeMap<String, RankedEvaluation>,
    /// Queries skipped because their relevant set was empty.
    pub undefined: Vec<String>,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_average_precision: f64,
}

/// Run every ground-truth query through `run` and aggregate the results.
pub fn evaluate_queries<F>(ground_truth: &GroundTruth, k: Option<usize>, mut run: F) -> Result<EvaluationReport>
where
    F: FnMut(&str) -> Result<Vec<DocId>>,
{
    let mut report = EvaluationReport::default();
    for (query, relevant) in ground_truth.queries() {
        let ranked = run(query)?;
        match evaluate_ranked(&ranked, relevant, k) {
            Ok(eval) => {
                report.per_query.insert(query.to_string(), eval);
            }
            Err(Error::UndefinedRecall) => {
                tracing::warn!(query, "skipping query with no relevant documents");
                report.undefined.push(query.to_string());
            }
            Err(e) => return Err(e),
        }
    }
    let n = report.per_query.len();
    if n > 0 {
        let n = n as f64;
        report.mean_precision = report.per_query.values().map(|e| e.precision).sum::<f64>() / n;
        report.mean_recall = report.per_query.values().map(|e| e.recall).sum::<f64>() / n;
        report.mean_average_precision = report.per_query.values().map(|e| e.average_precision).sum::<f64>() / n;
    }
    Ok(report)
}
