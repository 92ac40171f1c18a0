//! A document collection with lazily built, per-pipeline indexes.
//!
//! Indexes are never mutated. Per-document term sequences and whole indexes
//! are cached; adding a document or changing the stopword strategy drops the
//! cache and the next lookup builds fresh ones. Callers still holding an
//! `Arc<InvertedIndex>` keep their old snapshot.

use crate::boolean;
use crate::error::{Error, Result};
use crate::index::{DocId, Document, InvertedIndex};
use crate::pipeline::{Normalizer, Pipeline};
use crate::stopwords::{StopwordFilter, StopwordStrategy};
use crate::vector::{self, VectorSpaceConfig};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct Resolved {
    normalizer: Option<Arc<Normalizer>>,
    terms: HashMap<(DocId, Pipeline), Arc<[String]>>,
    indexes: HashMap<Pipeline, Arc<InvertedIndex>>,
}

#[derive(Default)]
pub struct Collection {
    documents: Vec<Document>,
    ids: BTreeSet<DocId>,
    stopwords: StopwordStrategy,
    cache: RwLock<Resolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub total_terms: u64,
    pub average_terms: f64,
    pub vocabulary: usize,
}

impl PipelineStats {
    pub fn of(index: &InvertedIndex) -> Self {
        let total_terms = index.total_terms();
        PipelineStats {
            total_terms,
            average_terms: total_terms as f64 / index.num_docs().max(1) as f64,
            vocabulary: index.postings.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionStats {
    pub documents: usize,
    pub pipelines: BTreeMap<Pipeline, PipelineStats>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from any document source.
    pub fn from_documents<I, D>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Document>,
    {
        let mut collection = Self::new();
        for doc in documents {
            collection.add_document(doc)?;
        }
        Ok(collection)
    }

    pub fn with_stopwords(mut self, strategy: StopwordStrategy) -> Self {
        self.set_stopwords(strategy);
        self
    }

    pub fn add_document(&mut self, doc: impl Into<Document>) -> Result<()> {
        let doc = doc.into();
        if !self.ids.insert(doc.id) {
            return Err(Error::DuplicateDocument { id: doc.id });
        }
        self.documents.push(doc);
        self.invalidate();
        Ok(())
    }

    pub fn set_stopwords(&mut self, strategy: StopwordStrategy) {
        self.stopwords = strategy;
        self.invalidate();
    }

    pub fn stopwords(&self) -> &StopwordStrategy {
        &self.stopwords
    }

    fn invalidate(&mut self) {
        let cache = self.cache.get_mut();
        if cache.normalizer.is_some() || !cache.terms.is_empty() || !cache.indexes.is_empty() {
            tracing::debug!(documents = self.documents.len(), "dropping cached terms and indexes");
        }
        *cache = Resolved::default();
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The normalizer with the stopword strategy resolved against the
    /// current documents.
    pub fn normalizer(&self) -> Result<Arc<Normalizer>> {
        if let Some(normalizer) = &self.cache.read().normalizer {
            return Ok(Arc::clone(normalizer));
        }
        let filter = StopwordFilter::resolve(&self.stopwords, self.documents.iter().map(|d| d.text.as_str()))?;
        let normalizer = Arc::new(Normalizer::new(filter));
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.normalizer.get_or_insert(normalizer)))
    }

    /// The index for `pipeline`, built on first use.
    pub fn index(&self, pipeline: Pipeline) -> Result<Arc<InvertedIndex>> {
        if let Some(index) = self.cache.read().indexes.get(&pipeline) {
            return Ok(Arc::clone(index));
        }
        let normalizer = self.normalizer()?;
        let sequences: Vec<(DocId, Arc<[String]>)> = self
            .documents
            .iter()
            .map(|doc| (doc.id, self.cached_terms(doc, pipeline, &normalizer)))
            .collect();
        let index = Arc::new(InvertedIndex::from_terms(
            pipeline,
            sequences.iter().map(|(id, terms)| (*id, &terms[..])),
        )?);
        tracing::info!(%pipeline, documents = index.num_docs(), terms = index.postings.len(), "indexed collection");
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.indexes.entry(pipeline).or_insert(index)))
    }

    /// Normalized terms of one document, computed on first use.
    pub fn terms(&self, id: DocId, pipeline: Pipeline) -> Result<Option<Arc<[String]>>> {
        let Some(doc) = self.get(id) else { return Ok(None) };
        let normalizer = self.normalizer()?;
        Ok(Some(self.cached_terms(doc, pipeline, &normalizer)))
    }

    fn cached_terms(&self, doc: &Document, pipeline: Pipeline, normalizer: &Normalizer) -> Arc<[String]> {
        if let Some(terms) = self.cache.read().terms.get(&(doc.id, pipeline)) {
            return Arc::clone(terms);
        }
        let terms: Arc<[String]> = normalizer.normalize(&doc.text, pipeline).into();
        let mut cache = self.cache.write();
        Arc::clone(cache.terms.entry((doc.id, pipeline)).or_insert(terms))
    }

    pub fn boolean_search(&self, query: &str, pipeline: Pipeline) -> Result<BTreeSet<DocId>> {
        let index = self.index(pipeline)?;
        let normalizer = self.normalizer()?;
        boolean::search(query, &index, &normalizer)
    }

    pub fn vector_search(
        &self,
        query: &str,
        pipeline: Pipeline,
        top_k: Option<usize>,
        config: VectorSpaceConfig,
    ) -> Result<Vec<(DocId, f64)>> {
        let index = self.index(pipeline)?;
        let normalizer = self.normalizer()?;
        Ok(vector::search_text(query, &index, &normalizer, top_k, config))
    }

    pub fn stats(&self) -> Result<CollectionStats> {
        let mut pipelines = BTreeMap::new();
        for pipeline in Pipeline::ALL {
            pipelines.insert(pipeline, PipelineStats::of(&*self.index(pipeline)?));
        }
        Ok(CollectionStats { documents: self.len(), pipelines })
    }
}
