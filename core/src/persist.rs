use crate::config::{RetrievalConfig, StopwordSetting};
use crate::evaluation::{GroundTruth, GroundTruthFile};
use crate::index::{Document, InvertedIndex};
use crate::pipeline::Pipeline;
use crate::stopwords::{FrequencyThresholds, StopwordFilter, StopwordList, StopwordStrategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub pipelines: Vec<Pipeline>,
    pub stopwords: StopwordSetting,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self, pipeline: Pipeline) -> PathBuf { self.root.join(format!("index-{pipeline}.bin")) }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn stopwords(&self) -> PathBuf { self.root.join("stopwords.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_string(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(buf)
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    let pipeline = index.pipeline.context("index has no pipeline")?;
    create_dir_all(&paths.root)?;
    write_bytes(&paths.index(pipeline), &bincode::serialize(index)?)
}

pub fn load_index(paths: &IndexPaths, pipeline: Pipeline) -> Result<InvertedIndex> {
    let index = bincode::deserialize(&read_bytes(&paths.index(pipeline))?)?;
    Ok(index)
}

pub fn save_docs(paths: &IndexPaths, docs: &[Document]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.docs(), &bincode::serialize(docs)?)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<Document>> {
    let docs = bincode::deserialize(&read_bytes(&paths.docs())?)?;
    Ok(docs)
}

/// Persist the stopword filter the indexes were built with, so queries can
/// be normalized the same way without the original documents.
pub fn save_stopwords(paths: &IndexPaths, filter: &StopwordFilter) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.stopwords(), &bincode::serialize(filter)?)
}

pub fn load_stopwords(paths: &IndexPaths) -> Result<StopwordFilter> {
    let filter = bincode::deserialize(&read_bytes(&paths.stopwords())?)?;
    Ok(filter)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let meta: MetaFile = serde_json::from_str(&read_string(&paths.meta())?)?;
    Ok(meta)
}

/// Read a stopword file: one word per line, case-insensitive.
pub fn load_stopword_list(path: &Path) -> Result<StopwordList> {
    Ok(StopwordList::parse(&read_string(path)?))
}

/// Read a JSON object mapping queries to arrays of relevant documents, given
/// as ids or as names resolved against `documents`' titles.
pub fn load_ground_truth<'a, I>(path: &Path, documents: I) -> Result<GroundTruth>
where
    I: IntoIterator<Item = &'a Document>,
{
    let file: GroundTruthFile = serde_json::from_str(&read_string(path)?)
        .with_context(|| format!("parsing ground truth {}", path.display()))?;
    Ok(file.resolve(documents))
}

pub fn load_config(path: &Path) -> Result<RetrievalConfig> {
    let config = serde_json::from_str(&read_string(path)?)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Turn a configured stopword setting into a strategy, reading list files.
pub fn resolve_stopwords(setting: &StopwordSetting) -> Result<StopwordStrategy> {
    let strategy = match setting {
        StopwordSetting::None => StopwordStrategy::None,
        StopwordSetting::English => StopwordStrategy::List(StopwordList::english()),
        StopwordSetting::List { path } => StopwordStrategy::List(load_stopword_list(path)?),
        StopwordSetting::Frequency { common, rare } => {
            let thresholds = FrequencyThresholds { common: *common, rare: *rare };
            thresholds.validate()?;
            StopwordStrategy::Frequency(thresholds)
        }
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Normalizer;
    use tempfile::tempdir;

    #[test]
    fn index_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let docs = vec![Document::new(1, "the cat sat"), Document::new(2, "cats and dogs").with_title("Pets")];
        let index = InvertedIndex::build(&docs, Pipeline::Stemmed, &Normalizer::default()).unwrap();
        save_index(&paths, &index).unwrap();
        save_docs(&paths, &docs).unwrap();
        assert_eq!(load_index(&paths, Pipeline::Stemmed).unwrap(), index);
        assert_eq!(load_docs(&paths).unwrap(), docs);
        assert!(load_index(&paths, Pipeline::Raw).is_err());
    }

    #[test]
    fn meta_and_stopwords_round_trip() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("nested"));
        let meta = MetaFile {
            num_docs: 2,
            pipelines: Pipeline::ALL.to_vec(),
            stopwords: StopwordSetting::English,
            created_at: "2024-01-01T00:00:00Z".into(),
            version: 1,
        };
        save_meta(&paths, &meta).unwrap();
        assert_eq!(load_meta(&paths).unwrap(), meta);

        let filter = StopwordFilter::List(StopwordList::new(["the", "and"]));
        save_stopwords(&paths, &filter).unwrap();
        assert_eq!(load_stopwords(&paths).unwrap(), filter);
    }

    #[test]
    fn loads_collaborator_files() {
        let dir = tempdir().unwrap();
        let stop = dir.path().join("stop.txt");
        std::fs::write(&stop, "The\nAND\n\n").unwrap();
        let gt = dir.path().join("gt.json");
        std::fs::write(&gt, r#"{"cat": [1, 3], "dog": ["The_Dog-Days", 9]}"#).unwrap();
        let docs = vec![
            Document::new(1, "the cat").with_title("Cat"),
            Document::new(2, "the dog").with_title("The Dog Days"),
        ];

        let list = load_stopword_list(&stop).unwrap();
        assert!(list.contains("the") && list.contains("and"));
        let truth = load_ground_truth(&gt, &docs).unwrap();
        assert_eq!(truth.relevant("cat").map(|s| s.len()), Some(2));
        assert_eq!(truth.relevant("dog").map(|s| s.iter().copied().collect::<Vec<_>>()), Some(vec![2, 9]));

        let strategy = resolve_stopwords(&StopwordSetting::List { path: stop }).unwrap();
        assert_eq!(strategy, StopwordStrategy::List(list));
        assert!(resolve_stopwords(&StopwordSetting::Frequency { common: 2.0, rare: None }).is_err());
        assert!(load_ground_truth(&dir.path().join("missing.json"), &docs).is_err());
    }
}
