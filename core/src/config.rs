//! Retrieval settings and their defaults.
//!
//! Compile-time defaults live here as constants. Runtime settings arrive
//! either as CLI flags or as a JSON file deserialized into
//! [`RetrievalConfig`].

use crate::pipeline::Pipeline;
use crate::stopwords::FrequencyThresholds;
use crate::vector::VectorSpaceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of ranked results shown when no cutoff is given.
pub const DEFAULT_TOP_K: usize = 10;

/// Largest accepted `top_k`.
pub const MAX_TOP_K: usize = 10_000;

/// Snapshot format version written to `meta.json`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Where stopwords come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StopwordSetting {
    #[default]
    None,
    /// The built-in English list.
    English,
    /// A plain-text list, one word per line.
    List { path: PathBuf },
    Frequency {
        common: f64,
        #[serde(default)]
        rare: Option<f64>,
    },
}

impl StopwordSetting {
    pub fn thresholds(&self) -> Option<FrequencyThresholds> {
        match self {
            StopwordSetting::Frequency { common, rare } => Some(FrequencyThresholds { common: *common, rare: *rare }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub pipeline: Pipeline,
    pub stopwords: StopwordSetting,
    pub vector: VectorSpaceConfig,
    pub top_k: Option<usize>,
}

impl RetrievalConfig {
    /// The configured cutoff clamped to `1..=MAX_TOP_K`; `None` when unset.
    pub fn cutoff(&self) -> Option<usize> {
        self.top_k.map(|k| k.clamp(1, MAX_TOP_K))
    }

    /// [`cutoff`](Self::cutoff), falling back to [`DEFAULT_TOP_K`].
    pub fn effective_top_k(&self) -> usize {
        self.cutoff().unwrap_or(DEFAULT_TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::TfWeighting;

    #[test]
    fn empty_json_uses_defaults() {
        let config: RetrievalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetrievalConfig::default());
        assert_eq!(config.effective_top_k(), DEFAULT_TOP_K);
        assert_eq!(config.cutoff(), None);
    }

    #[test]
    fn cutoff_and_display_count_clamp_alike() {
        for (top_k, cutoff) in [(0, 1), (5, 5), (MAX_TOP_K + 1, MAX_TOP_K)] {
            let config = RetrievalConfig { top_k: Some(top_k), ..RetrievalConfig::default() };
            assert_eq!(config.cutoff(), Some(cutoff));
            assert_eq!(config.effective_top_k(), cutoff);
        }
    }

    #[test]
    fn parses_full_config() {
        let config: RetrievalConfig = serde_json::from_str(
            r#"{
                "pipeline": "filtered-stemmed",
                "stopwords": {"kind": "frequency", "common": 0.4},
                "vector": {"tf": "log-scaled", "smoothed_idf": true},
                "top_k": 0
            }"#,
        )
        .unwrap();
        assert_eq!(config.pipeline, Pipeline::FilteredStemmed);
        assert_eq!(config.stopwords.thresholds(), Some(FrequencyThresholds::new(0.4)));
        assert_eq!(config.vector.tf, TfWeighting::LogScaled);
        assert!(config.vector.smoothed_idf);
        assert_eq!(config.effective_top_k(), 1);
    }

    #[test]
    fn parses_list_setting() {
        let setting: StopwordSetting = serde_json::from_str(r#"{"kind": "list", "path": "stop.txt"}"#).unwrap();
        assert_eq!(setting, StopwordSetting::List { path: PathBuf::from("stop.txt") });
        assert_eq!(setting.thresholds(), None);
    }
}
