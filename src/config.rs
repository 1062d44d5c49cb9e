use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::PriorityThresholds;
use crate::corrections::CorrectionDictionary;
use crate::error::{ConfigError, Result};
use crate::lexicon::Lexicon;
use crate::normalize::{Normalizer, SaraAmNormalizer, UnicodeNormalizer};
use crate::pipeline::{Capabilities, Pipeline, PostProcessOptions};
use crate::review::ReviewCriteria;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub postprocess: PostProcessOptions,
    pub normalizer: NormalizerConfig,
    pub lexicon: LexiconConfig,
    pub dictionary: DictionaryConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerBackend {
    /// Decompose SARA AM only
    #[default]
    SaraAm,
    /// NFKC first, then SARA AM decomposition
    Unicode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub backend: NormalizerBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Directory holding the word list and Hunspell files
    pub dir: PathBuf,
    pub word_list: String,
    /// Hunspell base name, without `.aff`/`.dic`
    pub hunspell: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dictionaries"),
            word_list: "th_words.txt".to_string(),
            hunspell: "th_TH".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Seed with the built-in financial-statement rules
    pub builtin: bool,
    /// Extra rules, a JSON list of correction rules
    pub seed_file: Option<PathBuf>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            seed_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub multi_file_threshold: usize,
    pub medium_multi_file_threshold: usize,
    pub low_confidence: f64,
    pub high_quality_confidence: f64,
    pub high_quality_min_chars: usize,
    pub high_quality_max_chars: usize,
    pub flag_min_chars: usize,
    pub flag_max_chars: usize,
    pub flag_max_words: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let thresholds = PriorityThresholds::default();
        let criteria = ReviewCriteria::default();
        Self {
            multi_file_threshold: thresholds.multi_file,
            medium_multi_file_threshold: thresholds.medium_multi_file,
            low_confidence: thresholds.low_confidence,
            high_quality_confidence: criteria.high_quality_confidence,
            high_quality_min_chars: criteria.high_quality_min_chars,
            high_quality_max_chars: criteria.high_quality_max_chars,
            flag_min_chars: criteria.flag_min_chars,
            flag_max_chars: criteria.flag_max_chars,
            flag_max_words: criteria.flag_max_words,
        }
    }
}

impl ReviewConfig {
    pub fn thresholds(&self) -> PriorityThresholds {
        PriorityThresholds {
            multi_file: self.multi_file_threshold,
            medium_multi_file: self.medium_multi_file_threshold,
            low_confidence: self.low_confidence,
        }
    }

    /// Bulk review criteria. The low-confidence cut-off is shared with the priority tiers.
    pub fn criteria(&self) -> ReviewCriteria {
        ReviewCriteria {
            high_quality_confidence: self.high_quality_confidence,
            high_quality_min_chars: self.high_quality_min_chars,
            high_quality_max_chars: self.high_quality_max_chars,
            flag_min_chars: self.flag_min_chars,
            flag_max_chars: self.flag_max_chars,
            flag_low_confidence: self.low_confidence,
            flag_max_words: self.flag_max_words,
        }
    }
}

impl ServiceConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn build_dictionary(&self) -> Result<CorrectionDictionary> {
        let dictionary = if self.dictionary.builtin {
            CorrectionDictionary::builtin()
        } else {
            CorrectionDictionary::new()
        };
        if let Some(seed_file) = &self.dictionary.seed_file {
            dictionary.extend_from_json(seed_file)?;
        }
        Ok(dictionary)
    }

    pub fn build_capabilities(&self) -> Capabilities {
        let normalizer: Arc<dyn Normalizer> = match self.normalizer.backend {
            NormalizerBackend::SaraAm => Arc::new(SaraAmNormalizer),
            NormalizerBackend::Unicode => Arc::new(UnicodeNormalizer),
        };
        let (segmenter, corrector) =
            Lexicon::load(&self.lexicon.dir, &self.lexicon.word_list, &self.lexicon.hunspell)
                .into_capabilities();

        Capabilities {
            normalizer,
            segmenter,
            corrector,
        }
    }

    /// Dictionary plus capabilities. Missing lexicon files only degrade spell check.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let dictionary = self.build_dictionary()?;
        info!(rules = dictionary.len(), "correction dictionary ready");
        Ok(Pipeline::with_capabilities(
            Arc::new(dictionary),
            self.build_capabilities(),
        ))
    }
}
