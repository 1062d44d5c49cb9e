//! Post-processing orchestrator.
//!
//! Stage order is fixed: spacing, normalization, spell check, dictionary,
//! negative numbers, duplicate-mark collapse. Spell check runs before the
//! dictionary so financial terms win over generic suggestions, and the
//! collapse runs last so it also cleans up after dictionary replacements.
//!
//! A replacement can end in a mark that sits before a space. When spacing
//! repair is on it runs again after the dictionary, so a second pass over
//! the output finds nothing left to join.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corrections::CorrectionDictionary;
use crate::error::StoreError;
use crate::marks::remove_duplicate_marks;
use crate::normalize::{Normalizer, SaraAmNormalizer, normalize_thai_text};
use crate::numbers::convert_parentheses_to_negative;
use crate::spacing::fix_spacing;
use crate::spell::{NoCorrector, NoSegmenter, Segmenter, SpellCorrector, correct_thai_spelling};

/// Per-stage switches. Every stage is on except spell check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessOptions {
    pub fix_spacing: bool,
    pub normalize: bool,
    pub spell_check: bool,
    pub apply_corrections: bool,
    pub convert_negatives: bool,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            fix_spacing: true,
            normalize: true,
            spell_check: false,
            apply_corrections: true,
            convert_negatives: true,
        }
    }
}

impl PostProcessOptions {
    /// Options used by the markdown entry point.
    pub fn markdown() -> Self {
        Self {
            spell_check: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessResult {
    pub original: String,
    pub corrected: String,
    /// Spell-check plus dictionary replacements.
    pub corrections_made: usize,
    pub negative_numbers_converted: usize,
}

impl PostProcessResult {
    fn unchanged(text: &str) -> Self {
        Self {
            original: text.to_string(),
            corrected: text.to_string(),
            corrections_made: 0,
            negative_numbers_converted: 0,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.original != self.corrected
    }
}

/// External helpers the pipeline delegates to. Each defaults to the offline stand-in.
#[derive(Clone)]
pub struct Capabilities {
    pub normalizer: Arc<dyn Normalizer>,
    pub segmenter: Arc<dyn Segmenter>,
    pub corrector: Arc<dyn SpellCorrector>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            normalizer: Arc::new(SaraAmNormalizer),
            segmenter: Arc::new(NoSegmenter),
            corrector: Arc::new(NoCorrector),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("normalizer", &self.normalizer.name())
            .field("segmenter", &self.segmenter.name())
            .field("corrector", &self.corrector.name())
            .finish()
    }
}

/// Post-processor bound to a shared correction dictionary.
///
/// Cloning is cheap and clones share the dictionary, so rules added through
/// one handle apply to every clone from the next call on.
#[derive(Debug, Clone)]
pub struct Pipeline {
    dictionary: Arc<CorrectionDictionary>,
    capabilities: Capabilities,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Arc::new(CorrectionDictionary::builtin()))
    }
}

impl Pipeline {
    pub fn new(dictionary: Arc<CorrectionDictionary>) -> Self {
        Self::with_capabilities(dictionary, Capabilities::default())
    }

    pub fn with_capabilities(dictionary: Arc<CorrectionDictionary>, capabilities: Capabilities) -> Self {
        Self {
            dictionary,
            capabilities,
        }
    }

    pub fn dictionary(&self) -> &Arc<CorrectionDictionary> {
        &self.dictionary
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn postprocess(&self, text: &str, options: &PostProcessOptions) -> PostProcessResult {
        if text.trim().is_empty() {
            return PostProcessResult::unchanged(text);
        }

        let mut result = text.to_string();
        let mut corrections_made = 0;
        let mut negative_numbers_converted = 0;

        if options.fix_spacing {
            result = fix_spacing(&result);
            debug!(len = result.len(), "spacing repaired");
        }

        if options.normalize {
            result = normalize_thai_text(self.capabilities.normalizer.as_ref(), &result);
            debug!(normalizer = self.capabilities.normalizer.name(), "normalized");
        }

        if options.spell_check {
            let (corrected, count) = correct_thai_spelling(
                self.capabilities.segmenter.as_ref(),
                self.capabilities.corrector.as_ref(),
                &result,
            );
            result = corrected;
            corrections_made += count;
            debug!(count, "spell check applied");
        }

        if options.apply_corrections {
            let (corrected, count) = self.dictionary.apply(&result);
            result = corrected;
            corrections_made += count;
            debug!(count, "dictionary corrections applied");
        }

        if options.fix_spacing && (options.spell_check || options.apply_corrections) {
            result = fix_spacing(&result);
        }

        if options.convert_negatives {
            let (converted, count) = convert_parentheses_to_negative(&result);
            result = converted;
            negative_numbers_converted = count;
            debug!(count, "negative numbers converted");
        }

        result = remove_duplicate_marks(&result);

        PostProcessResult {
            original: text.to_string(),
            corrected: result,
            corrections_made,
            negative_numbers_converted,
        }
    }

    /// Markdown goes through the same stages; no rule touches markdown syntax.
    pub fn postprocess_markdown(&self, markdown: &str) -> String {
        self.postprocess(markdown, &PostProcessOptions::markdown())
            .corrected
    }

    /// Process many texts on the rayon pool, results in input order.
    pub fn postprocess_batch<S>(&self, texts: &[S], options: &PostProcessOptions) -> Vec<PostProcessResult>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.postprocess(text.as_ref(), options))
            .collect()
    }

    /// Read `input`, post-process it, write `output` (creating parent directories).
    /// Returns: (was_modified, corrections_made, negative_numbers_converted, bytes_read)
    pub fn postprocess_file(
        &self,
        input: &Path,
        output: &Path,
        markdown: bool,
    ) -> Result<(bool, usize, usize, u64), StoreError> {
        let content = fs::read_to_string(input).map_err(|e| StoreError::io(input, e))?;
        let bytes_read = content.len() as u64;

        let options = if markdown {
            PostProcessOptions::markdown()
        } else {
            PostProcessOptions::default()
        };
        let result = self.postprocess(&content, &options);

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        fs::write(output, &result.corrected).map_err(|e| StoreError::io(output, e))?;

        Ok((
            result.is_modified(),
            result.corrections_made,
            result.negative_numbers_converted,
            bytes_read,
        ))
    }
}

/// [`Pipeline::postprocess`] against `dictionary` with offline capabilities.
pub fn postprocess(
    dictionary: &Arc<CorrectionDictionary>,
    text: &str,
    options: &PostProcessOptions,
) -> PostProcessResult {
    Pipeline::new(Arc::clone(dictionary)).postprocess(text, options)
}

pub fn postprocess_markdown(dictionary: &Arc<CorrectionDictionary>, markdown: &str) -> String {
    Pipeline::new(Arc::clone(dictionary)).postprocess_markdown(markdown)
}
