use std::path::Path;

use lazy_static::lazy_static;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::ServiceConfig;
use crate::corrections::{AddOutcome, CorrectionRule, RuleCategory};
use crate::error::{ConfigError, Error, StoreError};
use crate::pipeline::{Pipeline, PostProcessOptions};

lazy_static! {
    // Built-in rules only, for the module-level helpers
    static ref DEFAULT_PIPELINE: Pipeline = Pipeline::default();
}

fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::Store(StoreError::Io { .. }) | Error::Config(ConfigError::Io { .. }) => {
            PyIOError::new_err(e.to_string())
        }
        other => PyValueError::new_err(other.to_string()),
    }
}

fn category_from_str(name: &str) -> PyResult<RuleCategory> {
    match name {
        "tone_mark" => Ok(RuleCategory::ToneMark),
        "spacing" => Ok(RuleCategory::Spacing),
        "character_corruption" => Ok(RuleCategory::CharacterCorruption),
        "word_segmentation" => Ok(RuleCategory::WordSegmentation),
        "other" => Ok(RuleCategory::Other),
        _ => Err(PyValueError::new_err(format!("Unknown rule category: {}", name))),
    }
}

/// Thai OCR post-processor holding its own correction dictionary
#[pyclass]
struct ThaiOcrCorrector {
    pipeline: Pipeline,
    options: PostProcessOptions,
}

#[pymethods]
impl ThaiOcrCorrector {
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<String>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => ServiceConfig::load_from_file(&path).map_err(|e| to_py_err(e.into()))?,
            None => ServiceConfig::default(),
        };
        let pipeline = config.build_pipeline().map_err(to_py_err)?;
        Ok(Self {
            pipeline,
            options: config.postprocess,
        })
    }

    /// Returns: (corrected, corrections_made, negative_numbers_converted)
    #[pyo3(signature = (text, spell_check=None))]
    fn postprocess(&self, text: String, spell_check: Option<bool>) -> (String, usize, usize) {
        let mut options = self.options;
        if let Some(spell_check) = spell_check {
            options.spell_check = spell_check;
        }
        let result = self.pipeline.postprocess(&text, &options);
        (
            result.corrected,
            result.corrections_made,
            result.negative_numbers_converted,
        )
    }

    fn postprocess_markdown(&self, markdown: String) -> String {
        self.pipeline.postprocess_markdown(&markdown)
    }

    /// Returns True when the rule is new, False when it was already present.
    /// Raises ValueError when the pattern maps to a different replacement.
    #[pyo3(signature = (pattern, replacement, category="other"))]
    fn add_correction(&self, pattern: String, replacement: String, category: &str) -> PyResult<bool> {
        let rule = CorrectionRule::new(pattern, replacement, category_from_str(category)?);
        let outcome = self
            .pipeline
            .dictionary()
            .add_rule(rule)
            .map_err(|e| to_py_err(e.into()))?;
        Ok(outcome == AddOutcome::Inserted)
    }

    /// Replace an existing mapping. Returns the superseded replacement, if any.
    fn update_correction(&self, pattern: String, replacement: String) -> PyResult<Option<String>> {
        let previous = self
            .pipeline
            .dictionary()
            .update_correction(&pattern, &replacement)
            .map_err(|e| to_py_err(e.into()))?;
        Ok(previous.map(|rule| rule.replacement))
    }

    /// Returns: (was_modified, corrections_made, negative_numbers_converted, bytes_read)
    #[pyo3(signature = (input_path, output_path, markdown=false))]
    fn postprocess_file(&self, input_path: String, output_path: String, markdown: bool) -> PyResult<(bool, usize, usize, u64)> {
        self.pipeline
            .postprocess_file(Path::new(&input_path), Path::new(&output_path), markdown)
            .map_err(|e| PyIOError::new_err(format!("Failed to process {}: {}", input_path, e)))
    }

    #[getter]
    fn rule_count(&self) -> usize {
        self.pipeline.dictionary().len()
    }
}

/// Phrase candidate returned from Rust
#[pyclass]
#[derive(Clone)]
struct PhraseInfo {
    #[pyo3(get)]
    phrase: String,
    #[pyo3(get)]
    word_count: usize,
    #[pyo3(get)]
    thai_char_ratio: f64,
    #[pyo3(get)]
    position: usize,
    #[pyo3(get)]
    segment_length: usize,
}

#[pyfunction]
fn extract_phrases(text: String) -> PyResult<Vec<PhraseInfo>> {
    Ok(crate::phrases::extract_phrases(&text)
        .into_iter()
        .map(|c| PhraseInfo {
            phrase: c.phrase,
            word_count: c.word_count,
            thai_char_ratio: c.thai_char_ratio,
            position: c.position,
            segment_length: c.segment_length,
        })
        .collect())
}

#[pyfunction]
fn fix_spacing(text: String) -> PyResult<String> {
    Ok(crate::spacing::fix_spacing(&text))
}

#[pyfunction]
fn remove_duplicate_marks(text: String) -> PyResult<String> {
    Ok(crate::marks::remove_duplicate_marks(&text))
}

/// Returns: (converted_text, conversion_count)
#[pyfunction]
fn convert_parentheses_to_negative(text: String) -> PyResult<(String, usize)> {
    Ok(crate::numbers::convert_parentheses_to_negative(&text))
}

/// Post-process a single file with the built-in rules, reading and writing entirely in Rust
/// Returns: (was_modified, corrections_made, negative_numbers_converted, bytes_read)
#[pyfunction]
#[pyo3(signature = (input_path, output_path, markdown=false))]
fn postprocess_file(input_path: String, output_path: String, markdown: bool) -> PyResult<(bool, usize, usize, u64)> {
    DEFAULT_PIPELINE
        .postprocess_file(Path::new(&input_path), Path::new(&output_path), markdown)
        .map_err(|e| PyIOError::new_err(format!("Failed to process {}: {}", input_path, e)))
}

#[pymodule]
fn thai_ocr_fix(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_phrases, m)?)?;
    m.add_function(wrap_pyfunction!(fix_spacing, m)?)?;
    m.add_function(wrap_pyfunction!(remove_duplicate_marks, m)?)?;
    m.add_function(wrap_pyfunction!(convert_parentheses_to_negative, m)?)?;
    m.add_function(wrap_pyfunction!(postprocess_file, m)?)?;
    m.add_class::<ThaiOcrCorrector>()?;
    m.add_class::<PhraseInfo>()?;
    Ok(())
}
