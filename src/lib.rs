//! Post-processing for Thai OCR output of financial statements.
//!
//! [`Pipeline`] repairs spacing, normalizes, optionally spell-checks, applies
//! the [`CorrectionDictionary`] and rewrites parenthesized negatives. The
//! [`phrases`], [`aggregate`] and [`review`] modules turn OCR text into a
//! deduplicated review queue whose corrections feed back into the dictionary.

pub mod aggregate;
pub mod chars;
pub mod config;
pub mod corrections;
pub mod error;
pub mod lexicon;
pub mod marks;
pub mod normalize;
pub mod numbers;
pub mod phrases;
pub mod pipeline;
pub mod review;
mod seed;
pub mod spacing;
pub mod spell;

#[cfg(feature = "python")]
mod python;

pub use aggregate::{
    Aggregation, CorrectionSource, DocumentRef, PhraseGroup, PhraseInstanceRecord, Priority,
    PriorityThresholds, ReductionStats, aggregate_phrases, aggregate_phrases_with,
};
pub use config::ServiceConfig;
pub use corrections::{
    AddOutcome, CorrectionDictionary, CorrectionRule, RuleCategory, RuleKind, apply_common_corrections,
};
pub use error::{CapabilityError, ConfigError, DictionaryError, Error, Result, ReviewError, StoreError};
pub use marks::remove_duplicate_marks;
pub use normalize::{Normalizer, SaraAmNormalizer, UnicodeNormalizer, normalize_thai_text};
pub use numbers::convert_parentheses_to_negative;
pub use phrases::{ExtractedPhrase, PhraseCandidate, PhraseSource, TableCell, clean_thai_text, extract_phrases};
pub use pipeline::{Capabilities, Pipeline, PostProcessOptions, PostProcessResult, postprocess, postprocess_markdown};
pub use review::{
    InMemoryPhraseStore, PhraseRepository, PhraseStatistics, PhraseStatus, ReviewCriteria, apply_group_correction,
    mark_for_review, mark_high_quality, promote_group,
};
pub use spacing::fix_spacing;
pub use spell::{Segmenter, SpellCorrector, WordListSegmenter, correct_thai_spelling};
