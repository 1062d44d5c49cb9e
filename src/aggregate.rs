//! Collapse stored phrase instances into a prioritized review queue.
//!
//! Instances are grouped by exact phrase text. Each group gets a
//! representative instance, a final correction (dictionary first, then
//! reviewer suggestions) and a priority tier. Groups are sorted most urgent
//! first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corrections::{CorrectionDictionary, RuleCategory};
use crate::phrases::PhraseSource;
use crate::review::PhraseStatus;

/// The document a phrase instance was extracted from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_name_en: Option<String>,
}

/// One stored phrase occurrence.
///
/// `document` is the resolved document row. An instance whose `document_id`
/// is set but whose document could not be resolved is an orphan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseInstanceRecord {
    pub id: i64,
    pub phrase: String,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub status: PhraseStatus,
    #[serde(default)]
    pub needs_correction: bool,
    #[serde(default)]
    pub correction_suggestion: Option<String>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub source: Option<PhraseSource>,
    #[serde(default)]
    pub source_id: Option<i64>,
    #[serde(default)]
    pub document_id: Option<i64>,
    #[serde(default)]
    pub document: Option<DocumentRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PhraseInstanceRecord {
    /// A fresh pending instance.
    pub fn new(id: i64, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        Self {
            id,
            word_count: phrase.split_whitespace().count(),
            phrase,
            confidence_score: None,
            status: PhraseStatus::Pending,
            needs_correction: false,
            correction_suggestion: None,
            context: String::new(),
            source: None,
            source_id: None,
            document_id: None,
            document: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.correction_suggestion
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn is_orphan(&self) -> bool {
        self.document_id.is_some() && self.document.is_none()
    }

    fn file_name(&self) -> Option<&str> {
        self.document.as_ref()?.file_name.as_deref()
    }

    /// Representative score: confidence dominates, then suggestion, then timestamps.
    fn representative_score(&self) -> f64 {
        let mut score = self.confidence_score.unwrap_or(0.0) * 1000.0;
        if self.suggestion().is_some() {
            score += 100.0;
        }
        if self.updated_at.is_some() {
            score += 10.0;
        }
        if self.created_at.is_some() {
            score += 5.0;
        }
        score
    }
}

/// Where a group's final correction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSource {
    Dictionary(RuleCategory),
    PhraseSuggestion,
    NeedsManualReview,
    None,
}

impl CorrectionSource {
    /// Flat label, e.g. `dictionary_tone_mark` or `no_correction_needed`.
    pub fn label(&self) -> String {
        match self {
            CorrectionSource::Dictionary(category) => format!("dictionary_{}", category.as_str()),
            CorrectionSource::PhraseSuggestion => "phrase_suggestion".to_string(),
            CorrectionSource::NeedsManualReview => "needs_manual_review".to_string(),
            CorrectionSource::None => "no_correction_needed".to_string(),
        }
    }
}

/// Review tier, most urgent first. `None` marks groups needing no correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    HighMultiFile,
    HighLowConfidence,
    MediumMultiFile,
    Standard,
    None,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::HighMultiFile => "HIGH_MULTI_FILE",
            Priority::HighLowConfidence => "HIGH_LOW_CONFIDENCE",
            Priority::MediumMultiFile => "MEDIUM_MULTI_FILE",
            Priority::Standard => "STANDARD",
            Priority::None => "NONE",
        }
    }
}

/// Tier cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityThresholds {
    pub multi_file: usize,
    pub medium_multi_file: usize,
    pub low_confidence: f64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            multi_file: 3,
            medium_multi_file: 2,
            low_confidence: 0.5,
        }
    }
}

impl PriorityThresholds {
    pub fn assign(&self, needs_correction: bool, group_size: usize, confidence: Option<f64>) -> Priority {
        if !needs_correction {
            Priority::None
        } else if group_size >= self.multi_file {
            Priority::HighMultiFile
        } else if confidence.is_some_and(|c| c < self.low_confidence) {
            Priority::HighLowConfidence
        } else if group_size >= self.medium_multi_file {
            Priority::MediumMultiFile
        } else {
            Priority::Standard
        }
    }
}

/// All instances sharing one phrase text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseGroup {
    pub phrase_text: String,
    pub group_size: usize,
    /// Confidence of the representative instance.
    pub confidence_score: Option<f64>,
    pub word_count: usize,
    pub status: PhraseStatus,
    pub needs_correction: bool,
    pub correction_suggestion: Option<String>,
    pub final_correction: Option<String>,
    pub correction_source: CorrectionSource,
    pub source_documents: BTreeSet<String>,
    pub companies: BTreeSet<String>,
    pub best_instance_id: i64,
    pub best_file_name: Option<String>,
    pub context: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub priority: Priority,
}

impl PhraseGroup {
    fn review_order(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.group_size.cmp(&self.group_size))
            .then_with(|| sort_confidence(self).total_cmp(&sort_confidence(other)))
    }
}

/// Missing confidence sorts after every real score.
fn sort_confidence(group: &PhraseGroup) -> f64 {
    group.confidence_score.unwrap_or(999.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionStats {
    /// Instances aggregated, orphans excluded.
    pub original_phrases: usize,
    pub unique_phrases: usize,
    pub reduced_by: usize,
    pub reduction_percentage: f64,
    pub orphans_skipped: usize,
    /// Group size to number of groups of that size.
    pub size_distribution: BTreeMap<usize, usize>,
    /// Instances beyond the first in every group.
    pub total_duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Sorted by priority tier, then group size descending, then confidence ascending.
    pub groups: Vec<PhraseGroup>,
    pub stats: ReductionStats,
}

impl Aggregation {
    /// Groups flagged as needing correction, in review order.
    pub fn needs_review(&self) -> impl Iterator<Item = &PhraseGroup> {
        self.groups.iter().filter(|g| g.needs_correction)
    }

    /// Groups in the given tiers or more urgent ones.
    pub fn high_priority_queue(&self, up_to: Priority) -> Vec<&PhraseGroup> {
        self.groups
            .iter()
            .filter(|g| g.priority != Priority::None && g.priority <= up_to)
            .collect()
    }
}

pub fn aggregate_phrases(instances: &[PhraseInstanceRecord], dictionary: &CorrectionDictionary) -> Aggregation {
    aggregate_phrases_with(instances, dictionary, &PriorityThresholds::default())
}

pub fn aggregate_phrases_with(
    instances: &[PhraseInstanceRecord],
    dictionary: &CorrectionDictionary,
    thresholds: &PriorityThresholds,
) -> Aggregation {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Vec<&PhraseInstanceRecord>> = Vec::new();
    let mut orphans_skipped = 0;

    for instance in instances {
        if instance.is_orphan() {
            orphans_skipped += 1;
            continue;
        }
        let slot = *index.entry(instance.phrase.as_str()).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(instance);
    }

    if orphans_skipped > 0 {
        warn!(orphans_skipped, "phrase instances reference missing documents");
    }

    let mut groups: Vec<PhraseGroup> = buckets
        .iter()
        .filter_map(|bucket| build_group(bucket, dictionary, thresholds))
        .collect();
    groups.sort_by(PhraseGroup::review_order);

    let stats = reduction_stats(&groups, orphans_skipped);
    info!(
        original = stats.original_phrases,
        unique = stats.unique_phrases,
        reduction_pct = stats.reduction_percentage,
        "phrases aggregated"
    );

    Aggregation { groups, stats }
}

fn build_group(
    bucket: &[&PhraseInstanceRecord],
    dictionary: &CorrectionDictionary,
    thresholds: &PriorityThresholds,
) -> Option<PhraseGroup> {
    let mut best = *bucket.first()?;
    let mut best_score = best.representative_score();
    for &instance in &bucket[1..] {
        let score = instance.representative_score();
        if score > best_score {
            best = instance;
            best_score = score;
        }
    }

    let mut source_documents = BTreeSet::new();
    let mut companies = BTreeSet::new();
    for instance in bucket {
        if let Some(doc) = &instance.document {
            source_documents.extend(doc.file_name.iter().cloned());
            companies.extend(doc.company_name.iter().cloned());
            companies.extend(doc.company_name_en.iter().cloned());
        }
    }

    let needs_correction = bucket.iter().any(|i| i.needs_correction);
    let suggestion = best
        .suggestion()
        .or_else(|| bucket.iter().find_map(|i| i.suggestion()));

    let (final_correction, correction_source) = match dictionary.lookup(&best.phrase) {
        Some(rule) => (Some(rule.replacement), CorrectionSource::Dictionary(rule.category)),
        None => match suggestion {
            Some(s) => (Some(s.to_string()), CorrectionSource::PhraseSuggestion),
            None if needs_correction => (None, CorrectionSource::NeedsManualReview),
            None => (None, CorrectionSource::None),
        },
    };

    let group_size = bucket.len();
    Some(PhraseGroup {
        phrase_text: best.phrase.clone(),
        group_size,
        confidence_score: best.confidence_score,
        word_count: best.word_count,
        status: best.status,
        needs_correction,
        correction_suggestion: best.correction_suggestion.clone(),
        final_correction,
        correction_source,
        source_documents,
        companies,
        best_instance_id: best.id,
        best_file_name: best.file_name().map(str::to_string),
        context: best.context.clone(),
        created_at: best.created_at,
        updated_at: best.updated_at,
        priority: thresholds.assign(needs_correction, group_size, best.confidence_score),
    })
}

fn reduction_stats(groups: &[PhraseGroup], orphans_skipped: usize) -> ReductionStats {
    let original_phrases: usize = groups.iter().map(|g| g.group_size).sum();
    let unique_phrases = groups.len();
    let reduced_by = original_phrases - unique_phrases;

    let mut size_distribution = BTreeMap::new();
    for group in groups {
        *size_distribution.entry(group.group_size).or_insert(0) += 1;
    }

    ReductionStats {
        original_phrases,
        unique_phrases,
        reduced_by,
        reduction_percentage: if original_phrases == 0 {
            0.0
        } else {
            reduced_by as f64 / original_phrases as f64 * 100.0
        },
        orphans_skipped,
        size_distribution,
        total_duplicates: reduced_by,
    }
}
