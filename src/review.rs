//! Human-in-the-loop review of stored phrase instances.
//!
//! Instances move `pending -> reviewed -> corrected`. Only the bulk
//! high-quality pass may settle a pending instance without flagging it, and
//! `corrected` is terminal. Every bulk operation is all-or-nothing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::aggregate::{DocumentRef, PhraseInstanceRecord};
use crate::corrections::{AddOutcome, CorrectionDictionary, CorrectionRule, RuleCategory};
use crate::error::{ReviewError, StoreError};
use crate::phrases::ExtractedPhrase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseStatus {
    #[default]
    Pending,
    Reviewed,
    Corrected,
}

impl PhraseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhraseStatus::Pending => "pending",
            PhraseStatus::Reviewed => "reviewed",
            PhraseStatus::Corrected => "corrected",
        }
    }

    /// One step forward, or staying put.
    pub fn can_become(self, next: PhraseStatus) -> bool {
        matches!(
            (self, next),
            (PhraseStatus::Pending, PhraseStatus::Pending | PhraseStatus::Reviewed)
                | (PhraseStatus::Reviewed, PhraseStatus::Reviewed | PhraseStatus::Corrected)
                | (PhraseStatus::Corrected, PhraseStatus::Corrected)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == PhraseStatus::Corrected
    }
}

impl fmt::Display for PhraseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn transition(record: &mut PhraseInstanceRecord, next: PhraseStatus) -> Result<(), ReviewError> {
    if !record.status.can_become(next) {
        return Err(ReviewError::InvalidTransition {
            id: record.id,
            from: record.status.as_str(),
            to: next.as_str(),
        });
    }
    record.status = next;
    Ok(())
}

/// Storage for raw phrase instances.
pub trait PhraseRepository: Send + Sync {
    /// Every instance, with documents resolved.
    fn instances(&self) -> Vec<PhraseInstanceRecord>;

    /// Apply `edit` to every instance matching `select`.
    ///
    /// Either every edit succeeds and is stored, or the first error is
    /// returned and nothing changes. Returns the number of updated instances.
    fn update_all(
        &self,
        select: &dyn Fn(&PhraseInstanceRecord) -> bool,
        edit: &dyn Fn(&mut PhraseInstanceRecord) -> Result<(), ReviewError>,
    ) -> Result<usize, ReviewError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    documents: BTreeMap<i64, DocumentRef>,
    #[serde(default)]
    phrases: Vec<PhraseInstanceRecord>,
}

impl StoreState {
    fn next_id(&self) -> i64 {
        self.phrases.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    fn resolved(&self, record: &PhraseInstanceRecord) -> PhraseInstanceRecord {
        let mut record = record.clone();
        record.document = record
            .document_id
            .and_then(|id| self.documents.get(&id).cloned());
        record
    }
}

/// In-process phrase store with JSON persistence.
///
/// Documents are kept in a separate registry and joined onto instances on
/// read, so an instance pointing at an unregistered document reads back as
/// an orphan.
#[derive(Debug, Default)]
pub struct InMemoryPhraseStore {
    state: RwLock<StoreState>,
}

impl InMemoryPhraseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<PhraseInstanceRecord>) -> Self {
        let mut state = StoreState::default();
        for mut record in records {
            if let (Some(id), Some(doc)) = (record.document_id, record.document.take()) {
                state.documents.entry(id).or_insert(doc);
            }
            state.phrases.push(record);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_document(&self, id: i64, document: DocumentRef) {
        self.write().documents.insert(id, document);
    }

    pub fn len(&self) -> usize {
        self.read().phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: i64) -> Option<PhraseInstanceRecord> {
        let state = self.read();
        state
            .phrases
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.resolved(p))
    }

    /// Store freshly extracted phrases as pending instances.
    ///
    /// A phrase already stored for the same source row is skipped. Returns the
    /// number of instances stored.
    pub fn insert_extracted(&self, phrases: &[ExtractedPhrase]) -> usize {
        let mut state = self.write();
        let mut seen: HashSet<(String, Option<_>, Option<i64>)> = state
            .phrases
            .iter()
            .map(|p| (p.phrase.clone(), p.source, p.source_id))
            .collect();

        let now = Utc::now();
        let mut next_id = state.next_id();
        let mut stored = 0;
        for extracted in phrases {
            let key = (
                extracted.candidate.phrase.clone(),
                Some(extracted.source),
                Some(extracted.source_id),
            );
            if !seen.insert(key) {
                continue;
            }
            let mut record = PhraseInstanceRecord::new(next_id, extracted.candidate.phrase.clone());
            record.word_count = extracted.candidate.word_count;
            record.confidence_score = extracted.confidence_score;
            record.context = extracted.context.clone();
            record.source = Some(extracted.source);
            record.source_id = Some(extracted.source_id);
            record.document_id = extracted.document_id;
            record.created_at = Some(now);
            record.updated_at = Some(now);
            state.phrases.push(record);
            next_id += 1;
            stored += 1;
        }
        stored
    }

    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let state: StoreState = serde_json::from_str(&content).map_err(|e| StoreError::json(path, e))?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write documents and instances as JSON, atomically.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir).map_err(|e| StoreError::io(parent_dir, e))?;

        let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| StoreError::io(parent_dir, e))?;
        {
            let state = self.read();
            let mut writer = BufWriter::new(temp_file.as_file());
            serde_json::to_writer_pretty(&mut writer, &*state)
                .map_err(|e| StoreError::json(path, e))?;
            writer.flush().map_err(|e| StoreError::io(path, e))?;
        }
        temp_file
            .persist(path)
            .map_err(|e| StoreError::io(path, e.error))?;
        Ok(())
    }
}

impl PhraseRepository for InMemoryPhraseStore {
    fn instances(&self) -> Vec<PhraseInstanceRecord> {
        let state = self.read();
        state.phrases.iter().map(|p| state.resolved(p)).collect()
    }

    fn update_all(
        &self,
        select: &dyn Fn(&PhraseInstanceRecord) -> bool,
        edit: &dyn Fn(&mut PhraseInstanceRecord) -> Result<(), ReviewError>,
    ) -> Result<usize, ReviewError> {
        let mut state = self.write();
        let mut staged = Vec::new();
        for (idx, record) in state.phrases.iter().enumerate() {
            let resolved = state.resolved(record);
            if select(&resolved) {
                let mut updated = record.clone();
                edit(&mut updated)?;
                staged.push((idx, updated));
            }
        }
        let count = staged.len();
        for (idx, updated) in staged {
            state.phrases[idx] = updated;
        }
        Ok(count)
    }
}

/// Thresholds for the bulk review passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCriteria {
    pub high_quality_confidence: f64,
    pub high_quality_min_chars: usize,
    pub high_quality_max_chars: usize,
    pub flag_min_chars: usize,
    pub flag_max_chars: usize,
    pub flag_low_confidence: f64,
    pub flag_max_words: usize,
}

impl Default for ReviewCriteria {
    fn default() -> Self {
        Self {
            high_quality_confidence: 0.8,
            high_quality_min_chars: 3,
            high_quality_max_chars: 50,
            flag_min_chars: 5,
            flag_max_chars: 60,
            flag_low_confidence: 0.5,
            flag_max_words: 15,
        }
    }
}

impl ReviewCriteria {
    fn is_high_quality(&self, record: &PhraseInstanceRecord) -> bool {
        let chars = record.phrase.chars().count();
        record
            .confidence_score
            .is_some_and(|c| c >= self.high_quality_confidence)
            && (self.high_quality_min_chars..=self.high_quality_max_chars).contains(&chars)
    }

    fn is_suspicious(&self, record: &PhraseInstanceRecord) -> bool {
        let chars = record.phrase.chars().count();
        chars < self.flag_min_chars
            || chars > self.flag_max_chars
            || record
                .confidence_score
                .is_some_and(|c| c < self.flag_low_confidence)
            || record.word_count > self.flag_max_words
    }
}

/// Set `correction` as the suggestion on every instance of `phrase_text`.
///
/// Instances are flagged as needing correction and pending ones become
/// reviewed. Corrected instances keep their status but take the new
/// suggestion. Returns the number of instances updated.
pub fn apply_group_correction(
    repo: &dyn PhraseRepository,
    phrase_text: &str,
    correction: &str,
) -> Result<usize, ReviewError> {
    if correction.is_empty() {
        warn!(phrase = phrase_text, "empty group correction ignored");
        return Ok(0);
    }
    let now = Utc::now();
    let updated = repo.update_all(&|r: &PhraseInstanceRecord| r.phrase == phrase_text, &|r: &mut PhraseInstanceRecord| {
        if !r.status.is_terminal() {
            transition(r, PhraseStatus::Reviewed)?;
        }
        r.needs_correction = true;
        r.correction_suggestion = Some(correction.to_string());
        r.updated_at = Some(now);
        Ok(())
    })?;
    info!(phrase = phrase_text, updated, "group correction applied");
    Ok(updated)
}

/// Correct a single reviewed instance.
pub fn apply_instance_correction(
    repo: &dyn PhraseRepository,
    id: i64,
    correction: &str,
) -> Result<(), ReviewError> {
    let now = Utc::now();
    let updated = repo.update_all(&|r: &PhraseInstanceRecord| r.id == id, &|r: &mut PhraseInstanceRecord| {
        transition(r, PhraseStatus::Corrected)?;
        r.correction_suggestion = Some(correction.to_string());
        r.updated_at = Some(now);
        Ok(())
    })?;
    if updated == 0 {
        return Err(ReviewError::UnknownPhrase(format!("#{id}")));
    }
    Ok(())
}

/// Settle pending instances that are confident and of a sane length.
pub fn mark_high_quality(repo: &dyn PhraseRepository, criteria: &ReviewCriteria) -> Result<usize, ReviewError> {
    let now = Utc::now();
    let updated = repo.update_all(
        &|r: &PhraseInstanceRecord| r.status == PhraseStatus::Pending && criteria.is_high_quality(r),
        &|r: &mut PhraseInstanceRecord| {
            transition(r, PhraseStatus::Reviewed)?;
            r.updated_at = Some(now);
            Ok(())
        },
    )?;
    info!(updated, "phrases marked high quality");
    Ok(updated)
}

/// Flag pending instances that look like OCR damage.
pub fn mark_for_review(repo: &dyn PhraseRepository, criteria: &ReviewCriteria) -> Result<usize, ReviewError> {
    let now = Utc::now();
    let updated = repo.update_all(
        &|r: &PhraseInstanceRecord| r.status == PhraseStatus::Pending && criteria.is_suspicious(r),
        &|r: &mut PhraseInstanceRecord| {
            transition(r, PhraseStatus::Reviewed)?;
            r.needs_correction = true;
            r.updated_at = Some(now);
            Ok(())
        },
    )?;
    info!(updated, "phrases flagged for review");
    Ok(updated)
}

/// Turn a group's suggestion into a dictionary rule and mark the group corrected.
///
/// A conflicting dictionary entry aborts before any instance is touched.
pub fn promote_group(
    repo: &dyn PhraseRepository,
    dictionary: &CorrectionDictionary,
    phrase_text: &str,
    category: RuleCategory,
) -> Result<usize, ReviewError> {
    let instances: Vec<_> = repo
        .instances()
        .into_iter()
        .filter(|r| r.phrase == phrase_text)
        .collect();
    if instances.is_empty() {
        return Err(ReviewError::UnknownPhrase(phrase_text.to_string()));
    }
    let suggestion = instances
        .iter()
        .find_map(|r| r.suggestion().map(str::to_string))
        .ok_or_else(|| ReviewError::MissingSuggestion(phrase_text.to_string()))?;

    let outcome = dictionary.add_rule(CorrectionRule::new(phrase_text, &suggestion, category))?;

    let now = Utc::now();
    let result = repo.update_all(&|r: &PhraseInstanceRecord| r.phrase == phrase_text, &|r: &mut PhraseInstanceRecord| {
        if r.status == PhraseStatus::Pending {
            transition(r, PhraseStatus::Reviewed)?;
        }
        transition(r, PhraseStatus::Corrected)?;
        r.correction_suggestion = Some(suggestion.clone());
        r.needs_correction = false;
        r.updated_at = Some(now);
        Ok(())
    });
    let updated = match result {
        Ok(updated) => updated,
        Err(e) => {
            // the rule must not outlive a failed store update
            if outcome == AddOutcome::Inserted {
                dictionary.deactivate(phrase_text)?;
            }
            warn!(phrase = phrase_text, "promotion rolled back: {e}");
            return Err(e);
        }
    };
    info!(
        phrase = phrase_text,
        replacement = %suggestion,
        new_rule = outcome == AddOutcome::Inserted,
        updated,
        "group promoted to dictionary"
    );
    Ok(updated)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBuckets {
    /// >= 0.8
    pub high: usize,
    /// >= 0.6
    pub medium: usize,
    pub low: usize,
    pub unscored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhraseStatistics {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub average_word_count: f64,
    pub needs_correction: usize,
    pub confidence: ConfidenceBuckets,
}

pub fn statistics(repo: &dyn PhraseRepository) -> PhraseStatistics {
    let instances = repo.instances();
    let mut stats = PhraseStatistics {
        total: instances.len(),
        ..PhraseStatistics::default()
    };
    let mut by_status: HashMap<PhraseStatus, usize> = HashMap::new();
    let mut words = 0usize;

    for record in &instances {
        *by_status.entry(record.status).or_insert(0) += 1;
        let source = record.source.map_or("unknown", |s| s.as_str());
        *stats.by_source.entry(source.to_string()).or_insert(0) += 1;
        words += record.word_count;
        if record.needs_correction {
            stats.needs_correction += 1;
        }
        match record.confidence_score {
            Some(c) if c >= 0.8 => stats.confidence.high += 1,
            Some(c) if c >= 0.6 => stats.confidence.medium += 1,
            Some(_) => stats.confidence.low += 1,
            None => stats.confidence.unscored += 1,
        }
    }

    stats.by_status = by_status
        .into_iter()
        .map(|(status, n)| (status.as_str().to_string(), n))
        .collect();
    if !instances.is_empty() {
        stats.average_word_count = words as f64 / instances.len() as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_phrases;
    use crate::phrases::{PhraseSource, extract_from_text_blocks};

    fn record(id: i64, phrase: &str, confidence: Option<f64>) -> PhraseInstanceRecord {
        PhraseInstanceRecord {
            confidence_score: confidence,
            ..PhraseInstanceRecord::new(id, phrase)
        }
    }

    fn store() -> InMemoryPhraseStore {
        InMemoryPhraseStore::from_records(vec![
            record(1, "เจ้าหนีการค า", Some(0.4)),
            record(2, "เจ้าหนีการค า", Some(0.7)),
            record(3, "เจ้าหนีการค า", None),
            record(4, "เงินสดและรายการเทียบเท่าเงินสด", Some(0.95)),
            record(5, "กข", Some(0.9)),
        ])
    }

    #[test]
    fn test_transitions() {
        use PhraseStatus::*;
        assert!(Pending.can_become(Reviewed));
        assert!(Reviewed.can_become(Corrected));
        assert!(!Pending.can_become(Corrected));
        assert!(!Corrected.can_become(Reviewed));
        assert!(!Reviewed.can_become(Pending));
        assert!(Corrected.is_terminal());
    }

    #[test]
    fn test_group_correction_updates_every_instance() {
        let store = store();
        let n = apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
        assert_eq!(n, 3);
        for id in 1..=3 {
            let r = store.get(id).unwrap();
            assert!(r.needs_correction);
            assert_eq!(r.status, PhraseStatus::Reviewed);
            assert_eq!(r.correction_suggestion.as_deref(), Some("เจ้าหนี้การค้า"));
            assert!(r.updated_at.is_some());
        }
        assert_eq!(store.get(4).unwrap().status, PhraseStatus::Pending);
    }

    #[test]
    fn test_group_correction_unknown_phrase() {
        let store = store();
        assert_eq!(apply_group_correction(&store, "ไม่มี", "x").unwrap(), 0);
        assert_eq!(apply_group_correction(&InMemoryPhraseStore::new(), "ไม่มี", "x").unwrap(), 0);

        // an empty correction changes nothing
        assert_eq!(apply_group_correction(&store, "กข", "").unwrap(), 0);
        let r = store.get(5).unwrap();
        assert_eq!(r.status, PhraseStatus::Pending);
        assert!(!r.needs_correction);
        assert!(r.correction_suggestion.is_none());
    }

    #[test]
    fn test_group_correction_keeps_corrected_terminal() {
        let store = store();
        apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
        apply_instance_correction(&store, 1, "เจ้าหนี้การค้า").unwrap();
        apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้ การค้า").unwrap();
        let r = store.get(1).unwrap();
        assert_eq!(r.status, PhraseStatus::Corrected);
        assert_eq!(r.correction_suggestion.as_deref(), Some("เจ้าหนี้ การค้า"));
    }

    #[test]
    fn test_update_all_is_atomic() {
        let store = store();
        let err = store
            .update_all(&|r: &PhraseInstanceRecord| r.phrase == "เจ้าหนีการค า", &|r: &mut PhraseInstanceRecord| {
                if r.id == 3 {
                    return Err(ReviewError::UnknownPhrase("boom".into()));
                }
                r.needs_correction = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ReviewError::UnknownPhrase(_)));
        assert!(!store.get(1).unwrap().needs_correction);
        assert!(!store.get(2).unwrap().needs_correction);
    }

    #[test]
    fn test_individual_correction_cannot_skip_review() {
        let store = store();
        let err = apply_instance_correction(&store, 4, "x").unwrap_err();
        assert!(matches!(
            err,
            ReviewError::InvalidTransition {
                id: 4,
                from: "pending",
                to: "corrected"
            }
        ));
    }

    #[test]
    fn test_mark_high_quality() {
        let store = store();
        let n = mark_high_quality(&store, &ReviewCriteria::default()).unwrap();
        // id 5 is too short, ids 1-3 lack confidence
        assert_eq!(n, 1);
        let r = store.get(4).unwrap();
        assert_eq!(r.status, PhraseStatus::Reviewed);
        assert!(!r.needs_correction);
    }

    #[test]
    fn test_mark_for_review() {
        let store = store();
        let mut long = record(6, &"ก".repeat(61), Some(0.9));
        long.word_count = 1;
        let mut wordy = record(7, "ก ข ค ง จ ฉ ช ซ ฌ ญ ฎ ฏ ฐ ฑ ฒ ณ", Some(0.9));
        wordy.word_count = 16;
        let store = InMemoryPhraseStore::from_records(
            store.instances().into_iter().chain([long, wordy]).collect(),
        );

        let n = mark_for_review(&store, &ReviewCriteria::default()).unwrap();
        // id 1 low confidence, id 5 short, ids 6 and 7
        assert_eq!(n, 4);
        for id in [1, 5, 6, 7] {
            let r = store.get(id).unwrap();
            assert_eq!(r.status, PhraseStatus::Reviewed);
            assert!(r.needs_correction);
        }
        assert_eq!(store.get(2).unwrap().status, PhraseStatus::Pending);
    }

    #[test]
    fn test_promote_group() {
        let store = store();
        let dictionary = CorrectionDictionary::new();
        apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();

        let n = promote_group(&store, &dictionary, "เจ้าหนีการค า", RuleCategory::Spacing).unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            dictionary.lookup("เจ้าหนีการค า").map(|r| r.replacement),
            Some("เจ้าหนี้การค้า".to_string())
        );
        for id in 1..=3 {
            assert_eq!(store.get(id).unwrap().status, PhraseStatus::Corrected);
        }

        let agg = aggregate_phrases(&store.instances(), &dictionary);
        let group = agg
            .groups
            .iter()
            .find(|g| g.phrase_text == "เจ้าหนีการค า")
            .unwrap();
        assert_eq!(group.final_correction.as_deref(), Some("เจ้าหนี้การค้า"));
    }

    #[test]
    fn test_promote_conflict_leaves_instances() {
        let store = store();
        let dictionary = CorrectionDictionary::new();
        dictionary.add_correction("เจ้าหนีการค า", "อย่างอื่น").unwrap();
        apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();

        let err = promote_group(&store, &dictionary, "เจ้าหนีการค า", RuleCategory::Spacing).unwrap_err();
        assert!(matches!(err, ReviewError::Dictionary(_)));
        assert_eq!(store.get(1).unwrap().status, PhraseStatus::Reviewed);
    }

    /// Reads from an inner store but refuses every write.
    struct ReadOnlyStore(InMemoryPhraseStore);

    impl PhraseRepository for ReadOnlyStore {
        fn instances(&self) -> Vec<PhraseInstanceRecord> {
            self.0.instances()
        }

        fn update_all(
            &self,
            _select: &dyn Fn(&PhraseInstanceRecord) -> bool,
            _edit: &dyn Fn(&mut PhraseInstanceRecord) -> Result<(), ReviewError>,
        ) -> Result<usize, ReviewError> {
            Err(ReviewError::UnknownPhrase("read-only".into()))
        }
    }

    #[test]
    fn test_promote_rolls_back_rule_when_store_fails() {
        let inner = store();
        apply_group_correction(&inner, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
        let repo = ReadOnlyStore(inner);
        let dictionary = CorrectionDictionary::new();

        let err = promote_group(&repo, &dictionary, "เจ้าหนีการค า", RuleCategory::Spacing).unwrap_err();
        assert!(matches!(err, ReviewError::UnknownPhrase(_)));
        assert!(dictionary.lookup("เจ้าหนีการค า").is_none());
        assert_eq!(dictionary.apply("เจ้าหนีการค า").0, "เจ้าหนีการค า");
        assert_eq!(repo.0.get(1).unwrap().status, PhraseStatus::Reviewed);
    }

    #[test]
    fn test_promote_keeps_existing_rule_when_store_fails() {
        let inner = store();
        apply_group_correction(&inner, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
        let repo = ReadOnlyStore(inner);
        let dictionary = CorrectionDictionary::new();
        dictionary.add_correction("เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();

        promote_group(&repo, &dictionary, "เจ้าหนีการค า", RuleCategory::Spacing).unwrap_err();
        assert!(dictionary.lookup("เจ้าหนีการค า").is_some());
    }

    #[test]
    fn test_promote_requires_suggestion() {
        let store = store();
        let err = promote_group(&store, &CorrectionDictionary::new(), "กข", RuleCategory::Other).unwrap_err();
        assert!(matches!(err, ReviewError::MissingSuggestion(_)));
    }

    #[test]
    fn test_documents_joined_on_read() {
        let store = InMemoryPhraseStore::new();
        let blocks = ["งบกำไรขาดทุน", "หมายเหตุประกอบงบการเงิน"];
        assert_eq!(store.insert_extracted(&extract_from_text_blocks(1, &blocks)), 2);
        // same source row again
        assert_eq!(store.insert_extracted(&extract_from_text_blocks(1, &blocks)), 0);

        assert_eq!(aggregate_phrases(&store.instances(), &CorrectionDictionary::new()).stats.orphans_skipped, 2);

        store.register_document(
            1,
            DocumentRef {
                file_name: Some("fs_2566.pdf".into()),
                ..DocumentRef::default()
            },
        );
        let agg = aggregate_phrases(&store.instances(), &CorrectionDictionary::new());
        assert_eq!(agg.stats.orphans_skipped, 0);
        assert!(agg.groups.iter().all(|g| g.best_file_name.as_deref() == Some("fs_2566.pdf")));
        let r = store.get(1).unwrap();
        assert_eq!(r.source, Some(PhraseSource::TextBlock));
        assert_eq!(r.confidence_score, Some(0.8));
    }

    #[test]
    fn test_statistics() {
        let store = store();
        apply_group_correction(&store, "เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
        let stats = statistics(&store);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status.get("reviewed"), Some(&3));
        assert_eq!(stats.by_status.get("pending"), Some(&2));
        assert_eq!(stats.by_source.get("unknown"), Some(&5));
        assert_eq!(stats.needs_correction, 3);
        assert_eq!(
            stats.confidence,
            ConfidenceBuckets {
                high: 2,
                medium: 1,
                low: 1,
                unscored: 1
            }
        );
        // three two-word instances, two one-word ones
        assert!((stats.average_word_count - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrases.json");
        let store = store();
        store.register_document(
            9,
            DocumentRef {
                file_name: Some("a.pdf".into()),
                ..DocumentRef::default()
            },
        );
        store.save_json(&path).unwrap();

        let loaded = InMemoryPhraseStore::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.instances(), store.instances());
    }
}
