//! Correction dictionary: known-wrong substrings mapped to known-right ones.
//!
//! Rules are applied longest pattern first over an immutable [`RuleSet`]
//! snapshot. Writers build a fresh snapshot and swap it in under the lock,
//! so a reader either sees the old rule set or the new one, never a mix.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::chars::{SARA_AM, SARA_AM_DECOMPOSED};
use crate::error::{DictionaryError, Error, StoreError};
use crate::seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    ToneMark,
    Spacing,
    CharacterCorruption,
    WordSegmentation,
    #[default]
    Other,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::ToneMark => "tone_mark",
            RuleCategory::Spacing => "spacing",
            RuleCategory::CharacterCorruption => "character_corruption",
            RuleCategory::WordSegmentation => "word_segmentation",
            RuleCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Exact substring.
    #[default]
    Substring,
    /// Regex, reserved for structural fixes such as `บริษัท\s+จำกัด`.
    Regex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub category: RuleCategory,
    #[serde(default)]
    pub kind: RuleKind,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CorrectionRule {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        category: RuleCategory,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            category,
            kind: RuleKind::Substring,
            active: true,
        }
    }

    pub fn structural(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        category: RuleCategory,
    ) -> Self {
        Self {
            kind: RuleKind::Regex,
            ..Self::new(pattern, replacement, category)
        }
    }
}

/// Result of a successful [`CorrectionDictionary::add_correction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    /// The exact mapping was already active; nothing changed.
    AlreadyPresent,
}

/// Compiled, immutable view of the active rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    /// Longest pattern first; ties keep insertion order.
    substring: Vec<(String, String)>,
    structural: Vec<(Regex, String)>,
}

enum Piece<'r> {
    Open(String),
    Fixed(&'r str),
}

impl RuleSet {
    fn compile(rules: &[CorrectionRule]) -> Result<Self, DictionaryError> {
        let mut substring: Vec<(String, String)> = Vec::new();
        let mut structural = Vec::new();
        let mut patterns: HashSet<String> = HashSet::new();

        for rule in rules.iter().filter(|r| r.active) {
            match rule.kind {
                RuleKind::Substring => {
                    patterns.insert(rule.pattern.clone());
                    // Identity rules cannot change text and would only inflate the count.
                    if rule.pattern != rule.replacement {
                        substring.push((rule.pattern.clone(), rule.replacement.clone()));
                    }
                }
                RuleKind::Regex => {
                    structural.push((compile_regex(&rule.pattern)?, rule.replacement.clone()))
                }
            }
        }

        // Normalization decomposes SARA AM before the dictionary runs, so a
        // replacement spelled with composed SARA AM must also be reachable
        // from its decomposed spelling, or a second run would not restore it.
        let mut restorations = Vec::new();
        for (_, replacement) in &substring {
            if !replacement.contains(SARA_AM) {
                continue;
            }
            let decomposed = replacement.replace(SARA_AM, SARA_AM_DECOMPOSED);
            if patterns.insert(decomposed.clone()) {
                restorations.push((decomposed, replacement.clone()));
            }
        }
        substring.extend(restorations);

        substring.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        Ok(Self {
            substring,
            structural,
        })
    }

    /// Number of compiled rules, restorations included.
    pub fn len(&self) -> usize {
        self.substring.len() + self.structural.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every rule, longest pattern first.
    ///
    /// Text produced by a replacement is not matched again by shorter rules
    /// in the same pass. Structural rules run afterwards over the whole text.
    /// The count is the number of matched occurrences, not distinct rules.
    pub fn apply(&self, text: &str) -> (String, usize) {
        if text.is_empty() {
            return (String::new(), 0);
        }

        let mut corrections = 0;
        let mut pieces = vec![Piece::Open(text.to_string())];

        for (pattern, replacement) in &self.substring {
            let hit = pieces
                .iter()
                .any(|p| matches!(p, Piece::Open(s) if s.contains(pattern.as_str())));
            if !hit {
                continue;
            }

            let mut next = Vec::with_capacity(pieces.len() + 2);
            for piece in pieces {
                let open = match piece {
                    Piece::Open(s) if s.contains(pattern.as_str()) => s,
                    other => {
                        next.push(other);
                        continue;
                    }
                };

                let mut last = 0;
                for (idx, _) in open.match_indices(pattern.as_str()) {
                    if idx > last {
                        next.push(Piece::Open(open[last..idx].to_string()));
                    }
                    next.push(Piece::Fixed(replacement.as_str()));
                    corrections += 1;
                    last = idx + pattern.len();
                }
                if last < open.len() {
                    next.push(Piece::Open(open[last..].to_string()));
                }
            }
            pieces = next;
        }

        let mut result = String::with_capacity(text.len());
        for piece in &pieces {
            match piece {
                Piece::Open(s) => result.push_str(s),
                Piece::Fixed(s) => result.push_str(s),
            }
        }

        for (regex, replacement) in &self.structural {
            let count = regex.find_iter(&result).count();
            if count > 0 {
                result = regex.replace_all(&result, replacement.as_str()).into_owned();
                corrections += count;
            }
        }

        (result, corrections)
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, DictionaryError> {
    Regex::new(pattern).map_err(|source| DictionaryError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Clone)]
struct DictionaryState {
    /// Every rule ever added, superseded ones included.
    rules: Vec<CorrectionRule>,
    /// Active pattern -> index into `rules`.
    active: HashMap<String, usize>,
    compiled: Arc<RuleSet>,
}

impl DictionaryState {
    fn recompile(&mut self) -> Result<(), DictionaryError> {
        self.compiled = Arc::new(RuleSet::compile(&self.rules)?);
        Ok(())
    }
}

/// Process-wide correction dictionary, shared by reference between pipelines.
pub struct CorrectionDictionary {
    state: RwLock<DictionaryState>,
}

impl Default for CorrectionDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CorrectionDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionDictionary")
            .field("active_rules", &self.len())
            .finish()
    }
}

impl CorrectionDictionary {
    /// Empty dictionary.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DictionaryState {
                rules: Vec::new(),
                active: HashMap::new(),
                compiled: Arc::new(RuleSet::default()),
            }),
        }
    }

    /// Dictionary seeded with the built-in financial-statement rules.
    pub fn builtin() -> Self {
        match Self::from_rules(seed::builtin_rules()) {
            Ok(dict) => dict,
            // Seed table is covered by tests.
            Err(e) => {
                tracing::error!("built-in correction rules rejected: {e}");
                Self::new()
            }
        }
    }

    /// Build from a rule list. Inactive rules go to history only.
    pub fn from_rules(
        rules: impl IntoIterator<Item = CorrectionRule>,
    ) -> Result<Self, DictionaryError> {
        let dict = Self::new();
        dict.add_rules(rules)?;
        Ok(dict)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DictionaryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DictionaryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current compiled rules. Cheap; the snapshot stays valid across later writes.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.read().compiled)
    }

    /// Apply the current snapshot to `text`.
    pub fn apply(&self, text: &str) -> (String, usize) {
        self.snapshot().apply(text)
    }

    /// Add `pattern -> replacement` as an [`RuleCategory::Other`] substring rule.
    pub fn add_correction(
        &self,
        pattern: &str,
        replacement: &str,
    ) -> Result<AddOutcome, DictionaryError> {
        self.add_rule(CorrectionRule::new(pattern, replacement, RuleCategory::Other))
    }

    /// Insert a rule keyed by exact pattern.
    ///
    /// Re-adding an identical mapping is a no-op. A pattern that is already
    /// active with a different replacement is rejected with
    /// [`DictionaryError::Conflict`]; use [`update_correction`](Self::update_correction)
    /// to supersede it deliberately.
    pub fn add_rule(&self, rule: CorrectionRule) -> Result<AddOutcome, DictionaryError> {
        let mut state = self.write();
        if let Some(&idx) = state.active.get(&rule.pattern) {
            let existing = &state.rules[idx];
            if existing.replacement == rule.replacement {
                return Ok(AddOutcome::AlreadyPresent);
            }
            return Err(DictionaryError::Conflict {
                pattern: rule.pattern,
                existing: existing.replacement.clone(),
                rejected: rule.replacement,
            });
        }

        let pattern = rule.pattern.clone();
        insert_rule(&mut state, rule)?;
        state.recompile()?;
        debug!(pattern = %pattern, rules = state.active.len(), "correction added");
        Ok(AddOutcome::Inserted)
    }

    /// Replace the active mapping for `pattern`, keeping the old rule in
    /// history as inactive. Inserts if the pattern is new.
    /// Returns the superseded rule, if there was one.
    pub fn update_correction(
        &self,
        pattern: &str,
        replacement: &str,
    ) -> Result<Option<CorrectionRule>, DictionaryError> {
        let mut state = self.write();
        let Some(&idx) = state.active.get(pattern) else {
            insert_rule(
                &mut state,
                CorrectionRule::new(pattern, replacement, RuleCategory::Other),
            )?;
            state.recompile()?;
            return Ok(None);
        };

        if state.rules[idx].replacement == replacement {
            return Ok(None);
        }

        let mut superseding = state.rules[idx].clone();
        superseding.replacement = replacement.to_string();
        if superseding.kind == RuleKind::Regex {
            compile_regex(&superseding.pattern)?;
        }

        state.rules[idx].active = false;
        let previous = state.rules[idx].clone();
        state.active.remove(pattern);
        insert_rule(&mut state, superseding)?;
        state.recompile()?;
        info!(pattern, from = %previous.replacement, to = replacement, "correction superseded");
        Ok(Some(previous))
    }

    /// Retire the active rule for `pattern`. The rule stays in history.
    pub fn deactivate(&self, pattern: &str) -> Result<CorrectionRule, DictionaryError> {
        let mut state = self.write();
        let idx = state
            .active
            .remove(pattern)
            .ok_or_else(|| DictionaryError::UnknownPattern(pattern.to_string()))?;
        state.rules[idx].active = false;
        state.recompile()?;
        Ok(state.rules[idx].clone())
    }

    /// Active rule whose pattern equals `pattern` exactly.
    pub fn lookup(&self, pattern: &str) -> Option<CorrectionRule> {
        let state = self.read();
        state.active.get(pattern).map(|&idx| state.rules[idx].clone())
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.read().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active rules in insertion order.
    pub fn rules(&self) -> Vec<CorrectionRule> {
        self.read()
            .rules
            .iter()
            .filter(|r| r.active)
            .cloned()
            .collect()
    }

    /// Every rule ever added, superseded and retired ones included.
    pub fn history(&self) -> Vec<CorrectionRule> {
        self.read().rules.clone()
    }

    /// Load a JSON rule list written by [`save_json`](Self::save_json).
    pub fn load_json(path: &Path) -> Result<Self, Error> {
        let rules = read_rules(path)?;
        Ok(Self::from_rules(rules)?)
    }

    /// Add many rules with a single snapshot rebuild. Returns how many were new.
    ///
    /// All or nothing: on a conflict or invalid rule the dictionary is left
    /// as it was. Inactive rules go to history only.
    pub fn add_rules(
        &self,
        rules: impl IntoIterator<Item = CorrectionRule>,
    ) -> Result<usize, DictionaryError> {
        let mut state = self.write();
        let mut staged = DictionaryState::clone(&state);
        let mut inserted = 0;
        for rule in rules {
            let active = rule.active;
            if insert_rule(&mut staged, rule)? == AddOutcome::Inserted && active {
                inserted += 1;
            }
        }
        if inserted > 0 || staged.rules.len() != state.rules.len() {
            staged.recompile()?;
            *state = staged;
        }
        debug!(inserted, rules = state.active.len(), "corrections added in bulk");
        Ok(inserted)
    }

    /// Add every active rule from a JSON file. Returns how many were new.
    pub fn extend_from_json(&self, path: &Path) -> Result<usize, Error> {
        let rules = read_rules(path)?.into_iter().filter(|r| r.active);
        let inserted = self.add_rules(rules)?;
        info!(path = %path.display(), inserted, "seed rules loaded");
        Ok(inserted)
    }

    /// Write the full history as JSON, atomically.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let rules = self.history();
        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir).map_err(|e| StoreError::io(parent_dir, e))?;

        let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| StoreError::io(parent_dir, e))?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            serde_json::to_writer_pretty(&mut writer, &rules)
                .map_err(|e| StoreError::json(path, e))?;
            writer.flush().map_err(|e| StoreError::io(path, e))?;
        }
        temp_file
            .persist(path)
            .map_err(|e| StoreError::io(path, e.error))?;
        Ok(())
    }
}

fn insert_rule(state: &mut DictionaryState, rule: CorrectionRule) -> Result<AddOutcome, DictionaryError> {
    if rule.pattern.is_empty() {
        return Err(DictionaryError::EmptyPattern);
    }
    if rule.kind == RuleKind::Regex {
        compile_regex(&rule.pattern)?;
    }
    if rule.active {
        if let Some(&idx) = state.active.get(&rule.pattern) {
            let existing = &state.rules[idx];
            if existing.replacement == rule.replacement {
                return Ok(AddOutcome::AlreadyPresent);
            }
            return Err(DictionaryError::Conflict {
                pattern: rule.pattern,
                existing: existing.replacement.clone(),
                rejected: rule.replacement,
            });
        }
        state.active.insert(rule.pattern.clone(), state.rules.len());
    }
    state.rules.push(rule);
    Ok(AddOutcome::Inserted)
}

fn read_rules(path: &Path) -> Result<Vec<CorrectionRule>, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::json(path, e))
}

/// Apply the dictionary's current rules to `text`.
/// Returns the corrected text and the number of matched occurrences.
pub fn apply_common_corrections(dictionary: &CorrectionDictionary, text: &str) -> (String, usize) {
    dictionary.apply(text)
}
