//! Optional token-level spell correction.
//!
//! Both halves (segmenter and corrector) are soft dependencies. When either
//! is missing or fails, the pass degrades to identity for the affected text.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::chars::{contains_thai, is_attachable, is_thai_char};
use crate::error::CapabilityError;

/// Splits text into tokens whose concatenation is the original text.
pub trait Segmenter: Send + Sync {
    fn name(&self) -> &'static str;

    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError>;
}

/// Suggests a spelling for a single token.
pub trait SpellCorrector: Send + Sync {
    fn name(&self) -> &'static str;

    fn correct(&self, token: &str) -> Result<String, CapabilityError>;
}

/// Stand-in when no segmenter is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSegmenter;

impl Segmenter for NoSegmenter {
    fn name(&self) -> &'static str {
        "none"
    }

    fn tokenize(&self, _text: &str) -> Result<Vec<String>, CapabilityError> {
        Err(CapabilityError::Unavailable {
            capability: "segmenter",
        })
    }
}

/// Stand-in when no spell corrector is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCorrector;

impl SpellCorrector for NoCorrector {
    fn name(&self) -> &'static str {
        "none"
    }

    fn correct(&self, _token: &str) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable {
            capability: "spell corrector",
        })
    }
}

/// Correct Thai tokens one at a time.
///
/// Tokens without Thai characters and single-character tokens are kept as
/// they are. A token is also kept if the corrector errors or proposes the
/// same (or an empty) string. Returns the rejoined text and the number of
/// replaced tokens.
pub fn correct_thai_spelling(
    segmenter: &dyn Segmenter,
    corrector: &dyn SpellCorrector,
    text: &str,
) -> (String, usize) {
    if text.is_empty() {
        return (String::new(), 0);
    }

    let tokens = match segmenter.tokenize(text) {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!(segmenter = segmenter.name(), "spell check skipped: {e}");
            return (text.to_string(), 0);
        }
    };

    let rejoined_len: usize = tokens.iter().map(String::len).sum();
    if rejoined_len != text.len() || tokens.concat() != text {
        warn!(
            segmenter = segmenter.name(),
            "segmenter did not preserve input, skipping spell check"
        );
        return (text.to_string(), 0);
    }

    let mut corrections = 0;
    let mut out = String::with_capacity(text.len());

    for token in &tokens {
        if !contains_thai(token) || token.chars().count() <= 1 {
            out.push_str(token);
            continue;
        }
        match corrector.correct(token) {
            Ok(corrected) if !corrected.is_empty() && corrected != *token => {
                out.push_str(&corrected);
                corrections += 1;
            }
            Ok(_) => out.push_str(token),
            Err(e) => {
                debug!(corrector = corrector.name(), token = %token, "token kept: {e}");
                out.push_str(token);
            }
        }
    }

    (out, corrections)
}

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: HashMap<char, usize>,
    terminal: bool,
}

/// Longest-match word segmenter over a Thai word list.
///
/// Unknown stretches become a single token each, split where the text
/// switches between Thai and non-Thai characters. A word is never cut off
/// in front of a combining mark or trailing vowel.
#[derive(Debug, Clone)]
pub struct WordListSegmenter {
    nodes: Vec<TrieNode>,
    words: usize,
}

impl Default for WordListSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl WordListSegmenter {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            words: 0,
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segmenter = Self::new();
        for word in words {
            segmenter.insert(word.as_ref());
        }
        segmenter
    }

    /// O(k) in the word length.
    pub fn insert(&mut self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        let mut node_idx = 0;
        for c in word.chars() {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&c) {
                id
            } else {
                let id = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node_idx].children.insert(c, id);
                id
            };
            node_idx = next_idx;
        }
        if !self.nodes[node_idx].terminal {
            self.nodes[node_idx].terminal = true;
            self.words += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    pub fn contains(&self, word: &str) -> bool {
        let mut node_idx = 0;
        for c in word.chars() {
            match self.nodes[node_idx].children.get(&c) {
                Some(&id) => node_idx = id,
                None => return false,
            }
        }
        self.nodes[node_idx].terminal
    }

    /// Length in chars of the longest word starting at `start`.
    fn longest_match(&self, chars: &[char], start: usize) -> Option<usize> {
        let mut node_idx = 0;
        let mut best = None;
        for (offset, c) in chars[start..].iter().enumerate() {
            match self.nodes[node_idx].children.get(c) {
                Some(&id) => node_idx = id,
                None => break,
            }
            let end = start + offset + 1;
            let at_boundary = chars.get(end).is_none_or(|&next| !is_attachable(next));
            if self.nodes[node_idx].terminal && at_boundary {
                best = Some(offset + 1);
            }
        }
        best
    }
}

impl Segmenter for WordListSegmenter {
    fn name(&self) -> &'static str {
        "word_list"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut pending = String::new();
        let mut pending_thai = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let thai = is_thai_char(c);

            if thai {
                if let Some(len) = self.longest_match(&chars, i) {
                    if !pending.is_empty() {
                        tokens.push(std::mem::take(&mut pending));
                    }
                    tokens.push(chars[i..i + len].iter().collect());
                    i += len;
                    continue;
                }
            }

            if !pending.is_empty() && pending_thai != thai {
                tokens.push(std::mem::take(&mut pending));
            }
            pending.push(c);
            pending_thai = thai;
            i += 1;
        }

        if !pending.is_empty() {
            tokens.push(pending);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Corrects from a fixed table, errors on one poisoned token.
    struct TableCorrector(HashMap<&'static str, &'static str>);

    impl SpellCorrector for TableCorrector {
        fn name(&self) -> &'static str {
            "table"
        }

        fn correct(&self, token: &str) -> Result<String, CapabilityError> {
            if token == "พัง" {
                return Err(CapabilityError::failed("spell corrector", "boom"));
            }
            Ok(self.0.get(token).map_or(token, |s| *s).to_string())
        }
    }

    /// Drops whitespace, which the pass must refuse to use.
    struct LossySegmenter;

    impl Segmenter for LossySegmenter {
        fn name(&self) -> &'static str {
            "lossy"
        }

        fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }
    }

    fn segmenter() -> WordListSegmenter {
        WordListSegmenter::from_words(["เงิน", "เงินสด", "สด", "กำไร", "ที่", "ดิน", "ยืม"])
    }

    #[test]
    fn test_longest_match() {
        let tokens = segmenter().tokenize("เงินสดกำไร").unwrap();
        assert_eq!(tokens, vec!["เงินสด", "กำไร"]);
    }

    #[test]
    fn test_unknown_runs_and_script_switches() {
        let tokens = segmenter().tokenize("กขค 1,234 เงิน").unwrap();
        assert_eq!(tokens, vec!["กขค", " 1,234 ", "เงิน"]);
        assert_eq!(tokens.concat(), "กขค 1,234 เงิน");
    }

    #[test]
    fn test_word_not_cut_before_mark() {
        let seg = WordListSegmenter::from_words(["ที"]);
        let tokens = seg.tokenize("ที่").unwrap();
        assert_eq!(tokens, vec!["ที่"]);
    }

    #[test]
    fn test_trie_contains() {
        let seg = segmenter();
        assert_eq!(seg.len(), 7);
        assert!(seg.contains("เงินสด"));
        assert!(!seg.contains("เงินส"));
    }

    #[test]
    fn test_unavailable_segmenter_is_identity() {
        let (text, count) = correct_thai_spelling(&NoSegmenter, &NoCorrector, "เงินสด");
        assert_eq!(text, "เงินสด");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_corrects_thai_tokens_only() {
        let corrector = TableCorrector(HashMap::from([("ดิน", "ดิ้น"), ("AB", "XY")]));
        let seg = WordListSegmenter::from_words(["ดิน", "AB"]);
        let (text, count) = correct_thai_spelling(&seg, &corrector, "ดิน AB");
        assert_eq!(text, "ดิ้น AB");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_single_char_and_errors_kept() {
        let corrector = TableCorrector(HashMap::from([("ก", "ข")]));
        let seg = WordListSegmenter::from_words(["ก", "พัง"]);
        let (text, count) = correct_thai_spelling(&seg, &corrector, "กพัง");
        assert_eq!(text, "กพัง");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_corrector_keeps_tokens() {
        let (text, count) = correct_thai_spelling(&segmenter(), &NoCorrector, "เงินสดกำไร");
        assert_eq!(text, "เงินสดกำไร");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_lossy_segmenter_rejected() {
        let corrector = TableCorrector(HashMap::from([("เงิน", "เงิ้น")]));
        let (text, count) = correct_thai_spelling(&LossySegmenter, &corrector, "เงิน เงิน");
        assert_eq!(text, "เงิน เงิน");
        assert_eq!(count, 0);
    }
}
