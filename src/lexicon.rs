//! On-disk Thai lexicons backing the spell-correction pass.
//!
//! A plain word list (one word per line, `#` comments) drives segmentation,
//! and an optional Hunspell dictionary read through zspell validates tokens.
//! Every file is optional: whatever is missing degrades to the no-op
//! capability of the same kind.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use zspell::Dictionary;

use crate::chars::{TONE_MARKS, UPPER_VOWELS, is_combining_mark};
use crate::error::CapabilityError;
use crate::spell::{NoCorrector, NoSegmenter, Segmenter, SpellCorrector, WordListSegmenter};

/// Loaded lexicons, either half may be absent.
pub struct Lexicon {
    words: Option<WordListSegmenter>,
    hunspell: Option<HunspellCorrector>,
}

impl Lexicon {
    /// Load `word_list` and the Hunspell pair `<hunspell>.aff`/`<hunspell>.dic` from `dir`.
    pub fn load(dir: &Path, word_list: &str, hunspell: &str) -> Self {
        let mut lexicon = Self::empty();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "lexicon directory not found");
            return lexicon;
        }

        match read_optional(&dir.join(word_list)) {
            Ok(Some(content)) => lexicon.words = Some(parse_word_list(&content)),
            Ok(None) => warn!(file = word_list, "Thai word list not found"),
            Err(e) => warn!("word list skipped: {e}"),
        }
        match HunspellCorrector::from_dir(dir, hunspell) {
            Ok(Some(corrector)) => lexicon.hunspell = Some(corrector),
            Ok(None) => warn!(name = hunspell, "Hunspell dictionary not found"),
            Err(e) => warn!("Hunspell dictionary skipped: {e}"),
        }

        info!("{}", lexicon.stats());
        lexicon
    }

    pub fn empty() -> Self {
        Self {
            words: None,
            hunspell: None,
        }
    }

    pub fn stats(&self) -> String {
        format!(
            "Lexicon loaded: words={}, hunspell={}",
            self.words.as_ref().map_or(0, WordListSegmenter::len),
            self.hunspell.is_some()
        )
    }

    /// Real capabilities where loaded, no-op stand-ins otherwise.
    pub fn into_capabilities(self) -> (Arc<dyn Segmenter>, Arc<dyn SpellCorrector>) {
        let segmenter: Arc<dyn Segmenter> = match self.words {
            Some(words) if !words.is_empty() => Arc::new(words),
            _ => Arc::new(NoSegmenter),
        };
        let corrector: Arc<dyn SpellCorrector> = match self.hunspell {
            Some(hunspell) => Arc::new(hunspell),
            None => Arc::new(NoCorrector),
        };
        (segmenter, corrector)
    }
}

/// `Ok(None)` when the file does not exist.
fn read_optional(path: &Path) -> Result<Option<String>, CapabilityError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CapabilityError::failed("lexicon", format!("{}: {e}", path.display()))),
    }
}

/// One word per line; blank lines and `#` comments are skipped.
fn parse_word_list(content: &str) -> WordListSegmenter {
    WordListSegmenter::from_words(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

/// Hunspell-backed corrector limited to mark-level edits.
///
/// OCR damage on Thai text is mostly a lost, extra or misread mark, so
/// candidates are a single mark deleted, a tone mark inserted after a
/// consonant, or one mark swapped for another of its class. The first known
/// candidate in that order wins; unknown tokens come back unchanged.
pub struct HunspellCorrector {
    dict: Dictionary,
}

impl HunspellCorrector {
    pub fn new(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// Build from `<name>.aff` and `<name>.dic` in `dir`, `Ok(None)` if either is missing.
    pub fn from_dir(dir: &Path, name: &str) -> Result<Option<Self>, CapabilityError> {
        let aff = read_optional(&dir.join(format!("{name}.aff")))?;
        let dic = read_optional(&dir.join(format!("{name}.dic")))?;
        let (Some(aff), Some(dic)) = (aff, dic) else {
            return Ok(None);
        };
        let dict = zspell::builder()
            .config_str(&aff)
            .dict_str(&dic)
            .build()
            .map_err(|e| CapabilityError::failed("hunspell", format!("{name}: {e}")))?;
        Ok(Some(Self::new(dict)))
    }

    pub fn check(&self, word: &str) -> bool {
        self.dict.check_word(word)
    }
}

impl SpellCorrector for HunspellCorrector {
    fn name(&self) -> &'static str {
        "hunspell"
    }

    fn correct(&self, token: &str) -> Result<String, CapabilityError> {
        if self.check(token) {
            return Ok(token.to_string());
        }
        Ok(mark_edits(token)
            .into_iter()
            .find(|candidate| self.check(candidate))
            .unwrap_or_else(|| token.to_string()))
    }
}

fn is_consonant(c: char) -> bool {
    ('\u{0e01}'..='\u{0e2e}').contains(&c)
}

/// Single mark-level edits of `token`, deduplicated, in a fixed order.
fn mark_edits(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |candidate: String| {
        if candidate != token && seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    };

    for (i, &c) in chars.iter().enumerate() {
        if is_combining_mark(c) {
            let mut edited = chars.clone();
            edited.remove(i);
            push(edited.into_iter().collect());
        }
    }

    for (i, &c) in chars.iter().enumerate() {
        if !is_consonant(c) {
            continue;
        }
        // tone marks stack above any vowel sign on the same consonant
        let mut at = i + 1;
        while at < chars.len() && UPPER_VOWELS.contains(&chars[at]) {
            at += 1;
        }
        if chars.get(at).is_some_and(|next| TONE_MARKS.contains(next)) {
            continue;
        }
        for &tone in TONE_MARKS {
            let mut edited = chars.clone();
            edited.insert(at, tone);
            push(edited.into_iter().collect());
        }
    }

    for (i, &c) in chars.iter().enumerate() {
        let class = if TONE_MARKS.contains(&c) {
            TONE_MARKS
        } else if UPPER_VOWELS.contains(&c) {
            UPPER_VOWELS
        } else {
            continue;
        };
        for &other in class {
            if other == c {
                continue;
            }
            let mut edited = chars.clone();
            edited[i] = other;
            push(edited.into_iter().collect());
        }
    }

    out
}
