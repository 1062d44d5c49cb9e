//! Whitespace repair between base characters and their marks.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::chars;

lazy_static! {
    // "อ ้อม" -> "อ้อม", "สินค า" -> "สินคา"
    static ref SPACE_BEFORE_MARK: Regex =
        Regex::new(&format!(r"(\S)\s+([{}])", chars::attachable_class())).unwrap();

    // "ก ็ น" -> "ก็น": a stray mark followed by a gap re-attaches forward
    static ref SPACE_AFTER_MARK: Regex =
        Regex::new(&format!(r"([{}])\s+(\S)", chars::combining_class())).unwrap();
}

/// Remove OCR-introduced gaps around Thai combining marks and trailing vowels.
///
/// The gap-before-mark rewrite runs to a fixed point, because closing one gap
/// can expose another (a consonant with two split marks). Every productive pass
/// deletes at least one whitespace character, so the loop is capped at the
/// whitespace count plus one.
pub fn fix_spacing(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    let (fixed, _) = fix_spacing_bounded(text, pass_limit(text));
    fixed
}

/// Upper bound on productive fixed-point passes for `text`.
pub fn pass_limit(text: &str) -> usize {
    text.chars().filter(|c| c.is_whitespace()).count() + 1
}

/// Same as [`fix_spacing`] with an explicit pass cap.
/// Returns the repaired text and the number of passes that changed it.
pub fn fix_spacing_bounded(text: &str, max_passes: usize) -> (String, usize) {
    let mut current = text.to_string();
    let mut passes = 0;

    while passes < max_passes {
        match SPACE_BEFORE_MARK.replace_all(&current, "${1}${2}") {
            Cow::Borrowed(_) => break,
            Cow::Owned(next) => {
                current = next;
                passes += 1;
            }
        }
    }

    let fixed = SPACE_AFTER_MARK.replace_all(&current, "${1}${2}").into_owned();
    (fixed, passes)
}
