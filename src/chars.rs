//! Thai character classes shared by every repair rule.
//!
//! OCR engines routinely detach the marks listed here from the base
//! consonant they sit on, so the spacing, duplicate-mark and extraction
//! passes all key off these tables.

/// Upper and lower vowel signs: ั ิ ี ึ ื ุ ู ็ ์ ํ
pub const UPPER_VOWELS: &[char] = &[
    '\u{0e31}', '\u{0e34}', '\u{0e35}', '\u{0e36}', '\u{0e37}', '\u{0e38}', '\u{0e39}', '\u{0e47}',
    '\u{0e4c}', '\u{0e4d}',
];

/// Tone marks: ่ ้ ๊ ๋
pub const TONE_MARKS: &[char] = &['\u{0e48}', '\u{0e49}', '\u{0e4a}', '\u{0e4b}'];

/// Vowels written after the consonant that OCR often splits off: า ำ
pub const TRAILING_VOWELS: &[char] = &['\u{0e32}', '\u{0e33}'];

pub const SARA_AM: char = '\u{0e33}';
pub const NIKHAHIT: char = '\u{0e4d}';
pub const SARA_AA: char = '\u{0e32}';

/// Decomposed spelling of SARA AM (NIKHAHIT + SARA AA).
pub const SARA_AM_DECOMPOSED: &str = "\u{0e4d}\u{0e32}";

/// Bounds of the Thai block. Code points above it are not counted as Thai.
const THAI_BLOCK_START: char = '\u{0e00}';
const THAI_BLOCK_END: char = '\u{0e7f}';

/// Combining marks: upper/lower vowels and tone marks.
pub fn is_combining_mark(c: char) -> bool {
    UPPER_VOWELS.contains(&c) || TONE_MARKS.contains(&c)
}

/// Anything that should sit directly against the preceding character.
pub fn is_attachable(c: char) -> bool {
    is_combining_mark(c) || TRAILING_VOWELS.contains(&c)
}

pub fn is_thai_char(c: char) -> bool {
    (THAI_BLOCK_START..=THAI_BLOCK_END).contains(&c)
}

/// True if the text contains at least one Thai character.
pub fn contains_thai(text: &str) -> bool {
    text.chars().any(is_thai_char)
}

/// Share of characters in the Thai block, 0.0 for empty input.
pub fn thai_char_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut thai = 0usize;
    for c in text.chars() {
        total += 1;
        if is_thai_char(c) {
            thai += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        thai as f64 / total as f64
    }
}

/// Regex character-class body for [`is_combining_mark`].
pub(crate) fn combining_class() -> String {
    UPPER_VOWELS.iter().chain(TONE_MARKS).collect()
}

/// Regex character-class body for [`is_attachable`].
pub(crate) fn attachable_class() -> String {
    UPPER_VOWELS
        .iter()
        .chain(TONE_MARKS)
        .chain(TRAILING_VOWELS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_classes() {
        assert!(is_combining_mark('\u{0e49}'));
        assert!(is_combining_mark('\u{0e4c}'));
        assert!(!is_combining_mark('\u{0e32}'));
        assert!(is_attachable('\u{0e32}'));
        assert!(is_attachable('\u{0e33}'));
        assert!(!is_attachable('ก'));
        assert!(!is_attachable(' '));
    }

    #[test]
    fn test_thai_ratio() {
        assert_eq!(thai_char_ratio(""), 0.0);
        assert_eq!(thai_char_ratio("กขคง"), 1.0);
        assert!((thai_char_ratio("กข12") - 0.5).abs() < 1e-9);
        assert!(contains_thai("ABC ก"));
        assert!(!contains_thai("Company Limited"));
    }

    #[test]
    fn test_class_strings_cover_tables() {
        assert_eq!(combining_class().chars().count(), 14);
        assert_eq!(attachable_class().chars().count(), 16);
    }
}
