//! Collapse repeated combining marks left by double OCR passes.

use crate::chars::is_combining_mark;

/// Collapse any run of two or more identical combining marks to one.
///
/// "เจ้าหนี้้" -> "เจ้าหนี้". Different marks in sequence are left alone,
/// only repeats of the same code point are dropped.
pub fn remove_duplicate_marks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if is_combining_mark(c) && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }

    out
}
