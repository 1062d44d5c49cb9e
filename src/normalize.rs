//! Canonical spelling of multi-code-point Thai sequences.

use unicode_normalization::UnicodeNormalization;

use crate::chars::{SARA_AM, SARA_AM_DECOMPOSED};
use crate::error::CapabilityError;

/// A text normalizer the pipeline can delegate to.
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn normalize(&self, text: &str) -> Result<String, CapabilityError>;
}

/// Offline fallback: splits SARA AM into NIKHAHIT + SARA AA and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct SaraAmNormalizer;

impl Normalizer for SaraAmNormalizer {
    fn name(&self) -> &'static str {
        "sara_am"
    }

    fn normalize(&self, text: &str) -> Result<String, CapabilityError> {
        Ok(decompose_sara_am(text))
    }
}

/// NFKC through `unicode-normalization`, then SARA AM decomposition.
///
/// NFKC folds full-width digits and brackets and reorders stacked marks into
/// canonical order. The SARA AM split runs afterwards so both normalizers
/// agree on SARA AM whatever the NFKC tables do with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeNormalizer;

impl Normalizer for UnicodeNormalizer {
    fn name(&self) -> &'static str {
        "unicode"
    }

    fn normalize(&self, text: &str) -> Result<String, CapabilityError> {
        let folded: String = text.nfkc().collect();
        Ok(decompose_sara_am(&folded))
    }
}

pub fn decompose_sara_am(text: &str) -> String {
    text.replace(SARA_AM, SARA_AM_DECOMPOSED)
}

/// Normalize with `normalizer`, falling back to the SARA AM rule if it errors.
pub fn normalize_thai_text(normalizer: &dyn Normalizer, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    match normalizer.normalize(text) {
        Ok(normalized) => normalized,
        Err(e) => {
            tracing::warn!(normalizer = normalizer.name(), "normalizer failed, using SARA AM rule: {e}");
            decompose_sara_am(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Normalizer for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn normalize(&self, _text: &str) -> Result<String, CapabilityError> {
            Err(CapabilityError::failed("normalizer", "offline"))
        }
    }

    #[test]
    fn test_sara_am_paths_agree() {
        for word in ["จำกัด", "กำไร", "คำนวณ", "ทำ", "จำนวนหุ้น - ที่ออกและเรียกชำระแล้ว"] {
            let fallback = normalize_thai_text(&SaraAmNormalizer, word);
            let unicode = normalize_thai_text(&UnicodeNormalizer, word);
            assert_eq!(fallback, unicode, "{word}");
            assert!(!fallback.contains(SARA_AM));
        }
    }

    #[test]
    fn test_sara_am_decomposed() {
        assert_eq!(normalize_thai_text(&SaraAmNormalizer, "จำกัด"), "จํากัด");
    }

    #[test]
    fn test_failure_falls_back() {
        assert_eq!(normalize_thai_text(&Broken, "กำไร"), "กําไร");
    }

    #[test]
    fn test_ascii_and_empty_untouched() {
        assert_eq!(normalize_thai_text(&UnicodeNormalizer, ""), "");
        assert_eq!(normalize_thai_text(&UnicodeNormalizer, "Total 1,234.00"), "Total 1,234.00");
    }

    #[test]
    fn test_unicode_folds_then_decomposes() {
        assert_eq!(normalize_thai_text(&UnicodeNormalizer, "กำไร （１,０００）"), "กําไร (1,000)");
        // the SARA AM backend leaves compatibility forms alone
        assert_eq!(normalize_thai_text(&SaraAmNormalizer, "กำไร （１）"), "กําไร （１）");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_thai_text(&UnicodeNormalizer, "งบกำไรขาดทุน");
        assert_eq!(normalize_thai_text(&UnicodeNormalizer, &once), once);
    }
}
