//! Thai phrase extraction from OCR output.
//!
//! Text is split on punctuation and line breaks; each segment is cleaned and
//! kept when it has at least two characters and is mostly Thai.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::chars::{contains_thai, thai_char_ratio};

/// Default confidence for phrases from free text blocks, which carry no OCR score.
pub const TEXT_BLOCK_CONFIDENCE: f64 = 0.8;

const MIN_SEGMENT_CHARS: usize = 2;
const MIN_THAI_RATIO: f64 = 0.5;
const CONTEXT_PREVIEW_CHARS: usize = 50;

lazy_static! {
    static ref DELIMITERS: Regex = Regex::new(r#"[,\.;:(){}\[\]"'—–\n\r\t]+"#).unwrap();
    static ref ZERO_WIDTH: Regex = Regex::new("[\u{200b}-\u{200d}\u{feff}]").unwrap();
    static ref DETACHED_TONE: Regex = Regex::new(r"\s+([่้๊๋])").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseCandidate {
    pub phrase: String,
    pub word_count: usize,
    pub thai_char_ratio: f64,
    /// Index of the segment in the split input, skipped segments included.
    pub position: usize,
    /// Length of the cleaned segment in chars.
    pub segment_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseSource {
    TextBlock,
    TableCell,
}

impl PhraseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhraseSource::TextBlock => "text_block",
            PhraseSource::TableCell => "table_cell",
        }
    }
}

/// A candidate plus where it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPhrase {
    #[serde(flatten)]
    pub candidate: PhraseCandidate,
    pub source: PhraseSource,
    /// Document id for text blocks, cell id for table cells.
    pub source_id: i64,
    pub document_id: Option<i64>,
    pub confidence_score: Option<f64>,
    pub context: String,
}

/// One OCR table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub id: i64,
    pub row_index: usize,
    pub col_index: usize,
    pub value: String,
    pub confidence_score: Option<f64>,
}

/// Strip zero-width characters, reattach detached tone marks, collapse whitespace.
pub fn clean_thai_text(text: &str) -> String {
    let text = ZERO_WIDTH.replace_all(text, "");
    let text = DETACHED_TONE.replace_all(&text, "${1}");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

pub fn extract_phrases(text: &str) -> Vec<PhraseCandidate> {
    if !contains_thai(text) {
        return Vec::new();
    }

    DELIMITERS
        .split(text)
        .enumerate()
        .filter_map(|(position, segment)| {
            let phrase = clean_thai_text(segment);
            let segment_length = phrase.chars().count();
            if segment_length < MIN_SEGMENT_CHARS {
                return None;
            }
            let ratio = thai_char_ratio(&phrase);
            if ratio <= MIN_THAI_RATIO {
                return None;
            }
            Some(PhraseCandidate {
                word_count: phrase.split_whitespace().count(),
                thai_char_ratio: ratio,
                position,
                segment_length,
                phrase,
            })
        })
        .collect()
}

/// Extract from many texts on the rayon pool, results in input order.
pub fn extract_phrases_batch<S>(texts: &[S]) -> Vec<Vec<PhraseCandidate>>
where
    S: AsRef<str> + Sync,
{
    texts
        .par_iter()
        .map(|text| extract_phrases(text.as_ref()))
        .collect()
}

/// Phrases from a document's free text blocks, scored [`TEXT_BLOCK_CONFIDENCE`].
pub fn extract_from_text_blocks<S: AsRef<str>>(document_id: i64, blocks: &[S]) -> Vec<ExtractedPhrase> {
    let mut out = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        let block = block.as_ref();
        if !contains_thai(block) {
            continue;
        }
        let context = format!(
            "Document {document_id}, Block {block_index}: {}",
            preview(block)
        );
        out.extend(extract_phrases(block).into_iter().map(|candidate| ExtractedPhrase {
            candidate,
            source: PhraseSource::TextBlock,
            source_id: document_id,
            document_id: Some(document_id),
            confidence_score: Some(TEXT_BLOCK_CONFIDENCE),
            context: context.clone(),
        }));
    }
    out
}

/// Phrases from OCR table cells, each carrying its cell's confidence.
pub fn extract_from_table_cells(
    table_id: i64,
    document_id: Option<i64>,
    cells: &[TableCell],
) -> Vec<ExtractedPhrase> {
    let mut out = Vec::new();
    for cell in cells {
        if !contains_thai(&cell.value) {
            continue;
        }
        let context = format!(
            "Table {table_id}, Row {}, Col {}: {}",
            cell.row_index,
            cell.col_index,
            preview(&cell.value)
        );
        out.extend(extract_phrases(&cell.value).into_iter().map(|candidate| ExtractedPhrase {
            candidate,
            source: PhraseSource::TableCell,
            source_id: cell.id,
            document_id,
            confidence_score: cell.confidence_score,
            context: context.clone(),
        }));
    }
    out
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(CONTEXT_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_delimiters() {
        let phrases = extract_phrases("สินทรัพย์หมุนเวียน, เงินสด (หมายเหตุ 5)");
        let texts: Vec<_> = phrases.iter().map(|p| p.phrase.as_str()).collect();
        assert_eq!(texts, vec!["สินทรัพย์หมุนเวียน", "เงินสด", "หมายเหตุ 5"]);
        assert_eq!(phrases[0].position, 0);
        assert_eq!(phrases[1].position, 1);
        assert_eq!(phrases[2].word_count, 2);
    }

    #[test]
    fn test_skips_short_and_latin_segments() {
        let phrases = extract_phrases("ก, Total assets 2566, รายได้");
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].phrase, "รายได้");
        assert_eq!(phrases[0].position, 2);
        assert!((phrases[0].thai_char_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_must_exceed_half() {
        // 4 Thai chars, 4 others
        assert!(extract_phrases("กขคง1234").is_empty());
        assert_eq!(extract_phrases("กขคงจ1234").len(), 1);
    }

    #[test]
    fn test_no_thai_gives_nothing() {
        assert!(extract_phrases("Statement of cash flows").is_empty());
        assert!(extract_phrases("").is_empty());
    }

    #[test]
    fn test_clean_thai_text() {
        assert_eq!(clean_thai_text("\u{feff} ค่าใช \u{200b}้จ่าย \n  รวม "), "ค่าใช้จ่าย รวม");
        assert_eq!(clean_thai_text("ที ่ดิน"), "ที่ดิน");
    }

    #[test]
    fn test_segment_length_in_chars() {
        let phrases = extract_phrases("เงินสด");
        assert_eq!(phrases[0].segment_length, 6);
    }

    #[test]
    fn test_text_blocks_carry_context() {
        let phrases = extract_from_text_blocks(7, &["Page 1", "งบแสดงฐานะการเงิน"]);
        assert_eq!(phrases.len(), 1);
        let p = &phrases[0];
        assert_eq!(p.source, PhraseSource::TextBlock);
        assert_eq!(p.source_id, 7);
        assert_eq!(p.document_id, Some(7));
        assert_eq!(p.confidence_score, Some(TEXT_BLOCK_CONFIDENCE));
        assert_eq!(p.context, "Document 7, Block 1: งบแสดงฐานะการเงิน...");
    }

    #[test]
    fn test_table_cells() {
        let cells = vec![
            TableCell {
                id: 11,
                row_index: 2,
                col_index: 0,
                value: "ลูกหนี้การค้า".into(),
                confidence_score: Some(0.42),
            },
            TableCell {
                id: 12,
                row_index: 2,
                col_index: 1,
                value: "1,234,567".into(),
                confidence_score: Some(0.99),
            },
        ];
        let phrases = extract_from_table_cells(3, None, &cells);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].source_id, 11);
        assert_eq!(phrases[0].confidence_score, Some(0.42));
        assert_eq!(phrases[0].document_id, None);
        assert!(phrases[0].context.starts_with("Table 3, Row 2, Col 0: "));
    }

    #[test]
    fn test_batch_keeps_order() {
        let out = extract_phrases_batch(&["เงินสด", "cash", "กำไร, ขาดทุน"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 1);
        assert!(out[1].is_empty());
        assert_eq!(out[2].len(), 2);
    }
}
