//! Accounting-style negative numbers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "(1,234,567.89)" and "( 123 )"; must start with a digit so "(,)" stays put
    static ref PARENTHESIZED_NUMBER: Regex =
        Regex::new(r"\(\s*([0-9][0-9,]*\.?[0-9]*)\s*\)").unwrap();
}

/// Rewrite parenthesized figures to a leading minus sign.
///
/// Comma grouping and the decimal point are kept as written. Parentheses that
/// hold anything other than a figure ("(note 3)", "(ขาดทุน)") are not touched.
/// Returns the rewritten text and the number of figures converted.
pub fn convert_parentheses_to_negative(text: &str) -> (String, usize) {
    if text.is_empty() {
        return (String::new(), 0);
    }

    let count = PARENTHESIZED_NUMBER.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }

    let converted = PARENTHESIZED_NUMBER.replace_all(text, "-${1}").into_owned();
    (converted, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_decimal() {
        assert_eq!(
            convert_parentheses_to_negative("(1,234,567.89)"),
            ("-1,234,567.89".to_string(), 1)
        );
    }

    #[test]
    fn test_plain_and_padded() {
        assert_eq!(convert_parentheses_to_negative("(123)"), ("-123".to_string(), 1));
        assert_eq!(convert_parentheses_to_negative("( 1,234 )"), ("-1,234".to_string(), 1));
    }

    #[test]
    fn test_non_numeric_left_alone() {
        assert_eq!(convert_parentheses_to_negative("(note 3)"), ("(note 3)".to_string(), 0));
        assert_eq!(
            convert_parentheses_to_negative("กำไร (ขาดทุน)"),
            ("กำไร (ขาดทุน)".to_string(), 0)
        );
        assert_eq!(convert_parentheses_to_negative("(,)"), ("(,)".to_string(), 0));
    }

    #[test]
    fn test_table_row() {
        let row = "| ขาดทุนสุทธิ | (12,500) | (3,000.50) | 400 |";
        let (converted, count) = convert_parentheses_to_negative(row);
        assert_eq!(converted, "| ขาดทุนสุทธิ | -12,500 | -3,000.50 | 400 |");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_empty() {
        assert_eq!(convert_parentheses_to_negative(""), (String::new(), 0));
    }
}
