//! Detects which spreadsheet column holds phone numbers.

use super::country::COUNTRY_PREFIXES;
use crate::sheet::Sheet;

/// Number of rows sampled for detection.
const SAMPLE_ROWS: usize = 3;

/// Returns the index of the first column that looks like a phone column, judged
/// on a sample of at most the first three rows.
///
/// A column is accepted when every sampled value satisfies one rule:
/// 1. starts with `+` (international format), or
/// 2. is all digits with a mean length above 9, or
/// 3. starts with a known country prefix. Prefixes are tried in table order, not
///    longest-first; the first prefix every value matches wins for the column.
///
/// An all-empty column never matches. Datasets with fewer than three rows are
/// judged on the rows that exist.
pub fn detect_phone_column(sheet: &Sheet) -> Option<usize> {
    let sample = sheet.sample(SAMPLE_ROWS);
    if sample.is_empty() {
        return None;
    }

    for (idx, name) in sheet.columns.iter().enumerate() {
        let values: Vec<&str> = sample.iter().map(|row| row[idx].as_str()).collect();
        if values.iter().all(|v| v.is_empty()) {
            continue;
        }

        if values.iter().all(|v| v.starts_with('+')) {
            tracing::debug!(target: "intake_task", "Column '{}' matched the '+' rule", name);
            return Some(idx);
        }

        let all_digits = values
            .iter()
            .all(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()));
        if all_digits {
            let mean_len =
                values.iter().map(|v| v.len()).sum::<usize>() as f64 / values.len() as f64;
            if mean_len > 9.0 {
                tracing::debug!(
                    target: "intake_task",
                    "Column '{}' matched the digit-length rule (mean {:.1})",
                    name,
                    mean_len
                );
                return Some(idx);
            }
        }

        for (prefix, _) in COUNTRY_PREFIXES {
            if values.iter().all(|v| v.starts_with(prefix)) {
                tracing::debug!(
                    target: "intake_task",
                    "Column '{}' matched the country-prefix rule ({})",
                    name,
                    prefix
                );
                return Some(idx);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(columns: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_plus_column_wins_in_column_order() {
        let s = sheet(
            &["name", "phone", "big_numbers"],
            &[
                &["Alice", "+33612345678", "12345678901234"],
                &["Bob", "+33698765432", "98765432109876"],
                &["Carol", "+97250000000", "55555555555555"],
            ],
        );
        assert_eq!(detect_phone_column(&s), Some(1));
    }

    #[test]
    fn test_digit_length_rule() {
        let s = sheet(
            &["id", "phone"],
            &[&["1", "33612345678"], &["2", "33698765432"]],
        );
        assert_eq!(detect_phone_column(&s), Some(1));
    }

    #[test]
    fn test_digit_rule_requires_mean_length_over_nine() {
        // Mean length exactly 9 fails the digit rule, and the values share no
        // common country prefix
        let s = sheet(&["code"], &[&["623456789"], &["987654321"]]);
        assert_eq!(detect_phone_column(&s), None);
    }

    #[test]
    fn test_prefix_rule() {
        // Too short for the digit-length rule; the shared 212 prefix decides
        let s = sheet(
            &["other", "phone"],
            &[&["x", "21261234"], &["y", "21269876"]],
        );
        assert_eq!(detect_phone_column(&s), Some(1));
    }

    #[test]
    fn test_short_sample_is_accepted() {
        let s = sheet(&["phone"], &[&["+33612345678"]]);
        assert_eq!(detect_phone_column(&s), Some(0));
    }

    #[test]
    fn test_empty_column_is_skipped() {
        let s = sheet(
            &["empty", "phone"],
            &[&["", "+33612345678"], &["", "+33698765432"]],
        );
        assert_eq!(detect_phone_column(&s), Some(1));
    }

    #[test]
    fn test_no_phone_column() {
        let s = sheet(
            &["name", "city"],
            &[&["Alice", "Paris"], &["Bob", "Lyon"]],
        );
        assert_eq!(detect_phone_column(&s), None);
    }

    #[test]
    fn test_no_rows_means_no_column() {
        let s = sheet(&["phone"], &[]);
        assert_eq!(detect_phone_column(&s), None);
    }
}
