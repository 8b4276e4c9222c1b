//! Orchestrates one intake run: column detection, normalization, classification,
//! dedup gating, and bulk persistence of the resulting batches.

use super::columns::detect_phone_column;
use super::country::classify_country;
use super::normalize::normalize_phone_number;
use crate::core::error::{AppError, Result};
use crate::core::models::{IntakeReport, PhoneRecord, RejectReason, RejectedRecord};
use crate::sheet::Sheet;
use crate::store::NumberStore;
use std::collections::HashSet;

/// Row values that mean "no phone number here", compared case-insensitively.
const EMPTY_MARKERS: [&str; 3] = ["nan", "", "none"];

/// Runs the full intake pipeline over a parsed sheet.
///
/// The existing valid/invalid key sets are fetched once and treated as a
/// snapshot for the whole run; a per-run "processed" set collapses duplicate
/// rows within the file (first occurrence wins). Both output batches are
/// bulk-inserted independently; a failure on one batch does not undo the other.
pub fn run(store: &dyn NumberStore, sheet: &Sheet) -> Result<IntakeReport> {
    let phone_col = detect_phone_column(sheet).ok_or_else(|| {
        AppError::MalformedInput("No valid phone number column detected".to_string())
    })?;
    tracing::info!(
        target: "intake_task",
        "Using phone column '{}' ({} rows to process)",
        sheet.columns[phone_col],
        sheet.rows.len()
    );

    let mut existing_valid = store.valid_keys()?;
    let mut existing_invalid = store.invalid_keys()?;
    tracing::debug!(
        target: "intake_task",
        "Loaded key snapshot: {} valid, {} invalid",
        existing_valid.len(),
        existing_invalid.len()
    );

    let mut processed: HashSet<String> = HashSet::new();
    let mut valid_entries: Vec<PhoneRecord> = Vec::new();
    let mut invalid_entries: Vec<RejectedRecord> = Vec::new();

    for row in &sheet.rows {
        let raw_phone = row[phone_col].trim();
        if EMPTY_MARKERS
            .iter()
            .any(|m| raw_phone.eq_ignore_ascii_case(m))
        {
            continue;
        }

        match normalize_phone_number(raw_phone) {
            Some(normalized) => {
                if processed.contains(&normalized) {
                    // Duplicate row within this file; first occurrence wins
                    continue;
                }
                processed.insert(normalized.clone());

                if existing_valid.contains(&normalized) || existing_invalid.contains(&normalized) {
                    continue;
                }

                let country = classify_country(&normalized);
                if !country.is_empty() && country != "Unknown" {
                    tracing::debug!(
                        target: "intake_task",
                        "Classified {} as {}",
                        normalized,
                        country
                    );
                    valid_entries.push(PhoneRecord::new(normalized.clone(), country));
                    existing_valid.insert(normalized);
                } else if !existing_invalid.contains(&normalized) {
                    tracing::debug!(
                        target: "intake_task",
                        "No country detected for {}",
                        normalized
                    );
                    invalid_entries.push(RejectedRecord {
                        phone_number: normalized.clone(),
                        reason: RejectReason::NoCountryDetected,
                    });
                    existing_invalid.insert(normalized);
                }
            }
            None => {
                // Best-effort key: the raw trimmed string, since normalization
                // produced nothing
                let fallback = raw_phone.to_string();
                if !existing_invalid.contains(&fallback) {
                    tracing::debug!(target: "intake_task", "Rejected raw value '{}'", fallback);
                    invalid_entries.push(RejectedRecord {
                        phone_number: fallback.clone(),
                        reason: RejectReason::InvalidFormat,
                    });
                    existing_invalid.insert(fallback);
                }
            }
        }
    }

    let mut batch_errors: Vec<String> = Vec::new();
    let mut new_valid = 0;
    let mut new_invalid = 0;

    if !valid_entries.is_empty() {
        match store.insert_valid(&valid_entries) {
            Ok(count) => new_valid = count,
            Err(e) => {
                tracing::error!(target: "intake_task", "Valid batch insert failed: {}", e);
                batch_errors.push(format!("valid batch: {}", e));
            }
        }
    }
    if !invalid_entries.is_empty() {
        match store.insert_invalid(&invalid_entries) {
            Ok(count) => new_invalid = count,
            Err(e) => {
                tracing::error!(target: "intake_task", "Invalid batch insert failed: {}", e);
                batch_errors.push(format!("invalid batch: {}", e));
            }
        }
    }
    if !batch_errors.is_empty() {
        return Err(AppError::Persistence(batch_errors.join("; ")));
    }

    let report = IntakeReport {
        new_valid,
        new_invalid,
        total_valid: store.count_valid()?,
        total_invalid: store.count_invalid()?,
    };
    tracing::info!(
        target: "intake_task",
        "Intake completed: {} new valid, {} new invalid (totals: {}/{})",
        report.new_valid,
        report.new_invalid,
        report.total_valid,
        report.total_invalid
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Reachability;
    use crate::store::MemoryStore;

    fn phone_sheet(values: &[&str]) -> Sheet {
        Sheet {
            columns: vec!["phone".to_string()],
            rows: values.iter().map(|v| vec![v.to_string()]).collect(),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let store = MemoryStore::new();
        // First three rows carry a '+' so the detector accepts the column; the
        // remaining rows exercise the reject paths
        let sheet = Sheet {
            columns: vec!["name".to_string(), "phone".to_string()],
            rows: vec![
                vec!["Alice".to_string(), "+33612345678".to_string()],
                vec!["Bob".to_string(), "+0612345678".to_string()],
                vec!["Carol".to_string(), "+9726123456".to_string()],
                vec!["Dan".to_string(), "notaphone".to_string()],
                vec!["Eve".to_string(), "".to_string()],
            ],
        };

        let report = run(&store, &sheet).unwrap();

        // Both French rows collapse into one canonical key
        let valid = store.valid_keys().unwrap();
        assert_eq!(valid.len(), 1);
        assert!(valid.contains("33612345678"));
        assert_eq!(report.new_valid, 1);

        // "notaphone" fails normalization; the repaired 9726 value normalizes to
        // 336123456 but is too short for any country
        let invalid = store.invalid_keys().unwrap();
        assert!(invalid.contains("notaphone"));
        assert!(invalid.contains("336123456"));
        assert_eq!(report.new_invalid, 2);

        let records = store.valid_by_reachability(Reachability::Unknown).unwrap();
        assert_eq!(records[0].country, "France");
    }

    #[test]
    fn test_intake_is_idempotent() {
        let store = MemoryStore::new();
        let sheet = phone_sheet(&["+33612345678", "+notaphone"]);

        let first = run(&store, &sheet).unwrap();
        assert_eq!(first.new_valid, 1);
        assert_eq!(first.new_invalid, 1);

        let second = run(&store, &sheet).unwrap();
        assert_eq!(second.new_valid, 0);
        assert_eq!(second.new_invalid, 0);
        assert_eq!(second.total_valid, 1);
        assert_eq!(second.total_invalid, 1);
    }

    #[test]
    fn test_collections_stay_disjoint() {
        let store = MemoryStore::new();
        let sheet = phone_sheet(&[
            "+33612345678",
            "+59891234567",
            "+9726123456",
            "336&bad",
            "0612345678",
        ]);
        run(&store, &sheet).unwrap();

        let valid = store.valid_keys().unwrap();
        let invalid = store.invalid_keys().unwrap();
        assert!(valid.is_disjoint(&invalid));
    }

    #[test]
    fn test_placeholder_rows_are_skipped() {
        let store = MemoryStore::new();
        let sheet = phone_sheet(&[
            "+33612345678",
            "+33698765432",
            "+33611111111",
            "nan",
            "NaN",
            "None",
            "none",
            "",
        ]);
        let report = run(&store, &sheet).unwrap();
        // The placeholder rows neither validate nor reject; they vanish
        assert_eq!(report.new_valid, 3);
        assert_eq!(report.new_invalid, 0);
        assert!(store.invalid_keys().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_invalid_rows_emit_one_record() {
        let store = MemoryStore::new();
        let sheet = phone_sheet(&["+notaphone", "+notaphone", "+notaphone"]);
        let report = run(&store, &sheet).unwrap();
        assert_eq!(report.new_invalid, 1);
    }

    #[test]
    fn test_no_phone_column_is_malformed_input() {
        let store = MemoryStore::new();
        let sheet = Sheet {
            columns: vec!["name".to_string()],
            rows: vec![vec!["Alice".to_string()], vec!["Bob".to_string()]],
        };
        match run(&store, &sheet) {
            Err(AppError::MalformedInput(_)) => {}
            other => panic!("expected MalformedInput, got {:?}", other.map(|_| ())),
        }
    }
}
