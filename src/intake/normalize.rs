//! Normalizes raw spreadsheet phone strings into canonical digit strings.

/// Reduces a raw cell value to a bare, country-code-prefixed digit string, or
/// rejects it with `None`.
///
/// The policy, applied in order:
/// 1. Reject empty input or anything containing `%` / `&` (encoding artifacts).
/// 2. Strip `.`, `-` and spaces.
/// 3. Strip any leading run of `p`, `:`, `+` (handles `p:+33...`, `+33...`).
/// 4. Keep only the part before the first `/` (multi-number cells).
/// 5. Locale repairs, first match wins:
///    - leading `O6`/`O7` (letter O typed for zero) or `06`/`07`: the first
///      character becomes `33` (French national format to E.164).
///    - leading `6`/`7` with exactly 9 digits: prepend `33`.
///    - leading `5` with exactly 9 digits: prepend `972` (Israeli mobile).
///    - leading `9726`: becomes `336...` (undoes an accidental `972` prefix on a
///      French mobile).
/// 6. The result must be all ASCII digits, else reject.
///
/// The returned string carries no leading `+`; one is re-added only when the
/// country classifier hands the number to the parsing library.
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.contains('%') || raw.contains('&') {
        return None;
    }

    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .collect();
    let stripped = stripped.trim_start_matches(['p', ':', '+']);
    let stripped = stripped.split('/').next().unwrap_or(stripped);

    let repaired = if stripped.starts_with("O6")
        || stripped.starts_with("O7")
        || stripped.starts_with("06")
        || stripped.starts_with("07")
    {
        format!("33{}", &stripped[1..])
    } else if (stripped.starts_with('6') || stripped.starts_with('7')) && stripped.len() == 9 {
        format!("33{}", stripped)
    } else if stripped.starts_with('5') && stripped.len() == 9 {
        format!("972{}", stripped)
    } else if let Some(rest) = stripped.strip_prefix("9726") {
        format!("336{}", rest)
    } else {
        stripped.to_string()
    };

    if !repaired.is_empty() && repaired.chars().all(|c| c.is_ascii_digit()) {
        Some(repaired)
    } else {
        None
    }
}
