//! Country classification for canonical digit strings.
//!
//! The authoritative path parses `+<digits>` with the `phonenumber` library; the
//! fallback path scans a fixed prefix table. The two paths are deliberately kept
//! separate: the fallback only runs when the library produces no answer.

use phonenumber::country;

/// Known dialing prefixes, in their historically observed declaration order.
///
/// The column detector iterates this table in declared order; the classifier
/// fallback scans it longest-prefix-first. Do not reorder entries without
/// checking both call sites.
pub(crate) const COUNTRY_PREFIXES: &[(&str, &str)] = &[
    ("212", "Morocco"),
    ("213", "Algeria"),
    ("216", "Tunisia"),
    ("218", "Libya"),
    ("225", "Ivory Coast"),
    ("590", "Guadeloupe"),
    ("393", "Italy"),
    ("31", "Netherlands"),
    ("1", "USA/Canada"),
    ("49", "Germany"),
    ("39", "Italy"),
    ("58", "Venezuela"),
    ("41", "Switzerland"),
    ("45", "Denmark"),
    ("46", "Sweden"),
    ("51", "Peru"),
    ("54", "Argentina"),
    ("55", "Brazil"),
    ("597", "Suriname"),
    ("598", "Uruguay"),
];

/// English display names for parsed regions. The `phonenumber` crate yields ISO
/// alpha-2 region ids, not names; regions outside this table fall back to the
/// bare code, which downstream treats as any other non-Unknown country label.
const REGION_NAMES: &[(&str, &str)] = &[
    ("FR", "France"),
    ("IL", "Israel"),
    ("MA", "Morocco"),
    ("DZ", "Algeria"),
    ("TN", "Tunisia"),
    ("LY", "Libya"),
    ("CI", "Ivory Coast"),
    ("GP", "Guadeloupe"),
    ("IT", "Italy"),
    ("NL", "Netherlands"),
    ("US", "USA/Canada"),
    ("CA", "USA/Canada"),
    ("DE", "Germany"),
    ("VE", "Venezuela"),
    ("CH", "Switzerland"),
    ("DK", "Denmark"),
    ("SE", "Sweden"),
    ("PE", "Peru"),
    ("AR", "Argentina"),
    ("BR", "Brazil"),
    ("SR", "Suriname"),
    ("UY", "Uruguay"),
    ("GB", "United Kingdom"),
    ("ES", "Spain"),
    ("BE", "Belgium"),
    ("PT", "Portugal"),
];

/// Classifies a canonical digit string into a country label.
///
/// Returns `"Unknown"` when neither the library nor the prefix table can place
/// the number; callers route that to the invalid collection.
pub fn classify_country(digits: &str) -> String {
    let primary = infer_country(digits);
    if !primary.is_empty() {
        return primary;
    }
    guess_country_from_prefix(digits).to_string()
}

/// Authoritative path: parse `+<digits>` with no region hint.
///
/// An impossible/invalid number or a parse error yields an empty string, never
/// an error; the caller then consults the prefix fallback.
fn infer_country(digits: &str) -> String {
    let parse_input = format!("+{}", digits);
    match phonenumber::parse(None, &parse_input) {
        Ok(parsed) => {
            if !phonenumber::is_valid(&parsed) {
                tracing::trace!(target: "intake_task", "Library rejected +{} as invalid", digits);
                return String::new();
            }
            match parsed.country().id() {
                Some(id) => region_display_name(id),
                None => String::new(),
            }
        }
        Err(e) => {
            tracing::trace!(target: "intake_task", "Parse error for +{}: {}", digits, e);
            String::new()
        }
    }
}

fn region_display_name(id: country::Id) -> String {
    let code: &str = id.as_ref();
    REGION_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Fallback path over the fixed prefix table, longest prefix first.
///
/// The `393`/length-12 special case disambiguates an Italian number shape that
/// collides with another prefix in the table.
pub(crate) fn guess_country_from_prefix(digits: &str) -> &'static str {
    if digits.starts_with("393") && digits.len() == 12 {
        return "Italy";
    }
    let mut ordered = COUNTRY_PREFIXES.to_vec();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    for (prefix, name) in ordered {
        if digits.starts_with(prefix) {
            return name;
        }
    }
    "Unknown"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_fallback_longest_wins() {
        // 598 must win over 59-anything and 5-anything
        assert_eq!(guess_country_from_prefix("59891234567"), "Uruguay");
        assert_eq!(guess_country_from_prefix("59712345678"), "Suriname");
        assert_eq!(guess_country_from_prefix("21261234567"), "Morocco");
    }

    #[test]
    fn test_prefix_fallback_italy_special_case() {
        assert_eq!(guess_country_from_prefix("393123456789"), "Italy");
        // Other lengths still resolve through the table
        assert_eq!(guess_country_from_prefix("3931234567890"), "Italy");
    }

    #[test]
    fn test_prefix_fallback_unknown() {
        assert_eq!(guess_country_from_prefix("999999"), "Unknown");
        assert_eq!(guess_country_from_prefix(""), "Unknown");
    }

    #[test]
    fn test_classify_valid_french_mobile() {
        assert_eq!(classify_country("33612345678"), "France");
    }

    #[test]
    fn test_classify_falls_back_for_short_numbers() {
        // Too short for the library, but the 212 prefix is in the table
        assert_eq!(classify_country("2126"), "Morocco");
        assert_eq!(classify_country("336123456"), "Unknown");
    }
}
