use crate::record::{Record, TargetValue};

/// Outcome of the validity predicate. "Modulated" is the successful
/// classification; everything else is an error row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Modulated,
    NotModulated,
}

/// Classification is a pure function of the coerced target value. This is
/// the single source of truth for every report surface; nothing else may
/// re-derive validity from the raw cell.
#[must_use]
pub fn classify(record: &Record) -> Modulation {
    match record.target {
        TargetValue::Number(_) => Modulation::Modulated,
        TargetValue::Blank | TargetValue::ErrorMarker | TargetValue::Unparsed(_) => {
            Modulation::NotModulated
        }
    }
}

/// Raw-text form of the predicate, for callers that have a cell but no
/// `Record`. Never panics and never propagates a parse failure.
#[must_use]
pub fn is_valid_target(raw: &str) -> bool {
    matches!(TargetValue::from_cell(raw), TargetValue::Number(_))
}

/// Keep only records whose business code contains `code` as a substring.
/// Containment, not equality: exports sometimes carry the code with
/// leading zeros or concatenated prefixes.
#[must_use]
pub fn filter_business(mut records: Vec<Record>, code: &str) -> Vec<Record> {
    records.retain(|record| record.business_code.contains(code));
    records
}

#[cfg(test)]
mod tests {
    use super::{Modulation, classify, filter_business, is_valid_target};
    use crate::record::{Record, TargetValue};
    use time::macros::date;

    fn fixture_record(business_code: &str, entity_key: &str, target: &str) -> Record {
        Record {
            delivery_date: date!(2024 - 01 - 10),
            business_code: business_code.to_string(),
            entity_key: entity_key.to_string(),
            target: TargetValue::from_cell(target),
            client_id: None,
            vehicle_id: None,
            order_ref: None,
            reason: None,
        }
    }

    #[test]
    fn accepts_decimals_with_comma_or_dot() {
        assert!(is_valid_target("5.2"));
        assert!(is_valid_target("5,2"));
        assert!(is_valid_target("9"));
        assert!(is_valid_target("  12,75  "));
    }

    #[test]
    fn rejects_blank_whitespace_markers_and_text() {
        assert!(!is_valid_target(""));
        assert!(!is_valid_target("   "));
        assert!(!is_valid_target("#N/A"));
        assert!(!is_valid_target("#DIV/0!"));
        assert!(!is_valid_target("ERROR"));
        assert!(!is_valid_target("Error de sistema"));
        assert!(!is_valid_target("pendiente"));
    }

    #[test]
    fn classification_follows_the_coerced_target() {
        assert_eq!(
            classify(&fixture_record("88", "E1", "5.2")),
            Modulation::Modulated
        );
        assert_eq!(
            classify(&fixture_record("88", "E2", "#N/A")),
            Modulation::NotModulated
        );
        assert_eq!(
            classify(&fixture_record("88", "E3", "")),
            Modulation::NotModulated
        );
    }

    #[test]
    fn business_filter_uses_substring_containment() {
        let records = vec![
            fixture_record("88", "E1", "1"),
            fixture_record("088", "E2", "1"),
            fixture_record("DPS-88", "E3", "1"),
            fixture_record("77", "E4", "1"),
        ];

        let kept = filter_business(records, "88");
        let entities = kept
            .iter()
            .map(|record| record.entity_key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(entities, vec!["E1", "E2", "E3"]);
    }
}
