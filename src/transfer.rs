use crate::models::Journal;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("invalid file format: not a JSON document")]
    InvalidJson,
    #[error("invalid file format: no \"weeks\" field")]
    MissingWeeks,
    #[error("invalid file format: {0}")]
    Malformed(String),
}

/// Parses an exported journal. The document must be an object with a `weeks` field.
pub fn parse_journal(bytes: &[u8]) -> Result<Journal, ImportError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| ImportError::InvalidJson)?;
    journal_from_value(value)
}

pub fn journal_from_value(value: Value) -> Result<Journal, ImportError> {
    match value.get("weeks") {
        Some(weeks) if !weeks.is_null() => {}
        _ => return Err(ImportError::MissingWeeks),
    }
    serde_json::from_value(value).map_err(|err| ImportError::Malformed(err.to_string()))
}

pub fn export_json(journal: &Journal) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(journal)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("fighter-reset-journal-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayPatch;
    use crate::store::update_day;

    #[test]
    fn export_then_import_round_trips() {
        let journal = update_day(
            &Journal::template(),
            5,
            "w5-d7",
            &DayPatch {
                sleep: Some(6.5),
                notes: Some("long week".into()),
                wellbeing: Some(4),
                ..DayPatch::default()
            },
        );
        let bytes = export_json(&journal).unwrap();
        assert_eq!(parse_journal(&bytes).unwrap(), journal);
    }

    #[test]
    fn import_without_weeks_fails() {
        assert_eq!(parse_journal(br#"{"days":[]}"#), Err(ImportError::MissingWeeks));
        assert_eq!(parse_journal(br#"{"weeks":null}"#), Err(ImportError::MissingWeeks));
        assert_eq!(parse_journal(b"[1,2]"), Err(ImportError::MissingWeeks));
        assert_eq!(parse_journal(b"not json"), Err(ImportError::InvalidJson));
    }

    #[test]
    fn import_rejects_undecodable_weeks() {
        assert!(matches!(
            parse_journal(br#"{"weeks":"eight"}"#),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn import_fills_missing_day_fields() {
        let journal = parse_journal(br#"{"weeks":[{"weekNumber":1,"days":[{"id":"a","water":2}]}]}"#).unwrap();
        let day = &journal.weeks[0].days[0];
        assert_eq!(day.water, 2.0);
        assert_eq!(day.notes, "");
        assert!(!day.workout);
    }

    #[test]
    fn export_file_is_named_by_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "fighter-reset-journal-2026-03-09.json");
    }
}
