//! Actual results written back as fixture documents

use crate::actual::ActualResult;
use base64::Engine;
use sp_core::fixture::tags;
use sp_core::{FixtureCell, FixtureColumn, FixtureException, FixtureResult};
use sp_db::SqlValue;

/// Fixture form of an actual result.
///
/// `with_trace` keeps the error chain of an exception, used for artifacts.
pub fn to_fixture(actual: &ActualResult, with_trace: bool) -> FixtureResult {
    match actual {
        ActualResult::Exception(e) => FixtureResult::exception(FixtureException {
            class: e.class.clone(),
            message: Some(e.root_cause_message.clone()),
            message_regex: None,
            stack_trace: with_trace.then(|| e.stack_trace.clone()),
        }),
        ActualResult::Update(count) => FixtureResult::update(*count),
        ActualResult::NoResult => FixtureResult::no_result(),
        ActualResult::Table(table) => FixtureResult::table(
            table
                .columns
                .iter()
                .map(|c| FixtureColumn {
                    name: c.label.clone(),
                    type_name: c.type_name.clone(),
                })
                .collect(),
            table
                .rows
                .iter()
                .map(|row| row.iter().map(to_cell).collect())
                .collect(),
        ),
    }
}

fn to_cell(value: &SqlValue) -> Option<FixtureCell> {
    match value {
        SqlValue::Null => None,
        SqlValue::Text(s) if !is_printable(s) => Some(FixtureCell::new(
            tags::UNPRINTABLE,
            base64::engine::general_purpose::STANDARD.encode(s.as_bytes()),
        )),
        other => Some(FixtureCell::new(other.type_tag(), other.to_string())),
    }
}

/// Whether every character is allowed in an XML 1.0 document
pub fn is_printable(text: &str) -> bool {
    text.chars().all(|c| {
        matches!(c, '\t' | '\n' | '\r')
            || ('\u{20}'..='\u{D7FF}').contains(&c)
            || ('\u{E000}'..='\u{FFFD}').contains(&c)
            || c >= '\u{10000}'
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actual::{ActualException, ResultTable};
    use crate::cell::ExpectedCell;
    use sp_db::ColumnMeta;

    #[test]
    fn test_printable() {
        assert!(is_printable("tab\tand newline\n"));
        assert!(is_printable("unicode \u{1F600}"));
        assert!(!is_printable("bell\u{7}"));
        assert!(!is_printable("\u{FFFE}"));
    }

    #[test]
    fn test_table_cells_round_trip_through_expected() {
        let actual = ActualResult::Table(ResultTable {
            columns: vec![ColumnMeta::new("id", "integer"), ColumnMeta::new("s", "string")],
            rows: vec![
                vec![SqlValue::Integer(1), SqlValue::Text("ok".into())],
                vec![SqlValue::Null, SqlValue::Text("a\u{0}b".into())],
            ],
        });
        let fixture = to_fixture(&actual, false);
        let table = fixture.table.as_ref().unwrap();
        assert_eq!(table.rows[0][0], Some(FixtureCell::new("integer", "1")));
        assert_eq!(table.rows[1][0], None);
        assert_eq!(table.rows[1][1].as_ref().unwrap().tag, tags::UNPRINTABLE);

        let parsed = ExpectedCell::from_fixture(table.rows[1][1].as_ref()).unwrap();
        assert_eq!(parsed, ExpectedCell::Value(SqlValue::Text("a\u{0}b".into())));
    }

    #[test]
    fn test_exception_trace_only_when_requested() {
        let actual = ActualResult::Exception(ActualException {
            class: "CatalogError".into(),
            message: "outer".into(),
            root_cause_message: "inner".into(),
            stack_trace: "CatalogError: outer".into(),
        });
        let plain = to_fixture(&actual, false);
        let exception = plain.exception.unwrap();
        assert_eq!(exception.message.as_deref(), Some("inner"));
        assert!(exception.stack_trace.is_none());

        let traced = to_fixture(&actual, true);
        assert_eq!(
            traced.exception.unwrap().stack_trace.as_deref(),
            Some("CatalogError: outer")
        );
    }
}
