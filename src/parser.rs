//! CSV parser for survey response exports.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::analyzers::types::ResponseRecord;
use crate::config::ColumnMapping;
use crate::error::SurveyError;

/// Survey responses loaded from one source, before bucketing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub source: String,
    pub records: Vec<ResponseRecord>,
    /// Rows dropped because the question or choice cell was empty.
    pub blank_rows: usize,
}

struct Columns {
    timestamp: usize,
    question: usize,
    choice_text: usize,
}

fn find_column(
    headers: &StringRecord,
    candidates: &[String],
    logical: &str,
    source: &str,
) -> Result<usize, SurveyError> {
    headers
        .iter()
        .position(|h| {
            let h = h.trim_start_matches('\u{feff}').trim();
            candidates.iter().any(|c| c.eq_ignore_ascii_case(h))
        })
        .ok_or_else(|| SurveyError::UnreadableFile {
            source_name: source.to_string(),
            reason: format!(
                "missing {logical} column (expected one of: {})",
                candidates.join(", ")
            ),
        })
}

/// Decodes a CSV export into a [`Dataset`].
///
/// Column names are resolved through `columns`; extra columns are ignored.
///
/// # Errors
///
/// Returns [`SurveyError::UnreadableFile`] if a required column is missing
/// or the CSV is malformed.
pub fn parse_responses(
    bytes: &[u8],
    columns: &ColumnMapping,
    source: &str,
) -> Result<Dataset, SurveyError> {
    let unreadable = |reason: String| SurveyError::UnreadableFile {
        source_name: source.to_string(),
        reason,
    };

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::Fields)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| unreadable(e.to_string()))?
        .clone();

    let cols = Columns {
        timestamp: find_column(&headers, &columns.timestamp, "timestamp", source)?,
        question: find_column(&headers, &columns.question, "question", source)?,
        choice_text: find_column(&headers, &columns.choice_text, "choice_text", source)?,
    };

    let mut dataset = Dataset {
        source: source.to_string(),
        ..Default::default()
    };

    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| unreadable(format!("row {row}: {e}")))?;

        let field = |idx: usize| record.get(idx).unwrap_or("");
        let question = field(cols.question);
        let choice_text = field(cols.choice_text);

        if question.is_empty() || choice_text.is_empty() {
            dataset.blank_rows += 1;
            continue;
        }

        dataset.records.push(ResponseRecord::new(
            row,
            field(cols.timestamp),
            question,
            choice_text,
        ));
    }

    debug!(
        source,
        records = dataset.records.len(),
        blank_rows = dataset.blank_rows,
        "Responses parsed"
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercase_headers() {
        let csv = "timestamp,question,choice_text\n5/15/24 10:00,Fun?,4\n5/17/24 12:30,Fun?,5\n";
        let dataset = parse_responses(csv.as_bytes(), &ColumnMapping::default(), "mem").unwrap();

        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0].row, 1);
        assert_eq!(dataset.records[1].timestamp, "5/17/24 12:30");
        assert_eq!(dataset.records[1].choice_text, "5");
    }

    #[test]
    fn test_parse_uppercase_headers_with_extra_columns() {
        let csv = "ID,RESPONSE_TIMESTAMP,QUESTION,CHOICE_TEXT\n\
                   1,2024-05-15T10:00:00,\"Seat, section\",Upper\n";
        let dataset = parse_responses(csv.as_bytes(), &ColumnMapping::default(), "mem").unwrap();

        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].question, "Seat, section");
        assert_eq!(dataset.records[0].choice_text, "Upper");
    }

    #[test]
    fn test_custom_column_mapping() {
        let csv = "when,prompt,answer\n5/15/24 10:00,Fun?,4\n";
        let columns = ColumnMapping {
            timestamp: vec!["when".into()],
            question: vec!["prompt".into()],
            choice_text: vec!["answer".into()],
        };
        let dataset = parse_responses(csv.as_bytes(), &columns, "mem").unwrap();

        assert_eq!(dataset.records[0].question, "Fun?");
    }

    #[test]
    fn test_missing_column_is_unreadable() {
        let csv = "timestamp,question\n5/15/24 10:00,Fun?\n";
        let err = parse_responses(csv.as_bytes(), &ColumnMapping::default(), "mem").unwrap_err();

        match err {
            SurveyError::UnreadableFile { reason, .. } => assert!(reason.contains("choice_text")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_cells_are_counted_not_kept() {
        let csv = "timestamp,question,choice_text\n5/15/24 10:00,Fun?,\n5/15/24 10:00,Fun?,3\n";
        let dataset = parse_responses(csv.as_bytes(), &ColumnMapping::default(), "mem").unwrap();

        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.blank_rows, 1);
        assert_eq!(dataset.records[0].row, 2);
    }

    #[test]
    fn test_byte_order_mark_on_first_header() {
        let csv = "\u{feff}timestamp,question,choice_text\n5/15/24 10:00,Fun?,4\n";
        let dataset = parse_responses(csv.as_bytes(), &ColumnMapping::default(), "mem").unwrap();

        assert_eq!(dataset.records.len(), 1);
    }
}
