//! Error taxonomy for loading, bucketing and tabulating survey responses.

use serde::Serialize;
use thiserror::Error;

/// Every failure the pipeline can produce.
///
/// `Parse`, `Coercion` and `EmptySelection` are isolated to a row, a
/// question or a selection and normally travel inside a report as a
/// [`ReportedIssue`]. The file, fetch and config variants are fatal for the
/// invocation.
#[derive(Debug, Clone, Error)]
pub enum SurveyError {
    #[error("row {row}: timestamp '{value}' does not match format '{format}'")]
    Parse {
        row: usize,
        value: String,
        format: String,
    },

    #[error("question '{question}' row {row}: '{value}' is not an integer")]
    Coercion {
        question: String,
        row: usize,
        value: String,
    },

    #[error("no {what} selected")]
    EmptySelection { what: String },

    #[error("input file not found: {path}")]
    MissingFile { path: String },

    #[error("could not read {source_name}: {reason}")]
    UnreadableFile { source_name: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl SurveyError {
    /// Short machine-readable name used when the error is reported to a renderer.
    pub fn kind(&self) -> &'static str {
        match self {
            SurveyError::Parse { .. } => "parse_error",
            SurveyError::Coercion { .. } => "coercion_error",
            SurveyError::EmptySelection { .. } => "empty_selection",
            SurveyError::MissingFile { .. } => "missing_file",
            SurveyError::UnreadableFile { .. } => "unreadable_file",
            SurveyError::Fetch { .. } => "fetch_error",
            SurveyError::Config(_) => "config_error",
        }
    }

    /// Whether the error stops the whole invocation.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SurveyError::Parse { .. }
                | SurveyError::Coercion { .. }
                | SurveyError::EmptySelection { .. }
        )
    }
}

/// A non-fatal error tagged with the row or question it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedIssue {
    pub kind: String,
    pub row: Option<usize>,
    pub question: Option<String>,
    pub message: String,
}

impl From<&SurveyError> for ReportedIssue {
    fn from(err: &SurveyError) -> Self {
        let (row, question) = match err {
            SurveyError::Parse { row, .. } => (Some(*row), None),
            SurveyError::Coercion { question, row, .. } => (Some(*row), Some(question.clone())),
            _ => (None, None),
        };

        ReportedIssue {
            kind: err.kind().to_string(),
            row,
            question,
            message: err.to_string(),
        }
    }
}
