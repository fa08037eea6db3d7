//! Data types used by the classification and aggregation pipeline.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ReportedIssue;
use crate::stats::DatasetStats;

/// Display name for rows that fall in no window.
pub const UNBUCKETED: &str = "unbucketed";

/// One survey answer, as read from the CSV plus the fields derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    /// 1-based data row number in the source file.
    pub row: usize,
    pub timestamp: String,
    pub question: String,
    pub choice_text: String,
    pub date: Option<NaiveDate>,
    pub bucket: Option<String>,
}

impl ResponseRecord {
    pub fn new(
        row: usize,
        timestamp: impl Into<String>,
        question: impl Into<String>,
        choice_text: impl Into<String>,
    ) -> Self {
        Self {
            row,
            timestamp: timestamp.into(),
            question: question.into(),
            choice_text: choice_text.into(),
            date: None,
            bucket: None,
        }
    }
}

/// A single choice and how often it was picked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceCount {
    pub choice: String,
    pub count: usize,
}

/// Which presentation of a [`QuestionChoiceTable`] to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableView {
    #[default]
    Counts,
    Cumulative,
    Percent,
}

/// Choice frequencies for one question, optionally restricted to a bucket.
///
/// `choices` is ordered ascending by choice value: numerically when every
/// choice is a number, lexically otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionChoiceTable {
    pub question: String,
    pub bucket: Option<String>,
    pub numeric: bool,
    pub choices: Vec<ChoiceCount>,
}

/// Mean rating of a question within one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingPoint {
    pub bucket: String,
    pub mean: f64,
    pub responses: usize,
}

/// Per-bucket mean ratings for one rating question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSeries {
    pub question: String,
    pub points: Vec<RatingPoint>,
}

impl RatingSeries {
    pub fn mean_for(&self, bucket: &str) -> Option<f64> {
        self.points.iter().find(|p| p.bucket == bucket).map(|p| p.mean)
    }
}

/// What the caller wants to see. `None` means "everything"; an empty list
/// is an explicit empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub buckets: Option<Vec<String>>,
    pub questions: Option<Vec<String>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_buckets(mut self, buckets: Vec<String>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.questions = Some(questions);
        self
    }
}

/// Everything a renderer needs for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub summary: DatasetStats,
    pub buckets: Vec<String>,
    pub rating_questions: Vec<String>,
    pub tables: Vec<QuestionChoiceTable>,
    pub ratings: Vec<RatingSeries>,
    pub issues: Vec<ReportedIssue>,
}
