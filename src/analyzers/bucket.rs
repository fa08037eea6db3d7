//! Timestamp parsing and game-day bucketing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Format name that switches [`parse_date`] to ISO-8601 handling.
pub const ISO8601: &str = "iso8601";

/// Label format used for window labels derived from a start date.
pub const LABEL_FORMAT: &str = "%Y-%m-%d";

/// Parses a raw timestamp into a calendar date, discarding the time of day.
///
/// `format` is either a chrono pattern (date-time or date-only) or the
/// literal [`ISO8601`]. `row` is only used to tag the error.
pub fn parse_date(raw: &str, format: &str, row: usize) -> Result<NaiveDate, SurveyError> {
    let value = raw.trim();

    let parsed = if format.eq_ignore_ascii_case(ISO8601) {
        parse_iso8601(value)
    } else {
        NaiveDateTime::parse_from_str(value, format)
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(value, format))
            .ok()
    };

    parsed.ok_or_else(|| SurveyError::Parse {
        row,
        value: raw.to_string(),
        format: format.to_string(),
    })
}

fn parse_iso8601(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, LABEL_FORMAT).ok()
}

/// A labeled half-open date interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl BucketWindow {
    /// Window labeled with its start date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            label: start.format(LABEL_FORMAT).to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    fn overlaps(&self, other: &BucketWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// How dates are mapped to bucket labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketPolicy {
    /// Two boundaries A < B. Dates on or before A are unbucketed, dates
    /// strictly between go to A's label, and dates on or after B go to B's.
    TwoWindow {
        first: NaiveDate,
        first_label: String,
        second: NaiveDate,
        second_label: String,
    },
    /// Ordered `[start, end)` windows, first match wins.
    General { windows: Vec<BucketWindow> },
}

impl BucketPolicy {
    pub fn two_window(first: NaiveDate, second: NaiveDate) -> Result<Self, SurveyError> {
        if first >= second {
            return Err(SurveyError::Config(format!(
                "two-window boundaries must be increasing, got {first} and {second}"
            )));
        }
        Ok(BucketPolicy::TwoWindow {
            first,
            first_label: first.format(LABEL_FORMAT).to_string(),
            second,
            second_label: second.format(LABEL_FORMAT).to_string(),
        })
    }

    /// Builds a general policy.
    ///
    /// Overlapping windows are accepted (the earlier window wins) and logged;
    /// empty windows and duplicate labels are rejected.
    pub fn general(windows: Vec<BucketWindow>) -> Result<Self, SurveyError> {
        for (i, w) in windows.iter().enumerate() {
            if w.start >= w.end {
                return Err(SurveyError::Config(format!(
                    "window '{}' is empty: start {} is not before end {}",
                    w.label, w.start, w.end
                )));
            }
            for earlier in &windows[..i] {
                if earlier.label == w.label {
                    return Err(SurveyError::Config(format!(
                        "duplicate window label '{}'",
                        w.label
                    )));
                }
                if earlier.overlaps(w) {
                    tracing::warn!(
                        earlier = %earlier.label,
                        later = %w.label,
                        "Bucket windows overlap; earlier window wins"
                    );
                }
            }
        }
        Ok(BucketPolicy::General { windows })
    }

    /// Returns the label for `date`, or `None` when it is unbucketed.
    pub fn assign(&self, date: NaiveDate) -> Option<&str> {
        match self {
            BucketPolicy::TwoWindow {
                first,
                first_label,
                second,
                second_label,
            } => {
                if date >= *second {
                    Some(second_label.as_str())
                } else if date > *first {
                    Some(first_label.as_str())
                } else {
                    None
                }
            }
            BucketPolicy::General { windows } => windows
                .iter()
                .find(|w| w.contains(date))
                .map(|w| w.label.as_str()),
        }
    }

    /// All labels this policy can produce, in configured order.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            BucketPolicy::TwoWindow {
                first_label,
                second_label,
                ..
            } => vec![first_label.as_str(), second_label.as_str()],
            BucketPolicy::General { windows } => windows.iter().map(|w| w.label.as_str()).collect(),
        }
    }
}
