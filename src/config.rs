//! Pipeline configuration.
//!
//! Stored as a JSON object on disk:
//! ```json
//! {
//!   "timestamp_format": "%m/%d/%y %H:%M",
//!   "bucket_policy": "general",
//!   "windows": [
//!     { "start": "2024-05-14", "end": "2024-05-17", "label": "5-14" },
//!     { "start": "2024-05-17", "end": "2024-05-23", "label": "5-17" }
//!   ],
//!   "numeric_denylist": ["Test Question"],
//!   "columns": { "timestamp": ["RESPONSE_TIMESTAMP"] },
//!   "timestamp_errors": "skip",
//!   "integer_choices": false
//! }
//! ```
//! Every field is optional; missing fields fall back to [`PipelineConfig::default`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::bucket::{BucketPolicy, BucketWindow};
use crate::error::SurveyError;

/// Which bucketing rule to apply to `windows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Exactly two windows; only their `start` dates are used as boundaries.
    TwoWindow,
    General,
}

/// What to do with a timestamp that does not match `timestamp_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampErrors {
    /// Record the row as a parse error and keep going.
    #[default]
    Skip,
    /// Fail the whole invocation.
    Abort,
}

/// One entry of the `windows` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WindowSpec {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }
}

/// Accepted header names per logical column, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub timestamp: Vec<String>,
    pub question: Vec<String>,
    pub choice_text: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: vec!["timestamp".into(), "RESPONSE_TIMESTAMP".into()],
            question: vec!["question".into(), "QUESTION".into()],
            choice_text: vec!["choice_text".into(), "CHOICE_TEXT".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub timestamp_format: String,
    pub bucket_policy: PolicyKind,
    pub windows: Vec<WindowSpec>,
    pub numeric_denylist: Vec<String>,
    pub columns: ColumnMapping,
    pub timestamp_errors: TimestampErrors,
    pub integer_choices: bool,
}

impl Default for PipelineConfig {
    /// The 2024 game-day dashboard: two boundaries, 2024-05-14 and 2024-05-17.
    fn default() -> Self {
        let first = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap_or_default();
        let second = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap_or_default();
        Self {
            timestamp_format: "%m/%d/%y %H:%M".to_string(),
            bucket_policy: PolicyKind::TwoWindow,
            windows: vec![WindowSpec::new(first, None), WindowSpec::new(second, None)],
            numeric_denylist: vec!["Test Question".to_string()],
            columns: ColumnMapping::default(),
            timestamp_errors: TimestampErrors::Skip,
            integer_choices: false,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, SurveyError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SurveyError::MissingFile {
                path: path.to_string(),
            },
            _ => SurveyError::UnreadableFile {
                source_name: path.to_string(),
                reason: e.to_string(),
            },
        })?;
        let config = Self::from_json(&content)?;
        debug!(path, policy = ?config.bucket_policy, windows = config.windows.len(), "Config loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, SurveyError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| SurveyError::Config(format!("invalid config JSON: {e}")))?;
        config.bucket_policy()?;
        Ok(config)
    }

    /// Builds the validated bucketing policy described by this config.
    pub fn bucket_policy(&self) -> Result<BucketPolicy, SurveyError> {
        if self.timestamp_format.trim().is_empty() {
            return Err(SurveyError::Config("timestamp_format is empty".into()));
        }

        match self.bucket_policy {
            PolicyKind::TwoWindow => {
                let [first, second] = self.windows.as_slice() else {
                    return Err(SurveyError::Config(format!(
                        "two-window policy needs exactly 2 windows, got {}",
                        self.windows.len()
                    )));
                };
                let mut policy = BucketPolicy::two_window(first.start, second.start)?;
                if let BucketPolicy::TwoWindow {
                    first_label,
                    second_label,
                    ..
                } = &mut policy
                {
                    if let Some(label) = &first.label {
                        first_label.clone_from(label);
                    }
                    if let Some(label) = &second.label {
                        second_label.clone_from(label);
                    }
                    if first_label == second_label {
                        return Err(SurveyError::Config(format!(
                            "duplicate window label '{first_label}'"
                        )));
                    }
                }
                Ok(policy)
            }
            PolicyKind::General => {
                let windows = self
                    .windows
                    .iter()
                    .map(|w| -> Result<BucketWindow, SurveyError> {
                        let end = w.end.ok_or_else(|| {
                            SurveyError::Config(format!(
                                "window starting {} has no end date",
                                w.start
                            ))
                        })?;
                        let window = BucketWindow::new(w.start, end);
                        Ok(match &w.label {
                            Some(label) => window.with_label(label.clone()),
                            None => window,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                BucketPolicy::general(windows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_is_game_day_two_window() {
        let config = PipelineConfig::default();
        let policy = config.bucket_policy().unwrap();

        assert_eq!(policy.assign(d("2024-05-14")), None);
        assert_eq!(policy.assign(d("2024-05-15")), Some("2024-05-14"));
        assert_eq!(policy.assign(d("2024-05-17")), Some("2024-05-17"));
        assert_eq!(config.numeric_denylist, vec!["Test Question"]);
    }

    #[test]
    fn test_general_from_json() {
        let config = PipelineConfig::from_json(
            r#"{
                "bucket_policy": "general",
                "windows": [
                    { "start": "2024-05-14", "end": "2024-05-17", "label": "5-14" },
                    { "start": "2024-05-17", "end": "2024-05-23", "label": "5-17" }
                ],
                "timestamp_errors": "abort"
            }"#,
        )
        .unwrap();

        assert_eq!(config.timestamp_errors, TimestampErrors::Abort);
        assert_eq!(config.timestamp_format, "%m/%d/%y %H:%M");
        let policy = config.bucket_policy().unwrap();
        assert_eq!(policy.assign(d("2024-05-20")), Some("5-17"));
        assert_eq!(policy.assign(d("2024-06-01")), None);
    }

    #[test]
    fn test_two_window_custom_labels() {
        let config = PipelineConfig::from_json(
            r#"{
                "bucket_policy": "two-window",
                "windows": [
                    { "start": "2024-05-14", "label": "Game 1" },
                    { "start": "2024-05-17", "label": "Game 2" }
                ]
            }"#,
        )
        .unwrap();

        let policy = config.bucket_policy().unwrap();
        assert_eq!(policy.labels(), vec!["Game 1", "Game 2"]);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let three = r#"{ "bucket_policy": "two-window", "windows": [
            { "start": "2024-05-01" }, { "start": "2024-05-02" }, { "start": "2024-05-03" } ] }"#;
        assert!(matches!(
            PipelineConfig::from_json(three),
            Err(SurveyError::Config(_))
        ));

        let open_ended = r#"{ "bucket_policy": "general", "windows": [ { "start": "2024-05-01" } ] }"#;
        assert!(PipelineConfig::from_json(open_ended).is_err());

        let unknown_policy = r#"{ "bucket_policy": "weekly" }"#;
        assert!(PipelineConfig::from_json(unknown_policy).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let path = format!("{}/survey_tally_no_such_config.json", env::temp_dir().display());
        let _ = fs::remove_file(&path);

        assert!(matches!(
            PipelineConfig::load(&path),
            Err(SurveyError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = format!("{}/survey_tally_test_config.json", env::temp_dir().display());
        fs::write(&path, r#"{ "timestamp_format": "iso8601", "integer_choices": true }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.timestamp_format, "iso8601");
        assert!(config.integer_choices);
        assert_eq!(config.bucket_policy, PolicyKind::TwoWindow);

        fs::remove_file(&path).unwrap();
    }
}
