use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::analyzers::aggregate::rating_series;
use crate::analyzers::bucket::parse_date;
use crate::analyzers::numeric::{coerce_integers, rating_questions};
use crate::analyzers::tabulate::tabulate;
use crate::analyzers::types::{DashboardReport, ResponseRecord, Selection};
use crate::config::{PipelineConfig, TimestampErrors};
use crate::error::{ReportedIssue, SurveyError};
use crate::parser::Dataset;
use crate::stats::DatasetStats;

/// Records with their derived date and bucket filled in.
#[derive(Debug, Clone)]
pub struct Classified {
    pub records: Vec<ResponseRecord>,
    /// Bucket labels in the order they first appear in the data.
    pub buckets: Vec<String>,
    /// Row-level timestamp failures (only when strictness is `skip`).
    pub parse_errors: Vec<SurveyError>,
}

impl Classified {
    pub fn bucketed(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| r.bucket.is_some())
    }
}

/// Parses every timestamp and assigns a bucket label.
///
/// With [`TimestampErrors::Abort`] the first unparsable timestamp fails the
/// call; otherwise the row keeps `date = None` and its error is collected.
pub fn classify(dataset: &Dataset, config: &PipelineConfig) -> Result<Classified, SurveyError> {
    let policy = config.bucket_policy()?;

    let mut records = Vec::with_capacity(dataset.records.len());
    let mut buckets: Vec<String> = Vec::new();
    let mut parse_errors = Vec::new();

    for raw in &dataset.records {
        let mut record = raw.clone();

        match parse_date(&record.timestamp, &config.timestamp_format, record.row) {
            Ok(date) => {
                record.date = Some(date);
                record.bucket = policy.assign(date).map(str::to_string);
                if let Some(label) = &record.bucket {
                    if !buckets.contains(label) {
                        buckets.push(label.clone());
                    }
                }
            }
            Err(e) => match config.timestamp_errors {
                TimestampErrors::Abort => return Err(e),
                TimestampErrors::Skip => {
                    debug!(row = record.row, error = %e, "Skipping row with bad timestamp");
                    parse_errors.push(e);
                }
            },
        }

        records.push(record);
    }

    if !parse_errors.is_empty() {
        warn!(
            skipped = parse_errors.len(),
            format = %config.timestamp_format,
            "Rows skipped because their timestamp did not parse"
        );
    }

    Ok(Classified {
        records,
        buckets,
        parse_errors,
    })
}

/// Lists the bucket labels present in the dataset, in first-seen order.
pub fn bucket_labels(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<String>, SurveyError> {
    Ok(classify(dataset, config)?.buckets)
}

/// Runs the whole pipeline: classify, detect rating questions, tabulate the
/// selected buckets and questions, and average the rating questions.
///
/// Only fatal errors (bad config, aborting strictness) are returned as
/// `Err`. Row, question and selection problems are reported in
/// [`DashboardReport::issues`] and the rest of the report is still built.
#[tracing::instrument(skip_all, fields(source = %dataset.source))]
pub fn compute(
    dataset: &Dataset,
    config: &PipelineConfig,
    selection: &Selection,
) -> Result<DashboardReport, SurveyError> {
    let classified = classify(dataset, config)?;
    let mut issues: Vec<SurveyError> = classified.parse_errors.clone();

    let rating = rating_questions(&classified.records, &config.numeric_denylist);

    let buckets: Vec<String> = match &selection.buckets {
        None => classified.buckets.clone(),
        Some(selected) => {
            for label in selected {
                if !classified.buckets.contains(label) {
                    warn!(bucket = %label, "Selected bucket has no responses");
                }
            }
            selected.clone()
        }
    };
    if buckets.is_empty() && selection.buckets.is_some() {
        issues.push(SurveyError::EmptySelection {
            what: "buckets".into(),
        });
    }

    let mut questions: Vec<String> = Vec::new();
    for record in classified.bucketed() {
        if !questions.contains(&record.question) {
            questions.push(record.question.clone());
        }
    }
    if let Some(selected) = &selection.questions {
        if selected.is_empty() {
            issues.push(SurveyError::EmptySelection {
                what: "questions".into(),
            });
        }
        questions.retain(|q| selected.contains(q));
    }

    let mut blocked: HashSet<String> = HashSet::new();
    if config.integer_choices {
        for question in &questions {
            if let Err(e) = coerce_integers(question, classified.bucketed()) {
                warn!(question = %question, error = %e, "Question blocked: choices are not all integers");
                blocked.insert(question.clone());
                issues.push(e);
            }
        }
    }
    questions.retain(|q| !blocked.contains(q));

    let mut tables = Vec::new();
    for bucket in &buckets {
        let mut seen: Vec<&str> = Vec::new();
        for record in classified.bucketed() {
            if record.bucket.as_deref() == Some(bucket.as_str())
                && questions.contains(&record.question)
                && !seen.contains(&record.question.as_str())
            {
                seen.push(&record.question);
            }
        }

        for question in seen {
            tables.push(tabulate(classified.bucketed(), question, Some(bucket.as_str())));
        }
    }

    let mut ratings = rating_series(classified.bucketed(), &rating, &questions, &buckets);
    ratings.retain(|s| !s.points.is_empty());

    let summary = DatasetStats::from_records(
        &dataset.source,
        &classified.records,
        dataset.blank_rows,
        &classified.buckets,
    );

    info!(
        rows = summary.total_rows,
        bucketed = summary.bucketed,
        buckets = buckets.len(),
        tables = tables.len(),
        ratings = ratings.len(),
        issues = issues.len(),
        "Dashboard computed"
    );

    Ok(DashboardReport {
        summary,
        buckets: classified.buckets,
        rating_questions: rating,
        tables,
        ratings,
        issues: issues.iter().map(ReportedIssue::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PolicyKind, WindowSpec};
    use chrono::NaiveDate;

    fn dataset(rows: &[(&str, &str, &str)]) -> Dataset {
        Dataset {
            source: "mem".into(),
            records: rows
                .iter()
                .enumerate()
                .map(|(i, (ts, q, c))| ResponseRecord::new(i + 1, *ts, *q, *c))
                .collect(),
            blank_rows: 0,
        }
    }

    fn sample() -> Dataset {
        dataset(&[
            ("5/13/24 09:00", "Fun?", "5"),
            ("5/14/24 20:00", "Fun?", "1"),
            ("5/15/24 10:00", "Fun?", "4"),
            ("5/15/24 10:05", "Fun?", "2"),
            ("5/15/24 10:06", "Seat", "Upper"),
            ("5/18/24 11:00", "Fun?", "5"),
            ("5/18/24 11:00", "Seat", "Lower"),
            ("5/18/24 11:02", "Test Question", "3"),
            ("garbage", "Fun?", "1"),
        ])
    }

    #[test]
    fn test_classify_two_window() {
        let classified = classify(&sample(), &PipelineConfig::default()).unwrap();

        let buckets: Vec<Option<&str>> = classified
            .records
            .iter()
            .map(|r| r.bucket.as_deref())
            .collect();
        assert_eq!(buckets[0], None);
        assert_eq!(buckets[1], None);
        assert_eq!(buckets[2], Some("2024-05-14"));
        assert_eq!(buckets[5], Some("2024-05-17"));
        assert_eq!(classified.buckets, vec!["2024-05-14", "2024-05-17"]);
        assert_eq!(classified.parse_errors.len(), 1);
    }

    #[test]
    fn test_abort_strictness_fails_on_bad_timestamp() {
        let config = PipelineConfig {
            timestamp_errors: TimestampErrors::Abort,
            ..Default::default()
        };

        match classify(&sample(), &config) {
            Err(SurveyError::Parse { row, .. }) => assert_eq!(row, 9),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_compute_builds_tables_per_bucket_and_question() {
        let report = compute(&sample(), &PipelineConfig::default(), &Selection::all()).unwrap();

        let keys: Vec<(Option<&str>, &str)> = report
            .tables
            .iter()
            .map(|t| (t.bucket.as_deref(), t.question.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some("2024-05-14"), "Fun?"),
                (Some("2024-05-14"), "Seat"),
                (Some("2024-05-17"), "Fun?"),
                (Some("2024-05-17"), "Seat"),
                (Some("2024-05-17"), "Test Question"),
            ]
        );
        assert_eq!(report.tables[0].counts(), vec![("2", 1), ("4", 1)]);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, "parse_error");
        assert_eq!(report.issues[0].row, Some(9));
    }

    #[test]
    fn test_compute_rating_questions_and_means() {
        let report = compute(&sample(), &PipelineConfig::default(), &Selection::all()).unwrap();

        assert_eq!(report.rating_questions, vec!["Fun?"]);
        assert_eq!(report.ratings.len(), 1);
        let fun = &report.ratings[0];
        assert_eq!(fun.mean_for("2024-05-14"), Some(3.0));
        assert_eq!(fun.mean_for("2024-05-17"), Some(5.0));
    }

    #[test]
    fn test_compute_respects_selection() {
        let selection = Selection::all()
            .with_buckets(vec!["2024-05-17".into()])
            .with_questions(vec!["Seat".into()]);
        let report = compute(&sample(), &PipelineConfig::default(), &selection).unwrap();

        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].counts(), vec![("Lower", 1)]);
        assert!(report.ratings.is_empty());
    }

    #[test]
    fn test_empty_selection_returns_empty_report() {
        let selection = Selection::all().with_questions(vec![]);
        let report = compute(&sample(), &PipelineConfig::default(), &selection).unwrap();

        assert!(report.tables.is_empty());
        assert!(report.ratings.is_empty());
        assert!(report.issues.iter().any(|i| i.kind == "empty_selection"));

        let selection = Selection::all().with_buckets(vec![]);
        let report = compute(&sample(), &PipelineConfig::default(), &selection).unwrap();
        assert!(report.tables.is_empty());
        assert!(report.ratings.is_empty());
        assert!(report.issues.iter().any(|i| i.message.contains("buckets")));
    }

    #[test]
    fn test_integer_mode_blocks_only_offending_question() {
        let data = dataset(&[
            ("5/15/24 10:00", "Score", "3"),
            ("5/15/24 10:00", "Score", "4"),
            ("5/15/24 10:00", "Mood", "4"),
            ("5/15/24 10:01", "Mood", "meh"),
        ]);
        let config = PipelineConfig {
            integer_choices: true,
            ..Default::default()
        };
        let report = compute(&data, &config, &Selection::all()).unwrap();

        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].question, "Score");
        let coercion: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.kind == "coercion_error")
            .collect();
        assert_eq!(coercion.len(), 1);
        assert_eq!(coercion[0].question.as_deref(), Some("Mood"));
        assert_eq!(coercion[0].row, Some(4));
    }

    #[test]
    fn test_general_policy_pipeline() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let config = PipelineConfig {
            bucket_policy: PolicyKind::General,
            windows: vec![
                WindowSpec {
                    start: d("2024-05-14"),
                    end: Some(d("2024-05-17")),
                    label: Some("5-14".into()),
                },
                WindowSpec {
                    start: d("2024-05-17"),
                    end: Some(d("2024-05-23")),
                    label: Some("5-17".into()),
                },
            ],
            ..Default::default()
        };
        let data = dataset(&[
            ("5/14/24 08:00", "Fun?", "2"),
            ("5/20/24 08:00", "Fun?", "4"),
            ("6/01/24 08:00", "Fun?", "1"),
        ]);
        let report = compute(&data, &config, &Selection::all()).unwrap();

        assert_eq!(report.buckets, vec!["5-14", "5-17"]);
        assert_eq!(report.summary.unbucketed, 1);
        assert_eq!(report.ratings[0].mean_for("5-17"), Some(4.0));
    }

    #[test]
    fn test_compute_is_repeatable() {
        let data = sample();
        let config = PipelineConfig::default();
        let first = compute(&data, &config, &Selection::all()).unwrap();
        let second = compute(&data, &config, &Selection::all()).unwrap();

        assert_eq!(first, second);
    }
}
