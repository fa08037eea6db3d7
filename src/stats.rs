use serde::Serialize;

use crate::analyzers::types::ResponseRecord;
use crate::analyzers::utility::pct;

/// Number of responses that landed in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub bucket: String,
    pub responses: usize,
    /// Share of all bucketed responses, in percent.
    pub share: f64,
}

/// Row-level summary of a classified dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub source: String,
    pub total_rows: usize,
    pub blank_rows: usize,
    pub parse_failures: usize,
    pub bucketed: usize,
    pub unbucketed: usize,
    pub questions: usize,
    pub buckets: Vec<BucketCount>,
}

impl DatasetStats {
    /// Summarises classified records. `bucket_order` fixes the order of
    /// [`DatasetStats::buckets`]; records with a date but no bucket count as
    /// unbucketed, records without a date as parse failures.
    pub fn from_records(
        source: &str,
        records: &[ResponseRecord],
        blank_rows: usize,
        bucket_order: &[String],
    ) -> Self {
        let mut s = DatasetStats {
            source: source.to_string(),
            total_rows: records.len() + blank_rows,
            blank_rows,
            ..Default::default()
        };

        let mut questions: Vec<&str> = Vec::new();
        for r in records {
            if !questions.contains(&r.question.as_str()) {
                questions.push(&r.question);
            }

            match (&r.date, &r.bucket) {
                (None, _) => s.parse_failures += 1,
                (Some(_), None) => s.unbucketed += 1,
                (Some(_), Some(_)) => s.bucketed += 1,
            }
        }
        s.questions = questions.len();

        s.buckets = bucket_order
            .iter()
            .map(|label| {
                let responses = records
                    .iter()
                    .filter(|r| r.bucket.as_deref() == Some(label.as_str()))
                    .count();
                BucketCount {
                    bucket: label.clone(),
                    responses,
                    share: pct(responses, s.bucketed),
                }
            })
            .collect();

        s
    }

    pub fn bucketed_pct(&self) -> f64 {
        pct(self.bucketed, self.total_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(question: &str, dated: bool, bucket: Option<&str>) -> ResponseRecord {
        let mut r = ResponseRecord::new(1, "x", question, "1");
        if dated {
            r.date = NaiveDate::from_ymd_opt(2024, 5, 15);
        }
        r.bucket = bucket.map(str::to_string);
        r
    }

    #[test]
    fn test_from_records_empty() {
        let stats = DatasetStats::from_records("mem", &[], 0, &[]);

        assert_eq!(stats.total_rows, 0);
        assert_eq!(stats.bucketed_pct(), 0.0);
        assert!(stats.buckets.is_empty());
    }

    #[test]
    fn test_from_records_counts_each_outcome() {
        let records = vec![
            record("A", true, Some("2024-05-14")),
            record("A", true, Some("2024-05-14")),
            record("B", true, Some("2024-05-17")),
            record("B", true, None),
            record("C", false, None),
        ];
        let order = vec!["2024-05-14".to_string(), "2024-05-17".to_string()];
        let stats = DatasetStats::from_records("mem", &records, 1, &order);

        assert_eq!(stats.total_rows, 6);
        assert_eq!(stats.bucketed, 3);
        assert_eq!(stats.unbucketed, 1);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.questions, 3);
        assert_eq!(stats.buckets[0].responses, 2);
        assert_eq!(stats.buckets[1].bucket, "2024-05-17");
        assert_eq!(stats.buckets[1].responses, 1);
        assert_eq!(stats.bucketed_pct(), 50.0);
    }
}
