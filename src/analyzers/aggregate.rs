use std::collections::HashMap;

use crate::analyzers::numeric::parse_number;
use crate::analyzers::types::{RatingPoint, RatingSeries, ResponseRecord};
use crate::analyzers::utility::{mean, order_bucket_labels};

/// Computes mean ratings per bucket for each selected rating question.
///
/// Only records whose question is in `rating_set` and that carry a bucket
/// are considered. `bucket_order` is the discovery (or selection) order of
/// bucket labels; it is sorted chronologically when every label is a
/// `YYYY-MM-DD` date. Selected questions outside the rating set are skipped.
pub fn rating_series<'a, I>(
    records: I,
    rating_set: &[String],
    selected: &[String],
    bucket_order: &[String],
) -> Vec<RatingSeries>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    let mut buckets = bucket_order.to_vec();
    order_bucket_labels(&mut buckets);

    let mut values: HashMap<(&str, &str), Vec<f64>> = HashMap::new();

    for record in records {
        let Some(bucket) = record.bucket.as_deref() else {
            continue;
        };
        if !rating_set.contains(&record.question) || !selected.contains(&record.question) {
            continue;
        }
        // Rating-set membership already guarantees every value parses.
        if let Some(v) = parse_number(&record.choice_text) {
            values
                .entry((bucket, record.question.as_str()))
                .or_default()
                .push(v);
        }
    }

    selected
        .iter()
        .filter(|q| rating_set.contains(q))
        .map(|question| {
            let points = buckets
                .iter()
                .filter_map(|bucket| {
                    values
                        .get(&(bucket.as_str(), question.as_str()))
                        .map(|series| RatingPoint {
                            bucket: bucket.clone(),
                            mean: mean(series),
                            responses: series.len(),
                        })
                })
                .collect();

            RatingSeries {
                question: question.clone(),
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bucket: Option<&str>, question: &str, choice: &str) -> ResponseRecord {
        let mut r = ResponseRecord::new(1, "5/15/24 10:00", question, choice);
        r.bucket = bucket.map(str::to_string);
        r
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_mean_per_bucket() {
        let data = vec![
            record(Some("2024-05-14"), "Fun", "1"),
            record(Some("2024-05-14"), "Fun", "2.5"),
            record(Some("2024-05-14"), "Fun", "3"),
            record(Some("2024-05-17"), "Fun", "4"),
            record(None, "Fun", "100"),
        ];
        let series = rating_series(
            &data,
            &s(&["Fun"]),
            &s(&["Fun"]),
            &s(&["2024-05-17", "2024-05-14"]),
        );

        assert_eq!(series.len(), 1);
        let fun = &series[0];
        assert_eq!(fun.points[0].bucket, "2024-05-14");
        assert!((fun.points[0].mean - 6.5 / 3.0).abs() < 1e-9);
        assert_eq!(fun.points[0].responses, 3);
        assert_eq!(fun.mean_for("2024-05-17"), Some(4.0));
        assert_eq!(fun.points.len(), 2);
    }

    #[test]
    fn test_non_date_labels_keep_discovery_order() {
        let data = vec![
            record(Some("Opener"), "Fun", "2"),
            record(Some("Finals"), "Fun", "4"),
        ];
        let series = rating_series(&data, &s(&["Fun"]), &s(&["Fun"]), &s(&["Opener", "Finals"]));

        let order: Vec<&str> = series[0].points.iter().map(|p| p.bucket.as_str()).collect();
        assert_eq!(order, vec!["Opener", "Finals"]);
    }

    #[test]
    fn test_questions_outside_rating_set_are_skipped() {
        let data = vec![
            record(Some("2024-05-14"), "Fun", "2"),
            record(Some("2024-05-14"), "Seat", "Upper"),
        ];
        let series = rating_series(
            &data,
            &s(&["Fun"]),
            &s(&["Seat", "Fun"]),
            &s(&["2024-05-14"]),
        );

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].question, "Fun");
    }

    #[test]
    fn test_unselected_bucket_is_left_out() {
        let data = vec![
            record(Some("2024-05-14"), "Fun", "2"),
            record(Some("2024-05-17"), "Fun", "4"),
        ];
        let series = rating_series(&data, &s(&["Fun"]), &s(&["Fun"]), &s(&["2024-05-17"]));

        assert_eq!(series[0].points.len(), 1);
        assert_eq!(series[0].mean_for("2024-05-14"), None);
    }
}
