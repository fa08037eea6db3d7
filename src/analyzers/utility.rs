use chrono::NaiveDate;

use crate::analyzers::bucket::LABEL_FORMAT;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Share of `part` in `total` as a percentage. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Orders bucket labels chronologically when all of them are `YYYY-MM-DD`
/// dates; otherwise keeps the given order.
pub fn order_bucket_labels(labels: &mut [String]) {
    let dates: Option<Vec<NaiveDate>> = labels
        .iter()
        .map(|l| NaiveDate::parse_from_str(l, LABEL_FORMAT).ok())
        .collect();

    if dates.is_some() {
        labels.sort();
    }
}
