//! Choice frequency tables and their count, cumulative and percent views.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::analyzers::numeric::parse_number;
use crate::analyzers::types::{
    ChoiceCount, QuestionChoiceTable, ResponseRecord, TableView, UNBUCKETED,
};

/// Groups the records of `question` (optionally within `bucket`) by choice
/// text and counts them.
///
/// This is the single grouping step; [`QuestionChoiceTable::counts`],
/// [`QuestionChoiceTable::cumulative`] and [`QuestionChoiceTable::percentages`]
/// are views over its result.
pub fn tabulate<'a, I>(records: I, question: &str, bucket: Option<&str>) -> QuestionChoiceTable
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if record.question != question {
            continue;
        }
        if bucket.is_some() && record.bucket.as_deref() != bucket {
            continue;
        }
        *counts.entry(record.choice_text.as_str()).or_default() += 1;
    }

    let numeric = !counts.is_empty() && counts.keys().all(|c| parse_number(c).is_some());

    let mut choices: Vec<ChoiceCount> = counts
        .into_iter()
        .map(|(choice, count)| ChoiceCount {
            choice: choice.to_string(),
            count,
        })
        .collect();

    if numeric {
        choices.sort_by(|a, b| {
            let x = parse_number(&a.choice).unwrap_or(0.0);
            let y = parse_number(&b.choice).unwrap_or(0.0);
            x.partial_cmp(&y)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.choice.cmp(&b.choice))
        });
    } else {
        choices.sort_by(|a, b| a.choice.cmp(&b.choice));
    }

    QuestionChoiceTable {
        question: question.to_string(),
        bucket: bucket.map(str::to_string),
        numeric,
        choices,
    }
}

impl QuestionChoiceTable {
    pub fn total(&self) -> usize {
        self.choices.iter().map(|c| c.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Plain counts in choice order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.choices
            .iter()
            .map(|c| (c.choice.as_str(), c.count))
            .collect()
    }

    /// Running sum of counts along the choice axis.
    pub fn cumulative(&self) -> Vec<(&str, usize)> {
        let mut running = 0;
        self.choices
            .iter()
            .map(|c| {
                running += c.count;
                (c.choice.as_str(), running)
            })
            .collect()
    }

    /// Share of each choice within this table, with one decimal.
    ///
    /// Shares are apportioned in tenths of a percent by largest remainder,
    /// so a non-empty table always sums to exactly 100.0. Ties go to the
    /// earlier choice.
    pub fn percentages(&self) -> Vec<(&str, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }

        let mut tenths: Vec<usize> = Vec::with_capacity(self.choices.len());
        let mut remainders: Vec<(usize, usize)> = Vec::with_capacity(self.choices.len());
        for (i, c) in self.choices.iter().enumerate() {
            let scaled = c.count * 1000;
            tenths.push(scaled / total);
            remainders.push((scaled % total, i));
        }

        let leftover = 1000 - tenths.iter().sum::<usize>();
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for &(_, i) in remainders.iter().take(leftover) {
            tenths[i] += 1;
        }

        self.choices
            .iter()
            .zip(tenths)
            .map(|(c, t)| (c.choice.as_str(), t as f64 / 10.0))
            .collect()
    }

    /// Bucket label for display; [`UNBUCKETED`] when the table spans all buckets.
    pub fn bucket_name(&self) -> &str {
        self.bucket.as_deref().unwrap_or(UNBUCKETED)
    }

    /// Renders the requested view as `(choice, cell)` strings; percentages get
    /// a trailing `%`.
    pub fn render(&self, view: TableView) -> Vec<(String, String)> {
        match view {
            TableView::Counts => self
                .counts()
                .into_iter()
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .collect(),
            TableView::Cumulative => self
                .cumulative()
                .into_iter()
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .collect(),
            TableView::Percent => self
                .percentages()
                .into_iter()
                .map(|(c, p)| (c.to_string(), format_percent(p)))
                .collect(),
        }
    }
}

/// Formats a percentage with one decimal and a trailing `%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}
