//! Output formatting and persistence for dashboard reports.
//!
//! Supports pretty-printing, JSON serialization, plain-text tables and CSV export.

use std::fmt::Write as _;
use std::fs::File;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::tabulate::format_percent;
use crate::analyzers::types::{DashboardReport, QuestionChoiceTable, RatingSeries, TableView};

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &DashboardReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &DashboardReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Renders tables as text, one block per bucket and question.
pub fn render_tables(tables: &[QuestionChoiceTable], view: TableView) -> String {
    let mut out = String::new();

    if tables.is_empty() {
        let _ = writeln!(out, "No responses match this selection.");
        return out;
    }

    let mut current_bucket: Option<&str> = None;
    for table in tables {
        let bucket = table.bucket_name();
        if current_bucket != Some(bucket) {
            let _ = writeln!(out, "Game Day: {bucket}");
            current_bucket = Some(bucket);
        }

        let _ = writeln!(out, "  Question: {} ({} responses)", table.question, table.total());
        let rows = table.render(view);
        let width = rows.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);
        for (choice, cell) in rows {
            let _ = writeln!(out, "    {choice:<width$}  {cell}");
        }
    }

    out
}

/// Renders mean-rating series as text.
pub fn render_ratings(rating_questions: &[String], ratings: &[RatingSeries]) -> String {
    let mut out = String::new();

    if rating_questions.is_empty() {
        let _ = writeln!(out, "No rating questions found.");
        return out;
    }
    let _ = writeln!(out, "Rating questions: {}", rating_questions.join(", "));

    for series in ratings {
        let _ = writeln!(out, "  {}", series.question);
        for point in &series.points {
            let _ = writeln!(
                out,
                "    {}: {:.2} ({} responses)",
                point.bucket, point.mean, point.responses
            );
        }
    }

    out
}

#[derive(Serialize)]
struct TableRow<'a> {
    bucket: &'a str,
    question: &'a str,
    choice: &'a str,
    count: usize,
    cumulative: usize,
    percent: String,
}

/// Writes every table as CSV rows: one row per bucket, question and choice,
/// with the count, cumulative and percent views side by side.
pub fn write_tables_csv(path: &str, tables: &[QuestionChoiceTable]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    let mut rows = 0;
    for table in tables {
        let bucket = table.bucket_name();
        let cumulative = table.cumulative();
        let percentages = table.percentages();

        for ((choice, count), ((_, running), (_, percent))) in table
            .counts()
            .into_iter()
            .zip(cumulative.into_iter().zip(percentages))
        {
            writer.serialize(TableRow {
                bucket,
                question: &table.question,
                choice,
                count,
                cumulative: running,
                percent: format_percent(percent),
            })?;
            rows += 1;
        }
    }
    writer.flush()?;

    debug!(path, rows, "Tables written to CSV");
    Ok(())
}
