//! CLI entry point for the survey tally tool.
//!
//! Provides subcommands for listing game-day buckets, printing choice
//! frequency tables, printing mean ratings, and exporting the full report
//! as JSON to a file or S3.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use survey_tally::analyzers::writetos3::{encode_json, write_json_to_s3};
use survey_tally::fetch::{BasicClient, load_dataset};
use survey_tally::output::{print_pretty, render_ratings, render_tables, write_tables_csv};
use survey_tally::{DashboardReport, Dataset, PipelineConfig, Selection, TableView, compute};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "survey_tally")]
#[command(about = "Bucket survey responses by game day and tabulate them", long_about = None)]
struct Cli {
    /// JSON pipeline config (falls back to SURVEY_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Counts,
    Cumulative,
    Percent,
}

impl From<View> for TableView {
    fn from(view: View) -> Self {
        match view {
            View::Counts => TableView::Counts,
            View::Cumulative => TableView::Cumulative,
            View::Percent => TableView::Percent,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the game-day buckets present in a CSV
    Buckets {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Print choice frequency tables per game day and question
    Tally {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Only these game days (repeatable)
        #[arg(short, long = "bucket")]
        buckets: Vec<String>,

        /// Only these questions (repeatable)
        #[arg(short, long = "question")]
        questions: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = View::Counts)]
        view: View,

        /// Also write the tables to this CSV file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print rating questions and their mean per game day
    Ratings {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long = "bucket")]
        buckets: Vec<String>,

        #[arg(short, long = "question")]
        questions: Vec<String>,
    },
    /// Write the full report as JSON to a file or S3
    Report {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Local JSON file to write
        #[arg(short, long, default_value = "report.json")]
        out: String,

        /// Optional: S3 bucket name to upload the report to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// S3 object key for the report
        #[arg(long, default_value = "dashboards/report.json")]
        key: String,

        /// Gzip compress the report
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

/// Empty flag lists mean "no filter" on the command line.
fn selection(buckets: Vec<String>, questions: Vec<String>) -> Selection {
    let mut selection = Selection::all();
    if !buckets.is_empty() {
        selection = selection.with_buckets(buckets);
    }
    if !questions.is_empty() {
        selection = selection.with_questions(questions);
    }
    selection
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/survey_tally.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("survey_tally.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match cli.config.or_else(|| std::env::var("SURVEY_CONFIG").ok()) {
        Some(path) => PipelineConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => {
            info!("No config given, using built-in game-day defaults");
            PipelineConfig::default()
        }
    };

    match cli.command {
        Commands::Buckets { source } => {
            let dataset = load(&source, &config).await?;
            let report = compute(&dataset, &config, &Selection::all())?;
            report_issues(&report);

            if report.summary.buckets.is_empty() {
                println!("No responses fall in a configured game day.");
            }
            for bucket in &report.summary.buckets {
                println!(
                    "{} ({} responses, {:.1}%)",
                    bucket.bucket, bucket.responses, bucket.share
                );
            }
            println!(
                "{} of {} rows bucketed ({:.1}%), {} unbucketed, {} unparsable",
                report.summary.bucketed,
                report.summary.total_rows,
                report.summary.bucketed_pct(),
                report.summary.unbucketed,
                report.summary.parse_failures
            );
        }
        Commands::Tally {
            source,
            buckets,
            questions,
            view,
            output,
        } => {
            let dataset = load(&source, &config).await?;
            let report = compute(&dataset, &config, &selection(buckets, questions))?;
            report_issues(&report);

            print!("{}", render_tables(&report.tables, view.into()));
            if let Some(path) = output {
                write_tables_csv(&path, &report.tables)?;
                println!("Tables written to {path}.");
            }
        }
        Commands::Ratings {
            source,
            buckets,
            questions,
        } => {
            let dataset = load(&source, &config).await?;
            let report = compute(&dataset, &config, &selection(buckets, questions))?;
            report_issues(&report);

            print!("{}", render_ratings(&report.rating_questions, &report.ratings));
        }
        Commands::Report {
            source,
            out,
            s3_bucket,
            key,
            gzip,
        } => {
            let dataset = load(&source, &config).await?;
            let report = compute(&dataset, &config, &Selection::all())?;
            report_issues(&report);
            print_pretty(&report);

            match s3_bucket {
                Some(bucket) => {
                    let aws = aws_config::load_from_env().await;
                    let s3 = aws_sdk_s3::Client::new(&aws);
                    write_json_to_s3(&s3, &bucket, &key, &report, gzip).await?;
                    println!("Report uploaded to s3://{bucket}/{key}.");
                }
                None => {
                    let (body, _) = encode_json(&report, gzip)?;
                    std::fs::write(&out, body)?;
                    println!("Report written to {out}.");
                }
            }
        }
    }

    Ok(())
}

/// Reads the CSV named on the command line. Missing or malformed input is fatal.
async fn load(source: &str, config: &PipelineConfig) -> Result<Dataset> {
    let client = BasicClient::new();
    let dataset = load_dataset(&client, source, &config.columns)
        .await
        .with_context(|| format!("loading {source}"))?;
    info!(
        source,
        records = dataset.records.len(),
        "Survey responses loaded"
    );
    Ok(dataset)
}

/// Surfaces row, question and selection problems without stopping the run.
fn report_issues(report: &DashboardReport) {
    for issue in &report.issues {
        warn!(
            kind = %issue.kind,
            row = issue.row,
            question = issue.question.as_deref(),
            "{}",
            issue.message
        );
    }
}
