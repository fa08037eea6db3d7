pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod stats;

pub use analyzers::analyzer::{bucket_labels, classify, compute};
pub use analyzers::types::{DashboardReport, Selection, TableView};
pub use config::PipelineConfig;
pub use error::SurveyError;
pub use parser::Dataset;
