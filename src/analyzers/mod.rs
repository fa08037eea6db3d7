//! Response classification and aggregation.
//!
//! This module parses response timestamps, assigns each response to a
//! game-day bucket, detects rating questions, builds choice frequency
//! tables and mean-rating series, and publishes the result as JSON to S3.

pub mod aggregate;
pub mod analyzer;
pub mod bucket;
pub mod numeric;
pub mod tabulate;
pub mod types;
pub mod utility;
pub mod writetos3;
