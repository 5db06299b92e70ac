//! Cost-rate reporting over quotation exports.
//!
//! Loads per-brand cost line items, splits them into the current season and
//! the one a year earlier, and produces quantity-weighted cost-rate
//! summaries, item tables and margin analyses.
pub mod config;
pub mod error;
pub mod fx;
pub mod loader;
pub mod logging;
pub mod output;
pub mod rate;
pub mod reports;
pub mod season;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
