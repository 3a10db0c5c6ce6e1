pub mod charts;
pub mod error;
pub mod export;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sources;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use error::{DashboardError, Result};
