//! Scenario metadata pipeline.
//!
//! Loads IAM scenario data, fills missing aggregate variables, evaluates the configured
//! criteria with [`scenmeta_core`] and exports the data with a metadata sheet.

pub mod config;
pub mod export;
pub mod pipeline;
#[cfg(feature = "python")]
pub mod python;

pub mod errors;
