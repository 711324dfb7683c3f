pub mod aggregates;
pub mod criteria;
pub mod dataset;
pub mod evaluate;
pub mod format;
pub mod io;
pub mod metadata;
#[cfg(feature = "python")]
pub mod python;
pub mod registry;
pub mod series;
pub mod units;

pub mod errors;
