//! Pipeline configuration.
//!
//! ```toml
//! input = "download/VanDeVenEtAl_2023_NCC_outputs/global_ite2_allmodels.csv"
//! output = "output/global_ite2_allmodels_meta.xlsx"
//!
//! [[aggregates]]
//! variable = "Primary Energy|Non-Biomass Renewables"
//!
//! # Omit to use the standard criteria
//! [criteria.change.pct_change_co2_2020_2030]
//! name = "Change in CO2 emissions in 2030 (% change rel to 2020)"
//! variable = "Emissions|CO2"
//! reference_year = 2020
//! target_year = 2030
//! ```

use crate::errors::{PipelineError, PipelineResult};
use scenmeta_core::registry::CriteriaRegistry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An aggregate variable to fill in where missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateSpec {
    pub variable: String,
    /// Explicit components. The direct hierarchy children are used when absent.
    #[serde(default)]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub aggregates: Vec<AggregateSpec>,
    #[serde(default)]
    pub criteria: Option<CriteriaRegistry>,
}

impl PipelineConfig {
    pub fn from_toml_str(input: &str) -> PipelineResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Read a config file. Relative `input` and `output` paths are resolved against the
    /// directory of the config file.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if let Some(dir) = path.parent() {
            config.input = config.input.map(|p| dir.join(p));
            config.output = config.output.map(|p| dir.join(p));
        }
        Ok(config)
    }

    /// The configured registry, or the standard one.
    pub fn registry(&self) -> CriteriaRegistry {
        self.criteria
            .clone()
            .unwrap_or_else(CriteriaRegistry::standard)
    }

    pub fn input(&self) -> PipelineResult<&Path> {
        self.input
            .as_deref()
            .ok_or(PipelineError::MissingPath("input"))
    }

    pub fn output(&self) -> PipelineResult<&Path> {
        self.output
            .as_deref()
            .ok_or(PipelineError::MissingPath("output"))
    }
}
