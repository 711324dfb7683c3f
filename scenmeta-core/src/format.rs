//! Output formatting policy for criterion values.
//!
//! Criteria compute their values with `region` and `unit` index levels and the
//! criterion name attached. A [`FormatPolicy`] is passed alongside the extraction and
//! decides which of these survive:
//!
//! - `keep_regions`: keep or drop the `region` level
//! - `unit`: drop the `unit` level, keep it unchanged, or overwrite it with a fixed label
//! - `keep_name`: keep or clear the series name
//!
//! The default policy drops regions, units and the name, leaving a series indexed by
//! model and scenario only.
//!
//! Policies are plain values, so evaluations using different policies can run side by
//! side.

use crate::errors::{CriteriaError, CriteriaResult};
use crate::series::ResultSeries;
use serde::{Deserialize, Serialize};

/// What to do with the `unit` index level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPolicy {
    #[default]
    Drop,
    Keep,
    /// Overwrite the unit of every row. No check is made that rows agreed beforehand.
    Set(String),
}

/// A loosely typed configuration value, as received from Python.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyValue {
    Bool(bool),
    Str(String),
    /// Any other value, described by its type name
    Other(String),
}

impl PolicyValue {
    fn type_name(&self) -> &str {
        match self {
            PolicyValue::Bool(_) => "bool",
            PolicyValue::Str(_) => "str",
            PolicyValue::Other(name) => name,
        }
    }
}

impl From<bool> for PolicyValue {
    fn from(value: bool) -> Self {
        PolicyValue::Bool(value)
    }
}

impl From<&str> for PolicyValue {
    fn from(value: &str) -> Self {
        PolicyValue::Str(value.to_string())
    }
}

impl TryFrom<PolicyValue> for UnitPolicy {
    type Error = CriteriaError;

    fn try_from(value: PolicyValue) -> CriteriaResult<Self> {
        match value {
            PolicyValue::Bool(false) => Ok(UnitPolicy::Drop),
            PolicyValue::Bool(true) => Ok(UnitPolicy::Keep),
            PolicyValue::Str(label) => Ok(UnitPolicy::Set(label)),
            other => Err(CriteriaError::InvalidConfiguration {
                parameter: "unit".to_string(),
                reason: format!("must be true, false or a string, got {}", other.type_name()),
            }),
        }
    }
}

fn parse_flag(parameter: &str, value: PolicyValue) -> CriteriaResult<bool> {
    match value {
        PolicyValue::Bool(b) => Ok(b),
        other => Err(CriteriaError::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: format!("must be either true or false, got {}", other.type_name()),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatPolicy {
    pub keep_regions: bool,
    pub unit: UnitPolicy,
    pub keep_name: bool,
}

impl FormatPolicy {
    pub fn new(keep_regions: bool, unit: UnitPolicy, keep_name: bool) -> Self {
        Self {
            keep_regions,
            unit,
            keep_name,
        }
    }

    /// Build a policy from untyped values, validating each one.
    pub fn from_values(
        keep_regions: PolicyValue,
        unit: PolicyValue,
        keep_name: PolicyValue,
    ) -> CriteriaResult<Self> {
        Ok(Self {
            keep_regions: parse_flag("keep_regions", keep_regions)?,
            unit: UnitPolicy::try_from(unit)?,
            keep_name: parse_flag("keep_name", keep_name)?,
        })
    }

    pub fn apply(&self, series: ResultSeries) -> ResultSeries {
        let original_name = series.name().map(str::to_string);
        let mut series = if self.keep_regions {
            series
        } else {
            series.drop_region()
        };
        series = match &self.unit {
            UnitPolicy::Drop => series.drop_unit(),
            UnitPolicy::Keep => series,
            UnitPolicy::Set(label) => series.set_unit(label),
        };
        series.set_name(if self.keep_name { original_name } else { None });
        series
    }
}
