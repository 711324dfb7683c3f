//! Registry of named criteria.
//!
//! A [`CriteriaRegistry`] maps short keys (`pct_change_co2_2020_2030`) to criterion
//! definitions, one map per kind, so keys are unique within a kind by construction.
//! Maps keep insertion (or document) order, which is the column order of the metadata.
//!
//! [`CriteriaRegistry::standard`] builds the default set of emissions and energy
//! criteria. Registries can also be read from TOML:
//!
//! ```toml
//! [change.pct_change_co2_2020_2030]
//! name = "Change in CO2 emissions in 2030 (% change rel to 2020)"
//! variable = "Emissions|CO2"
//! reference_year = 2020
//! target_year = 2030
//!
//! [cumulative.cumulative_co2_2020_2100]
//! name = "Cumulative CO2 emissions from 2020 until 2100 (Gt CO2)"
//! variable = "Emissions|CO2"
//! start_year = 2020
//! end_year = 2100
//! unit = "Gt CO2 / yr"
//! cumulative_unit = "Gt CO2"
//! region = "World"
//! ```

use crate::criteria::{
    make_cumulative_criterion, make_pct_change_criterion, make_share_criterion, ChangeCriterion,
    Criterion, CumulativeCriterion, ShareCriterion,
};
use crate::dataset::{Selector, Year};
use crate::errors::{CriteriaError, CriteriaResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Base year for changes and start of cumulative sums.
///
/// No check is made at definition time that scenarios report this year; evaluation
/// fails with [`CriteriaError::MissingYear`] if no scenario does.
pub const REFERENCE_YEAR: Year = 2020;

/// Years at which changes and shares are observed.
pub const OBS_YEARS: [Year; 2] = [2030, 2050];

/// End years of cumulative sums.
pub const CUMULATIVE_END_YEARS: [Year; 1] = [2100];

/// (key, description, variable)
const CHANGE_VARIABLES: &[(&str, &str, &str)] = &[("co2", "CO2 emissions", "Emissions|CO2")];

/// (key, component description, component, total description, total)
const SHARE_VARIABLES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "fe_ind",
        "Electricity",
        "Final Energy|Industry|Electricity",
        "Final Energy, Industrial sector",
        "Final Energy|Industry",
    ),
    (
        "fe_bldng",
        "Electricity",
        "Final Energy|Residential and Commercial|Electricity",
        "Final Energy, Buildings sector",
        "Final Energy|Residential and Commercial",
    ),
];

/// (key, description, variable, unit, cumulative unit)
const CUMULATIVE_VARIABLES: &[(&str, &str, &str, &str, &str)] = &[(
    "co2",
    "CO2 emissions",
    "Emissions|CO2",
    "Gt CO2 / yr",
    "Gt CO2",
)];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaRegistry {
    #[serde(default)]
    pub change: IndexMap<String, ChangeCriterion>,
    #[serde(default)]
    pub share: IndexMap<String, ShareCriterion>,
    #[serde(default)]
    pub cumulative: IndexMap<String, CumulativeCriterion>,
}

impl CriteriaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default emissions and energy criteria.
    pub fn standard() -> Self {
        Self::build(REFERENCE_YEAR, &OBS_YEARS, &CUMULATIVE_END_YEARS)
    }

    /// Build the default criteria for other years.
    pub fn build(reference_year: Year, obs_years: &[Year], cumulative_end_years: &[Year]) -> Self {
        let mut registry = Self::new();

        for &target_year in obs_years {
            for (var_key, descr, variable) in CHANGE_VARIABLES {
                registry.change.insert(
                    format!("pct_change_{var_key}_{reference_year}_{target_year}"),
                    make_pct_change_criterion(
                        reference_year,
                        target_year,
                        *variable,
                        format!(
                            "Change in {descr} in {target_year} (% change rel to {reference_year})"
                        ),
                        Selector::All,
                    ),
                );
            }
        }

        for &year in obs_years {
            for (comp_key, comp_descr, comp_variable, tot_descr, tot_variable) in SHARE_VARIABLES {
                registry.share.insert(
                    format!("share_{comp_key}_{year}"),
                    make_share_criterion(
                        year,
                        *comp_variable,
                        *tot_variable,
                        format!("{comp_descr} share in {tot_descr} in {year} (%)"),
                        Selector::All,
                    ),
                );
            }
        }

        for &end_year in cumulative_end_years {
            for (var_key, descr, variable, unit, cumulative_unit) in CUMULATIVE_VARIABLES {
                registry.cumulative.insert(
                    format!("cumulative_{var_key}_{reference_year}_{end_year}"),
                    make_cumulative_criterion(
                        reference_year,
                        end_year,
                        *variable,
                        format!(
                            "Cumulative {descr} from {reference_year} until {end_year} ({cumulative_unit})"
                        ),
                        Some(unit.to_string()),
                        Some(cumulative_unit.to_string()),
                        Selector::All,
                    ),
                );
            }
        }
        registry
    }

    pub fn from_toml_str(input: &str) -> CriteriaResult<Self> {
        toml::from_str(input).map_err(|e| CriteriaError::InvalidConfiguration {
            parameter: "criteria".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.change.len() + self.share.len() + self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All criteria as (key, criterion) pairs: change, then share, then cumulative.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Criterion)> + '_ {
        let change = self
            .change
            .iter()
            .map(|(k, c)| (k.as_str(), Criterion::from(c.clone())));
        let share = self
            .share
            .iter()
            .map(|(k, c)| (k.as_str(), Criterion::from(c.clone())));
        let cumulative = self
            .cumulative
            .iter()
            .map(|(k, c)| (k.as_str(), Criterion::from(c.clone())));
        change.chain(share).chain(cumulative)
    }
}
