//! Criterion definitions and value extraction.
//!
//! Three kinds of criteria are supported, each as its own parameter record wrapped in
//! the [`Criterion`] enum:
//!
//! - [`ChangeCriterion`]: relative change of a variable between a reference year and a
//!   target year, `(x[target] - x[reference]) / x[reference]`
//! - [`ShareCriterion`]: ratio of a component variable to a total in one year
//! - [`CumulativeCriterion`]: sum of a variable over an inclusive range of years
//!
//! Values are extracted with [`CriterionValues::get_values`], which checks that the
//! required years exist for the variable before computing, and formats the output with
//! the supplied [`FormatPolicy`]. Raw values are fractions for change and share criteria;
//! conversion to percent happens in [`crate::evaluate`].

use crate::dataset::{Filter, FloatValue, ScenarioDataset, Selector, Year};
use crate::errors::{CriteriaError, CriteriaResult};
use crate::format::FormatPolicy;
use crate::series::{ResultSeries, SeriesIndex};
use crate::units::conversion_factor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::debug;

/// Relative change of a variable over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeCriterion {
    pub name: String,
    pub reference_year: Year,
    pub target_year: Year,
    pub variable: String,
    #[serde(default)]
    pub region: Selector,
}

/// Share of a component variable in a total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareCriterion {
    pub name: String,
    pub year: Year,
    pub variable_component: String,
    pub variable_total: String,
    #[serde(default)]
    pub region: Selector,
}

/// Cumulative sum of a variable over `start_year..=end_year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CumulativeCriterion {
    pub name: String,
    pub start_year: Year,
    pub end_year: Year,
    pub variable: String,
    /// Unit to convert to before summing
    #[serde(default)]
    pub unit: Option<String>,
    /// Unit label for the output, typically `unit` without the "per year" part.
    ///
    /// This is only a label: no conversion is implied, and it is up to the caller to
    /// keep it consistent with `unit`.
    #[serde(default)]
    pub cumulative_unit: Option<String>,
    #[serde(default)]
    pub region: Selector,
}

impl CumulativeCriterion {
    /// Years included in the sum. Both ends are inclusive.
    pub fn years(&self) -> RangeInclusive<Year> {
        self.start_year..=self.end_year
    }
}

/// Make a criterion that calculates relative change over time.
pub fn make_pct_change_criterion(
    reference_year: Year,
    target_year: Year,
    variable: impl Into<String>,
    name: impl Into<String>,
    region: impl Into<Selector>,
) -> ChangeCriterion {
    ChangeCriterion {
        name: name.into(),
        reference_year,
        target_year,
        variable: variable.into(),
        region: region.into(),
    }
}

/// Make a criterion that calculates the share of `variable_component` in `variable_total`.
pub fn make_share_criterion(
    year: Year,
    variable_component: impl Into<String>,
    variable_total: impl Into<String>,
    name: impl Into<String>,
    region: impl Into<Selector>,
) -> ShareCriterion {
    ShareCriterion {
        name: name.into(),
        year,
        variable_component: variable_component.into(),
        variable_total: variable_total.into(),
        region: region.into(),
    }
}

/// Make a criterion that calculates the cumulative sum of `variable`.
pub fn make_cumulative_criterion(
    start_year: Year,
    end_year: Year,
    variable: impl Into<String>,
    name: impl Into<String>,
    unit: Option<String>,
    cumulative_unit: Option<String>,
    region: impl Into<Selector>,
) -> CumulativeCriterion {
    CumulativeCriterion {
        name: name.into(),
        start_year,
        end_year,
        variable: variable.into(),
        unit,
        cumulative_unit,
        region: region.into(),
    }
}

/// Shared behaviour of all criterion kinds.
pub trait CriterionValues {
    fn name(&self) -> &str;

    fn region(&self) -> &Selector;

    /// (variable, year) pairs that must have data somewhere in the dataset.
    fn required_data(&self) -> Vec<(&str, Year)>;

    /// Values with `region` and `unit` levels and the criterion name attached.
    fn raw_values(&self, dataset: &ScenarioDataset) -> CriteriaResult<ResultSeries>;

    /// Fail if a required year is absent for the criterion's variable in every scenario.
    ///
    /// Gaps in individual scenarios are not errors; they show up as missing values.
    fn validate(&self, dataset: &ScenarioDataset) -> CriteriaResult<()> {
        for (variable, year) in self.required_data() {
            let present = dataset.iter().any(|(key, _)| {
                key.year == year && key.variable == variable && self.region().matches(&key.region)
            });
            if !present {
                return Err(CriteriaError::MissingYear {
                    criterion: self.name().to_string(),
                    variable: variable.to_string(),
                    year,
                });
            }
        }
        Ok(())
    }

    fn get_values(
        &self,
        dataset: &ScenarioDataset,
        policy: &FormatPolicy,
    ) -> CriteriaResult<ResultSeries> {
        self.validate(dataset)?;
        let raw = self.raw_values(dataset)?;
        debug!(criterion = self.name(), rows = raw.len(), "extracted criterion values");
        Ok(policy.apply(raw))
    }
}

impl CriterionValues for ChangeCriterion {
    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &Selector {
        &self.region
    }

    fn required_data(&self) -> Vec<(&str, Year)> {
        vec![
            (self.variable.as_str(), self.reference_year),
            (self.variable.as_str(), self.target_year),
        ]
    }

    fn raw_values(&self, dataset: &ScenarioDataset) -> CriteriaResult<ResultSeries> {
        let selected = dataset.filter(
            &Filter::new()
                .variable(self.variable.as_str())
                .region(self.region.clone())
                .years([self.reference_year, self.target_year]),
        );
        let mut out = ResultSeries::new(Some(self.name.clone()));
        for (key, values) in selected.timeseries() {
            let reference = values
                .get(&self.reference_year)
                .copied()
                .unwrap_or(FloatValue::NAN);
            let target = values
                .get(&self.target_year)
                .copied()
                .unwrap_or(FloatValue::NAN);
            out.push(
                SeriesIndex::new(key.model, key.scenario, key.region, key.unit),
                (target - reference) / reference,
            );
        }
        Ok(out)
    }
}

impl CriterionValues for ShareCriterion {
    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &Selector {
        &self.region
    }

    fn required_data(&self) -> Vec<(&str, Year)> {
        vec![
            (self.variable_component.as_str(), self.year),
            (self.variable_total.as_str(), self.year),
        ]
    }

    fn raw_values(&self, dataset: &ScenarioDataset) -> CriteriaResult<ResultSeries> {
        let in_year = dataset.filter(
            &Filter::new()
                .region(self.region.clone())
                .years([self.year]),
        );

        // (model, scenario, region) -> (unit, value)
        type Lookup = BTreeMap<(String, String, String), (String, FloatValue)>;
        let collect = |variable: &str| -> Lookup {
            in_year
                .filter(&Filter::new().variable(variable))
                .into_iter()
                .map(|(key, value)| ((key.model, key.scenario, key.region), (key.unit, value)))
                .collect()
        };
        let components = collect(&self.variable_component);
        let totals = collect(&self.variable_total);

        let mut out = ResultSeries::new(Some(self.name.clone()));
        let mut keys: Vec<&(String, String, String)> =
            components.keys().chain(totals.keys()).collect();
        keys.sort();
        keys.dedup();
        for key in keys {
            let (model, scenario, region) = key;
            let component = components.get(key);
            let total = totals.get(key);
            let unit = component.or(total).map(|(u, _)| u.clone()).unwrap_or_default();
            let value = match (component, total) {
                (Some((_, c)), Some((_, t))) => c / t,
                _ => FloatValue::NAN,
            };
            out.push(
                SeriesIndex::new(model.clone(), scenario.clone(), region.clone(), unit),
                value,
            );
        }
        Ok(out)
    }
}

impl CriterionValues for CumulativeCriterion {
    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &Selector {
        &self.region
    }

    fn required_data(&self) -> Vec<(&str, Year)> {
        vec![
            (self.variable.as_str(), self.start_year),
            (self.variable.as_str(), self.end_year),
        ]
    }

    fn raw_values(&self, dataset: &ScenarioDataset) -> CriteriaResult<ResultSeries> {
        let selected = dataset.filter(
            &Filter::new()
                .variable(self.variable.as_str())
                .region(self.region.clone())
                .years(self.years()),
        );

        // Sum per (model, scenario, region, unit) after optional unit conversion
        let mut sums: BTreeMap<(String, String, String, String), FloatValue> = BTreeMap::new();
        for (key, values) in selected.timeseries() {
            let (unit, factor) = match &self.unit {
                Some(target) => (target.clone(), conversion_factor(&key.unit, target)?),
                None => (key.unit.clone(), 1.0),
            };
            let total: FloatValue = values.values().sum::<FloatValue>() * factor;
            *sums
                .entry((key.model, key.scenario, key.region, unit))
                .or_insert(0.0) += total;
        }

        let mut out = ResultSeries::new(Some(self.name.clone()));
        for ((model, scenario, region, unit), value) in sums {
            let label = self.cumulative_unit.clone().unwrap_or(unit);
            out.push(SeriesIndex::new(model, scenario, region, label), value);
        }
        Ok(out)
    }
}

/// A criterion of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    Change(ChangeCriterion),
    Share(ShareCriterion),
    Cumulative(CumulativeCriterion),
}

impl Criterion {
    pub fn kind(&self) -> &'static str {
        match self {
            Criterion::Change(_) => "change",
            Criterion::Share(_) => "share",
            Criterion::Cumulative(_) => "cumulative",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Criterion::Change(c) => &c.name,
            Criterion::Share(c) => &c.name,
            Criterion::Cumulative(c) => &c.name,
        }
    }
}

impl From<ChangeCriterion> for Criterion {
    fn from(value: ChangeCriterion) -> Self {
        Criterion::Change(value)
    }
}

impl From<ShareCriterion> for Criterion {
    fn from(value: ShareCriterion) -> Self {
        Criterion::Share(value)
    }
}

impl From<CumulativeCriterion> for Criterion {
    fn from(value: CumulativeCriterion) -> Self {
        Criterion::Cumulative(value)
    }
}
