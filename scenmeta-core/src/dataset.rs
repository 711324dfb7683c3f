//! Long-format scenario data.
//!
//! A [`ScenarioDataset`] holds one value per (model, scenario, region, variable, unit, year)
//! key. Missing observations are represented by absent rows rather than stored NaNs, so
//! every operation here only ever sees real numbers.
//!
//! The operations mirror what criteria evaluation and pre-processing need from a
//! tabular data model:
//!
//! - selecting rows with a [`Filter`] (with `*` wildcards, as in IAMC tooling)
//! - partitioning by the set of model/scenario pairs ([`ScenarioDataset::filter_index`])
//! - summing named component variables into an aggregate ([`ScenarioDataset::aggregate`])
//! - concatenating datasets without row loss ([`ScenarioDataset::concat`])
//!
//! # Example
//!
//! ```
//! use scenmeta_core::dataset::{DataKey, Filter, ScenarioDataset};
//!
//! let mut data = ScenarioDataset::new();
//! data.insert(DataKey::new("GCAM", "NPi", "World", "Emissions|CO2", "Mt CO2/yr", 2020), 40.0)
//!     .unwrap();
//! data.insert(DataKey::new("GCAM", "NPi", "World", "Emissions|CO2", "Mt CO2/yr", 2030), 35.0)
//!     .unwrap();
//!
//! let subset = data.filter(&Filter::new().variable("Emissions|*").years([2030]));
//! assert_eq!(subset.len(), 1);
//! ```

use crate::errors::{CriteriaError, CriteriaResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type FloatValue = f64;
pub type Year = i32;

/// Separator between levels of a variable hierarchy (`Primary Energy|Solar`).
pub const HIERARCHY_SEPARATOR: char = '|';

/// Identifies a single model/scenario combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioId {
    pub model: String,
    pub scenario: String,
}

impl ScenarioId {
    pub fn new(model: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model, self.scenario)
    }
}

/// Identifies a timeseries, i.e. a data key without the year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
}

/// Full key of a single observation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DataKey {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    pub year: Year,
}

impl DataKey {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        variable: impl Into<String>,
        unit: impl Into<String>,
        year: Year,
    ) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
            region: region.into(),
            variable: variable.into(),
            unit: unit.into(),
            year,
        }
    }

    pub fn scenario_id(&self) -> ScenarioId {
        ScenarioId::new(self.model.clone(), self.scenario.clone())
    }

    pub fn series_key(&self) -> SeriesKey {
        SeriesKey {
            model: self.model.clone(),
            scenario: self.scenario.clone(),
            region: self.region.clone(),
            variable: self.variable.clone(),
            unit: self.unit.clone(),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.model, self.scenario, self.region, self.variable, self.unit, self.year
        )
    }
}

/// Selects values of one index level.
///
/// Patterns may contain `*`, which matches any run of characters (including the
/// hierarchy separator). A bare `*` selects everything. In configuration files a
/// selector is written either as a single string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SelectorRepr", into = "SelectorRepr")]
pub enum Selector {
    #[default]
    All,
    Patterns(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    One(String),
    Many(Vec<String>),
}

impl From<SelectorRepr> for Selector {
    fn from(value: SelectorRepr) -> Self {
        match value {
            SelectorRepr::One(pattern) => Selector::from(pattern.as_str()),
            SelectorRepr::Many(patterns) => Selector::from(patterns),
        }
    }
}

impl From<Selector> for SelectorRepr {
    fn from(value: Selector) -> Self {
        match value {
            Selector::All => SelectorRepr::One("*".to_string()),
            Selector::Patterns(mut patterns) if patterns.len() == 1 => {
                SelectorRepr::One(patterns.remove(0))
            }
            Selector::Patterns(patterns) => SelectorRepr::Many(patterns),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        if value == "*" {
            Selector::All
        } else {
            Selector::Patterns(vec![value.to_string()])
        }
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::from(value.as_str())
    }
}

impl From<Vec<String>> for Selector {
    fn from(values: Vec<String>) -> Self {
        if values.iter().any(|v| v == "*") {
            Selector::All
        } else {
            Selector::Patterns(values)
        }
    }
}

impl From<&[&str]> for Selector {
    fn from(values: &[&str]) -> Self {
        Selector::from(values.iter().map(|v| v.to_string()).collect::<Vec<_>>())
    }
}

impl Selector {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Patterns(patterns) => patterns.iter().any(|p| pattern_match(p, value)),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "*"),
            Selector::Patterns(patterns) => write!(f, "{}", patterns.join(", ")),
        }
    }
}

/// Glob-style match supporting only the `*` wildcard.
fn pattern_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;

    // First part is anchored at the start, last part at the end
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    let last = parts[parts.len() - 1];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// Row selection over every index level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub model: Selector,
    pub scenario: Selector,
    pub region: Selector,
    pub variable: Selector,
    pub unit: Selector,
    pub years: Option<BTreeSet<Year>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, selector: impl Into<Selector>) -> Self {
        self.model = selector.into();
        self
    }

    pub fn scenario(mut self, selector: impl Into<Selector>) -> Self {
        self.scenario = selector.into();
        self
    }

    pub fn region(mut self, selector: impl Into<Selector>) -> Self {
        self.region = selector.into();
        self
    }

    pub fn variable(mut self, selector: impl Into<Selector>) -> Self {
        self.variable = selector.into();
        self
    }

    pub fn unit(mut self, selector: impl Into<Selector>) -> Self {
        self.unit = selector.into();
        self
    }

    pub fn years(mut self, years: impl IntoIterator<Item = Year>) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    pub fn matches(&self, key: &DataKey) -> bool {
        self.years.as_ref().map_or(true, |y| y.contains(&key.year))
            && self.model.matches(&key.model)
            && self.scenario.matches(&key.scenario)
            && self.region.matches(&key.region)
            && self.variable.matches(&key.variable)
            && self.unit.matches(&key.unit)
    }
}

/// A long-format table of scenario data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioDataset {
    data: BTreeMap<DataKey, FloatValue>,
}

impl ScenarioDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from rows, failing if any key appears twice.
    pub fn from_rows(rows: impl IntoIterator<Item = (DataKey, FloatValue)>) -> CriteriaResult<Self> {
        let mut dataset = Self::new();
        for (key, value) in rows {
            dataset.insert(key, value)?;
        }
        Ok(dataset)
    }

    /// Insert a single observation.
    ///
    /// NaN values are not stored, since a missing value is an absent row.
    pub fn insert(&mut self, key: DataKey, value: FloatValue) -> CriteriaResult<()> {
        if value.is_nan() {
            return Ok(());
        }
        if self.data.contains_key(&key) {
            return Err(CriteriaError::DuplicateKey(key.to_string()));
        }
        self.data.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &DataKey) -> Option<FloatValue> {
        self.data.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataKey, &FloatValue)> {
        self.data.iter()
    }

    /// Rows matching the filter
    pub fn filter(&self, filter: &Filter) -> Self {
        Self {
            data: self
                .data
                .iter()
                .filter(|(key, _)| filter.matches(key))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// The set of model/scenario pairs with at least one row.
    pub fn index(&self) -> BTreeSet<ScenarioId> {
        self.data.keys().map(DataKey::scenario_id).collect()
    }

    /// Keep (or, with `keep = false`, drop) the rows of the given model/scenario pairs.
    pub fn filter_index(&self, index: &BTreeSet<ScenarioId>, keep: bool) -> Self {
        Self {
            data: self
                .data
                .iter()
                .filter(|(key, _)| index.contains(&key.scenario_id()) == keep)
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.data.keys().map(|k| k.variable.clone()).collect()
    }

    pub fn years(&self) -> BTreeSet<Year> {
        self.data.keys().map(|k| k.year).collect()
    }

    /// Variables exactly one hierarchy level below `variable`.
    pub fn children(&self, variable: &str) -> Vec<String> {
        let prefix = format!("{variable}{HIERARCHY_SEPARATOR}");
        self.variables()
            .into_iter()
            .filter(|v| {
                v.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains(HIERARCHY_SEPARATOR))
            })
            .collect()
    }

    /// Group rows into timeseries keyed by everything except the year.
    pub fn timeseries(&self) -> BTreeMap<SeriesKey, BTreeMap<Year, FloatValue>> {
        let mut out: BTreeMap<SeriesKey, BTreeMap<Year, FloatValue>> = BTreeMap::new();
        for (key, value) in &self.data {
            out.entry(key.series_key())
                .or_default()
                .insert(key.year, *value);
        }
        out
    }

    /// Sum `components` into a new `variable`.
    ///
    /// Returns only the newly computed rows, one per (model, scenario, region, unit, year)
    /// where at least one component has data. Components with different units are summed
    /// separately.
    pub fn aggregate(&self, variable: &str, components: &[String]) -> Self {
        let mut sums: BTreeMap<DataKey, FloatValue> = BTreeMap::new();
        for (key, value) in &self.data {
            if !components.contains(&key.variable) {
                continue;
            }
            let mut target = key.clone();
            target.variable = variable.to_string();
            *sums.entry(target).or_insert(0.0) += value;
        }
        Self { data: sums }
    }

    /// Add all rows of `other`, failing on the first duplicated key.
    pub fn append(&mut self, other: ScenarioDataset) -> CriteriaResult<()> {
        for (key, value) in other.data {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Concatenate datasets. Fails if the same key occurs in more than one of them.
    pub fn concat(datasets: impl IntoIterator<Item = ScenarioDataset>) -> CriteriaResult<Self> {
        let mut out = Self::new();
        for dataset in datasets {
            out.append(dataset)?;
        }
        Ok(out)
    }

    /// Wide (IAMC) layout: one row per timeseries and one column per year.
    pub fn to_wide(&self) -> (Vec<Year>, Vec<(SeriesKey, Vec<Option<FloatValue>>)>) {
        let years: Vec<Year> = self.years().into_iter().collect();
        let rows = self
            .timeseries()
            .into_iter()
            .map(|(key, values)| {
                let row = years.iter().map(|y| values.get(y).copied()).collect();
                (key, row)
            })
            .collect();
        (years, rows)
    }
}

impl IntoIterator for ScenarioDataset {
    type Item = (DataKey, FloatValue);
    type IntoIter = std::collections::btree_map::IntoIter<DataKey, FloatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
