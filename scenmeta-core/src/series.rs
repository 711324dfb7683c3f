//! Result series produced by criteria.
//!
//! A [`ResultSeries`] is a named list of values indexed by model and scenario, with
//! optional `region`, `unit` and `criterion` levels. An optional level is either present
//! on every entry or on none of them.

use crate::dataset::{FloatValue, ScenarioId};
use crate::errors::{CriteriaError, CriteriaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Index of a single entry in a [`ResultSeries`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesIndex {
    pub model: String,
    pub scenario: String,
    pub region: Option<String>,
    pub unit: Option<String>,
    pub criterion: Option<String>,
}

impl SeriesIndex {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
            region: Some(region.into()),
            unit: Some(unit.into()),
            criterion: None,
        }
    }

    pub fn scenario_id(&self) -> ScenarioId {
        ScenarioId::new(self.model.clone(), self.scenario.clone())
    }
}

impl fmt::Display for SeriesIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}", self.model, self.scenario)?;
        for level in [&self.region, &self.unit, &self.criterion].into_iter().flatten() {
            write!(f, ", {level}")?;
        }
        write!(f, ")")
    }
}

/// Which optional index levels a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLevels {
    pub region: bool,
    pub unit: bool,
    pub criterion: bool,
}

impl Default for IndexLevels {
    fn default() -> Self {
        Self {
            region: true,
            unit: true,
            criterion: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSeries {
    name: Option<String>,
    levels: IndexLevels,
    entries: Vec<(SeriesIndex, FloatValue)>,
}

impl ResultSeries {
    /// An empty series with `region` and `unit` levels.
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            levels: IndexLevels::default(),
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    ///
    /// # Panics
    /// Panics if the optional levels of `index` disagree with the series' levels.
    pub fn push(&mut self, index: SeriesIndex, value: FloatValue) {
        assert_eq!(
            (
                index.region.is_some(),
                index.unit.is_some(),
                index.criterion.is_some()
            ),
            (self.levels.region, self.levels.unit, self.levels.criterion),
            "index {index} does not match the series levels"
        );
        self.entries.push((index, value));
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn levels(&self) -> IndexLevels {
        self.levels
    }

    pub fn has_region(&self) -> bool {
        self.levels.region
    }

    pub fn has_unit(&self) -> bool {
        self.levels.unit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(SeriesIndex, FloatValue)> {
        self.entries.iter()
    }

    pub fn values(&self) -> Vec<FloatValue> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    /// Look up the value of the first entry matching model, scenario and (if the
    /// series has that level) region.
    pub fn get(&self, model: &str, scenario: &str, region: Option<&str>) -> Option<FloatValue> {
        self.entries
            .iter()
            .find(|(idx, _)| {
                idx.model == model && idx.scenario == scenario && idx.region.as_deref() == region
            })
            .map(|(_, v)| *v)
    }

    /// Multiply every value by `factor`.
    pub fn scale(mut self, factor: FloatValue) -> Self {
        for (_, value) in self.entries.iter_mut() {
            *value *= factor;
        }
        self
    }

    pub fn drop_region(mut self) -> Self {
        self.levels.region = false;
        for (idx, _) in self.entries.iter_mut() {
            idx.region = None;
        }
        self
    }

    pub fn drop_unit(mut self) -> Self {
        self.levels.unit = false;
        for (idx, _) in self.entries.iter_mut() {
            idx.unit = None;
        }
        self
    }

    /// Set the unit of every entry, adding the level if needed.
    pub fn set_unit(mut self, unit: &str) -> Self {
        self.levels.unit = true;
        for (idx, _) in self.entries.iter_mut() {
            idx.unit = Some(unit.to_string());
        }
        self
    }

    fn with_criterion(mut self, criterion: &str) -> Self {
        self.levels.criterion = true;
        for (idx, _) in self.entries.iter_mut() {
            idx.criterion = Some(criterion.to_string());
        }
        self
    }

    /// Concatenate per-criterion series into one series with a `criterion` level.
    ///
    /// All parts must share the same region/unit levels. A repeated index, from two
    /// criteria with the same name or a part with duplicated keys, fails with
    /// [`CriteriaError::IndexCollision`] as soon as it is seen. The closing
    /// [`CriteriaError::LengthMismatch`] check is an assertion that no entry was lost and
    /// is unreachable while the collision check holds.
    pub fn concat(
        parts: impl IntoIterator<Item = (String, ResultSeries)>,
    ) -> CriteriaResult<ResultSeries> {
        let mut out = ResultSeries {
            name: None,
            levels: IndexLevels {
                region: true,
                unit: true,
                criterion: true,
            },
            entries: Vec::new(),
        };
        let mut expected = 0;
        let mut seen: HashSet<SeriesIndex> = HashSet::new();
        let mut first_levels: Option<IndexLevels> = None;

        for (criterion, part) in parts {
            match first_levels {
                None => {
                    out.levels.region = part.levels.region;
                    out.levels.unit = part.levels.unit;
                    first_levels = Some(part.levels);
                }
                Some(levels) if levels != part.levels => {
                    return Err(CriteriaError::Error(format!(
                        "Cannot concatenate '{criterion}': index levels {:?} differ from {levels:?}",
                        part.levels
                    )));
                }
                Some(_) => {}
            }
            expected += part.len();
            for (idx, value) in part.with_criterion(&criterion).entries {
                if !seen.insert(idx.clone()) {
                    return Err(CriteriaError::IndexCollision(idx.to_string()));
                }
                out.entries.push((idx, value));
            }
        }

        if out.len() != expected {
            return Err(CriteriaError::LengthMismatch {
                expected,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str, rows: &[(&str, &str, f64)]) -> ResultSeries {
        let mut s = ResultSeries::new(Some(name.to_string()));
        for (model, scenario, value) in rows {
            s.push(SeriesIndex::new(*model, *scenario, "World", "%"), *value);
        }
        s
    }

    #[test]
    fn concat_disjoint_criteria() {
        let a = series("a", &[("M1", "S1", 1.0), ("M1", "S2", 2.0)]);
        let b = series("b", &[("M1", "S1", 3.0)]);
        let out = ResultSeries::concat([("a".to_string(), a), ("b".to_string(), b)]).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.levels().criterion);
        let unique: HashSet<_> = out.iter().map(|(i, _)| i.clone()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn concat_overlapping_criteria_fails() {
        let a = series("a", &[("M1", "S1", 1.0)]);
        let b = series("a", &[("M1", "S1", 3.0)]);
        let res = ResultSeries::concat([("a".to_string(), a), ("a".to_string(), b)]);
        assert!(matches!(res, Err(CriteriaError::IndexCollision(_))));
    }

    #[test]
    fn concat_mismatched_levels_fails() {
        let a = series("a", &[("M1", "S1", 1.0)]);
        let b = series("b", &[("M1", "S1", 3.0)]).drop_unit();
        let res = ResultSeries::concat([("a".to_string(), a), ("b".to_string(), b)]);
        assert!(matches!(res, Err(CriteriaError::Error(_))));
    }

    #[test]
    fn level_manipulation() {
        let s = series("a", &[("M1", "S1", 0.5)]).scale(100.0);
        assert_eq!(s.get("M1", "S1", Some("World")), Some(50.0));

        let s = s.drop_region().set_unit("Gt CO2");
        assert!(!s.has_region());
        assert_eq!(s.get("M1", "S1", None), Some(50.0));
        assert_eq!(s.iter().next().unwrap().0.unit.as_deref(), Some("Gt CO2"));
    }

    #[test]
    #[should_panic]
    fn push_with_wrong_levels() {
        let mut s = ResultSeries::new(None).drop_region();
        s.push(SeriesIndex::new("M", "S", "World", "%"), 1.0);
    }
}
