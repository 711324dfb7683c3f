//! Per-scenario metadata tables built from evaluated criteria.
//!
//! Evaluated criteria are concatenated into one long series with a `criterion` level
//! and reshaped so that each criterion becomes a column and each row is a model/scenario
//! pair. The `region` and `unit` levels are dropped in the reshape, which is only
//! meaningful if every criterion reduces to a single value per model/scenario. Anything
//! else is an [`CriteriaError::AmbiguousReduction`].

use crate::dataset::{FloatValue, ScenarioDataset, ScenarioId};
use crate::errors::{CriteriaError, CriteriaResult};
use crate::series::ResultSeries;
use std::collections::BTreeMap;

/// Name of the conventional exclusion flag column.
pub const EXCLUDE_COLUMN: &str = "exclude";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataRow {
    pub exclude: bool,
    pub values: Vec<Option<FloatValue>>,
}

/// Wide table with one row per model/scenario and one column per criterion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataTable {
    columns: Vec<String>,
    rows: BTreeMap<ScenarioId, MetadataRow>,
}

impl MetadataTable {
    /// Concatenate per-criterion results and reshape them to wide form.
    ///
    /// Columns follow the order of `results`. NaN values become empty cells.
    pub fn from_results(results: Vec<(String, ResultSeries)>) -> CriteriaResult<Self> {
        let columns: Vec<String> = results.iter().map(|(name, _)| name.clone()).collect();
        let long = ResultSeries::concat(results)?;

        let mut counts: BTreeMap<(ScenarioId, usize), usize> = BTreeMap::new();
        let mut rows: BTreeMap<ScenarioId, MetadataRow> = BTreeMap::new();
        for (idx, value) in long.iter() {
            let criterion = idx.criterion.as_deref().unwrap_or_default();
            let column = columns
                .iter()
                .position(|c| c == criterion)
                .ok_or_else(|| CriteriaError::Error(format!("unknown criterion '{criterion}'")))?;
            let id = idx.scenario_id();

            let count = counts.entry((id.clone(), column)).or_insert(0);
            *count += 1;
            if *count > 1 {
                return Err(CriteriaError::AmbiguousReduction {
                    criterion: criterion.to_string(),
                    model: id.model,
                    scenario: id.scenario,
                    count: *count,
                });
            }

            let row = rows.entry(id).or_insert_with(|| MetadataRow {
                exclude: false,
                values: vec![None; columns.len()],
            });
            row.values[column] = (!value.is_nan()).then_some(*value);
        }
        Ok(Self { columns, rows })
    }

    /// Add empty rows for model/scenario pairs of `dataset` without any criterion value.
    pub fn extend_to(mut self, dataset: &ScenarioDataset) -> Self {
        let width = self.columns.len();
        for id in dataset.index() {
            self.rows.entry(id).or_insert_with(|| MetadataRow {
                exclude: false,
                values: vec![None; width],
            });
        }
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&ScenarioId, &MetadataRow)> {
        self.rows.iter()
    }

    pub fn get(&self, model: &str, scenario: &str, column: &str) -> Option<FloatValue> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .get(&ScenarioId::new(model, scenario))
            .and_then(|row| row.values[col])
    }
}

/// A dataset together with its metadata, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedDataset {
    pub data: ScenarioDataset,
    pub meta: MetadataTable,
}

impl AnnotatedDataset {
    /// Attach `meta` to `data`, giving every model/scenario in the data a metadata row.
    pub fn new(data: ScenarioDataset, meta: MetadataTable) -> Self {
        let meta = meta.extend_to(&data);
        Self { data, meta }
    }
}
