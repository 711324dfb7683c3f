//! Reading IAMC-style CSV files.
//!
//! The expected layout has the identifier columns `model`, `scenario`, `region`,
//! `variable` and `unit` (header matching is case-insensitive) followed by one column per
//! year. Model outputs found in the wild need some cleaning, which happens while reading:
//!
//! - columns with an empty header (trailing commas) are ignored
//! - rows where every cell is empty are skipped
//! - empty cells and the token `UNDF` are treated as missing values
//!
//! Other non-year columns are ignored with a warning.

use crate::dataset::{DataKey, ScenarioDataset, Year};
use crate::errors::{CriteriaError, CriteriaResult};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Tokens read as a missing value, in addition to empty cells.
pub const NA_VALUES: &[&str] = &["UNDF"];

const ID_COLUMNS: [&str; 5] = ["model", "scenario", "region", "variable", "unit"];

pub fn read_iamc_csv(path: impl AsRef<Path>) -> CriteriaResult<ScenarioDataset> {
    let path = path.as_ref();
    let dataset = read_iamc_csv_from_reader(File::open(path)?)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        scenarios = dataset.index().len(),
        "loaded scenario data"
    );
    Ok(dataset)
}

pub fn read_iamc_csv_from_reader<R: Read>(reader: R) -> CriteriaResult<ScenarioDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut id_positions = [usize::MAX; 5];
    let mut year_columns: Vec<(usize, Year)> = Vec::new();
    for (position, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let lower = header.to_lowercase();
        if let Some(i) = ID_COLUMNS.iter().position(|c| *c == lower) {
            id_positions[i] = position;
        } else if let Ok(year) = header.parse::<Year>() {
            year_columns.push((position, year));
        } else {
            warn!(column = header, "ignoring non-year data column");
        }
    }
    for (i, name) in ID_COLUMNS.iter().enumerate() {
        if id_positions[i] == usize::MAX {
            return Err(CriteriaError::InvalidTable(format!(
                "missing required column '{name}'"
            )));
        }
    }
    if year_columns.is_empty() {
        return Err(CriteriaError::InvalidTable("no year columns".to_string()));
    }

    let mut dataset = ScenarioDataset::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        // Header is line 1
        let line = line + 2;
        let id = |i: usize| -> CriteriaResult<String> {
            match record.get(id_positions[i]) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(CriteriaError::InvalidTable(format!(
                    "line {line}: empty '{}'",
                    ID_COLUMNS[i]
                ))),
            }
        };
        let (model, scenario, region, variable, unit) = (id(0)?, id(1)?, id(2)?, id(3)?, id(4)?);

        for (position, year) in &year_columns {
            let cell = record.get(*position).unwrap_or_default();
            if cell.is_empty() || NA_VALUES.contains(&cell) {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| {
                CriteriaError::InvalidTable(format!(
                    "line {line}: cannot parse '{cell}' as a number in column {year}"
                ))
            })?;
            dataset.insert(
                DataKey::new(
                    model.as_str(),
                    scenario.as_str(),
                    region.as_str(),
                    variable.as_str(),
                    unit.as_str(),
                    *year,
                ),
                value,
            )?;
        }
    }
    Ok(dataset)
}
