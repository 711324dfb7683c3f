//! Writing annotated datasets.
//!
//! The data is written in the wide IAMC layout (one column per year) and the metadata
//! as one row per model/scenario with an `exclude` column followed by one column per
//! criterion. Missing values are written as empty cells.

use crate::errors::{PipelineError, PipelineResult};
use csv::Writer;
use rust_xlsxwriter::{Workbook, Worksheet};
use scenmeta_core::metadata::{AnnotatedDataset, EXCLUDE_COLUMN};
use std::path::{Path, PathBuf};
use tracing::info;

const DATA_SHEET: &str = "data";
const META_SHEET: &str = "meta";
const DATA_ID_COLUMNS: [&str; 5] = ["model", "scenario", "region", "variable", "unit"];

/// Write to `.xlsx`, or to a pair of `.csv` files, depending on the extension of `path`.
pub fn write_annotated(annotated: &AnnotatedDataset, path: &Path) -> PipelineResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("xlsx") => write_xlsx(annotated, path),
        Some("csv") => write_csv(annotated, path),
        other => Err(PipelineError::UnsupportedFormat(
            other.unwrap_or_default().to_string(),
        )),
    }
}

fn data_header(years: &[i32]) -> Vec<String> {
    DATA_ID_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(years.iter().map(|y| y.to_string()))
        .collect()
}

fn meta_header(annotated: &AnnotatedDataset) -> Vec<String> {
    ["model", "scenario", EXCLUDE_COLUMN]
        .iter()
        .map(|c| c.to_string())
        .chain(annotated.meta.columns().iter().cloned())
        .collect()
}

fn write_header(sheet: &mut Worksheet, header: &[String]) -> PipelineResult<()> {
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    Ok(())
}

pub fn write_xlsx(annotated: &AnnotatedDataset, path: &Path) -> PipelineResult<()> {
    let mut workbook = Workbook::new();

    let (years, rows) = annotated.data.to_wide();
    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    write_header(sheet, &data_header(&years))?;
    for (i, (key, values)) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        let ids = [&key.model, &key.scenario, &key.region, &key.variable, &key.unit];
        for (col, id) in ids.iter().enumerate() {
            sheet.write_string(row, col as u16, id.as_str())?;
        }
        for (offset, value) in values.iter().enumerate() {
            if let Some(value) = value {
                sheet.write_number(row, (ids.len() + offset) as u16, *value)?;
            }
        }
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(META_SHEET)?;
    write_header(sheet, &meta_header(annotated))?;
    for (i, (id, meta)) in annotated.meta.rows().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, id.model.as_str())?;
        sheet.write_string(row, 1, id.scenario.as_str())?;
        sheet.write_boolean(row, 2, meta.exclude)?;
        for (offset, value) in meta.values.iter().enumerate() {
            if let Some(value) = value {
                sheet.write_number(row, (3 + offset) as u16, *value)?;
            }
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), rows = rows.len(), scenarios = annotated.meta.len(), "wrote workbook");
    Ok(())
}

/// Path of the metadata file written next to a CSV data file (`<stem>_meta.csv`).
pub fn meta_csv_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_meta.csv"))
}

fn cell(value: &Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_csv(annotated: &AnnotatedDataset, path: &Path) -> PipelineResult<()> {
    let (years, rows) = annotated.data.to_wide();
    let mut writer = Writer::from_path(path)?;
    writer.write_record(data_header(&years))?;
    for (key, values) in &rows {
        let record: Vec<String> = [&key.model, &key.scenario, &key.region, &key.variable, &key.unit]
            .into_iter()
            .cloned()
            .chain(values.iter().map(cell))
            .collect();
        writer.write_record(record)?;
    }
    writer.flush()?;

    let meta_path = meta_csv_path(path);
    let mut writer = Writer::from_path(&meta_path)?;
    writer.write_record(meta_header(annotated))?;
    for (id, meta) in annotated.meta.rows() {
        let record: Vec<String> = [
            id.model.clone(),
            id.scenario.clone(),
            meta.exclude.to_string(),
        ]
        .into_iter()
        .chain(meta.values.iter().map(cell))
        .collect();
        writer.write_record(record)?;
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        meta = %meta_path.display(),
        rows = rows.len(),
        "wrote csv files"
    );
    Ok(())
}
