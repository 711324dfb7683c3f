//! The metadata pipeline: load, fill aggregates, evaluate criteria, attach, export.

use crate::config::PipelineConfig;
use crate::errors::PipelineResult;
use crate::export::write_annotated;
use scenmeta_core::aggregates::add_missing_aggregates;
use scenmeta_core::dataset::ScenarioDataset;
use scenmeta_core::evaluate::evaluate_registry;
use scenmeta_core::io::read_iamc_csv;
use scenmeta_core::metadata::{AnnotatedDataset, MetadataTable};
use tracing::info;

/// Fill aggregates and attach criterion metadata to `dataset`.
pub fn process(dataset: ScenarioDataset, config: &PipelineConfig) -> PipelineResult<AnnotatedDataset> {
    let mut dataset = dataset;
    for spec in &config.aggregates {
        let before = dataset.len();
        dataset = add_missing_aggregates(&dataset, &spec.variable, spec.components.as_deref())?;
        info!(
            variable = %spec.variable,
            added = dataset.len() - before,
            "filled missing aggregates"
        );
    }

    let registry = config.registry();
    let results = evaluate_registry(&dataset, &registry)?;
    let meta = MetadataTable::from_results(results)?;
    info!(
        criteria = registry.len(),
        scenarios = meta.len(),
        "built metadata table"
    );
    Ok(AnnotatedDataset::new(dataset, meta))
}

/// Run the full pipeline from the configured input to the configured output.
pub fn run(config: &PipelineConfig) -> PipelineResult<AnnotatedDataset> {
    let dataset = read_iamc_csv(config.input()?)?;
    let annotated = process(dataset, config)?;
    write_annotated(&annotated, config.output()?)?;
    Ok(annotated)
}
