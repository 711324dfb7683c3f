//! Evaluation of criteria against a dataset.
//!
//! Each criterion kind has its own entry point that picks the output format and applies
//! kind-specific post-processing:
//!
//! | Kind       | Regions | Unit                        | Values          |
//! |------------|---------|-----------------------------|-----------------|
//! | change     | kept    | set to `%`                  | fraction × 100  |
//! | share      | kept    | set to `%`                  | fraction × 100  |
//! | cumulative | kept    | passed through (cumulative) | sum             |

use crate::criteria::{
    ChangeCriterion, Criterion, CriterionValues, CumulativeCriterion, ShareCriterion,
};
use crate::dataset::ScenarioDataset;
use crate::errors::CriteriaResult;
use crate::format::{FormatPolicy, UnitPolicy};
use crate::registry::CriteriaRegistry;
use crate::series::ResultSeries;
use tracing::info;

/// Whether evaluated series keep the criterion name.
pub const KEEP_NAME: bool = true;

pub const PERCENT: &str = "%";

fn percent_policy() -> FormatPolicy {
    FormatPolicy::new(true, UnitPolicy::Set(PERCENT.to_string()), KEEP_NAME)
}

pub fn get_change_criterion_values(
    dataset: &ScenarioDataset,
    criterion: &ChangeCriterion,
) -> CriteriaResult<ResultSeries> {
    Ok(criterion.get_values(dataset, &percent_policy())?.scale(100.0))
}

pub fn get_share_criterion_values(
    dataset: &ScenarioDataset,
    criterion: &ShareCriterion,
) -> CriteriaResult<ResultSeries> {
    Ok(criterion.get_values(dataset, &percent_policy())?.scale(100.0))
}

/// The unit is passed through since the cumulative unit label is set by the criterion.
pub fn get_cumulative_criterion_values(
    dataset: &ScenarioDataset,
    criterion: &CumulativeCriterion,
) -> CriteriaResult<ResultSeries> {
    criterion.get_values(
        dataset,
        &FormatPolicy::new(true, UnitPolicy::Keep, KEEP_NAME),
    )
}

pub fn evaluate(dataset: &ScenarioDataset, criterion: &Criterion) -> CriteriaResult<ResultSeries> {
    match criterion {
        Criterion::Change(c) => get_change_criterion_values(dataset, c),
        Criterion::Share(c) => get_share_criterion_values(dataset, c),
        Criterion::Cumulative(c) => get_cumulative_criterion_values(dataset, c),
    }
}

/// Evaluate every criterion in the registry, returning (criterion name, values) pairs in
/// registry order.
pub fn evaluate_registry(
    dataset: &ScenarioDataset,
    registry: &CriteriaRegistry,
) -> CriteriaResult<Vec<(String, ResultSeries)>> {
    registry
        .iter()
        .map(|(key, criterion)| {
            let values = evaluate(dataset, &criterion)?;
            info!(
                key = key,
                kind = criterion.kind(),
                rows = values.len(),
                "evaluated criterion"
            );
            Ok((criterion.name().to_string(), values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{
        make_cumulative_criterion, make_pct_change_criterion, make_share_criterion,
    };
    use crate::dataset::{DataKey, Year};
    use approx::assert_relative_eq;

    fn row(variable: &str, unit: &str, year: Year, value: f64) -> (DataKey, f64) {
        (
            DataKey::new("IMAGE", "1.5C", "World", variable, unit, year),
            value,
        )
    }

    #[test]
    fn change_in_percent() {
        let data = ScenarioDataset::from_rows([
            row("Emissions|CO2", "Mt CO2/yr", 2020, 100.0),
            row("Emissions|CO2", "Mt CO2/yr", 2030, 150.0),
        ])
        .unwrap();
        let c = make_pct_change_criterion(2020, 2030, "Emissions|CO2", "Change in CO2", "*");
        let values = get_change_criterion_values(&data, &c).unwrap();

        assert!(values.has_region());
        assert_eq!(values.name(), Some("Change in CO2"));
        let (idx, value) = values.iter().next().unwrap();
        assert_relative_eq!(*value, 50.0);
        assert_eq!(idx.unit.as_deref(), Some("%"));
        assert_eq!(idx.region.as_deref(), Some("World"));
    }

    #[test]
    fn share_in_percent() {
        let data = ScenarioDataset::from_rows([
            row("Final Energy|Industry|Electricity", "EJ/yr", 2030, 30.0),
            row("Final Energy|Industry", "EJ/yr", 2030, 120.0),
        ])
        .unwrap();
        let s = make_share_criterion(
            2030,
            "Final Energy|Industry|Electricity",
            "Final Energy|Industry",
            "share",
            "*",
        );
        let values = get_share_criterion_values(&data, &s).unwrap();
        let (idx, value) = values.iter().next().unwrap();
        assert_relative_eq!(*value, 25.0);
        assert_eq!(idx.unit.as_deref(), Some("%"));
    }

    #[test]
    fn cumulative_keeps_label() {
        let data = ScenarioDataset::from_rows(
            (2020..=2024).map(|y| row("Emissions|CO2", "Gt CO2/yr", y, 5.0)),
        )
        .unwrap();
        let k = make_cumulative_criterion(
            2020,
            2024,
            "Emissions|CO2",
            "cumulative",
            None,
            Some("Gt CO2".to_string()),
            "*",
        );
        let values = get_cumulative_criterion_values(&data, &k).unwrap();
        assert_eq!(values.len(), 1);
        let (idx, value) = values.iter().next().unwrap();
        assert_relative_eq!(*value, 25.0);
        assert_eq!(idx.unit.as_deref(), Some("Gt CO2"));
    }

    #[test]
    fn dispatch_matches_kind() {
        let data = ScenarioDataset::from_rows([
            row("Emissions|CO2", "Mt CO2/yr", 2020, 100.0),
            row("Emissions|CO2", "Mt CO2/yr", 2030, 80.0),
        ])
        .unwrap();
        let c: Criterion =
            make_pct_change_criterion(2020, 2030, "Emissions|CO2", "c", "*").into();
        let values = evaluate(&data, &c).unwrap();
        assert_relative_eq!(values.values()[0], -20.0, epsilon = 1e-9);
    }
}
