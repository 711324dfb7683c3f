//! Pre-processing of variables before criteria are evaluated.

use crate::dataset::{Filter, ScenarioDataset};
use crate::errors::CriteriaResult;
use tracing::{debug, warn};

/// Add an aggregate variable to the model/scenario pairs that do not report it.
///
/// The data is split into the pairs that already report `agg_var` (left untouched) and
/// the rest. For the rest, `agg_var` is computed per region, unit and year as the sum of
/// `component_vars`, or of the direct hierarchy children of `agg_var` (`agg_var|*`, one
/// level down) when no components are given. The two parts are then concatenated.
///
/// Pairs that lack some of the components get the sum of the components they do report.
/// Pairs that lack all of them get no aggregate rows.
pub fn add_missing_aggregates(
    dataset: &ScenarioDataset,
    agg_var: &str,
    component_vars: Option<&[String]>,
) -> CriteriaResult<ScenarioDataset> {
    let has_agg_var_index = dataset.filter(&Filter::new().variable(agg_var)).index();
    let agg_present = dataset.filter_index(&has_agg_var_index, true);
    let mut agg_missing = dataset.filter_index(&has_agg_var_index, false);

    let components = match component_vars {
        Some(components) => components.to_vec(),
        None => agg_missing.children(agg_var),
    };
    debug!(
        variable = agg_var,
        components = ?components,
        present = has_agg_var_index.len(),
        missing = agg_missing.index().len(),
        "filling missing aggregates"
    );

    for scenario in agg_missing.index() {
        let reported = agg_missing
            .filter(
                &Filter::new()
                    .model(scenario.model.as_str())
                    .scenario(scenario.scenario.as_str()),
            )
            .variables();
        let absent: Vec<&String> = components.iter().filter(|c| !reported.contains(*c)).collect();
        if !absent.is_empty() {
            warn!(
                scenario = %scenario,
                variable = agg_var,
                absent = ?absent,
                "components missing; aggregate is the sum of the reported ones"
            );
        }
    }

    let aggregated = agg_missing.aggregate(agg_var, &components);
    agg_missing.append(aggregated)?;
    ScenarioDataset::concat([agg_present, agg_missing])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataKey, Year};

    const AGG: &str = "Primary Energy|Non-Biomass Renewables";

    fn row(scenario: &str, variable: &str, year: Year, value: f64) -> (DataKey, f64) {
        (
            DataKey::new("WITCH", scenario, "World", variable, "EJ/yr", year),
            value,
        )
    }

    fn dataset() -> ScenarioDataset {
        ScenarioDataset::from_rows([
            row("direct", AGG, 2030, 42.0),
            row("direct", &format!("{AGG}|Hydro"), 2030, 1.0),
            row("components", &format!("{AGG}|Hydro"), 2030, 1.0),
            row("components", &format!("{AGG}|Solar"), 2030, 2.0),
            row("components", &format!("{AGG}|Wind"), 2030, 3.0),
            row("components", &format!("{AGG}|Geothermal"), 2030, 4.0),
            row("components", "Primary Energy", 2030, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn inferred_components() {
        let out = add_missing_aggregates(&dataset(), AGG, None).unwrap();
        assert_eq!(
            out.get(&DataKey::new("WITCH", "components", "World", AGG, "EJ/yr", 2030)),
            Some(10.0)
        );
        // Existing aggregate is never overwritten
        assert_eq!(
            out.get(&DataKey::new("WITCH", "direct", "World", AGG, "EJ/yr", 2030)),
            Some(42.0)
        );
        assert_eq!(out.len(), dataset().len() + 1);
    }

    #[test]
    fn explicit_components() {
        let components = vec![format!("{AGG}|Solar"), format!("{AGG}|Wind")];
        let out = add_missing_aggregates(&dataset(), AGG, Some(&components)).unwrap();
        assert_eq!(
            out.get(&DataKey::new("WITCH", "components", "World", AGG, "EJ/yr", 2030)),
            Some(5.0)
        );
    }

    #[test]
    fn other_variables_unchanged() {
        let input = dataset();
        let out = add_missing_aggregates(&input, AGG, None).unwrap();
        let others = |d: &ScenarioDataset| {
            d.iter()
                .filter(|(k, _)| k.variable != AGG)
                .map(|(k, v)| (k.clone(), *v))
                .collect::<Vec<_>>()
        };
        assert_eq!(others(&input), others(&out));
    }

    #[test]
    fn idempotent() {
        let once = add_missing_aggregates(&dataset(), AGG, None).unwrap();
        let twice = add_missing_aggregates(&once, AGG, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn partial_components_sum_what_is_reported() {
        let data = ScenarioDataset::from_rows([
            row("partial", &format!("{AGG}|Solar"), 2030, 2.0),
            row("partial", "Primary Energy", 2030, 50.0),
        ])
        .unwrap();
        let components = vec![format!("{AGG}|Solar"), format!("{AGG}|Wind")];
        let out = add_missing_aggregates(&data, AGG, Some(&components)).unwrap();
        assert_eq!(
            out.get(&DataKey::new("WITCH", "partial", "World", AGG, "EJ/yr", 2030)),
            Some(2.0)
        );
    }
}
