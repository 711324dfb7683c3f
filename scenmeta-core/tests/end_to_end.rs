//! End-to-end tests: load a table, fill aggregates, evaluate criteria and build metadata.

use approx::assert_relative_eq;
use scenmeta_core::aggregates::add_missing_aggregates;
use scenmeta_core::criteria::{
    make_cumulative_criterion, make_pct_change_criterion, make_share_criterion,
};
use scenmeta_core::dataset::{DataKey, Selector};
use scenmeta_core::errors::CriteriaError;
use scenmeta_core::evaluate::{evaluate_registry, get_change_criterion_values};
use scenmeta_core::io::read_iamc_csv_from_reader;
use scenmeta_core::metadata::{AnnotatedDataset, MetadataTable};
use scenmeta_core::registry::CriteriaRegistry;
use scenmeta_core::series::ResultSeries;

const RENEWABLES: &str = "Primary Energy|Non-Biomass Renewables";

const TABLE: &str = "\
model,scenario,region,variable,unit,2020,2021,2022,2023,2024,2030
REMIND,Direct,World,Emissions|CO2,Gt CO2/yr,5,5,5,5,5,2.5
REMIND,Direct,World,Primary Energy|Non-Biomass Renewables,EJ/yr,,,,,,40
REMIND,Direct,World,Final Energy,EJ/yr,,,,,,200
REMIND,Direct,World,Final Energy|Electricity,EJ/yr,,,,,,50
MESSAGE,Components,World,Emissions|CO2,Gt CO2/yr,100,UNDF,,,,150
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Hydro,EJ/yr,,,,,,1
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Solar,EJ/yr,,,,,,2
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Wind,EJ/yr,,,,,,3
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Geothermal,EJ/yr,,,,,,4
MESSAGE,Components,World,Final Energy,EJ/yr,,,,,,120
MESSAGE,Components,World,Final Energy|Electricity,EJ/yr,,,,,,30
";

fn registry() -> CriteriaRegistry {
    let mut registry = CriteriaRegistry::new();
    registry.change.insert(
        "pct_change_co2_2020_2030".to_string(),
        make_pct_change_criterion(2020, 2030, "Emissions|CO2", "CO2 change (%)", "*"),
    );
    registry.share.insert(
        "share_elec_2030".to_string(),
        make_share_criterion(
            2030,
            "Final Energy|Electricity",
            "Final Energy",
            "Electricity share (%)",
            "*",
        ),
    );
    registry.cumulative.insert(
        "cumulative_co2_2020_2024".to_string(),
        make_cumulative_criterion(
            2020,
            2024,
            "Emissions|CO2",
            "Cumulative CO2 (Gt CO2)",
            None,
            Some("Gt CO2".to_string()),
            "*",
        ),
    );
    registry
}

#[test]
fn renewables_are_filled_from_components() {
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let filled = add_missing_aggregates(&data, RENEWABLES, None).unwrap();

    let key = DataKey::new("MESSAGE", "Components", "World", RENEWABLES, "EJ/yr", 2030);
    assert_eq!(data.get(&key), None);
    assert_eq!(filled.get(&key), Some(10.0));

    let direct = DataKey::new("REMIND", "Direct", "World", RENEWABLES, "EJ/yr", 2030);
    assert_eq!(filled.get(&direct), Some(40.0));
    assert_eq!(filled.len(), data.len() + 1);
}

#[test]
fn metadata_from_registry() {
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let results = evaluate_registry(&data, &registry()).unwrap();
    let expected_len: usize = results.iter().map(|(_, s)| s.len()).sum();

    let long = ResultSeries::concat(results.clone()).unwrap();
    assert_eq!(long.len(), expected_len);

    let meta = MetadataTable::from_results(results).unwrap();
    assert_eq!(
        meta.columns(),
        &[
            "CO2 change (%)".to_string(),
            "Electricity share (%)".to_string(),
            "Cumulative CO2 (Gt CO2)".to_string(),
        ]
    );

    assert_relative_eq!(meta.get("MESSAGE", "Components", "CO2 change (%)").unwrap(), 50.0);
    assert_relative_eq!(meta.get("REMIND", "Direct", "CO2 change (%)").unwrap(), -50.0);
    assert_relative_eq!(
        meta.get("MESSAGE", "Components", "Electricity share (%)").unwrap(),
        25.0
    );
    assert_relative_eq!(
        meta.get("REMIND", "Direct", "Cumulative CO2 (Gt CO2)").unwrap(),
        25.0
    );
    // Only 2020 is reported in the cumulative range
    assert_relative_eq!(
        meta.get("MESSAGE", "Components", "Cumulative CO2 (Gt CO2)").unwrap(),
        100.0
    );

    let annotated = AnnotatedDataset::new(data, meta);
    assert_eq!(annotated.meta.len(), 2);
}

#[test]
fn cumulative_unit_label_is_unchanged() {
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let results = evaluate_registry(&data, &registry()).unwrap();
    let (_, cumulative) = results
        .iter()
        .find(|(name, _)| name == "Cumulative CO2 (Gt CO2)")
        .unwrap();
    assert!(cumulative
        .iter()
        .all(|(idx, _)| idx.unit.as_deref() == Some("Gt CO2")));
}

#[test]
fn regional_results_cannot_be_flattened() {
    let table = "\
model,scenario,region,variable,unit,2020,2030
M,S,World,Emissions|CO2,Mt CO2/yr,10,5
M,S,R5ASIA,Emissions|CO2,Mt CO2/yr,4,2
";
    let data = read_iamc_csv_from_reader(table.as_bytes()).unwrap();
    let all = make_pct_change_criterion(2020, 2030, "Emissions|CO2", "all regions", "*");
    let world = make_pct_change_criterion(
        2020,
        2030,
        "Emissions|CO2",
        "world",
        Selector::from("World"),
    );

    let res = MetadataTable::from_results(vec![(
        all.name.clone(),
        get_change_criterion_values(&data, &all).unwrap(),
    )]);
    assert!(matches!(
        res,
        Err(CriteriaError::AmbiguousReduction { .. })
    ));

    let meta = MetadataTable::from_results(vec![(
        world.name.clone(),
        get_change_criterion_values(&data, &world).unwrap(),
    )])
    .unwrap();
    assert_relative_eq!(meta.get("M", "S", "world").unwrap(), -50.0);
}

#[test]
fn standard_registry_reports_missing_years() {
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    // The test table has no 2050 or 2100 data
    let res = evaluate_registry(&data, &CriteriaRegistry::standard());
    assert!(matches!(res, Err(CriteriaError::MissingYear { .. })));
}
