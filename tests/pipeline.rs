use approx::assert_relative_eq;
use scenmeta::config::PipelineConfig;
use scenmeta::errors::PipelineError;
use scenmeta::export::{meta_csv_path, write_annotated};
use scenmeta::pipeline::{process, run};
use scenmeta_core::dataset::DataKey;
use scenmeta_core::io::read_iamc_csv_from_reader;
use std::fs;

const TABLE: &str = "\
model,scenario,region,variable,unit,2020,2030
REMIND,Direct,World,Emissions|CO2,Gt CO2/yr,5,2.5
REMIND,Direct,World,Primary Energy|Non-Biomass Renewables,EJ/yr,20,40
MESSAGE,Components,World,Emissions|CO2,Gt CO2/yr,100,150
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Solar,EJ/yr,2,4
MESSAGE,Components,World,Primary Energy|Non-Biomass Renewables|Wind,EJ/yr,3,6
";

const CONFIG: &str = r#"
[[aggregates]]
variable = "Primary Energy|Non-Biomass Renewables"

[criteria.change.pct_change_co2_2020_2030]
name = "CO2 change (%)"
variable = "Emissions|CO2"
reference_year = 2020
target_year = 2030

[criteria.change.pct_change_re_2020_2030]
name = "Renewables change (%)"
variable = "Primary Energy|Non-Biomass Renewables"
reference_year = 2020
target_year = 2030
"#;

#[test]
fn process_fills_aggregates_before_evaluating() {
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
    let annotated = process(data, &config).unwrap();

    let filled = DataKey::new(
        "MESSAGE",
        "Components",
        "World",
        "Primary Energy|Non-Biomass Renewables",
        "EJ/yr",
        2030,
    );
    assert_eq!(annotated.data.get(&filled), Some(10.0));

    let meta = &annotated.meta;
    assert_eq!(meta.len(), 2);
    assert_relative_eq!(meta.get("REMIND", "Direct", "CO2 change (%)").unwrap(), -50.0);
    assert_relative_eq!(
        meta.get("MESSAGE", "Components", "Renewables change (%)").unwrap(),
        100.0
    );
}

#[test]
fn csv_export_writes_data_and_meta() {
    let dir = tempfile::tempdir().unwrap();
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
    let annotated = process(data, &config).unwrap();

    let path = dir.path().join("out.csv");
    write_annotated(&annotated, &path).unwrap();

    let written = read_iamc_csv_from_reader(fs::read(&path).unwrap().as_slice()).unwrap();
    assert_eq!(written, annotated.data);

    let meta_path = meta_csv_path(&path);
    assert_eq!(meta_path, dir.path().join("out_meta.csv"));
    let mut reader = csv::Reader::from_path(&meta_path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        header,
        [
            "model",
            "scenario",
            "exclude",
            "CO2 change (%)",
            "Renewables change (%)"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "MESSAGE");
    assert_eq!(&rows[0][2], "false");
    assert_relative_eq!(rows[0][3].parse::<f64>().unwrap(), 50.0);
}

#[test]
fn run_writes_workbook() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("input.csv"), TABLE).unwrap();
    let config_path = dir.path().join("pipeline.toml");
    fs::write(
        &config_path,
        format!("input = \"input.csv\"\noutput = \"meta.xlsx\"\n{CONFIG}"),
    )
    .unwrap();

    let config = PipelineConfig::from_file(&config_path).unwrap();
    let annotated = run(&config).unwrap();

    assert_eq!(annotated.meta.len(), 2);
    let written = fs::metadata(dir.path().join("meta.xlsx")).unwrap();
    assert!(written.len() > 0);
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = read_iamc_csv_from_reader(TABLE.as_bytes()).unwrap();
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
    let annotated = process(data, &config).unwrap();

    let res = write_annotated(&annotated, &dir.path().join("out.parquet"));
    assert!(matches!(res, Err(PipelineError::UnsupportedFormat(ext)) if ext == "parquet"));
}
