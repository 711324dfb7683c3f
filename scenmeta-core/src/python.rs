//! Python bindings for datasets, criteria and evaluation.
//!
//! Exposed as the `core` submodule of the `scenmeta._lib` extension module.

use crate::aggregates::add_missing_aggregates;
use crate::criteria::{
    make_cumulative_criterion, make_pct_change_criterion, make_share_criterion, Criterion,
};
use crate::dataset::{DataKey, ScenarioDataset, Selector, Year};
use crate::errors::CriteriaError;
use crate::evaluate;
use crate::format::{FormatPolicy, PolicyValue};
use crate::io::read_iamc_csv;
use crate::series::ResultSeries;
use numpy::PyArray1;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use std::path::PathBuf;

impl From<CriteriaError> for PyErr {
    fn from(err: CriteriaError) -> PyErr {
        match err {
            CriteriaError::TypeMismatch { .. } => PyTypeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// A region filter as given from Python: one pattern or a list of them.
#[derive(Debug, Clone, PartialEq, FromPyObject)]
enum RegionArg {
    One(String),
    Many(Vec<String>),
}

fn region_selector(region: Option<RegionArg>) -> Selector {
    match region {
        None => Selector::All,
        Some(RegionArg::One(pattern)) => Selector::from(pattern),
        Some(RegionArg::Many(patterns)) => Selector::from(patterns),
    }
}

fn policy_value(obj: &Bound<'_, PyAny>) -> PolicyValue {
    if let Ok(b) = obj.extract::<bool>() {
        PolicyValue::Bool(b)
    } else if let Ok(s) = obj.extract::<String>() {
        PolicyValue::Str(s)
    } else {
        let type_name = obj
            .get_type()
            .name()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| "object".to_string());
        PolicyValue::Other(type_name)
    }
}

#[pyclass(name = "ScenarioDataset", module = "scenmeta.core")]
#[derive(Debug, Clone, Default)]
pub struct PyScenarioDataset(pub ScenarioDataset);

#[pymethods]
impl PyScenarioDataset {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    #[staticmethod]
    fn read_csv(path: PathBuf) -> PyResult<Self> {
        Ok(Self(read_iamc_csv(path)?))
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        model: &str,
        scenario: &str,
        region: &str,
        variable: &str,
        unit: &str,
        year: Year,
        value: f64,
    ) -> PyResult<()> {
        self.0.insert(
            DataKey::new(model, scenario, region, variable, unit, year),
            value,
        )?;
        Ok(())
    }

    #[pyo3(signature = (agg_var, component_vars=None))]
    fn add_missing_aggregates(
        &self,
        agg_var: &str,
        component_vars: Option<Vec<String>>,
    ) -> PyResult<Self> {
        Ok(Self(add_missing_aggregates(
            &self.0,
            agg_var,
            component_vars.as_deref(),
        )?))
    }

    fn variables(&self) -> Vec<String> {
        self.0.variables().into_iter().collect()
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScenarioDataset(rows={}, scenarios={})",
            self.0.len(),
            self.0.index().len()
        )
    }
}

#[pyclass(name = "Criterion", module = "scenmeta.core")]
#[derive(Debug, Clone)]
pub struct PyCriterion(pub Criterion);

#[pymethods]
impl PyCriterion {
    #[staticmethod]
    #[pyo3(signature = (reference_year, target_year, variable, name, region=None))]
    fn change(
        reference_year: Year,
        target_year: Year,
        variable: String,
        name: String,
        region: Option<RegionArg>,
    ) -> Self {
        Self(
            make_pct_change_criterion(
                reference_year,
                target_year,
                variable,
                name,
                region_selector(region),
            )
            .into(),
        )
    }

    #[staticmethod]
    #[pyo3(signature = (year, variable_component, variable_total, name, region=None))]
    fn share(
        year: Year,
        variable_component: String,
        variable_total: String,
        name: String,
        region: Option<RegionArg>,
    ) -> Self {
        Self(
            make_share_criterion(
                year,
                variable_component,
                variable_total,
                name,
                region_selector(region),
            )
            .into(),
        )
    }

    #[staticmethod]
    #[pyo3(signature = (start_year, end_year, variable, name, unit=None, cumulative_unit=None, region=None))]
    fn cumulative(
        start_year: Year,
        end_year: Year,
        variable: String,
        name: String,
        unit: Option<String>,
        cumulative_unit: Option<String>,
        region: Option<RegionArg>,
    ) -> Self {
        Self(
            make_cumulative_criterion(
                start_year,
                end_year,
                variable,
                name,
                unit,
                cumulative_unit,
                region_selector(region),
            )
            .into(),
        )
    }

    #[getter]
    fn name(&self) -> String {
        self.0.name().to_string()
    }

    #[getter]
    fn kind(&self) -> &'static str {
        self.0.kind()
    }

    fn __repr__(&self) -> String {
        format!("Criterion(kind='{}', name='{}')", self.0.kind(), self.0.name())
    }
}

#[pyclass(name = "ResultSeries", module = "scenmeta.core")]
#[derive(Debug, Clone)]
pub struct PyResultSeries(pub ResultSeries);

#[pymethods]
impl PyResultSeries {
    #[getter]
    fn name(&self) -> Option<String> {
        self.0.name().map(str::to_string)
    }

    /// Index entries as (model, scenario, region, unit) tuples
    fn index<'py>(&self, py: Python<'py>) -> Vec<Bound<'py, PyTuple>> {
        self.0
            .iter()
            .map(|(idx, _)| {
                PyTuple::new_bound(
                    py,
                    [
                        Some(idx.model.clone()),
                        Some(idx.scenario.clone()),
                        idx.region.clone(),
                        idx.unit.clone(),
                    ],
                )
            })
            .collect()
    }

    fn values<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec_bound(py, self.0.values())
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }
}

#[pyfunction]
#[pyo3(name = "evaluate")]
fn py_evaluate(dataset: &PyScenarioDataset, criterion: &PyCriterion) -> PyResult<PyResultSeries> {
    Ok(PyResultSeries(evaluate::evaluate(&dataset.0, &criterion.0)?))
}

/// Re-format a series with the given region, unit and name policy.
#[pyfunction]
#[pyo3(signature = (series, keep_regions, unit=None, keep_name=None))]
fn format_series(
    series: &Bound<'_, PyAny>,
    keep_regions: &Bound<'_, PyAny>,
    unit: Option<&Bound<'_, PyAny>>,
    keep_name: Option<&Bound<'_, PyAny>>,
) -> PyResult<PyResultSeries> {
    let series = series.downcast::<PyResultSeries>().map_err(|_| {
        CriteriaError::TypeMismatch {
            expected: "ResultSeries".to_string(),
            got: series
                .get_type()
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "object".to_string()),
        }
    })?;
    let policy = FormatPolicy::from_values(
        policy_value(keep_regions),
        unit.map_or(PolicyValue::Bool(false), policy_value),
        keep_name.map_or(PolicyValue::Bool(false), policy_value),
    )?;
    Ok(PyResultSeries(policy.apply(series.borrow().0.clone())))
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyScenarioDataset>()?;
    m.add_class::<PyCriterion>()?;
    m.add_class::<PyResultSeries>()?;
    m.add_function(wrap_pyfunction!(py_evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(format_series, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::{PyList, PyString};

    fn change_region(criterion: PyCriterion) -> Selector {
        match criterion.0 {
            Criterion::Change(c) => c.region,
            other => panic!("expected a change criterion, got {}", other.kind()),
        }
    }

    #[test]
    fn region_accepts_string_or_list() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let one = PyString::new_bound(py, "World");
            let region: RegionArg = one.extract().unwrap();
            assert_eq!(region, RegionArg::One("World".to_string()));
            let c = PyCriterion::change(2020, 2030, "X".into(), "x".into(), Some(region));
            assert_eq!(change_region(c), Selector::from("World"));

            let many = PyList::new_bound(py, ["World", "R5*"]);
            let region: RegionArg = many.extract().unwrap();
            let c = PyCriterion::change(2020, 2030, "X".into(), "x".into(), Some(region));
            assert!(change_region(c).matches("R5ASIA"));

            let all = PyString::new_bound(py, "*");
            let c = PyCriterion::change(2020, 2030, "X".into(), "x".into(), all.extract().ok());
            assert_eq!(change_region(c), Selector::All);

            let c = PyCriterion::change(2020, 2030, "X".into(), "x".into(), None);
            assert_eq!(change_region(c), Selector::All);
        });
    }

    #[test]
    fn wrong_series_type_is_a_type_error() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let not_a_series = py.eval_bound("1", None, None).unwrap();
            let keep_regions = py.eval_bound("True", None, None).unwrap();
            let err = format_series(&not_a_series, &keep_regions, None, None).unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));

            let bad_unit = py.eval_bound("3", None, None).unwrap();
            let series = Bound::new(py, PyResultSeries(ResultSeries::new(None))).unwrap();
            let err = format_series(series.as_any(), &keep_regions, Some(&bad_unit), None)
                .unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }
}
