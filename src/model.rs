use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use polars::prelude::DataFrame;

use crate::aggregation::summarize_maintenance_issues;
use crate::config::{SeedScope, SimulationConfig};
use crate::error::FleetError;
use crate::fleet::{generate_fleet_history, FleetHistory};
use crate::incident::{extract_incidents, incidents_frame};
use crate::risk::predict_risk_with_daily_mileage;

/// One fleet simulation run, holding each stage's table once computed.
#[pyclass]
pub struct FleetModel {
    bus_count: usize,
    config: SimulationConfig,
    fleet: Option<FleetHistory>,
    incidents: Option<DataFrame>,
    risk: Option<DataFrame>,
}

#[pymethods]
impl FleetModel {
    #[new]
    #[pyo3(signature = (bus_count, seed=0, seed_scope="fleet", avg_daily_mileage=None))]
    fn new(
        bus_count: usize,
        seed: u64,
        seed_scope: &str,
        avg_daily_mileage: Option<f64>,
    ) -> PyResult<Self> {
        let seed_scope: SeedScope = seed_scope
            .parse()
            .map_err(|e: FleetError| PyValueError::new_err(e.to_string()))?;
        let mut config = SimulationConfig {
            seed,
            seed_scope,
            ..SimulationConfig::default()
        };
        if let Some(avg) = avg_daily_mileage {
            config.avg_daily_mileage = avg;
        }
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(Self {
            bus_count,
            config,
            fleet: None,
            incidents: None,
            risk: None,
        })
    }

    // ── Pipeline ────────────────────────────────────────────────────────────

    /// Simulate the fleet. Returns the history table and invalidates every
    /// downstream table.
    fn generate(&mut self) -> PyResult<PyDataFrame> {
        let fleet = generate_fleet_history(self.bus_count, &self.config)?;
        let df = fleet.history_frame()?;
        self.fleet = Some(fleet);
        self.incidents = None;
        self.risk = None;
        Ok(PyDataFrame(df))
    }

    /// Derive the incident table, simulating the fleet first if needed.
    fn extract_incidents(&mut self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.get_or_build_incidents()?.clone()))
    }

    /// Derive the risk table, running the earlier stages if needed.
    fn predict_risk(&mut self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.get_or_build_risk()?.clone()))
    }

    /// Share of risk rows per maintenance level, optionally within
    /// each value of a column of `risk_df`.
    ///
    /// Pass `risk_df` to summarize a risk table joined with bus attributes;
    /// otherwise the model's own risk table is used.
    #[pyo3(signature = (group_by=None, risk_df=None))]
    fn summarize(
        &mut self,
        group_by: Option<&str>,
        risk_df: Option<PyDataFrame>,
    ) -> PyResult<PyDataFrame> {
        let df = match risk_df {
            Some(df) => summarize_maintenance_issues(&df.0, group_by)?,
            None => summarize_maintenance_issues(self.get_or_build_risk()?, group_by)?,
        };
        Ok(PyDataFrame(df))
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn bus_count(&self) -> usize {
        self.bus_count
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.config.seed
    }

    #[getter]
    fn history_df(&self) -> PyResult<Option<PyDataFrame>> {
        self.fleet
            .as_ref()
            .map(|f| f.history_frame().map(PyDataFrame))
            .transpose()
            .map_err(PyErr::from)
    }

    #[getter]
    fn schedules_df(&self) -> PyResult<Option<PyDataFrame>> {
        self.fleet
            .as_ref()
            .map(|f| f.schedules_frame().map(PyDataFrame))
            .transpose()
            .map_err(PyErr::from)
    }

    #[getter]
    fn incidents_df(&self) -> Option<PyDataFrame> {
        self.incidents.clone().map(PyDataFrame)
    }

    #[getter]
    fn risk_df(&self) -> Option<PyDataFrame> {
        self.risk.clone().map(PyDataFrame)
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl FleetModel {
    fn get_or_build_fleet(&mut self) -> Result<&FleetHistory, FleetError> {
        if self.fleet.is_none() {
            self.fleet = Some(generate_fleet_history(self.bus_count, &self.config)?);
        }
        Ok(self.fleet.as_ref().expect("fleet set above"))
    }

    fn get_or_build_incidents(&mut self) -> Result<&DataFrame, FleetError> {
        if self.incidents.is_none() {
            let fleet = self.get_or_build_fleet()?;
            let incidents = extract_incidents(&fleet.histories, &fleet.schedules)?;
            self.incidents = Some(incidents_frame(&incidents)?);
        }
        Ok(self.incidents.as_ref().expect("incidents set above"))
    }

    fn get_or_build_risk(&mut self) -> Result<&DataFrame, FleetError> {
        if self.risk.is_none() {
            let avg = self.config.avg_daily_mileage;
            let incidents = self.get_or_build_incidents()?;
            self.risk = Some(predict_risk_with_daily_mileage(incidents, avg)?);
        }
        Ok(self.risk.as_ref().expect("risk set above"))
    }
}
