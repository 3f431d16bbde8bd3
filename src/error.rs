#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

use crate::incident::IncidentKey;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Shape: {0}")]
    Shape(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Duplicate incident: {0}")]
    DuplicateIncident(IncidentKey),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "python")]
impl From<FleetError> for PyErr {
    fn from(err: FleetError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}
