//! Synthetic school-bus maintenance histories and replacement-risk
//! projection.
//!
//! The pipeline runs in five stages, each consuming only the previous
//! stage's output:
//!
//! 1. [`schedule`]: shuffled replacement schedules per bus.
//! 2. [`history`]: component identity, mileage and date spans per bus.
//! 3. [`fleet`]: all buses, with fleet-unique component identities.
//! 4. [`incident`]: one row per component replacement.
//! 5. [`risk`]: latest replacement per bus/component, remaining mileage and
//!    days, and a LOW/MEDIUM/HIGH maintenance issue.
//!
//! [`aggregation`] summarizes the risk table per maintenance level.

pub mod aggregation;
pub mod component;
pub mod config;
pub mod error;
pub mod fleet;
pub mod history;
pub mod incident;
pub mod risk;
pub mod schedule;
pub mod schema;

#[cfg(feature = "python")]
mod model;

pub use component::Component;
pub use config::{SeedScope, SimulationConfig};
pub use error::FleetError;
pub use fleet::{generate_fleet_history, FleetHistory};
pub use incident::{extract_incidents, incidents_frame, Incident, IncidentKey};
pub use risk::{predict_risk, MaintenanceIssue};

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use pyo3::types::PyModule;

    use crate::model::FleetModel;
    use crate::schema;

    /// Export schema constants as Python submodules
    fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // History
        let history = PyModule::new(m.py(), "history")?;
        history.add("BUS_ID", schema::history::BUS_ID)?;
        history.add("ENGINE_ID", schema::history::ENGINE_ID)?;
        history.add("TRANSMISSION_ID", schema::history::TRANSMISSION_ID)?;
        history.add("RADIATOR_ID", schema::history::RADIATOR_ID)?;
        history.add("BRAKES_ID", schema::history::BRAKES_ID)?;
        history.add("MILEAGE", schema::history::MILEAGE)?;
        history.add("START_TIMESTAMP", schema::history::START_TIMESTAMP)?;
        history.add("END_TIMESTAMP", schema::history::END_TIMESTAMP)?;
        m.add_submodule(&history)?;

        // Schedule
        let schedule = PyModule::new(m.py(), "schedule")?;
        schedule.add("BUS_ID", schema::schedule::BUS_ID)?;
        schedule.add("STEP", schema::schedule::STEP)?;
        schedule.add("ENGINE", schema::schedule::ENGINE)?;
        schedule.add("TRANSMISSION", schema::schedule::TRANSMISSION)?;
        schedule.add("RADIATOR", schema::schedule::RADIATOR)?;
        schedule.add("BRAKES", schema::schedule::BRAKES)?;
        m.add_submodule(&schedule)?;

        // Incident
        let incident = PyModule::new(m.py(), "incident")?;
        incident.add("INCIDENT_ID", schema::incident::INCIDENT_ID)?;
        incident.add("COMPONENT_TYPE", schema::incident::COMPONENT_TYPE)?;
        incident.add("BUS_ID", schema::incident::BUS_ID)?;
        incident.add("COMPONENT_ID", schema::incident::COMPONENT_ID)?;
        incident.add("MILEAGE", schema::incident::MILEAGE)?;
        incident.add("INCIDENT_TIMESTAMP", schema::incident::INCIDENT_TIMESTAMP)?;
        m.add_submodule(&incident)?;

        // Risk
        let risk = PyModule::new(m.py(), "risk")?;
        risk.add("BUS_ID", schema::risk::BUS_ID)?;
        risk.add("COMPONENT_TYPE", schema::risk::COMPONENT_TYPE)?;
        risk.add(
            "LATEST_INCIDENT_TIMESTAMP",
            schema::risk::LATEST_INCIDENT_TIMESTAMP,
        )?;
        risk.add("MILEAGE", schema::risk::MILEAGE)?;
        risk.add("RECORDS", schema::risk::RECORDS)?;
        risk.add("CURRENT_MILEAGE", schema::risk::CURRENT_MILEAGE)?;
        risk.add("STANDARD_MILEAGE", schema::risk::STANDARD_MILEAGE)?;
        risk.add("MILEAGE_TO_REPLACE", schema::risk::MILEAGE_TO_REPLACE)?;
        risk.add("DAYS_TO_REPLACE", schema::risk::DAYS_TO_REPLACE)?;
        risk.add("PART_WEAR", schema::risk::PART_WEAR)?;
        risk.add("MAINTENANCE_ISSUE", schema::risk::MAINTENANCE_ISSUE)?;
        m.add_submodule(&risk)?;

        // Summary
        let summary = PyModule::new(m.py(), "summary")?;
        summary.add("COUNT", schema::summary::COUNT)?;
        summary.add("PERCENTAGE", schema::summary::PERCENTAGE)?;
        m.add_submodule(&summary)?;

        // Maintenance issue levels
        let issue = PyModule::new(m.py(), "maintenance_issue")?;
        issue.add("LOW", schema::maintenance_issue::LOW)?;
        issue.add("MEDIUM", schema::maintenance_issue::MEDIUM)?;
        issue.add("HIGH", schema::maintenance_issue::HIGH)?;
        m.add_submodule(&issue)?;

        Ok(())
    }

    #[pymodule]
    #[pyo3(name = "_core")]
    fn core_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<FleetModel>()?;
        add_schema_exports(m)?;
        Ok(())
    }
}
