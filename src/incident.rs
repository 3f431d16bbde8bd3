use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::info;

use crate::component::Component;
use crate::error::FleetError;
use crate::history::BusHistory;
use crate::schedule::ReplacementSchedule;
use crate::schema::{self, incident};

/// Identifies one replacement event.
///
/// Rendered as `"{bus_id}_{component_id}_{component_type}_{date}"` for the
/// `incident_id` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncidentKey {
    pub bus_id: i64,
    pub component_id: i64,
    pub component: Component,
    pub date: NaiveDate,
}

impl fmt::Display for IncidentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.bus_id,
            self.component_id,
            self.component,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// A single historical component replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub component: Component,
    pub bus_id: i64,
    /// Identity of the unit installed by this replacement.
    pub component_id: i64,
    pub mileage: i64,
    pub incident_date: NaiveDate,
}

impl Incident {
    pub fn key(&self) -> IncidentKey {
        IncidentKey {
            bus_id: self.bus_id,
            component_id: self.component_id,
            component: self.component,
            date: self.incident_date,
        }
    }
}

/// One incident per flagged schedule cell.
///
/// The replacement at step `k` is read from history record `k + 1`, the
/// record simulated for that step: its start date and mileage, and the
/// identity of its unit plus one, i.e. the unit the replacement installs.
/// `histories[i]` must have been simulated from `schedules[i]`.
pub fn extract_incidents(
    histories: &[BusHistory],
    schedules: &[ReplacementSchedule],
) -> Result<Vec<Incident>, FleetError> {
    if histories.len() != schedules.len() {
        return Err(FleetError::Shape(format!(
            "{} bus histories but {} replacement schedules",
            histories.len(),
            schedules.len()
        )));
    }

    let expected: usize = schedules.iter().flat_map(|s| s.totals()).sum();
    let mut incidents = Vec::with_capacity(expected);
    let mut seen: HashSet<IncidentKey> = HashSet::with_capacity(expected);

    for (history, schedule) in histories.iter().zip(schedules) {
        let records = history.records();
        if records.len() != schedule.len() + 1 {
            return Err(FleetError::Shape(format!(
                "bus {}: {} history records for {} schedule steps",
                history.bus_id(),
                records.len(),
                schedule.len()
            )));
        }

        for (step, component) in schedule.events() {
            let record = &records[step + 1];
            let incident = Incident {
                component,
                bus_id: record.bus_id,
                component_id: record.component_id(component) + 1,
                mileage: record.mileage,
                incident_date: record.start_date,
            };
            if !seen.insert(incident.key()) {
                return Err(FleetError::DuplicateIncident(incident.key()));
            }
            incidents.push(incident);
        }
    }

    info!(
        buses = histories.len(),
        incidents = incidents.len(),
        "extracted incidents"
    );
    Ok(incidents)
}

/// Render incidents as a table: incident_id, component_type, bus_id,
/// component_id, mileage, incident_timestamp.
pub fn incidents_frame(incidents: &[Incident]) -> Result<DataFrame, FleetError> {
    let ids: Vec<String> = incidents.iter().map(|i| i.key().to_string()).collect();
    let types: Vec<&str> = incidents.iter().map(|i| i.component.as_str()).collect();
    let bus_ids: Vec<i64> = incidents.iter().map(|i| i.bus_id).collect();
    let component_ids: Vec<i64> = incidents.iter().map(|i| i.component_id).collect();
    let mileages: Vec<i64> = incidents.iter().map(|i| i.mileage).collect();
    let dates: Vec<i32> = incidents
        .iter()
        .map(|i| schema::epoch_days(i.incident_date))
        .collect();

    let df = DataFrame::new(vec![
        Column::new(incident::INCIDENT_ID.into(), &ids),
        Column::new(incident::COMPONENT_TYPE.into(), &types),
        Column::new(incident::BUS_ID.into(), &bus_ids),
        Column::new(incident::COMPONENT_ID.into(), &component_ids),
        Column::new(incident::MILEAGE.into(), &mileages),
        Column::new(incident::INCIDENT_TIMESTAMP.into(), &dates).cast(&DataType::Date)?,
    ])?;
    Ok(df)
}
