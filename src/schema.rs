//! Column-name constants for the fleet tables.
//! Single source of truth - exported to Python via PyO3.

use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;

use crate::error::FleetError;

// ── History columns ─────────────────────────────────────────────────────────
pub mod history {
    pub const BUS_ID: &str = "bus_id";
    pub const ENGINE_ID: &str = "engine_id";
    pub const TRANSMISSION_ID: &str = "transmission_id";
    pub const RADIATOR_ID: &str = "radiator_id";
    pub const BRAKES_ID: &str = "brakes_id";
    pub const MILEAGE: &str = "mileage";
    pub const START_TIMESTAMP: &str = "start_timestamp";
    pub const END_TIMESTAMP: &str = "end_timestamp";

    /// Identity columns, indexed the same as `Component::ALL`.
    pub const COMPONENT_IDS: [&str; 4] = [ENGINE_ID, TRANSMISSION_ID, RADIATOR_ID, BRAKES_ID];
}

// ── Schedule columns ────────────────────────────────────────────────────────
pub mod schedule {
    pub const BUS_ID: &str = "bus_id";
    pub const STEP: &str = "step";
    pub const ENGINE: &str = "engine";
    pub const TRANSMISSION: &str = "transmission";
    pub const RADIATOR: &str = "radiator";
    pub const BRAKES: &str = "brakes";

    pub const FLAGS: [&str; 4] = [ENGINE, TRANSMISSION, RADIATOR, BRAKES];
}

// ── Incident columns ────────────────────────────────────────────────────────
pub mod incident {
    pub const INCIDENT_ID: &str = "incident_id";
    pub const COMPONENT_TYPE: &str = "component_type";
    pub const BUS_ID: &str = "bus_id";
    pub const COMPONENT_ID: &str = "component_id";
    pub const MILEAGE: &str = "mileage";
    pub const INCIDENT_TIMESTAMP: &str = "incident_timestamp";
}

// ── Risk columns ────────────────────────────────────────────────────────────
pub mod risk {
    pub const BUS_ID: &str = "bus_id";
    pub const COMPONENT_TYPE: &str = "component_type";
    pub const LATEST_INCIDENT_TIMESTAMP: &str = "latest_incident_timestamp";
    pub const MILEAGE: &str = "mileage";
    pub const RECORDS: &str = "records";
    pub const CURRENT_MILEAGE: &str = "current_mileage";
    pub const STANDARD_MILEAGE: &str = "standard_mileage";
    pub const MILEAGE_TO_REPLACE: &str = "mileage_to_replace";
    pub const DAYS_TO_REPLACE: &str = "days_to_replace";
    pub const PART_WEAR: &str = "part_wear";
    pub const MAINTENANCE_ISSUE: &str = "maintenance_issue";

    pub const ALL: [&str; 11] = [
        BUS_ID,
        COMPONENT_TYPE,
        LATEST_INCIDENT_TIMESTAMP,
        MILEAGE,
        RECORDS,
        CURRENT_MILEAGE,
        STANDARD_MILEAGE,
        MILEAGE_TO_REPLACE,
        DAYS_TO_REPLACE,
        PART_WEAR,
        MAINTENANCE_ISSUE,
    ];
}

// ── Summary columns ─────────────────────────────────────────────────────────
pub mod summary {
    pub const COUNT: &str = "count";
    pub const PERCENTAGE: &str = "percentage";
}

// ── Maintenance issue values ────────────────────────────────────────────────
pub mod maintenance_issue {
    pub const LOW: &str = "LOW";
    pub const MEDIUM: &str = "MEDIUM";
    pub const HIGH: &str = "HIGH";
}

/// Fail with `MissingColumn` for the first required column `df` lacks.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), FleetError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(FleetError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

// ── Date encoding ───────────────────────────────────────────────────────────

const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Polars stores `Date` as days since the Unix epoch in an `Int32`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}
