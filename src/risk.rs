use std::fmt;

use polars::prelude::*;
use tracing::info;

use crate::component::Component;
use crate::config::AVG_DAILY_MILEAGE;
use crate::error::FleetError;
use crate::schema::{self, incident, maintenance_issue, risk};

/// Urgency of servicing a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaintenanceIssue {
    Low,
    Medium,
    High,
}

impl MaintenanceIssue {
    /// Fewer remaining days than this is at least MEDIUM.
    pub const MEDIUM_BELOW_DAYS: i64 = 150;

    /// First match wins: no days left is HIGH, under 150 days MEDIUM.
    pub fn classify(days_to_replace: i64) -> Self {
        if days_to_replace == 0 {
            Self::High
        } else if days_to_replace < Self::MEDIUM_BELOW_DAYS {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => maintenance_issue::LOW,
            Self::Medium => maintenance_issue::MEDIUM,
            Self::High => maintenance_issue::HIGH,
        }
    }

    /// `classify` as a polars expression over an integer days column.
    pub fn classify_expr(days_to_replace: Expr) -> Expr {
        when(days_to_replace.clone().eq(lit(0i64)))
            .then(lit(Self::High.as_str()))
            .when(days_to_replace.lt(lit(Self::MEDIUM_BELOW_DAYS)))
            .then(lit(Self::Medium.as_str()))
            .otherwise(lit(Self::Low.as_str()))
    }
}

impl fmt::Display for MaintenanceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup table: component_type → standard_mileage.
pub fn standard_mileage_frame() -> Result<DataFrame, FleetError> {
    let names: Vec<&str> = Component::ALL.iter().map(|c| c.as_str()).collect();
    let mileages: Vec<i64> = Component::ALL.iter().map(|c| c.standard_mileage()).collect();
    let df = DataFrame::new(vec![
        Column::new(risk::COMPONENT_TYPE.into(), &names),
        Column::new(risk::STANDARD_MILEAGE.into(), &mileages),
    ])?;
    Ok(df)
}

/// Project replacement risk per (bus, component) from an incident table.
pub fn predict_risk(incidents: &DataFrame) -> Result<DataFrame, FleetError> {
    predict_risk_with_daily_mileage(incidents, AVG_DAILY_MILEAGE)
}

/// `predict_risk` with an explicit miles-per-day average.
///
/// Output columns, in order: bus_id, component_type,
/// latest_incident_timestamp, mileage, records, current_mileage,
/// standard_mileage, mileage_to_replace, days_to_replace, part_wear,
/// maintenance_issue. A (bus, component) pair without incidents has no row.
pub fn predict_risk_with_daily_mileage(
    incidents: &DataFrame,
    avg_daily_mileage: f64,
) -> Result<DataFrame, FleetError> {
    schema::require_columns(
        incidents,
        &[
            incident::BUS_ID,
            incident::COMPONENT_TYPE,
            incident::COMPONENT_ID,
            incident::MILEAGE,
            incident::INCIDENT_TIMESTAMP,
        ],
    )?;
    if !(avg_daily_mileage > 0.0) {
        return Err(FleetError::InvalidConfig(format!(
            "avg_daily_mileage must be positive, got {avg_daily_mileage}"
        )));
    }

    // Unknown component types would silently drop out of the join below.
    for name in incidents.column(incident::COMPONENT_TYPE)?.str()?.into_iter() {
        match name {
            Some(name) => {
                name.parse::<Component>()?;
            }
            None => {
                return Err(FleetError::Shape(
                    "Null component_type in incident table".to_string(),
                ))
            }
        }
    }

    let latest = incidents
        .clone()
        .lazy()
        .group_by([col(incident::BUS_ID), col(incident::COMPONENT_TYPE)])
        .agg([
            col(incident::INCIDENT_TIMESTAMP)
                .max()
                .alias(risk::LATEST_INCIDENT_TIMESTAMP),
            col(incident::MILEAGE).max().alias(risk::MILEAGE),
            col(incident::COMPONENT_ID)
                .count()
                .cast(DataType::Int64)
                .alias(risk::RECORDS),
        ]);

    // The odometer of a bus is its furthest replacement across all components.
    let current = latest
        .clone()
        .group_by([col(risk::BUS_ID)])
        .agg([col(risk::MILEAGE).max().alias(risk::CURRENT_MILEAGE)]);

    let remaining = col(risk::STANDARD_MILEAGE) + col(risk::MILEAGE) - col(risk::CURRENT_MILEAGE);

    let df = latest
        .join(
            current,
            [col(risk::BUS_ID)],
            [col(risk::BUS_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            standard_mileage_frame()?.lazy(),
            [col(risk::COMPONENT_TYPE)],
            [col(risk::COMPONENT_TYPE)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns([when(remaining.clone().gt(lit(0i64)))
            .then(remaining)
            .otherwise(lit(0i64))
            .alias(risk::MILEAGE_TO_REPLACE)])
        .with_columns([
            // Non-negative, so truncation is floor.
            (col(risk::MILEAGE_TO_REPLACE).cast(DataType::Float64) / lit(avg_daily_mileage))
                .cast(DataType::Int64)
                .alias(risk::DAYS_TO_REPLACE),
            ((col(risk::CURRENT_MILEAGE) - col(risk::MILEAGE)).cast(DataType::Float64)
                / col(risk::STANDARD_MILEAGE).cast(DataType::Float64))
            .alias(risk::PART_WEAR),
        ])
        .with_columns([MaintenanceIssue::classify_expr(col(risk::DAYS_TO_REPLACE))
            .alias(risk::MAINTENANCE_ISSUE)])
        .sort_by_exprs(
            [col(risk::BUS_ID), col(risk::COMPONENT_TYPE)],
            SortMultipleOptions::default(),
        )
        .select(risk::ALL.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;

    info!(
        incidents = incidents.height(),
        assessments = df.height(),
        "predicted maintenance risk"
    );
    Ok(df)
}
