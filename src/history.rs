use chrono::{Days, NaiveDate};
use polars::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::component::{Component, COMPONENT_COUNT};
use crate::config::SimulationConfig;
use crate::error::FleetError;
use crate::schedule::ReplacementSchedule;
use crate::schema::{self, history};

/// Component identities of one history row, in `Component::ALL` order.
pub type ComponentIds = [i64; COMPONENT_COUNT];

/// One span of a bus's life during which the installed units did not change.
#[derive(Debug, Clone, PartialEq)]
pub struct BusHistoryRecord {
    pub bus_id: i64,
    pub component_ids: ComponentIds,
    /// Odometer reading at the start of the span.
    pub mileage: i64,
    pub start_date: NaiveDate,
    /// Last day of the span; `None` for the span still in service.
    pub end_date: Option<NaiveDate>,
}

impl BusHistoryRecord {
    pub fn component_id(&self, component: Component) -> i64 {
        self.component_ids[component.index()]
    }
}

/// Simulated history of a single bus: an initial record followed by one
/// record per schedule step.
#[derive(Debug, Clone, PartialEq)]
pub struct BusHistory {
    bus_id: i64,
    records: Vec<BusHistoryRecord>,
}

impl BusHistory {
    pub fn bus_id(&self) -> i64 {
        self.bus_id
    }

    pub fn records(&self) -> &[BusHistoryRecord] {
        &self.records
    }

    /// Odometer reading of the span currently in service.
    pub fn current_mileage(&self) -> i64 {
        self.records.last().map_or(0, |r| r.mileage)
    }

    /// Shift every component identity by `offset`.
    pub fn offset_component_ids(&mut self, offset: i64) {
        for record in &mut self.records {
            for id in &mut record.component_ids {
                *id += offset;
            }
        }
    }
}

/// Identity of the installed unit per schedule step.
///
/// A replacement flagged at step `i` takes effect from step `i + 1`, so
/// `ids[i][c]` counts the flags of column `c` in steps `0..i`.
pub fn component_identities(schedule: &ReplacementSchedule) -> Vec<ComponentIds> {
    let mut running = [0i64; COMPONENT_COUNT];
    schedule
        .rows()
        .iter()
        .map(|row| {
            let current = running;
            for (count, &flag) in running.iter_mut().zip(row) {
                *count += i64::from(flag);
            }
            current
        })
        .collect()
}

/// Draw an expected service life for every schedule cell.
///
/// One N(1, sigma) coefficient is drawn per cell in row-major order, flagged
/// or not, so a schedule of `h` steps always consumes `4 * h` draws. Cells
/// without a replacement get an infinite life.
pub fn draw_service_lives<R: Rng + ?Sized>(
    schedule: &ReplacementSchedule,
    rng: &mut R,
    sigma: f64,
) -> Result<Vec<[f64; COMPONENT_COUNT]>, FleetError> {
    // Normal::new accepts any finite std_dev, negative included.
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(FleetError::InvalidConfig(format!(
            "mileage_sigma must be finite and non-negative, got {sigma}"
        )));
    }
    let normal = Normal::new(1.0, sigma)
        .map_err(|e| FleetError::InvalidConfig(format!("mileage coefficient: {e}")))?;

    let lives = schedule
        .rows()
        .iter()
        .map(|row| {
            let mut lives = [f64::INFINITY; COMPONENT_COUNT];
            for component in Component::ALL {
                let coefficient = normal.sample(&mut *rng);
                if row[component.index()] {
                    let life = component.standard_mileage() as f64 * coefficient;
                    lives[component.index()] = life.max(0.0);
                }
            }
            lives
        })
        .collect();
    Ok(lives)
}

/// Mileage driven after each step: the life of whichever replaced unit is
/// due soonest. Steps with no replacement add nothing.
pub fn step_increments(lives: &[[f64; COMPONENT_COUNT]]) -> Vec<f64> {
    lives
        .iter()
        .map(|row| {
            let soonest = row.iter().copied().fold(f64::INFINITY, f64::min);
            if soonest.is_finite() {
                soonest
            } else {
                0.0
            }
        })
        .collect()
}

/// Simulate the history of one bus from its replacement schedule.
///
/// Returns `schedule.len() + 1` records. The first is the bus as delivered:
/// original units, zero mileage, starting at `start_date`.
pub fn simulate_bus_history<R: Rng + ?Sized>(
    bus_id: i64,
    start_date: NaiveDate,
    schedule: &ReplacementSchedule,
    rng: &mut R,
    config: &SimulationConfig,
) -> Result<BusHistory, FleetError> {
    let identities = component_identities(schedule);
    let lives = draw_service_lives(schedule, rng, config.mileage_sigma)?;
    let increments = step_increments(&lives);

    // Odometer per record, same one-step lag as the identities.
    let mut mileages = Vec::with_capacity(schedule.len() + 1);
    mileages.push(0i64);
    let mut driven = 0.0f64;
    for increment in &increments {
        mileages.push(driven as i64);
        driven += increment;
    }

    let mut starts = Vec::with_capacity(mileages.len());
    starts.push(start_date);
    for pair in mileages.windows(2) {
        let days = config.days_for_mileage(pair[1] - pair[0]).max(0) as u64;
        let previous = starts[starts.len() - 1];
        let next = previous.checked_add_days(Days::new(days)).ok_or_else(|| {
            FleetError::InvalidConfig(format!(
                "bus {bus_id}: history date overflow after {previous}"
            ))
        })?;
        starts.push(next);
    }

    let mut records = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end_date = match starts.get(i + 1) {
            Some(next) => Some(next.pred_opt().ok_or_else(|| {
                FleetError::InvalidConfig(format!("bus {bus_id}: no day before {next}"))
            })?),
            None => None,
        };
        let component_ids = if i == 0 {
            [0; COMPONENT_COUNT]
        } else {
            identities[i - 1]
        };
        records.push(BusHistoryRecord {
            bus_id,
            component_ids,
            mileage: mileages[i],
            start_date: start,
            end_date,
        });
    }

    Ok(BusHistory { bus_id, records })
}

/// Render histories as one table: bus_id, four identity columns, mileage,
/// start_timestamp, end_timestamp (dates; the open span has a null end).
pub fn history_frame(histories: &[BusHistory]) -> Result<DataFrame, FleetError> {
    let height: usize = histories.iter().map(|h| h.records.len()).sum();
    let mut bus_ids = Vec::with_capacity(height);
    let mut ids: [Vec<i64>; COMPONENT_COUNT] = Default::default();
    let mut mileages = Vec::with_capacity(height);
    let mut starts = Vec::with_capacity(height);
    let mut ends: Vec<Option<i32>> = Vec::with_capacity(height);

    for record in histories.iter().flat_map(|h| h.records.iter()) {
        bus_ids.push(record.bus_id);
        for (column, &id) in ids.iter_mut().zip(&record.component_ids) {
            column.push(id);
        }
        mileages.push(record.mileage);
        starts.push(schema::epoch_days(record.start_date));
        ends.push(record.end_date.map(schema::epoch_days));
    }

    let mut columns = vec![Column::new(history::BUS_ID.into(), &bus_ids)];
    for (name, values) in history::COMPONENT_IDS.iter().zip(&ids) {
        columns.push(Column::new((*name).into(), values));
    }
    columns.push(Column::new(history::MILEAGE.into(), &mileages));
    columns.push(Column::new(history::START_TIMESTAMP.into(), &starts).cast(&DataType::Date)?);
    columns.push(Column::new(history::END_TIMESTAMP.into(), &ends).cast(&DataType::Date)?);

    Ok(DataFrame::new(columns)?)
}
