use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::component::{Component, COMPONENT_COUNT};
use crate::error::FleetError;
use crate::schema;

/// One schedule step: a replacement flag per component, in `Component::ALL` order.
pub type ReplacementRow = [bool; COMPONENT_COUNT];

const BASE_PATTERN: [[u8; COMPONENT_COUNT]; 10] = [
    [1, 0, 0, 0],
    [0, 1, 0, 0],
    [0, 0, 1, 0],
    [0, 0, 0, 1],
    [0, 0, 1, 0],
    [1, 1, 0, 0],
    [1, 0, 0, 0],
    [0, 1, 0, 0],
    [0, 0, 1, 0],
    [1, 0, 0, 0],
];

/// Ordered replacement events of a single bus.
///
/// Row `i` holds the components replaced at step `i`; row order is
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementSchedule {
    rows: Vec<ReplacementRow>,
}

impl ReplacementSchedule {
    /// The fixed demonstration pattern every bus schedule is shuffled from.
    pub fn base_pattern() -> Self {
        Self {
            rows: BASE_PATTERN
                .iter()
                .map(|row| row.map(|flag| flag == 1))
                .collect(),
        }
    }

    /// A row-shuffled copy of the base pattern.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut schedule = Self::base_pattern();
        schedule.rows.shuffle(rng);
        schedule
    }

    /// Build a schedule from a raw 0/1 matrix.
    ///
    /// Every row must have exactly one flag per component and every flag
    /// must be 0 or 1.
    pub fn from_rows<R: AsRef<[u8]>>(matrix: &[R]) -> Result<Self, FleetError> {
        let mut rows = Vec::with_capacity(matrix.len());
        for (i, raw) in matrix.iter().enumerate() {
            let raw = raw.as_ref();
            if raw.len() != COMPONENT_COUNT {
                return Err(FleetError::Shape(format!(
                    "Replacement row {i} has {} columns, expected {COMPONENT_COUNT}",
                    raw.len()
                )));
            }
            let mut row = [false; COMPONENT_COUNT];
            for (j, &flag) in raw.iter().enumerate() {
                row[j] = match flag {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(FleetError::Shape(format!(
                            "Replacement flag at row {i}, column {j} is {other}, expected 0 or 1"
                        )))
                    }
                };
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReplacementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every flagged cell as `(step, component)`, in row-major order.
    pub fn events(&self) -> impl Iterator<Item = (usize, Component)> + '_ {
        self.rows.iter().enumerate().flat_map(|(step, row)| {
            Component::ALL
                .into_iter()
                .filter(move |c| row[c.index()])
                .map(move |c| (step, c))
        })
    }

    /// Replacements per component over the whole schedule.
    pub fn totals(&self) -> [usize; COMPONENT_COUNT] {
        let mut totals = [0; COMPONENT_COUNT];
        for row in &self.rows {
            for (total, &flag) in totals.iter_mut().zip(row) {
                *total += usize::from(flag);
            }
        }
        totals
    }
}

/// Stack per-bus schedules into one long table: bus_id, step, one 0/1
/// column per component. `schedules[i]` belongs to bus `i + 1`.
pub fn schedules_frame(schedules: &[ReplacementSchedule]) -> Result<DataFrame, FleetError> {
    let mut bus_ids: Vec<i64> = Vec::new();
    let mut steps: Vec<i64> = Vec::new();
    let mut flags: [Vec<i32>; COMPONENT_COUNT] = Default::default();

    for (i, schedule) in schedules.iter().enumerate() {
        for (step, row) in schedule.rows().iter().enumerate() {
            bus_ids.push(i as i64 + 1);
            steps.push(step as i64);
            for (column, &flag) in flags.iter_mut().zip(row) {
                column.push(i32::from(flag));
            }
        }
    }

    let mut columns = vec![
        Column::new(schema::schedule::BUS_ID.into(), &bus_ids),
        Column::new(schema::schedule::STEP.into(), &steps),
    ];
    for (name, values) in schema::schedule::FLAGS.iter().zip(&flags) {
        columns.push(Column::new((*name).into(), values));
    }
    Ok(DataFrame::new(columns)?)
}
