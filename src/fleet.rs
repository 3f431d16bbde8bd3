use chrono::{Days, NaiveDate};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{SeedScope, SimulationConfig};
use crate::error::FleetError;
use crate::history::{self, simulate_bus_history, BusHistory};
use crate::schedule::{self, ReplacementSchedule};

/// Simulated histories of a whole fleet, with the schedule each bus was
/// simulated from. `histories[i]` and `schedules[i]` belong to bus `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct FleetHistory {
    pub histories: Vec<BusHistory>,
    pub schedules: Vec<ReplacementSchedule>,
}

impl FleetHistory {
    pub fn bus_count(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// The fleet-wide history table.
    pub fn history_frame(&self) -> Result<DataFrame, FleetError> {
        history::history_frame(&self.histories)
    }

    /// All bus schedules stacked into one table.
    pub fn schedules_frame(&self) -> Result<DataFrame, FleetError> {
        schedule::schedules_frame(&self.schedules)
    }
}

/// Tag mixed into the master seed for the service-life coefficient stream.
const COEFFICIENT_STREAM: u64 = 1;

/// Seed of an independent stream derived from the master seed.
fn derive_stream_seed(seed: u64, stream: u64) -> u64 {
    // SplitMix64 finalizer.
    let mut x = seed ^ (stream << 1);
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed of the stream the service-life coefficients are drawn from.
///
/// Start dates and shuffles use `seed` directly; the coefficients never
/// share its words.
pub fn coefficient_seed(seed: u64) -> u64 {
    derive_stream_seed(seed, COEFFICIENT_STREAM)
}

/// Uniform random day in the inclusive window.
pub fn random_start_date<R: Rng + ?Sized>(
    rng: &mut R,
    window: (NaiveDate, NaiveDate),
) -> Result<NaiveDate, FleetError> {
    let (first, last) = window;
    let span = (last - first).num_days();
    if span < 0 {
        return Err(FleetError::InvalidConfig(format!(
            "start_window begins after it ends: {first} > {last}"
        )));
    }
    let offset = rng.gen_range(0..=span as u64);
    first
        .checked_add_days(Days::new(offset))
        .ok_or_else(|| FleetError::InvalidConfig(format!("start date overflow after {first}")))
}

/// Simulate `bus_count` buses with ids `1..=bus_count`.
///
/// Each bus gets a random start date, a shuffled schedule and a simulated
/// history whose component identities are offset by
/// `bus_id * component_id_stride`, keeping identities unique fleet-wide.
pub fn generate_fleet_history(
    bus_count: usize,
    config: &SimulationConfig,
) -> Result<FleetHistory, FleetError> {
    config.validate()?;

    let steps = ReplacementSchedule::base_pattern().len() as i64;
    if config.component_id_stride <= steps {
        return Err(FleetError::InvalidConfig(format!(
            "component_id_stride {} must exceed the {steps} schedule steps",
            config.component_id_stride
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut coefficient_rng = StdRng::seed_from_u64(coefficient_seed(config.seed));

    let mut fleet = FleetHistory {
        histories: Vec::with_capacity(bus_count),
        schedules: Vec::with_capacity(bus_count),
    };

    for bus_id in 1..=bus_count as i64 {
        let start = random_start_date(&mut rng, config.start_window)?;
        let bus_schedule = ReplacementSchedule::shuffled(&mut rng);

        if config.seed_scope == SeedScope::PerBus {
            coefficient_rng = StdRng::seed_from_u64(coefficient_seed(config.seed));
        }
        let mut history =
            simulate_bus_history(bus_id, start, &bus_schedule, &mut coefficient_rng, config)?;
        history.offset_component_ids(bus_id * config.component_id_stride);

        debug!(
            bus_id,
            %start,
            mileage = history.current_mileage(),
            "simulated bus history"
        );
        fleet.histories.push(history);
        fleet.schedules.push(bus_schedule);
    }

    info!(
        buses = fleet.bus_count(),
        seed = config.seed,
        scope = ?config.seed_scope,
        "generated fleet history"
    );
    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use rand::RngCore;
    use std::collections::HashMap;

    #[test]
    fn empty_fleet() {
        let fleet = generate_fleet_history(0, &SimulationConfig::default()).unwrap();
        assert!(fleet.is_empty());
        assert!(fleet.schedules.is_empty());
        let df = fleet.history_frame().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 8);
        assert_eq!(fleet.schedules_frame().unwrap().height(), 0);
    }

    #[test]
    fn start_dates_stay_in_window() {
        let config = SimulationConfig::with_seed(9);
        let fleet = generate_fleet_history(50, &config).unwrap();
        let (first, last) = config.start_window;
        for history in &fleet.histories {
            let start = history.records()[0].start_date;
            assert!(start >= first && start <= last, "{start} outside window");
        }
    }

    #[test]
    fn component_ids_are_unique_across_buses() {
        let fleet = generate_fleet_history(25, &SimulationConfig::default()).unwrap();
        let mut owner: HashMap<(Component, i64), i64> = HashMap::new();
        for history in &fleet.histories {
            for record in history.records() {
                for component in Component::ALL {
                    let id = record.component_id(component);
                    let bus = *owner.entry((component, id)).or_insert(history.bus_id());
                    assert_eq!(bus, history.bus_id());
                }
            }
        }
    }

    #[test]
    fn ids_are_offset_by_bus() {
        let fleet = generate_fleet_history(3, &SimulationConfig::default()).unwrap();
        for (i, history) in fleet.histories.iter().enumerate() {
            let bus_id = i as i64 + 1;
            assert_eq!(history.bus_id(), bus_id);
            assert_eq!(history.records()[0].component_ids, [bus_id * 1000; 4]);
        }
    }

    #[test]
    fn same_seed_reproduces_fleet() {
        let config = SimulationConfig::with_seed(42);
        let a = generate_fleet_history(10, &config).unwrap();
        let b = generate_fleet_history(10, &config).unwrap();
        assert_eq!(a.histories, b.histories);
        assert_eq!(a.schedules, b.schedules);
    }

    #[test]
    fn per_bus_scope_reuses_coefficients() {
        let config = SimulationConfig {
            seed_scope: SeedScope::PerBus,
            ..SimulationConfig::with_seed(4)
        };
        let fleet = generate_fleet_history(6, &config).unwrap();
        // Identical schedules draw identical lives under per-bus seeding, so
        // two buses with the same shuffle end with the same odometer.
        for (i, a) in fleet.schedules.iter().enumerate() {
            for (j, b) in fleet.schedules.iter().enumerate().skip(i + 1) {
                if a == b {
                    assert_eq!(
                        fleet.histories[i].current_mileage(),
                        fleet.histories[j].current_mileage()
                    );
                }
            }
        }
    }

    #[test]
    fn per_bus_scope_matches_single_bus_simulation() {
        let config = SimulationConfig {
            seed_scope: SeedScope::PerBus,
            ..SimulationConfig::with_seed(8)
        };
        let fleet = generate_fleet_history(3, &config).unwrap();
        let third = &fleet.histories[2];
        let mut rng = StdRng::seed_from_u64(coefficient_seed(8));
        let mut expected = simulate_bus_history(
            3,
            third.records()[0].start_date,
            &fleet.schedules[2],
            &mut rng,
            &config,
        )
        .unwrap();
        expected.offset_component_ids(3000);
        assert_eq!(third, &expected);
    }

    #[test]
    fn coefficient_stream_is_independent_of_master_stream() {
        for seed in [0u64, 1, 42, u64::MAX] {
            assert_ne!(coefficient_seed(seed), seed);
            let mut master = StdRng::seed_from_u64(seed);
            let mut coefficients = StdRng::seed_from_u64(coefficient_seed(seed));
            let a: Vec<u64> = (0..5).map(|_| master.next_u64()).collect();
            let b: Vec<u64> = (0..5).map(|_| coefficients.next_u64()).collect();
            assert_ne!(a, b);
        }
        assert_ne!(coefficient_seed(0), coefficient_seed(1));
    }

    #[test]
    fn fleet_scope_draws_coefficients_from_derived_stream() {
        let config = SimulationConfig::with_seed(21);
        let fleet = generate_fleet_history(1, &config).unwrap();
        let bus = &fleet.histories[0];
        let start = bus.records()[0].start_date;

        let mut derived = StdRng::seed_from_u64(coefficient_seed(21));
        let mut expected =
            simulate_bus_history(1, start, &fleet.schedules[0], &mut derived, &config).unwrap();
        expected.offset_component_ids(1000);
        assert_eq!(bus, &expected);

        let mut master = StdRng::seed_from_u64(21);
        let mut shared =
            simulate_bus_history(1, start, &fleet.schedules[0], &mut master, &config).unwrap();
        shared.offset_component_ids(1000);
        assert_ne!(bus, &shared);
    }

    #[test]
    fn bus_count_matches_request() {
        let fleet = generate_fleet_history(7, &SimulationConfig::default()).unwrap();
        assert_eq!(fleet.bus_count(), 7);
        assert_eq!(fleet.schedules.len(), 7);
    }

    #[test]
    fn stride_must_exceed_schedule_length() {
        let config = SimulationConfig {
            component_id_stride: 10,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            generate_fleet_history(2, &config),
            Err(FleetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn history_frame_stacks_all_buses() {
        let fleet = generate_fleet_history(4, &SimulationConfig::default()).unwrap();
        let df = fleet.history_frame().unwrap();
        assert_eq!(df.height(), 4 * 11);
        let ends = df.column(crate::schema::history::END_TIMESTAMP).unwrap();
        assert_eq!(ends.null_count(), 4);
    }
}
