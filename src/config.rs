use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::FleetError;

/// School bus mileage per day is ~63.4 miles.
pub const AVG_DAILY_MILEAGE: f64 = 63.4;

/// How the service-life coefficient stream is seeded across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedScope {
    /// One coefficient stream, seeded once and advanced bus after bus.
    #[default]
    Fleet,
    /// The coefficient stream is re-seeded with the same seed for every bus,
    /// so each bus draws the identical coefficient sequence.
    PerBus,
}

impl FromStr for SeedScope {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fleet" => Ok(Self::Fleet),
            "per-bus" | "per_bus" => Ok(Self::PerBus),
            _ => Err(FleetError::InvalidConfig(format!(
                "Invalid seed_scope: '{s}'. Must be 'fleet' or 'per-bus'"
            ))),
        }
    }
}

/// Parameters of a fleet simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Master seed for every random draw of the run.
    pub seed: u64,
    pub seed_scope: SeedScope,
    /// Inclusive bounds for each bus's first history date.
    pub start_window: (NaiveDate, NaiveDate),
    /// Miles driven per calendar day, used to turn mileage into days.
    pub avg_daily_mileage: f64,
    /// Standard deviation of the service-life coefficient N(1, sigma).
    pub mileage_sigma: f64,
    /// Component identities of bus `n` are offset by `n * component_id_stride`.
    pub component_id_stride: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            seed_scope: SeedScope::Fleet,
            start_window: (
                NaiveDate::from_ymd_opt(2000, 3, 17).expect("valid date"),
                NaiveDate::from_ymd_opt(2001, 2, 8).expect("valid date"),
            ),
            avg_daily_mileage: AVG_DAILY_MILEAGE,
            mileage_sigma: 0.2,
            component_id_stride: 1000,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        let (first, last) = self.start_window;
        if first > last {
            return Err(FleetError::InvalidConfig(format!(
                "start_window begins after it ends: {first} > {last}"
            )));
        }
        if !(self.avg_daily_mileage > 0.0) {
            return Err(FleetError::InvalidConfig(format!(
                "avg_daily_mileage must be positive, got {}",
                self.avg_daily_mileage
            )));
        }
        if !(self.mileage_sigma >= 0.0) || !self.mileage_sigma.is_finite() {
            return Err(FleetError::InvalidConfig(format!(
                "mileage_sigma must be finite and non-negative, got {}",
                self.mileage_sigma
            )));
        }
        if self.component_id_stride <= 0 {
            return Err(FleetError::InvalidConfig(format!(
                "component_id_stride must be positive, got {}",
                self.component_id_stride
            )));
        }
        Ok(())
    }

    /// Whole days covered by `mileage` at the configured daily average.
    pub fn days_for_mileage(&self, mileage: i64) -> i64 {
        (mileage as f64 / self.avg_daily_mileage).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.seed_scope, SeedScope::Fleet);
        assert_eq!(config.component_id_stride, 1000);
    }

    #[test]
    fn days_for_mileage_floors() {
        let config = SimulationConfig::default();
        assert_eq!(config.days_for_mileage(100_000), 1577);
        assert_eq!(config.days_for_mileage(63), 0);
        assert_eq!(config.days_for_mileage(0), 0);
    }

    #[test]
    fn rejects_inverted_window() {
        let mut config = SimulationConfig::default();
        config.start_window = (config.start_window.1, config.start_window.0);
        assert!(matches!(
            config.validate(),
            Err(FleetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn seed_scope_parses() {
        assert_eq!("fleet".parse::<SeedScope>().unwrap(), SeedScope::Fleet);
        assert_eq!("per-bus".parse::<SeedScope>().unwrap(), SeedScope::PerBus);
        assert!("global".parse::<SeedScope>().is_err());
    }
}
