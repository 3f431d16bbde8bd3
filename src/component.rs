use std::fmt;
use std::str::FromStr;

use crate::error::FleetError;

pub const COMPONENT_COUNT: usize = 4;

/// A replaceable bus component slot.
///
/// The declaration order is the column order of every schedule and history
/// table: engine, transmission, radiator, brakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Engine,
    Transmission,
    Radiator,
    Brakes,
}

impl Component {
    pub const ALL: [Component; COMPONENT_COUNT] = [
        Component::Engine,
        Component::Transmission,
        Component::Radiator,
        Component::Brakes,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Engine => 0,
            Self::Transmission => 1,
            Self::Radiator => 2,
            Self::Brakes => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::Transmission => "transmission",
            Self::Radiator => "radiator",
            Self::Brakes => "brakes",
        }
    }

    /// Expected service life of a new unit, in miles.
    pub fn standard_mileage(self) -> i64 {
        match self {
            Self::Engine => 500_000,
            Self::Transmission => 1_000_000,
            Self::Radiator => 100_000,
            Self::Brakes => 100_000,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FleetError::Shape(format!("Unknown component type: '{s}'")))
    }
}
