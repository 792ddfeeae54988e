//! Transportation modes and their speed/accuracy profile

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the simulated device is moving
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportationMode {
    Stationary,
    #[default]
    Walking,
    Driving,
}

/// Constant per-mode profile
struct Profile {
    max_speed_mps: f64,
    default_accuracy_m: f64,
}

const STATIONARY: Profile = Profile {
    max_speed_mps: 0.0,
    default_accuracy_m: 5.0,
};

const WALKING: Profile = Profile {
    max_speed_mps: 2.5,
    default_accuracy_m: 8.0,
};

const DRIVING: Profile = Profile {
    max_speed_mps: 40.0,
    default_accuracy_m: 12.0,
};

impl TransportationMode {
    pub fn all() -> &'static [Self] {
        &[Self::Stationary, Self::Walking, Self::Driving]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stationary => "stationary",
            Self::Walking => "walking",
            Self::Driving => "driving",
        }
    }

    #[inline]
    fn profile(&self) -> &'static Profile {
        match self {
            Self::Stationary => &STATIONARY,
            Self::Walking => &WALKING,
            Self::Driving => &DRIVING,
        }
    }

    /// Highest speed this mode may report, in m/s
    #[inline]
    pub fn max_speed(&self) -> f64 {
        self.profile().max_speed_mps
    }

    /// Horizontal accuracy reported when no override is set, in meters
    #[inline]
    pub fn default_accuracy(&self) -> f64 {
        self.profile().default_accuracy_m
    }

    /// Clamp a candidate speed into `[0, max_speed]`. NaN maps to 0.
    #[inline]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return 0.0;
        }
        speed.clamp(0.0, self.max_speed())
    }
}

impl fmt::Display for TransportationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransportationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stationary" | "0" => Ok(Self::Stationary),
            "walking" | "1" => Ok(Self::Walking),
            "driving" | "2" => Ok(Self::Driving),
            other => Err(format!(
                "unknown transportation mode '{other}' (expected stationary, walking or driving)"
            )),
        }
    }
}
