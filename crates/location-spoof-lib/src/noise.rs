//! Bounded random jitter so spoofed readings look naturally noisy

use crate::geo_math::{self, Coordinate};
use rand::Rng;

/// Accuracy is perturbed within this fraction of its baseline
const ACCURACY_SPREAD: f64 = 0.2;

/// Jitter generator parameterized by an enable flag and an amplitude in meters
///
/// Draws come from the thread-local RNG, so successive calls are independent and
/// the model carries no state besides its parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseModel {
    pub enabled: bool,
    /// Maximum displacement along each axis, in meters
    pub amplitude_meters: f64,
}

impl NoiseModel {
    pub fn new(enabled: bool, amplitude_meters: f64) -> Self {
        Self {
            enabled,
            amplitude_meters: sanitize_amplitude(amplitude_meters),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0.0)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.enabled && self.amplitude_meters > 0.0
    }

    /// Random (north, east) displacement in meters, each within ±amplitude
    pub fn jitter_meters(&self) -> (f64, f64) {
        if !self.is_active() {
            return (0.0, 0.0);
        }
        let mut rng = rand::thread_rng();
        let a = self.amplitude_meters;
        (rng.gen_range(-a..=a), rng.gen_range(-a..=a))
    }

    /// Random coordinate offset in degrees, scaled for the latitude of `origin`
    ///
    /// Returns the zero offset when jitter is disabled.
    pub fn jitter(&self, origin: Coordinate) -> Coordinate {
        let (north, east) = self.jitter_meters();
        if north == 0.0 && east == 0.0 {
            return Coordinate::default();
        }
        let (d_lat, d_lon) = geo_math::meters_to_degrees(origin, north, east);
        Coordinate::new(d_lat, d_lon)
    }

    /// Apply jitter to a coordinate, keeping the result within WGS84 bounds
    pub fn apply(&self, coordinate: Coordinate) -> Coordinate {
        if !self.is_active() {
            return coordinate;
        }
        let offset = self.jitter(coordinate);
        Coordinate::new(
            coordinate.latitude + offset.latitude,
            coordinate.longitude + offset.longitude,
        )
        .normalized()
    }

    /// Perturb a baseline accuracy within ±20% to avoid suspiciously constant values
    pub fn accuracy_jitter(&self, base: f64) -> f64 {
        if !self.enabled || base <= 0.0 || !base.is_finite() {
            return base;
        }
        let factor = rand::thread_rng().gen_range(-ACCURACY_SPREAD..=ACCURACY_SPREAD);
        base * (1.0 + factor)
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::disabled()
    }
}

fn sanitize_amplitude(amplitude: f64) -> f64 {
    if amplitude.is_finite() {
        amplitude.max(0.0)
    } else {
        0.0
    }
}
