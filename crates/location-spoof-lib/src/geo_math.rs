//! Coordinate type and pure geodesic helpers (distance, bearing, interpolation)

use geo::Point;

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Maximum absolute latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Maximum absolute longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Precomputed constant: meters spanned by one degree of latitude
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Below this cosine the longitude scale is clamped (near the poles)
const MIN_COS_LATITUDE: f64 = 1e-6;

/// A WGS84 position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within WGS84 bounds
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= MAX_LATITUDE
            && self.longitude.abs() <= MAX_LONGITUDE
    }

    /// Clamp latitude into range and wrap longitude into [-180, 180]
    pub fn normalized(&self) -> Self {
        let latitude = self.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let mut longitude = self.longitude;
        if longitude.abs() > MAX_LONGITUDE {
            longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        }
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Point<f64>> for Coordinate {
    /// `geo` points store longitude as x and latitude as y
    #[inline]
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coordinate> for Point<f64> {
    #[inline]
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.longitude, coordinate.latitude)
    }
}

impl From<&gpx::Waypoint> for Coordinate {
    #[inline]
    fn from(waypoint: &gpx::Waypoint) -> Self {
        waypoint.point().into()
    }
}

/// Great-circle (haversine) distance between two coordinates in meters
#[inline]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `a` to `b`
///
/// # Returns
/// Degrees clockwise from true north in [0, 360). Identical points yield 0.
#[inline]
pub fn bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Linear interpolation between two coordinates
///
/// # Arguments
/// * `fraction` - Position along the segment, clamped to [0, 1]
///
/// The endpoints are returned exactly at fractions 0 and 1.
#[inline]
pub fn interpolate(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    let t = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    if t == 0.0 {
        return a;
    }
    if t == 1.0 {
        return b;
    }
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// Degree deltas equivalent to a local north/east displacement at `origin`
///
/// Uses a flat-earth approximation, adequate for the few meters of jitter
/// this is used for.
#[inline]
pub fn meters_to_degrees(origin: Coordinate, north_m: f64, east_m: f64) -> (f64, f64) {
    let cos_lat = origin.latitude.to_radians().cos().max(MIN_COS_LATITUDE);
    (
        north_m / METERS_PER_DEGREE,
        east_m / (METERS_PER_DEGREE * cos_lat),
    )
}

/// Displace `origin` by a local north/east offset in meters
#[inline]
pub fn offset_meters(origin: Coordinate, north_m: f64, east_m: f64) -> Coordinate {
    let (d_lat, d_lon) = meters_to_degrees(origin, north_m, east_m);
    Coordinate::new(origin.latitude + d_lat, origin.longitude + d_lon).normalized()
}

/// Wrap an angle in degrees into [0, 360)
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Course over ground in [0, 360); non-finite input maps to 0
///
/// Courses are wrapped, never clamped, whatever the transportation mode.
#[inline]
pub fn normalize_course(course: f64) -> f64 {
    if course.is_finite() {
        normalize_degrees(course)
    } else {
        0.0
    }
}
