//! Waypoint paths and the cursor that walks them
//!
//! A [`Path`] is an immutable, validated list of waypoints with precomputed segment
//! lengths. A [`PathTracker`] owns the only mutable cursor over a path and advances
//! it by simulated elapsed time at a fixed speed.

use crate::geo_math::{self, Coordinate};
use crate::state::SpoofedLocationSample;
use crate::{Result, SpoofError};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Immutable ordered list of at least two waypoints
#[derive(Clone, Debug)]
pub struct Path {
    waypoints: Vec<Coordinate>,
    /// Length of segment `i` (waypoint `i` to `i + 1`) in meters
    segment_lengths: Vec<f64>,
    /// Distance from the first waypoint to waypoint `i`, along the path
    cumulative: Vec<f64>,
    /// Cached total length in meters
    total_length: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Path {
    /// Create a new path from waypoints
    ///
    /// # Returns
    /// An `Arc<Path>` on success, or `InvalidPath` if there are fewer than two
    /// waypoints or any waypoint lies outside WGS84 bounds
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Arc<Self>> {
        if waypoints.len() < 2 {
            return Err(SpoofError::InvalidPath(format!(
                "a path needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if let Some((index, bad)) = waypoints.iter().enumerate().find(|(_, c)| !c.is_valid()) {
            return Err(SpoofError::InvalidPath(format!(
                "waypoint {index} is out of range: ({}, {})",
                bad.latitude, bad.longitude
            )));
        }

        let segment_lengths: Vec<f64> = waypoints
            .windows(2)
            .map(|pair| geo_math::distance_meters(pair[0], pair[1]))
            .collect();

        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut total_length = 0.0;
        cumulative.push(0.0);
        for length in &segment_lengths {
            total_length += length;
            cumulative.push(total_length);
        }

        Ok(Arc::new(Path {
            waypoints,
            segment_lengths,
            cumulative,
            total_length,
        }))
    }

    /// Build a path from every track point (or, failing that, route/waypoint) in a GPX document
    pub fn from_gpx(gpx: &gpx::Gpx) -> Result<Arc<Self>> {
        let mut waypoints: Vec<Coordinate> = gpx
            .tracks
            .iter()
            .flat_map(|track| track.segments.iter())
            .flat_map(|segment| segment.points.iter())
            .map(Coordinate::from)
            .collect();

        if waypoints.is_empty() {
            waypoints = gpx
                .routes
                .iter()
                .flat_map(|route| route.points.iter())
                .map(Coordinate::from)
                .collect();
        }
        if waypoints.is_empty() {
            waypoints = gpx.waypoints.iter().map(Coordinate::from).collect();
        }

        Self::new(waypoints)
    }

    /// Read and parse a GPX document, then build a path from it
    pub fn from_gpx_reader<R: std::io::Read>(reader: R) -> Result<Arc<Self>> {
        let gpx = gpx::read(reader)?;
        Self::from_gpx(&gpx)
    }

    #[inline]
    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false: a path holds at least two waypoints
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_lengths.len()
    }

    #[inline]
    pub fn segment_length(&self, index: usize) -> Option<f64> {
        self.segment_lengths.get(index).copied()
    }

    /// Total length in meters
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Distance along the path from its first waypoint to waypoint `index`
    #[inline]
    pub fn distance_to(&self, index: usize) -> f64 {
        self.cumulative
            .get(index)
            .copied()
            .unwrap_or(self.total_length)
    }

    /// Position and heading at `fraction` of segment `index`
    fn locate(&self, index: usize, fraction: f64) -> Option<TrackPosition> {
        let from = *self.waypoints.get(index)?;
        let to = *self.waypoints.get(index + 1)?;
        Some(TrackPosition {
            coordinate: geo_math::interpolate(from, to, fraction),
            course: geo_math::bearing_degrees(from, to),
        })
    }
}

/// Lifecycle of a [`PathTracker`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Moving,
    Completed,
    Cancelled,
}

/// Position of the tracker within its path
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathCursor {
    /// Index of the waypoint that starts the active segment
    pub current_index: usize,
    /// How far into the active segment the cursor is, in [0, 1]
    pub fraction_into_segment: f64,
}

/// Interpolated position plus the bearing of the active segment
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackPosition {
    pub coordinate: Coordinate,
    /// Degrees clockwise from north
    pub course: f64,
}

/// State machine walking a cursor along a [`Path`]
#[derive(Clone, Debug)]
pub struct PathTracker {
    state: TrackerState,
    path: Option<Arc<Path>>,
    cursor: PathCursor,
    /// Speed of the active run in m/s
    speed: f64,
    /// Last computed position, returned while not moving
    last_position: TrackPosition,
}

impl Default for PathTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PathTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            path: None,
            cursor: PathCursor::default(),
            speed: 0.0,
            last_position: TrackPosition::default(),
        }
    }

    /// Begin moving along `path` from waypoint `start_index`
    ///
    /// Fails without changing state when the tracker is already moving, the speed is
    /// not a positive finite number, or `start_index` has no segment ahead of it.
    /// A completed or cancelled tracker may be started again.
    pub fn start(&mut self, path: Arc<Path>, speed: f64, start_index: usize) -> Result<()> {
        if self.state == TrackerState::Moving {
            return Err(SpoofError::AlreadyMoving);
        }
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SpoofError::InvalidSpeed(speed));
        }
        if path.len() < 2 {
            return Err(SpoofError::InvalidPath(format!(
                "a path needs at least 2 waypoints, got {}",
                path.len()
            )));
        }
        if start_index >= path.segment_count() {
            return Err(SpoofError::InvalidPath(format!(
                "start index {start_index} out of range for a path of {} waypoints",
                path.len()
            )));
        }

        let cursor = PathCursor {
            current_index: start_index,
            fraction_into_segment: 0.0,
        };
        self.last_position = path.locate(start_index, 0.0).unwrap_or_default();
        self.cursor = cursor;
        self.speed = speed;
        self.path = Some(path);
        self.state = TrackerState::Moving;
        Ok(())
    }

    /// Move the cursor forward by `speed * elapsed_seconds` meters
    ///
    /// Crosses as many segments as the distance covers. Reaching the final waypoint
    /// transitions to `Completed`. When not moving this is a no-op returning the last
    /// known position.
    pub fn advance(&mut self, elapsed_seconds: f64) -> TrackPosition {
        if self.state != TrackerState::Moving {
            return self.last_position;
        }
        let Some(path) = self.path.clone() else {
            // Moving without a path cannot happen through `start`
            tracing::warn!("Path tracker moving without a path; completing");
            self.state = TrackerState::Completed;
            return self.last_position;
        };
        if !(elapsed_seconds.is_finite() && elapsed_seconds > 0.0) {
            return self.last_position;
        }

        let last_segment = path.segment_count() - 1;
        let mut distance = self.speed * elapsed_seconds;

        loop {
            let index = self.cursor.current_index;
            let Some(segment_length) = path.segment_length(index) else {
                // Cursor past the end without a completion: treat as completed
                tracing::warn!(index, "Path cursor out of range; completing");
                self.complete(&path);
                return self.last_position;
            };

            let left_in_segment = segment_length * (1.0 - self.cursor.fraction_into_segment);
            if distance >= left_in_segment {
                distance -= left_in_segment;
                if index >= last_segment {
                    self.complete(&path);
                    return self.last_position;
                }
                self.cursor.current_index += 1;
                self.cursor.fraction_into_segment = 0.0;
            } else {
                // segment_length > 0 here since left_in_segment > distance >= 0
                self.cursor.fraction_into_segment += distance / segment_length;
                self.cursor.fraction_into_segment = self.cursor.fraction_into_segment.min(1.0);
                break;
            }
        }

        if let Some(position) = path.locate(
            self.cursor.current_index,
            self.cursor.fraction_into_segment,
        ) {
            self.last_position = position;
        }
        self.last_position
    }

    fn complete(&mut self, path: &Path) {
        let last_segment = path.segment_count().saturating_sub(1);
        self.cursor = PathCursor {
            current_index: last_segment,
            fraction_into_segment: 1.0,
        };
        if let Some(position) = path.locate(last_segment, 1.0) {
            self.last_position = position;
        }
        self.state = TrackerState::Completed;
    }

    /// Stop moving; idempotent and a no-op unless moving
    pub fn cancel(&mut self) {
        if self.state == TrackerState::Moving {
            self.state = TrackerState::Cancelled;
        }
    }

    /// Meters left between the cursor and the final waypoint
    ///
    /// Idle and completed trackers have nothing left to travel.
    pub fn remaining_distance(&self) -> f64 {
        match (self.state, &self.path) {
            (TrackerState::Moving | TrackerState::Cancelled, Some(path)) => {
                let index = self.cursor.current_index;
                let covered_in_segment = path.segment_length(index).unwrap_or(0.0)
                    * self.cursor.fraction_into_segment;
                (path.total_length() - path.distance_to(index) - covered_in_segment).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Seconds to reach the final waypoint at `speed`; infinite for non-positive speeds
    pub fn estimated_seconds_to_complete(&self, speed: f64) -> f64 {
        if speed.is_nan() || speed <= 0.0 {
            return f64::INFINITY;
        }
        self.remaining_distance() / speed
    }

    #[inline]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.state == TrackerState::Moving
    }

    #[inline]
    pub fn cursor(&self) -> PathCursor {
        self.cursor
    }

    #[inline]
    pub fn position(&self) -> TrackPosition {
        self.last_position
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn path(&self) -> Option<&Arc<Path>> {
        self.path.as_ref()
    }
}

/// Upper bound on the samples [`plan_simple_movement`] produces
pub const MAX_SIMPLE_MOVEMENT_SAMPLES: usize = 100_000;

/// Straight-line movement from `start` to `end`, one sample every `interval`
///
/// The first sample sits on `start`, the last on `end`; timestamps begin now and are
/// spaced by `interval`. Speed and course describe the movement.
pub fn plan_simple_movement(
    start: Coordinate,
    end: Coordinate,
    speed: f64,
    interval: Duration,
    accuracy: f64,
) -> Result<Vec<SpoofedLocationSample>> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(SpoofError::InvalidSpeed(speed));
    }
    for c in [start, end] {
        if !c.is_valid() {
            return Err(SpoofError::InvalidCoordinate {
                latitude: c.latitude,
                longitude: c.longitude,
            });
        }
    }

    let now = SystemTime::now();
    let distance = geo_math::distance_meters(start, end);
    if distance == 0.0 {
        return Ok(vec![SpoofedLocationSample::at_rest(start, accuracy, now)]);
    }

    let step = speed * interval.as_secs_f64();
    let needed = if step > 0.0 {
        (distance / step).ceil().max(1.0)
    } else {
        1.0
    };
    // One sample per step plus the starting point
    if !needed.is_finite() || needed >= MAX_SIMPLE_MOVEMENT_SAMPLES as f64 {
        return Err(SpoofError::TooManySamples {
            needed: needed + 1.0,
            limit: MAX_SIMPLE_MOVEMENT_SAMPLES,
        });
    }
    let steps = needed as u32;
    let course = geo_math::bearing_degrees(start, end);

    (0..=steps)
        .map(|i| {
            let timestamp = interval
                .checked_mul(i)
                .and_then(|offset| now.checked_add(offset))
                .ok_or_else(|| {
                    SpoofError::InvalidPath(format!(
                        "sample {i} lies beyond the representable time range"
                    ))
                })?;
            let fraction = if i == steps {
                1.0
            } else {
                (f64::from(i) * step / distance).min(1.0)
            };
            Ok(SpoofedLocationSample {
                coordinate: geo_math::interpolate(start, end, fraction),
                course,
                speed,
                accuracy,
                timestamp,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_path() -> Arc<Path> {
        Path::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)]).unwrap()
    }

    fn zigzag_path() -> Arc<Path> {
        Path::new(vec![
            Coordinate::new(51.5074, -0.1278),
            Coordinate::new(51.5084, -0.1278),
            Coordinate::new(51.5084, -0.1262),
            Coordinate::new(51.5094, -0.1262),
        ])
        .unwrap()
    }

    #[test]
    fn test_path_requires_two_waypoints() {
        assert!(matches!(
            Path::new(vec![]),
            Err(SpoofError::InvalidPath(_))
        ));
        assert!(matches!(
            Path::new(vec![Coordinate::new(1.0, 1.0)]),
            Err(SpoofError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_path_rejects_invalid_waypoint() {
        let result = Path::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(95.0, 0.0)]);
        assert!(matches!(result, Err(SpoofError::InvalidPath(_))));
    }

    #[test]
    fn test_path_lengths() {
        let path = zigzag_path();
        assert_eq!(path.segment_count(), 3);
        let sum: f64 = (0..3).filter_map(|i| path.segment_length(i)).sum();
        assert!((sum - path.total_length()).abs() < 1e-9);
        assert_eq!(path.distance_to(0), 0.0);
        assert!((path.distance_to(3) - path.total_length()).abs() < 1e-9);
    }

    #[test]
    fn test_start_validation_leaves_tracker_idle() {
        let mut tracker = PathTracker::new();
        assert!(matches!(
            tracker.start(two_point_path(), 10.0, 1),
            Err(SpoofError::InvalidPath(_))
        ));
        assert!(matches!(
            tracker.start(two_point_path(), 0.0, 0),
            Err(SpoofError::InvalidSpeed(_))
        ));
        assert!(matches!(
            tracker.start(two_point_path(), f64::NAN, 0),
            Err(SpoofError::InvalidSpeed(_))
        ));
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_start_while_moving_keeps_cursor() {
        let mut tracker = PathTracker::new();
        tracker.start(two_point_path(), 10.0, 0).unwrap();
        tracker.advance(20.0);
        let cursor = tracker.cursor();

        assert!(matches!(
            tracker.start(zigzag_path(), 5.0, 0),
            Err(SpoofError::AlreadyMoving)
        ));
        assert_eq!(tracker.cursor(), cursor);
        assert_eq!(tracker.speed(), 10.0);
    }

    #[test]
    fn test_equator_scenario() {
        let mut tracker = PathTracker::new();
        tracker.start(two_point_path(), 10.0, 0).unwrap();

        let eta = tracker.estimated_seconds_to_complete(10.0);
        assert!((eta - 111.2).abs() < 0.5);

        let position = tracker.advance(55.5);
        assert!(position.coordinate.latitude.abs() < 1e-9);
        assert!((position.coordinate.longitude - 0.005).abs() < 1e-4);
        assert!((position.course - 90.0).abs() < 1e-6);
        assert_eq!(tracker.state(), TrackerState::Moving);
    }

    #[test]
    fn test_eta_strictly_decreases_until_completion() {
        let mut tracker = PathTracker::new();
        tracker.start(zigzag_path(), 3.0, 0).unwrap();

        let mut previous = tracker.estimated_seconds_to_complete(3.0);
        while tracker.is_moving() {
            tracker.advance(1.7);
            let eta = tracker.estimated_seconds_to_complete(3.0);
            assert!(eta < previous, "eta {eta} did not drop below {previous}");
            if tracker.is_moving() {
                assert!(eta > 0.0);
            }
            previous = eta;
        }
        assert_eq!(tracker.state(), TrackerState::Completed);
        assert_eq!(tracker.estimated_seconds_to_complete(3.0), 0.0);
    }

    #[test]
    fn test_advance_crosses_multiple_segments() {
        let path = zigzag_path();
        let mut tracker = PathTracker::new();
        tracker.start(path.clone(), 1.0, 0).unwrap();

        // Cover the first segment and half of the second in a single step
        let first = path.segment_length(0).unwrap();
        let second = path.segment_length(1).unwrap();
        let position = tracker.advance(first + second / 2.0);

        assert_eq!(tracker.cursor().current_index, 1);
        assert!((tracker.cursor().fraction_into_segment - 0.5).abs() < 1e-6);
        // Second segment heads east
        assert!((position.course - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_completion_lands_on_last_waypoint() {
        let path = zigzag_path();
        let mut tracker = PathTracker::new();
        tracker.start(path.clone(), 50.0, 0).unwrap();

        let position = tracker.advance(1_000.0);
        assert_eq!(tracker.state(), TrackerState::Completed);
        assert_eq!(position.coordinate, path.waypoints()[3]);
        assert_eq!(tracker.remaining_distance(), 0.0);

        // Further advances are no-ops
        assert_eq!(tracker.advance(10.0), position);
    }

    #[test]
    fn test_start_index_skips_earlier_segments() {
        let path = zigzag_path();
        let mut tracker = PathTracker::new();
        tracker.start(path.clone(), 1.0, 2).unwrap();

        assert_eq!(tracker.position().coordinate, path.waypoints()[2]);
        let expected = path.segment_length(2).unwrap();
        assert!((tracker.remaining_distance() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_segments_are_skipped() {
        let a = Coordinate::new(10.0, 10.0);
        let b = Coordinate::new(10.001, 10.0);
        let path = Path::new(vec![a, a, b, b]).unwrap();
        let mut tracker = PathTracker::new();
        tracker.start(path, 1.0, 0).unwrap();

        tracker.advance(1.0);
        assert_eq!(tracker.cursor().current_index, 1);

        tracker.advance(1_000.0);
        assert_eq!(tracker.state(), TrackerState::Completed);
        assert_eq!(tracker.position().coordinate, b);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut tracker = PathTracker::new();
        tracker.cancel();
        assert_eq!(tracker.state(), TrackerState::Idle);

        tracker.start(two_point_path(), 10.0, 0).unwrap();
        tracker.advance(10.0);
        let position = tracker.position();
        tracker.cancel();
        tracker.cancel();
        assert_eq!(tracker.state(), TrackerState::Cancelled);
        assert_eq!(tracker.advance(10.0), position);

        // A cancelled tracker can be restarted
        tracker.start(two_point_path(), 10.0, 0).unwrap();
        assert!(tracker.is_moving());
    }

    #[test]
    fn test_eta_infinite_for_non_positive_speed() {
        let mut tracker = PathTracker::new();
        tracker.start(two_point_path(), 10.0, 0).unwrap();
        assert_eq!(tracker.estimated_seconds_to_complete(0.0), f64::INFINITY);
        assert_eq!(tracker.estimated_seconds_to_complete(-1.0), f64::INFINITY);
    }

    #[test]
    fn test_non_positive_elapsed_does_not_move() {
        let mut tracker = PathTracker::new();
        tracker.start(two_point_path(), 10.0, 0).unwrap();
        let before = tracker.cursor();
        tracker.advance(0.0);
        tracker.advance(-5.0);
        assert_eq!(tracker.cursor(), before);
    }

    #[test]
    fn test_plan_simple_movement() {
        let start = Coordinate::new(0.0, 0.0);
        let end = Coordinate::new(0.0, 0.001);
        let samples = plan_simple_movement(start, end, 10.0, Duration::from_secs(1), 5.0).unwrap();

        // ~111 m at 10 m/s: 12 steps, 13 samples
        assert_eq!(samples.len(), 13);
        assert_eq!(samples[0].coordinate, start);
        assert_eq!(samples.last().unwrap().coordinate, end);
        assert!(samples.iter().all(|s| (s.course - 90.0).abs() < 1e-6));
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_plan_simple_movement_rejects_bad_speed() {
        let c = Coordinate::new(0.0, 0.0);
        assert!(matches!(
            plan_simple_movement(c, c, 0.0, Duration::from_secs(1), 5.0),
            Err(SpoofError::InvalidSpeed(_))
        ));
    }

    #[test]
    fn test_plan_simple_movement_caps_sample_count() {
        let start = Coordinate::new(0.0, 0.0);
        let end = Coordinate::new(0.0, 1.0);
        let second = Duration::from_secs(1);

        // ~111 km at 1 µm/s would need about 1.1e11 samples
        let result = plan_simple_movement(start, end, 1e-6, second, 5.0);
        assert!(matches!(
            result,
            Err(SpoofError::TooManySamples { limit: MAX_SIMPLE_MOVEMENT_SAMPLES, .. })
        ));

        // Step so small the ratio overflows to infinity
        assert!(matches!(
            plan_simple_movement(start, end, 1e-310, second, 5.0),
            Err(SpoofError::TooManySamples { .. })
        ));

        // Half a degree at 1 m/s stays under the cap
        let half = Coordinate::new(0.0, 0.5);
        let samples = plan_simple_movement(start, half, 1.0, second, 5.0).unwrap();
        assert!(samples.len() < MAX_SIMPLE_MOVEMENT_SAMPLES);
        assert_eq!(samples.last().unwrap().coordinate, half);
    }

    #[test]
    fn test_plan_simple_movement_rejects_unrepresentable_timestamps() {
        let start = Coordinate::new(0.0, 0.0);
        let end = Coordinate::new(0.0, 0.001);
        assert!(matches!(
            plan_simple_movement(start, end, 10.0, Duration::MAX, 5.0),
            Err(SpoofError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_path_from_gpx() {
        let mut gpx = gpx::Gpx::default();
        let mut track = gpx::Track::default();
        let mut segment = gpx::TrackSegment::default();
        segment
            .points
            .push(gpx::Waypoint::new(geo::Point::new(-0.1278, 51.5074)));
        segment
            .points
            .push(gpx::Waypoint::new(geo::Point::new(-0.1276, 51.5076)));
        track.segments.push(segment);
        gpx.tracks.push(track);

        let path = Path::from_gpx(&gpx).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.waypoints()[0], Coordinate::new(51.5074, -0.1278));
    }

    #[test]
    fn test_path_from_empty_gpx_fails() {
        assert!(Path::from_gpx(&gpx::Gpx::default()).is_err());
    }
}
