//! Route and waypoint models.

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Probability at or above which a detection spawns a route waypoint.
pub const WAYPOINT_PROBABILITY_THRESHOLD: u8 = 75;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A stop along the displayed route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Waypoint {
    pub location: GeoPoint,
    /// Whether the route should treat this as a stop rather than a pass-through.
    pub stopover: bool,
}

/// The displayed route: fixed endpoints plus waypoints that grow as
/// high-probability detections arrive. Waypoints are extended, never edited
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Route {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(origin: GeoPoint, destination: GeoPoint, waypoints: Vec<Waypoint>) -> Self {
        Self {
            origin,
            destination,
            waypoints,
        }
    }

    /// Default patrol route through downtown San Francisco.
    pub fn san_francisco() -> Self {
        Self::new(
            GeoPoint::new(37.7840, -122.4021),
            GeoPoint::new(37.7640, -122.4021),
            vec![
                Waypoint {
                    location: GeoPoint::new(37.7940, -122.4079),
                    stopover: false,
                },
                Waypoint {
                    location: GeoPoint::new(37.7749, -122.4194),
                    stopover: false,
                },
            ],
        )
    }

    /// Whether a detection at this probability should spawn a waypoint.
    pub fn should_spawn(probability: Option<u8>) -> bool {
        probability.is_some_and(|p| p >= WAYPOINT_PROBABILITY_THRESHOLD)
    }

    /// Synthesize a waypoint between a random pair of consecutive waypoints
    /// and append it. Returns `None` when fewer than two waypoints exist.
    pub fn spawn_waypoint(&mut self) -> Option<Waypoint> {
        if self.waypoints.len() < 2 {
            return None;
        }

        let mut rng = rand::rng();
        let index = rng.random_range(0..self.waypoints.len() - 1);
        let start = self.waypoints[index].location;
        let end = self.waypoints[index + 1].location;

        let waypoint = Waypoint {
            location: GeoPoint::new(
                random_between(&mut rng, start.lat, end.lat),
                random_between(&mut rng, start.lng, end.lng),
            ),
            stopover: true,
        };

        self.waypoints.push(waypoint);
        Some(waypoint)
    }
}

fn random_between(rng: &mut impl Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return lo;
    }
    rng.random_range(lo..hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert!(Route::should_spawn(Some(75)));
        assert!(Route::should_spawn(Some(100)));
        assert!(!Route::should_spawn(Some(74)));
        assert!(!Route::should_spawn(None));
    }

    #[test]
    fn test_spawn_waypoint_lies_between_pair() {
        let mut route = Route::san_francisco();
        let before = route.waypoints.clone();

        let spawned = route.spawn_waypoint().expect("two seed waypoints");
        assert_eq!(route.waypoints.len(), before.len() + 1);
        assert!(spawned.stopover);

        // Spawned point must sit inside the bounding box of some
        // consecutive pair of the original waypoints.
        let inside_some_pair = before.windows(2).any(|pair| {
            let (a, b) = (pair[0].location, pair[1].location);
            let (lat_lo, lat_hi) = (a.lat.min(b.lat), a.lat.max(b.lat));
            let (lng_lo, lng_hi) = (a.lng.min(b.lng), a.lng.max(b.lng));
            spawned.location.lat >= lat_lo
                && spawned.location.lat <= lat_hi
                && spawned.location.lng >= lng_lo
                && spawned.location.lng <= lng_hi
        });
        assert!(inside_some_pair);
    }

    #[test]
    fn test_spawn_waypoint_needs_two_points() {
        let mut route = Route::new(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            vec![Waypoint {
                location: GeoPoint::new(0.5, 0.5),
                stopover: false,
            }],
        );
        assert!(route.spawn_waypoint().is_none());
        assert_eq!(route.waypoints.len(), 1);
    }
}
