//! geometry.rs
//!
//! Point and polygon primitives shared by the boundary catalog and the grid.
//! Everything here works in plain degrees, latitude first.

use thiserror::Error;

use crate::constants::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

#[derive(Debug, Error, PartialEq)]
pub enum CoordError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    latitude: f64,
    longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        // NaN fails the range checks too
        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }

        Ok(Point { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Inclusive latitude/longitude range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Smallest box around `points`, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };

        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.latitude);
            bbox.max_lat = bbox.max_lat.max(p.latitude);
            bbox.min_lon = bbox.min_lon.min(p.longitude);
            bbox.max_lon = bbox.max_lon.max(p.longitude);
        }

        Some(bbox)
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Even-odd ray casting test.
///
/// A horizontal ray is cast from `point` toward increasing longitude and the
/// ring edges it crosses are counted; an odd count means inside. The ring may
/// be open or closed, the closing edge from the last vertex back to the first
/// is always considered.
///
/// Points lying exactly on an edge or a vertex have no defined answer: either
/// result can come back depending on the edge orientation. No epsilon is
/// applied to hide this.
pub fn point_in_polygon(point: &Point, ring: &[Point]) -> bool {
    let x = point.longitude;
    let y = point.latitude;

    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);

        // the edge straddles the ray's latitude, so yj != yi here
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ring(coords: &[(f64, f64)]) -> Vec<Point> {
        coords
            .iter()
            .map(|&(lat, lon)| Point::new(lat, lon).unwrap())
            .collect()
    }

    fn unit_square() -> Vec<Point> {
        ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])
    }

    #[test]
    fn test_square_inside_and_outside() {
        let square = unit_square();
        assert!(point_in_polygon(&Point::new(0.5, 0.5).unwrap(), &square));
        assert!(!point_in_polygon(&Point::new(2.0, 2.0).unwrap(), &square));
    }

    #[test]
    fn test_closed_ring_matches_open_ring() {
        let open = unit_square();
        let mut closed = open.clone();
        closed.push(open[0]);

        for &(lat, lon) in &[(0.5, 0.5), (0.1, 0.9), (1.5, 0.5), (-0.2, 0.3)] {
            let p = Point::new(lat, lon).unwrap();
            assert_eq!(point_in_polygon(&p, &open), point_in_polygon(&p, &closed));
        }
    }

    #[test]
    fn test_concave_polygon_notch() {
        // U shape opening north, notch between lon 1 and 2
        let u = ring(&[
            (0.0, 0.0),
            (0.0, 3.0),
            (3.0, 3.0),
            (3.0, 2.0),
            (1.0, 2.0),
            (1.0, 1.0),
            (3.0, 1.0),
            (3.0, 0.0),
        ]);

        assert!(point_in_polygon(&Point::new(2.0, 0.5).unwrap(), &u));
        assert!(point_in_polygon(&Point::new(0.5, 1.5).unwrap(), &u));
        assert!(!point_in_polygon(&Point::new(2.0, 1.5).unwrap(), &u));
    }

    #[test]
    fn test_degenerate_rings_contain_nothing() {
        let p = Point::new(0.0, 0.0).unwrap();
        assert!(!point_in_polygon(&p, &[]));
        assert!(!point_in_polygon(&p, &ring(&[(0.0, 0.0)])));
    }

    #[test]
    fn test_boundary_points_have_no_guaranteed_parity() {
        // Documents the known limitation: these calls must not panic, but the
        // result for edge/vertex points is unspecified, so it is not asserted.
        let square = unit_square();
        for &(lat, lon) in &[(0.0, 0.5), (1.0, 0.5), (0.5, 0.0), (0.5, 1.0), (0.0, 0.0), (1.0, 1.0)] {
            let _ = point_in_polygon(&Point::new(lat, lon).unwrap(), &square);
        }
    }

    #[test]
    fn test_random_convex_polygons() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            // regular-ish convex polygon: sorted angles around a center
            let center_lat: f64 = rng.random_range(-60.0..60.0);
            let center_lon: f64 = rng.random_range(-150.0..150.0);
            let radius: f64 = rng.random_range(0.5..5.0);
            let sides = rng.random_range(3..12);

            let poly: Vec<Point> = (0..sides)
                .map(|k| {
                    let angle = std::f64::consts::TAU * k as f64 / sides as f64;
                    Point::new(
                        center_lat + radius * angle.sin(),
                        center_lon + radius * angle.cos(),
                    )
                    .unwrap()
                })
                .collect();

            // a point within the inscribed circle is strictly inside
            let inner = radius * (std::f64::consts::PI / sides as f64).cos() * 0.9;
            let angle: f64 = rng.random_range(0.0..std::f64::consts::TAU);
            let dist: f64 = rng.random_range(0.0..inner);
            let p = Point::new(center_lat + dist * angle.sin(), center_lon + dist * angle.cos()).unwrap();
            assert!(point_in_polygon(&p, &poly));

            // anything outside the bounding box is outside
            let bbox = BoundingBox::from_points(&poly).unwrap();
            let q = Point::new(bbox.max_lat + rng.random_range(0.01..10.0), center_lon).unwrap();
            assert!(!bbox.contains(&q));
            assert!(!point_in_polygon(&q, &poly));
        }
    }

    #[test]
    fn test_bounding_box_is_inclusive() {
        let bbox = BoundingBox::from_points(&unit_square()).unwrap();
        assert!(bbox.contains(&Point::new(0.0, 0.0).unwrap()));
        assert!(bbox.contains(&Point::new(1.0, 1.0).unwrap()));
        assert!(!bbox.contains(&Point::new(1.0001, 0.5).unwrap()));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_point_rejects_out_of_range() {
        assert_eq!(Point::new(90.5, 0.0), Err(CoordError::InvalidLatitude(90.5)));
        assert_eq!(Point::new(0.0, -181.0), Err(CoordError::InvalidLongitude(-181.0)));
        assert!(Point::new(f64::NAN, 0.0).is_err());
        assert!(Point::new(-90.0, 180.0).is_ok());
    }
}
