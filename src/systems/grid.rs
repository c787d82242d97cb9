//! grid.rs
//!
//! 3x3 pixel neighbourhood around a clicked point, used to approximate which
//! sensor pixels cover it.

use serde::Serialize;

use crate::config::PIXEL_SIZE_DEG;
use crate::systems::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    // lower-left corner of the cell
    pub latitude: f64,
    pub longitude: f64,
    pub is_target: bool,
    #[serde(skip)]
    size: f64,
}

impl GridCell {
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Corners as (lat, lng), counter-clockwise from the lower-left one.
    pub fn bounds(&self) -> [(f64, f64); 4] {
        let (lat, lng, s) = (self.latitude, self.longitude, self.size);
        [
            (lat, lng),
            (lat + s, lng),
            (lat + s, lng + s),
            (lat, lng + s),
        ]
    }
}

pub fn build_grid(center: &Point) -> [GridCell; 9] {
    build_grid_with_size(center, PIXEL_SIZE_DEG)
}

/// Cells in row-major order: latitude offset outer, longitude offset inner,
/// both ascending from -1 to 1. The fifth cell is the target.
pub fn build_grid_with_size(center: &Point, size: f64) -> [GridCell; 9] {
    std::array::from_fn(|k| {
        let i = (k / 3) as f64 - 1.0;
        let j = (k % 3) as f64 - 1.0;

        GridCell {
            latitude: center.latitude() + i * size,
            longitude: center.longitude() + j * size,
            is_target: k == 4,
            size,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_has_nine_cells_and_one_target() {
        let cells = build_grid(&Point::new(10.0, 20.0).unwrap());
        assert_eq!(cells.len(), 9);
        assert!(cells[4].is_target);
        assert_eq!(cells.iter().filter(|c| c.is_target).count(), 1);
        assert_eq!(cells[4].latitude, 10.0);
        assert_eq!(cells[4].longitude, 20.0);
    }

    #[test]
    fn test_grid_traversal_order() {
        let center = Point::new(10.0, 20.0).unwrap();
        let cells = build_grid(&center);

        let mut k = 0;
        for i in -1..=1 {
            for j in -1..=1 {
                assert_eq!(cells[k].latitude, 10.0 + i as f64 * PIXEL_SIZE_DEG);
                assert_eq!(cells[k].longitude, 20.0 + j as f64 * PIXEL_SIZE_DEG);
                k += 1;
            }
        }
    }

    #[test]
    fn test_grid_spacing_matches_pixel_size() {
        for &(lat, lng) in &[(10.0, 20.0), (-45.123, 170.5), (0.0, 0.0), (89.0, -179.0)] {
            let cells = build_grid(&Point::new(lat, lng).unwrap());

            for row in cells.chunks(3) {
                for pair in row.windows(2) {
                    assert!((pair[1].longitude - pair[0].longitude - PIXEL_SIZE_DEG).abs() < 1e-12);
                    assert_eq!(pair[1].latitude, pair[0].latitude);
                }
            }
            for k in 0..6 {
                assert!((cells[k + 3].latitude - cells[k].latitude - PIXEL_SIZE_DEG).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_cell_bounds() {
        let cells = build_grid_with_size(&Point::new(1.0, 2.0).unwrap(), 0.5);
        let corners = cells[4].bounds();
        assert_eq!(corners, [(1.0, 2.0), (1.5, 2.0), (1.5, 2.5), (1.0, 2.5)]);
        assert_eq!(cells[0].size(), 0.5);
    }
}
