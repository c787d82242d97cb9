//! Boundary catalog
//!
//! Holds every path/row footprint polygon loaded from a boundary document and
//! answers which of them contain a point. The catalog is built once and never
//! mutated afterwards, so a shared reference can serve queries from any
//! number of threads.

mod kml;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::systems::geometry::{BoundingBox, CoordError, Point, point_in_polygon};

/// Why a boundary document could not be loaded.
///
/// Any of these aborts the whole load.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("document ended inside <{0}>")]
    Unclosed(String),
    #[error("document has no root element")]
    Empty,
    #[error("placemark {placemark}: bad coordinate tuple {token:?}")]
    Coordinate { placemark: usize, token: String },
    #[error("placemark {placemark}: {source}")]
    OutOfRange {
        placemark: usize,
        #[source]
        source: CoordError,
    },
    #[error("placemark {placemark}: ring has {points} distinct vertices, at least 3 are required")]
    DegenerateRing { placemark: usize, points: usize },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One footprint tile.
#[derive(Debug, Clone)]
pub struct Polygon {
    ring: Vec<Point>,
    bbox: BoundingBox,
    path: Option<u32>,
    row: Option<u32>,
    description: String,
}

impl Polygon {
    /// Returns `None` when the ring has fewer than three distinct vertices.
    pub fn new(ring: Vec<Point>, path: Option<u32>, row: Option<u32>, description: String) -> Option<Self> {
        if vertex_count(&ring) < 3 {
            return None;
        }
        let bbox = BoundingBox::from_points(&ring)?;

        Some(Polygon {
            ring,
            bbox,
            path,
            row,
            description,
        })
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.bbox.contains(point) && point_in_polygon(point, &self.ring)
    }

    // getters
    pub fn ring(&self) -> &[Point] {
        &self.ring
    }
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }
    pub fn path(&self) -> Option<u32> {
        self.path
    }
    pub fn row(&self) -> Option<u32> {
        self.row
    }
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Number of vertices in `ring`, not counting a closing point that repeats
/// the first one.
pub fn vertex_count(ring: &[Point]) -> usize {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => ring.len() - 1,
        _ => ring.len(),
    }
}

/// A polygon that contains the queried point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolygonMatch {
    /// position of the polygon in the catalog
    pub index: usize,
    pub path: Option<u32>,
    pub row: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryCatalog {
    polygons: Vec<Polygon>,
}

impl BoundaryCatalog {
    /// Parses a KML boundary document.
    ///
    /// Placemarks without polygon geometry are skipped. Coordinates are read
    /// as `lng,lat` and stored latitude first.
    pub fn load(source: &str) -> Result<Self, ParseError> {
        let polygons = kml::parse_polygons(source)?;
        info!("parsed {} polygons from KML", polygons.len());

        Ok(BoundaryCatalog { polygons })
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("loaded boundary document {:?}", path);
        Self::load(&source)
    }

    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        BoundaryCatalog { polygons }
    }

    /// Every polygon containing `point`, in catalog order.
    ///
    /// Footprints overlap, so more than one match is normal; an empty result
    /// means no tile covers the point.
    pub fn find_containing(&self, point: &Point) -> Vec<PolygonMatch> {
        self.polygons
            .iter()
            .enumerate()
            .filter(|(_, polygon)| polygon.contains(point))
            .map(|(index, polygon)| PolygonMatch {
                index,
                path: polygon.path,
                row: polygon.row,
            })
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Polygon> {
        self.polygons.get(index)
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}
