//! Path/row footprint lookup and satellite overpass prediction.
//!
//! Given a point on the map this crate answers which ground-track tiles
//! (WRS path/row footprints) contain it, builds the 3x3 pixel neighbourhood
//! around it, and predicts when the imaging satellite next rises above the
//! horizon there.

pub mod config;
pub mod constants;
pub mod logging;
pub mod systems;

pub use systems::catalog::{BoundaryCatalog, ParseError, Polygon, PolygonMatch};
pub use systems::geometry::{BoundingBox, CoordError, Point, point_in_polygon};
pub use systems::grid::{GridCell, build_grid, build_grid_with_size};
pub use systems::locations::{JsonLocationStore, LocationStore, NewLocation, StoreError};
pub use systems::satellites::{
    Observer, OrbitalElements, OverpassError, OverpassEvent, OverpassSearch, PropagationError, Satellite,
    find_next_overpass,
};
