pub mod fetch;
pub mod overpass;
pub mod tle;

pub use fetch::{FetchError, TleCache, fetch_elements, latest_elements};
pub use overpass::{
    OverpassError, OverpassEvent, OverpassSearch, find_next_overpass, find_next_overpass_with_timeout,
};
pub use tle::{LookAngleSource, LookAngles, Observer, OrbitalElements, PropagationError, Satellite};
