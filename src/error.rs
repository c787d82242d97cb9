//! CLI error handling.
//!
//! Wraps the library errors with a message fit for the terminal and a
//! non-zero exit.

use std::io;
use std::path::PathBuf;
use std::process;

use thiserror::Error;
use wrs_overpass::systems::satellites::FetchError;
use wrs_overpass::{CoordError, OverpassError, ParseError, StoreError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("Invalid coordinates: {0}")]
    Coord(#[from] CoordError),
    #[error("Failed to load boundary catalog: {0}")]
    Catalog(#[from] ParseError),
    #[error("Failed to read element file '{}': {source}", .path.display())]
    TleFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No two-line element set found in '{}'", .0.display())]
    TleFormat(PathBuf),
    #[error("Failed to get element set: {0}")]
    Fetch(#[from] FetchError),
    #[error("Overpass prediction failed: {0}")]
    Overpass(#[from] OverpassError),
    #[error("Location store error: {0}")]
    Store(#[from] StoreError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Fetch(FetchError::Http { .. }) => {
                eprintln!();
                eprintln!("CelesTrak may be rate limiting this address. Retry later,");
                eprintln!("or pass --tle <file> with a locally saved element set.");
            }
            CliError::Catalog(_) => {
                eprintln!();
                eprintln!("The boundary file must be a KML document of path/row placemarks,");
                eprintln!("e.g. WRS-2_bound_world_0.kml.");
            }
            _ => {}
        }

        process::exit(1)
    }
}
