//! wrs-overpass command-line front end.
//!
//! Resolves path/row tiles for a point, prints its pixel grid, predicts the
//! next overpass and manages the saved-location history.

mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;

use error::CliError;
use wrs_overpass::config::{self, DEFAULT_CATALOG_NUMBER, LOCATION_STORE_FILE, TLE_CACHE_FILE, TLE_CACHE_HOURS};
use wrs_overpass::logging::init_logging;
use wrs_overpass::systems::satellites::{TleCache, find_next_overpass_with_timeout, latest_elements};
use wrs_overpass::{
    BoundaryCatalog, JsonLocationStore, LocationStore, NewLocation, Observer, OrbitalElements, OverpassError,
    Point, build_grid,
};

#[derive(Parser)]
#[command(name = "wrs-overpass")]
#[command(about = "Path/row lookup and overpass prediction for a map point", long_about = None)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the path/row tiles that contain a point
    Locate {
        /// KML boundary document (e.g. WRS-2_bound_world_0.kml)
        #[arg(long)]
        kml: PathBuf,
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Print the 3x3 pixel grid around a point
    Grid {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Predict the next time the satellite rises above the horizon
    Overpass {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Observer height above sea level in meters
        #[arg(long, default_value = "0")]
        height: f64,
        /// Search start (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Read the element set from a file instead of CelesTrak
        #[arg(long)]
        tle: Option<PathBuf>,
        /// NORAD catalog number to fetch (default: Landsat 9)
        #[arg(long, default_value_t = DEFAULT_CATALOG_NUMBER)]
        catnr: u64,
        /// Element cache file
        #[arg(long, default_value = TLE_CACHE_FILE)]
        cache: PathBuf,
        /// Give up on the search after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// Manage saved locations
    History {
        /// Location store file
        #[arg(long, default_value = LOCATION_STORE_FILE)]
        store: PathBuf,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show saved locations, pinned first
    List,
    /// Save a named location, tagged with the tiles that contain it
    Save {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        name: String,
        /// Boundary document used to find the location's path/row
        #[arg(long)]
        kml: Option<PathBuf>,
    },
    /// Show the path/row pairs saved for a location
    PathRows {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Pin a location to the top of the list
    Pin {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Remove the pin from a location
    Unpin {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Delete every record saved for a location
    Delete {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Delete all saved locations
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        CliError::LoggingInit(e).exit();
    }

    if let Err(e) = run(cli.command).await {
        e.exit();
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Locate { kml, lat, lng } => locate(&kml, lat, lng),
        Command::Grid { lat, lng } => grid(lat, lng),
        Command::Overpass {
            lat,
            lng,
            height,
            start,
            tle,
            catnr,
            cache,
            timeout_secs,
        } => {
            let point = Point::new(lat, lng)?;
            let observer = Observer::at(&point).with_height(height);

            let elements = match tle {
                Some(path) => read_elements(&path)?,
                None => {
                    let cache = TleCache::new(cache, TimeDelta::hours(TLE_CACHE_HOURS));
                    latest_elements(&cache, &config::celestrak_url(catnr)).await?
                }
            };

            let start = start.unwrap_or_else(Utc::now);
            overpass(elements, observer, start, Duration::from_secs(timeout_secs)).await
        }
        Command::History { store, action } => history(&store, action),
    }
}

fn locate(kml: &Path, lat: f64, lng: f64) -> Result<(), CliError> {
    let point = Point::new(lat, lng)?;
    let catalog = BoundaryCatalog::load_file(kml)?;
    let matches = catalog.find_containing(&point);

    if matches.is_empty() {
        println!("No path/row tile covers {lat:.6}, {lng:.6}");
        return Ok(());
    }

    println!("Tiles containing {lat:.6}, {lng:.6}:");
    for m in matches {
        println!(
            "  #{:<6} PATH {:>4}  ROW {:>4}",
            m.index,
            display_index(m.path),
            display_index(m.row)
        );
    }
    Ok(())
}

fn grid(lat: f64, lng: f64) -> Result<(), CliError> {
    let center = Point::new(lat, lng)?;
    let cells = build_grid(&center);

    // one table row per latitude offset
    for (i, row) in cells.chunks(3).enumerate() {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(j, cell)| {
                let target = if cell.is_target { " (Target)" } else { "" };
                format!("Pixel {},{}: {:.6}, {:.6}{}", i + 1, j + 1, cell.latitude, cell.longitude, target)
            })
            .collect();
        println!("{}", line.join(" | "));
    }
    Ok(())
}

async fn overpass(
    elements: OrbitalElements,
    observer: Observer,
    start: DateTime<Utc>,
    timeout: Duration,
) -> Result<(), CliError> {
    debug!("searching from {start} for {:?}", elements.name);

    match find_next_overpass_with_timeout(elements, observer, start, timeout).await {
        Ok(event) => {
            println!("Next overpass: {}", event.time.to_rfc3339());
            println!("  Azimuth   : {:.2}°", event.azimuth_degrees);
            println!("  Elevation : {:.2}°", event.elevation_degrees);
            Ok(())
        }
        Err(OverpassError::NoOverpassFound { start, end }) => {
            println!("No overpass found between {} and {}.", start.to_rfc3339(), end.to_rfc3339());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn history(store_path: &Path, action: HistoryAction) -> Result<(), CliError> {
    let mut store = JsonLocationStore::open(store_path)?;

    match action {
        HistoryAction::List => {
            let entries = store.history();
            if entries.is_empty() {
                println!("No saved locations");
            }
            for entry in entries {
                let pin = if entry.pinned { "*" } else { " " };
                println!("{pin} {:<24} {:.6}, {:.6}", entry.name, entry.latitude, entry.longitude);
            }
        }
        HistoryAction::Save { lat, lng, name, kml } => {
            let point = Point::new(lat, lng)?;

            let tiles = match kml {
                Some(path) => BoundaryCatalog::load_file(path)?.find_containing(&point),
                None => Vec::new(),
            };

            // one record per covering tile, or a single untagged record
            let pairs: Vec<(Option<u32>, Option<u32>)> = if tiles.is_empty() {
                vec![(None, None)]
            } else {
                tiles.iter().map(|m| (m.path, m.row)).collect()
            };

            for (path, row) in pairs {
                let id = store.save(NewLocation {
                    latitude: lat,
                    longitude: lng,
                    path,
                    row,
                    name: name.clone(),
                })?;
                println!("Saved #{id}: {name} (PATH {}, ROW {})", display_index(path), display_index(row));
            }
        }
        HistoryAction::PathRows { lat, lng } => {
            for pr in store.path_rows(lat, lng) {
                println!("PATH {:>4}  ROW {:>4}", display_index(pr.path), display_index(pr.row));
            }
        }
        HistoryAction::Pin { lat, lng } => {
            let n = store.set_pinned(lat, lng, true)?;
            println!("Pinned {n} record(s)");
        }
        HistoryAction::Unpin { lat, lng } => {
            let n = store.set_pinned(lat, lng, false)?;
            println!("Unpinned {n} record(s)");
        }
        HistoryAction::Delete { lat, lng } => {
            let n = store.delete(lat, lng)?;
            println!("Deleted {n} record(s)");
        }
        HistoryAction::Clear => {
            store.clear()?;
            println!("Cleared all saved locations");
        }
    }
    Ok(())
}

fn read_elements(path: &Path) -> Result<OrbitalElements, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::TleFile {
        path: path.to_path_buf(),
        source,
    })?;

    OrbitalElements::parse_text(&text).ok_or_else(|| CliError::TleFormat(path.to_path_buf()))
}

fn display_index(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
