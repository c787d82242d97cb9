//! Fetches the current element set, refreshes the cache file and prints it.

use std::process;

use chrono::{TimeDelta, Utc};
use clap::Parser;
use tracing::error;

use wrs_overpass::config::{self, DEFAULT_CATALOG_NUMBER, TLE_CACHE_FILE, TLE_CACHE_HOURS};
use wrs_overpass::logging::init_logging;
use wrs_overpass::systems::satellites::{Satellite, TleCache, fetch_elements};

#[derive(Parser)]
#[command(name = "tle-fetch", about = "Download an element set from CelesTrak into the cache")]
struct Args {
    /// NORAD catalog number (default: Landsat 9)
    #[arg(long, default_value_t = DEFAULT_CATALOG_NUMBER)]
    catnr: u64,

    /// Cache file to refresh
    #[arg(long, default_value = TLE_CACHE_FILE)]
    cache: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(false) {
        eprintln!("Error: failed to initialize logging: {e}");
        process::exit(1);
    }

    let url = config::celestrak_url(args.catnr);
    let elements = match fetch_elements(&url).await {
        Ok(elements) => elements,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    // make sure SGP4 accepts it before it lands in the cache
    let satellite = match Satellite::from_elements(&elements) {
        Ok(satellite) => satellite,
        Err(e) => {
            error!("CelesTrak returned an unusable element set: {e}");
            process::exit(1);
        }
    };

    let cache = TleCache::new(&args.cache, TimeDelta::hours(TLE_CACHE_HOURS));
    if let Err(e) = cache.write(&elements, Utc::now()) {
        error!("{e}");
        process::exit(1);
    }

    println!("  Name     : {}", satellite.name());
    println!("  NORAD ID : {}", satellite.norad_id());
    println!("  Epoch    : {}", satellite.epoch());
    println!();
    println!("{}", elements.line1);
    println!("{}", elements.line2);
}
