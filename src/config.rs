// Grid
// approximate size of a Landsat pixel in degrees (~30m)
pub const PIXEL_SIZE_DEG: f64 = 0.00027;

// Overpass search
pub const SEARCH_STEP_MINUTES: i64 = 1;
pub const SEARCH_STEPS: u32 = 1440; // 24 hours of one-minute samples

// Element source
// Landsat 9 is NORAD 49260
pub const DEFAULT_CATALOG_NUMBER: u64 = 49260;
pub const CELESTRAK_GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";
pub const USER_AGENT: &str = "wrs-overpass";

// Cache paths and lifetimes
pub const TLE_CACHE_FILE: &str = "tle_cache.json";
pub const TLE_CACHE_HOURS: i64 = 4;
pub const LOCATION_STORE_FILE: &str = "locations.json";

// Logging
pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn celestrak_url(catalog_number: u64) -> String {
    format!("{CELESTRAK_GP_URL}?CATNR={catalog_number}&FORMAT=tle")
}
