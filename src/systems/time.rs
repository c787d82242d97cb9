//! time.rs
//!
//! Sidereal time used to rotate SGP4 output into the Earth-fixed frame.
//! UTC is used in place of UT1, the difference is below a second.

use chrono::{DateTime, Utc};

use crate::constants::{
    DAYS_PER_JULIAN_CENTURY, GMST_BASE_DEG, GMST_CORRECTION, GMST_CUBIC_DIVISOR,
    GMST_ROTATION_PER_DAY, SECONDS_PER_DAY,
};

// 2000-01-01T12:00:00Z
const J2000_UNIX_SECONDS: i64 = 946_728_000;

/// Days (with fraction) since the J2000 epoch.
pub fn days_since_j2000(timestamp: DateTime<Utc>) -> f64 {
    let micros = timestamp.timestamp_micros() - J2000_UNIX_SECONDS * 1_000_000;
    micros as f64 / (1.0e6 * SECONDS_PER_DAY)
}

/// Greenwich mean sidereal time in radians, normalized to [0, 2π).
pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let days = days_since_j2000(timestamp);
    let centuries = days / DAYS_PER_JULIAN_CENTURY;

    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / GMST_CUBIC_DIVISOR;

    gmst_degrees.rem_euclid(360.0).to_radians()
}
