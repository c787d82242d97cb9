use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sgp4::Prediction;
use thiserror::Error;

use crate::constants::{EARTH_FLATTENING, EARTH_RADIUS_KM};
use crate::systems::geometry::Point;
use crate::systems::time::greenwich_mean_sidereal_time;

// note: a TLE line is always 69 characters
const TLE_LINE_LEN: usize = 69;

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("invalid element set: {0}")]
    InvalidElements(String),
    #[error("{time} is not representable relative to the element epoch: {reason}")]
    Epoch { time: DateTime<Utc>, reason: String },
    #[error("SGP4 failed at {time}: {reason}")]
    Propagation { time: DateTime<Utc>, reason: String },
}

/// Two-line element set as received from the element source.
///
/// Not validated here; `Satellite::from_elements` does that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElements {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        OrbitalElements {
            name: None,
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reads the first element set out of a TLE text, with or without a
    /// name line in front.
    pub fn parse_text(text: &str) -> Option<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let start = lines.iter().position(|l| l.starts_with("1 "))?;
        let line2 = lines.get(start + 1).filter(|l| l.starts_with("2 "))?;

        let mut elements = OrbitalElements::new(lines[start], *line2);
        if start > 0 {
            elements.name = Some(lines[start - 1].to_string());
        }
        Some(elements)
    }
}

/// Ground position the satellite is looked at from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub height_meters: f64,
}

impl Observer {
    // assumes sea level
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Observer {
            latitude,
            longitude,
            height_meters: 0.0,
        }
    }

    pub fn at(point: &Point) -> Self {
        Self::new(point.latitude(), point.longitude())
    }

    pub fn with_height(mut self, height_meters: f64) -> Self {
        self.height_meters = height_meters;
        self
    }

    /// Earth-fixed position on the WGS-84 ellipsoid, km.
    pub fn ecef(&self) -> [f64; 3] {
        let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();

        let n = EARTH_RADIUS_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = self.height_meters / 1000.0;

        [
            (n + h) * cos_lat * lon.cos(),
            (n + h) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + h) * sin_lat,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    /// clockwise from north, [0, 360)
    pub azimuth_degrees: f64,
    /// above the local horizon
    pub elevation_degrees: f64,
    pub range_km: f64,
}

/// Anything that can say where a satellite appears in an observer's sky.
pub trait LookAngleSource {
    fn look_angles(&self, observer: &Observer, time: DateTime<Utc>) -> Result<LookAngles, PropagationError>;
}

/// SGP4 state built once from an element set and reused for every
/// propagation.
#[derive(Clone)]
pub struct Satellite {
    // SGP4 datatypes, extracted from TLE lines
    elements: sgp4::Elements,
    constants: sgp4::Constants,
}

impl Satellite {
    pub fn from_elements(tle: &OrbitalElements) -> Result<Self, PropagationError> {
        let line1 = tle.line1.trim();
        let line2 = tle.line2.trim();

        if line1.len() < TLE_LINE_LEN || line2.len() < TLE_LINE_LEN {
            return Err(PropagationError::InvalidElements(format!(
                "element lines must be {TLE_LINE_LEN} characters, got {} and {}",
                line1.len(),
                line2.len()
            )));
        }

        // let the SGP4 library do the heavy lifting
        let elements = sgp4::Elements::from_tle(tle.name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| PropagationError::InvalidElements(format!("{e:?}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| PropagationError::InvalidElements(format!("{e:?}")))?;

        Ok(Satellite { elements, constants })
    }

    // getters
    pub fn name(&self) -> &str {
        self.elements.object_name.as_deref().unwrap_or("Unknown")
    }
    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }
    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    /// TEME position (km) and velocity (km/s) at `time`.
    pub fn calculate(&self, time: DateTime<Utc>) -> Result<Prediction, PropagationError> {
        let minutes = self.minutes_since_epoch(time)?;

        self.constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Propagation {
                time,
                reason: format!("{e:?}"),
            })
    }

    fn minutes_since_epoch(&self, time: DateTime<Utc>) -> Result<sgp4::MinutesSinceEpoch, PropagationError> {
        self.elements
            .datetime_to_minutes_since_epoch(&time.naive_utc())
            .map_err(|e| PropagationError::Epoch {
                time,
                reason: format!("{e:?}"),
            })
    }
}

impl LookAngleSource for Satellite {
    fn look_angles(&self, observer: &Observer, time: DateTime<Utc>) -> Result<LookAngles, PropagationError> {
        let prediction = self.calculate(time)?;
        let sat = teme_to_ecef(prediction.position, greenwich_mean_sidereal_time(time));

        Ok(topocentric(observer, sat))
    }
}

// rotate about z by the sidereal angle; polar motion is ignored
fn teme_to_ecef(position: [f64; 3], gmst: f64) -> [f64; 3] {
    let (st, ct) = gmst.sin_cos();
    [
        ct * position[0] + st * position[1],
        -st * position[0] + ct * position[1],
        position[2],
    ]
}

// East-North-Up look angles from the observer to an Earth-fixed position
fn topocentric(observer: &Observer, sat_ecef: [f64; 3]) -> LookAngles {
    let site = observer.ecef();
    let dx = sat_ecef[0] - site[0];
    let dy = sat_ecef[1] - site[1];
    let dz = sat_ecef[2] - site[2];
    let range_km = (dx * dx + dy * dy + dz * dz).sqrt();

    let (sin_lat, cos_lat) = observer.latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = observer.longitude.to_radians().sin_cos();

    let east = -sin_lon * dx + cos_lon * dy;
    let north = -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz;
    let up = cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz;

    let azimuth_degrees = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_degrees = up.atan2((east * east + north * north).sqrt()).to_degrees();

    LookAngles {
        azimuth_degrees,
        elevation_degrees,
        range_km,
    }
}
