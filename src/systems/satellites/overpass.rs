//! overpass.rs
//!
//! Finds when a satellite next rises above an observer's horizon by sampling
//! its look angles at fixed steps over a bounded window.
//!
//! The answer is the first sample above the horizon, i.e. roughly when the
//! satellite becomes visible, not the culmination of the pass.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::tle::{LookAngleSource, Observer, OrbitalElements, PropagationError, Satellite};
use crate::config::{SEARCH_STEP_MINUTES, SEARCH_STEPS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverpassEvent {
    pub time: DateTime<Utc>,
    pub azimuth_degrees: f64,
    pub elevation_degrees: f64,
}

#[derive(Debug, Error)]
pub enum OverpassError {
    /// Every sample in the window was at or below the horizon. This is an
    /// ordinary outcome for many locations and dates.
    #[error("no overpass between {start} and {end}")]
    NoOverpassFound {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error(transparent)]
    Propagation(#[from] PropagationError),
    #[error("overpass search did not finish within {0:?}")]
    TimedOut(std::time::Duration),
    #[error("overpass search task failed: {0}")]
    Task(String),
}

impl OverpassError {
    pub fn is_no_overpass(&self) -> bool {
        matches!(self, OverpassError::NoOverpassFound { .. })
    }
}

/// Sampling plan for the search.
#[derive(Debug, Clone, Copy)]
pub struct OverpassSearch {
    step: TimeDelta,
    steps: u32,
}

impl Default for OverpassSearch {
    // one day of one-minute samples
    fn default() -> Self {
        Self {
            step: TimeDelta::minutes(SEARCH_STEP_MINUTES),
            steps: SEARCH_STEPS,
        }
    }
}

impl OverpassSearch {
    pub fn new(step: TimeDelta, steps: u32) -> Self {
        Self { step, steps }
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Time of sample `index` counted from `start`.
    fn sample_time(&self, start: DateTime<Utc>, index: u32) -> Option<DateTime<Utc>> {
        let offset = self.step.checked_mul(i32::try_from(index).ok()?)?;
        start.checked_add_signed(offset)
    }

    /// Scans from `start` and returns the first sample with positive
    /// elevation. Runs at most `steps` propagations; a propagation failure
    /// ends the scan immediately.
    pub fn find_next<S>(&self, source: &S, observer: &Observer, start: DateTime<Utc>) -> Result<OverpassEvent, OverpassError>
    where
        S: LookAngleSource + ?Sized,
    {
        let mut last = start;

        for i in 0..self.steps {
            let Some(time) = self.sample_time(start, i) else {
                break;
            };
            last = time;

            let angles = source.look_angles(observer, time)?;
            if angles.elevation_degrees > 0.0 {
                debug!("satellite above horizon after {i} steps");
                return Ok(OverpassEvent {
                    time,
                    azimuth_degrees: angles.azimuth_degrees,
                    elevation_degrees: angles.elevation_degrees,
                });
            }
        }

        Err(OverpassError::NoOverpassFound { start, end: last })
    }
}

/// Next time the satellite described by `elements` rises above the horizon
/// for `observer`, searching one day from `start`.
pub fn find_next_overpass(
    elements: &OrbitalElements,
    observer: &Observer,
    start: DateTime<Utc>,
) -> Result<OverpassEvent, OverpassError> {
    let satellite = Satellite::from_elements(elements)?;

    let result = OverpassSearch::default().find_next(&satellite, observer, start);
    match &result {
        Ok(event) => info!(
            "{} overpass for ({:.4}, {:.4}) at {} (az {:.2}, el {:.2})",
            satellite.name(),
            observer.latitude,
            observer.longitude,
            event.time,
            event.azimuth_degrees,
            event.elevation_degrees
        ),
        Err(e) => info!("{}: {}", satellite.name(), e),
    }
    result
}

/// Same as `find_next_overpass`, run on the blocking pool so an async caller
/// is not stalled, and abandoned once `timeout` elapses.
pub async fn find_next_overpass_with_timeout(
    elements: OrbitalElements,
    observer: Observer,
    start: DateTime<Utc>,
    timeout: std::time::Duration,
) -> Result<OverpassEvent, OverpassError> {
    let task = tokio::task::spawn_blocking(move || find_next_overpass(&elements, &observer, start));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(OverpassError::Task(e.to_string())),
        Err(_) => Err(OverpassError::TimedOut(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::satellites::tle::LookAngles;
    use chrono::TimeZone;
    use std::cell::Cell;

    // replays one elevation per minute from `start`
    struct Scripted {
        start: DateTime<Utc>,
        elevations: Vec<f64>,
        fail_at: Option<usize>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(elevations: Vec<f64>) -> Self {
            Scripted {
                start: start(),
                elevations,
                fail_at: None,
                calls: Cell::new(0),
            }
        }
    }

    impl LookAngleSource for Scripted {
        fn look_angles(&self, _observer: &Observer, time: DateTime<Utc>) -> Result<LookAngles, PropagationError> {
            self.calls.set(self.calls.get() + 1);
            let index = (time - self.start).num_minutes() as usize;

            if self.fail_at == Some(index) {
                return Err(PropagationError::Propagation {
                    time,
                    reason: "decayed".to_string(),
                });
            }

            Ok(LookAngles {
                azimuth_degrees: index as f64,
                elevation_degrees: self.elevations.get(index).copied().unwrap_or(-10.0),
                range_km: 1000.0,
            })
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_first_positive_sample_wins() {
        let source = Scripted::new(vec![-5.0, -1.0, 0.0, 3.0, 10.0, 45.0]);
        let event = OverpassSearch::default()
            .find_next(&source, &Observer::new(0.0, 0.0), start())
            .unwrap();

        // exactly 0 is still on the horizon
        assert_eq!(event.time, start() + TimeDelta::minutes(3));
        assert_eq!(event.elevation_degrees, 3.0);
        assert_eq!(event.azimuth_degrees, 3.0);
        assert_eq!(source.calls.get(), 4);
    }

    #[test]
    fn test_start_sample_counts() {
        let source = Scripted::new(vec![12.0]);
        let event = OverpassSearch::default()
            .find_next(&source, &Observer::new(0.0, 0.0), start())
            .unwrap();
        assert_eq!(event.time, start());
    }

    #[test]
    fn test_no_positive_sample_is_no_overpass() {
        let source = Scripted::new(vec![]);
        let err = OverpassSearch::default()
            .find_next(&source, &Observer::new(0.0, 0.0), start())
            .unwrap_err();

        assert!(err.is_no_overpass());
        match err {
            OverpassError::NoOverpassFound { start: s, end } => {
                assert_eq!(s, start());
                assert_eq!(end, start() + TimeDelta::minutes(1439));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(source.calls.get(), 1440);
    }

    #[test]
    fn test_pass_just_outside_window_is_not_found() {
        let mut elevations = vec![-1.0; 1440];
        elevations.push(20.0);
        let source = Scripted::new(elevations);

        let result = OverpassSearch::default().find_next(&source, &Observer::new(0.0, 0.0), start());
        assert!(matches!(result, Err(OverpassError::NoOverpassFound { .. })));
    }

    #[test]
    fn test_propagation_error_stops_search() {
        let mut source = Scripted::new(vec![-1.0, -1.0, -1.0, 5.0]);
        source.fail_at = Some(2);

        let err = OverpassSearch::default()
            .find_next(&source, &Observer::new(0.0, 0.0), start())
            .unwrap_err();
        assert!(matches!(err, OverpassError::Propagation(_)));
        assert!(!err.is_no_overpass());
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn test_custom_step_and_window() {
        let source = Scripted::new(vec![-1.0, -1.0, -1.0, -1.0, 8.0]);
        let search = OverpassSearch::new(TimeDelta::minutes(2), 3);

        // samples minutes 0, 2, 4
        let event = search.find_next(&source, &Observer::new(0.0, 0.0), start()).unwrap();
        assert_eq!(event.time, start() + TimeDelta::minutes(4));
        assert_eq!(search.steps(), 3);
        assert_eq!(search.step(), TimeDelta::minutes(2));
    }

    #[test]
    fn test_invalid_elements_are_propagation_errors() {
        let elements = OrbitalElements::new("1 bad", "2 bad");
        let err = find_next_overpass(&elements, &Observer::new(0.0, 0.0), start()).unwrap_err();
        assert!(matches!(err, OverpassError::Propagation(PropagationError::InvalidElements(_))));
    }
}
