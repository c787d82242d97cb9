//! KML reader for path/row boundary documents.
//!
//! Only the parts of KML the boundary files use are understood: `Placemark`,
//! its `description`, and the outer ring `coordinates` of the first `Polygon`.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::{debug, warn};

use super::{ParseError, Polygon, vertex_count};
use crate::systems::geometry::Point;

// WRS-2 descriptions render the label in bold: "<strong>PATH</strong>: 12"
static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bPATH(?:</strong>)?:\s*([\d.]+)").expect("Valid regex"));
static ROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bROW(?:</strong>)?:\s*([\d.]+)").expect("Valid regex"));

// which text node is being collected
#[derive(Clone, Copy, PartialEq)]
enum Capture {
    None,
    Description,
    Coordinates,
}

#[derive(Default)]
struct PlacemarkState {
    description: String,
    coordinates: Option<String>,
    saw_polygon: bool,
    polygon_depth: usize,
    inner_depth: usize,
    collecting_coordinates: bool,
}

pub(super) fn parse_polygons(source: &str) -> Result<Vec<Polygon>, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut polygons = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut seen_root = false;

    let mut placemark: Option<PlacemarkState> = None;
    let mut placemark_index = 0;
    let mut capture = Capture::None;

    loop {
        let event = reader.read_event().map_err(|source| ParseError::Xml {
            position: reader.buffer_position() as u64,
            source,
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                seen_root = true;

                if name == "Placemark" && placemark.is_none() {
                    placemark = Some(PlacemarkState::default());
                } else if let Some(state) = placemark.as_mut() {
                    match name.as_str() {
                        "description" => capture = Capture::Description,
                        "Polygon" => {
                            state.saw_polygon = true;
                            state.polygon_depth += 1;
                        }
                        "innerBoundaryIs" if state.polygon_depth > 0 => state.inner_depth += 1,
                        "coordinates" => {
                            // first outer ring of the first polygon only
                            if state.polygon_depth > 0
                                && state.inner_depth == 0
                                && state.coordinates.is_none()
                            {
                                state.collecting_coordinates = true;
                                state.coordinates = Some(String::new());
                                capture = Capture::Coordinates;
                            }
                        }
                        _ => {}
                    }
                }

                open.push(name);
            }
            Event::End(_) => {
                let name = open.pop().unwrap_or_default();

                if name == "Placemark" {
                    if let Some(state) = placemark.take() {
                        match finish_placemark(state, placemark_index)? {
                            Some(polygon) => polygons.push(polygon),
                            None => debug!("placemark {placemark_index} has no polygon, skipped"),
                        }
                        placemark_index += 1;
                    }
                } else if let Some(state) = placemark.as_mut() {
                    match name.as_str() {
                        "description" => capture = Capture::None,
                        "Polygon" => state.polygon_depth = state.polygon_depth.saturating_sub(1),
                        "innerBoundaryIs" => state.inner_depth = state.inner_depth.saturating_sub(1),
                        "coordinates" if state.collecting_coordinates => {
                            state.collecting_coordinates = false;
                            capture = Capture::None;
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                seen_root = true;
                let name = e.local_name();

                if name.as_ref() == b"Placemark" {
                    // self-closed placemark carries nothing
                    placemark_index += 1;
                } else if let Some(state) = placemark.as_mut() {
                    match name.as_ref() {
                        b"Polygon" => state.saw_polygon = true,
                        // an empty outer ring still counts as the polygon's ring
                        b"coordinates"
                            if state.polygon_depth > 0 && state.inner_depth == 0 && state.coordinates.is_none() =>
                        {
                            state.coordinates = Some(String::new());
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(text) => {
                if capture != Capture::None {
                    let unescaped = text.unescape().map_err(|source| ParseError::Xml {
                        position: reader.buffer_position() as u64,
                        source,
                    })?;
                    append(&mut placemark, capture, &unescaped);
                }
            }
            Event::CData(data) => {
                if capture != Capture::None {
                    append(&mut placemark, capture, &String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(name) = open.pop() {
        return Err(ParseError::Unclosed(name));
    }
    if !seen_root {
        return Err(ParseError::Empty);
    }

    Ok(polygons)
}

fn append(placemark: &mut Option<PlacemarkState>, capture: Capture, text: &str) {
    let Some(state) = placemark.as_mut() else {
        return;
    };

    match capture {
        Capture::Description => state.description.push_str(text),
        Capture::Coordinates => {
            if let Some(coords) = state.coordinates.as_mut() {
                coords.push(' ');
                coords.push_str(text);
            }
        }
        Capture::None => {}
    }
}

fn finish_placemark(state: PlacemarkState, index: usize) -> Result<Option<Polygon>, ParseError> {
    let coordinates = match state.coordinates {
        Some(coordinates) => coordinates,
        None if state.saw_polygon => {
            return Err(ParseError::DegenerateRing {
                placemark: index,
                points: 0,
            });
        }
        None => return Ok(None),
    };

    let ring = parse_ring(&coordinates, index)?;
    let points = vertex_count(&ring);
    let path = extract_label(&PATH_PATTERN, &state.description, "PATH", index);
    let row = extract_label(&ROW_PATTERN, &state.description, "ROW", index);

    Polygon::new(ring, path, row, state.description)
        .map(Some)
        .ok_or(ParseError::DegenerateRing { placemark: index, points })
}

/// Parses "lng,lat[,alt] lng,lat[,alt] ..." into latitude-first points.
fn parse_ring(text: &str, placemark: usize) -> Result<Vec<Point>, ParseError> {
    text.split_whitespace()
        .map(|token| {
            let bad = || ParseError::Coordinate {
                placemark,
                token: token.to_string(),
            };

            let mut parts = token.split(',');
            let lng: f64 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
            let lat: f64 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;

            // source order is lng,lat; stored order is lat,lng
            Point::new(lat, lng).map_err(|source| ParseError::OutOfRange { placemark, source })
        })
        .collect()
}

/// First `LABEL: <number>` in the description as a tile index.
fn extract_label(pattern: &Regex, description: &str, label: &str, placemark: usize) -> Option<u32> {
    let captured = pattern.captures(description)?.get(1)?.as_str();

    match captured.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            Some(value as u32)
        }
        _ => {
            warn!("placemark {placemark}: {label} value {captured:?} is not a tile index, ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_label_plain_and_html() {
        assert_eq!(extract_label(&PATH_PATTERN, "PATH: 42 ROW: 7", "PATH", 0), Some(42));
        assert_eq!(extract_label(&ROW_PATTERN, "PATH: 42 ROW: 7", "ROW", 0), Some(7));
        assert_eq!(
            extract_label(&PATH_PATTERN, "<strong>PATH</strong>: 118<br>", "PATH", 0),
            Some(118)
        );
    }

    #[test]
    fn test_extract_label_first_match_wins() {
        assert_eq!(extract_label(&ROW_PATTERN, "ROW: 3, ROW: 9", "ROW", 0), Some(3));
    }

    #[test]
    fn test_extract_label_is_case_sensitive() {
        assert_eq!(extract_label(&PATH_PATTERN, "path: 42", "PATH", 0), None);
    }

    #[test]
    fn test_extract_label_ignores_non_integers() {
        assert_eq!(extract_label(&PATH_PATTERN, "PATH: 12.5", "PATH", 0), None);
        assert_eq!(extract_label(&PATH_PATTERN, "PATH: 12.0", "PATH", 0), Some(12));
        assert_eq!(extract_label(&PATH_PATTERN, "PATH: .", "PATH", 0), None);
    }

    #[test]
    fn test_label_needs_word_boundary() {
        assert_eq!(extract_label(&ROW_PATTERN, "ARROW: 5", "ROW", 0), None);
    }

    #[test]
    fn test_parse_ring_flips_to_lat_lng() {
        let ring = parse_ring("10.0,50.0,0 11.0,51.0,0\n12.0,52.0", 0).unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring[0].latitude(), 50.0);
        assert_eq!(ring[0].longitude(), 10.0);
        assert_eq!(ring[2].latitude(), 52.0);
        assert_eq!(ring[2].longitude(), 12.0);
    }

    #[test]
    fn test_parse_ring_rejects_bad_tokens() {
        assert!(matches!(
            parse_ring("10.0,50.0 eleven,51.0", 3),
            Err(ParseError::Coordinate { placemark: 3, .. })
        ));
        assert!(matches!(
            parse_ring("10.0", 0),
            Err(ParseError::Coordinate { .. })
        ));
        // latitude 120 after the flip
        assert!(matches!(
            parse_ring("10.0,120.0", 1),
            Err(ParseError::OutOfRange { placemark: 1, .. })
        ));
    }
}
