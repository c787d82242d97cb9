//! locations.rs
//!
//! Saved-location history: named points with the path/row they fell in,
//! which can be pinned to the top of the list, deleted or cleared.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::systems::files::write_atomic;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a saved location needs a name")]
    MissingName,
    #[error("location file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("location file {} is not valid: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub path: Option<u32>,
    pub row: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub pinned: bool,
}

/// What a caller supplies when saving; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub path: Option<u32>,
    pub row: Option<u32>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathRow {
    pub path: Option<u32>,
    pub row: Option<u32>,
}

/// Persistence seam for saved locations. Locations are addressed by their
/// exact latitude/longitude pair, several records may share one.
///
/// A mutation that returns an error has not been applied.
pub trait LocationStore {
    fn save(&mut self, location: NewLocation) -> Result<u64, StoreError>;

    /// Distinct (lat, lng, name, pinned) entries, pinned first, newest first.
    fn history(&self) -> Vec<HistoryEntry>;

    fn path_rows(&self, latitude: f64, longitude: f64) -> Vec<PathRow>;

    /// Returns how many records changed.
    fn set_pinned(&mut self, latitude: f64, longitude: f64, pinned: bool) -> Result<usize, StoreError>;

    /// Returns how many records were removed.
    fn delete(&mut self, latitude: f64, longitude: f64) -> Result<usize, StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Records {
    next_id: u64,
    locations: Vec<SavedLocation>,
}

/// Location store kept in memory and, when opened on a file, written back as
/// JSON after every change.
#[derive(Debug, Default)]
pub struct JsonLocationStore {
    file: Option<PathBuf>,
    records: Records,
}

impl JsonLocationStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let records = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Records::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(JsonLocationStore {
            file: Some(path),
            records,
        })
    }

    pub fn locations(&self) -> &[SavedLocation] {
        &self.records.locations
    }

    /// Writes `records` out, then makes them current. A failed write leaves
    /// the store as it was.
    fn commit(&mut self, records: Records) -> Result<(), StoreError> {
        if let Some(path) = &self.file {
            let json = serde_json::to_string_pretty(&records).map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?;
            write_atomic(path, &json).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            debug!("wrote {} locations to {:?}", records.locations.len(), path);
        }

        self.records = records;
        Ok(())
    }

    fn at(&self, latitude: f64, longitude: f64) -> impl Iterator<Item = &SavedLocation> {
        self.records
            .locations
            .iter()
            .filter(move |l| l.latitude == latitude && l.longitude == longitude)
    }
}

impl LocationStore for JsonLocationStore {
    fn save(&mut self, location: NewLocation) -> Result<u64, StoreError> {
        let name = location.name.trim();
        if name.is_empty() {
            return Err(StoreError::MissingName);
        }

        let mut records = self.records.clone();
        records.next_id += 1;
        let id = records.next_id;

        records.locations.push(SavedLocation {
            id,
            latitude: location.latitude,
            longitude: location.longitude,
            path: location.path,
            row: location.row,
            name: name.to_string(),
            pinned: false,
        });

        self.commit(records)?;
        Ok(id)
    }

    fn history(&self) -> Vec<HistoryEntry> {
        let mut ordered: Vec<&SavedLocation> = self.records.locations.iter().collect();
        ordered.sort_by(|a, b| b.pinned.cmp(&a.pinned).then(b.id.cmp(&a.id)));

        let mut seen = HashSet::new();
        ordered
            .into_iter()
            .filter(|l| seen.insert((l.latitude.to_bits(), l.longitude.to_bits(), l.name.clone(), l.pinned)))
            .map(|l| HistoryEntry {
                latitude: l.latitude,
                longitude: l.longitude,
                name: l.name.clone(),
                pinned: l.pinned,
            })
            .collect()
    }

    fn path_rows(&self, latitude: f64, longitude: f64) -> Vec<PathRow> {
        self.at(latitude, longitude)
            .map(|l| PathRow { path: l.path, row: l.row })
            .collect()
    }

    fn set_pinned(&mut self, latitude: f64, longitude: f64, pinned: bool) -> Result<usize, StoreError> {
        let mut records = self.records.clone();
        let mut changed = 0;
        for location in &mut records.locations {
            if location.latitude == latitude && location.longitude == longitude {
                location.pinned = pinned;
                changed += 1;
            }
        }

        self.commit(records)?;
        Ok(changed)
    }

    fn delete(&mut self, latitude: f64, longitude: f64) -> Result<usize, StoreError> {
        let mut records = self.records.clone();
        records
            .locations
            .retain(|l| !(l.latitude == latitude && l.longitude == longitude));
        let removed = self.records.locations.len() - records.locations.len();

        self.commit(records)?;
        Ok(removed)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let records = Records {
            next_id: self.records.next_id,
            locations: Vec::new(),
        };
        self.commit(records)
    }
}
