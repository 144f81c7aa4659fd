//! Destination table (CSV).
//!
//! Columns: `ID,Name,PosX,PosY,PosZ,PointTag`. Positions are relative to the
//! environment origin. Only rows tagged `EndPoint` are destinations; other
//! tags (intermediate waypoints, stairs, ...) are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::session::{Destination, DestinationStore};

/// Tag marking a row as a navigable destination.
pub const END_POINT_TAG: &str = "EndPoint";

#[derive(Debug, Deserialize)]
struct DestinationRow {
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "PosX")]
    x: f64,
    #[serde(rename = "PosY")]
    y: f64,
    #[serde(rename = "PosZ")]
    z: f64,
    #[serde(rename = "PointTag", default)]
    tag: String,
}

/// Read destinations from any CSV source with a header row.
pub fn destinations_from_reader<R: Read>(reader: R) -> Result<DestinationStore> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut destinations = Vec::new();
    for (line, row) in rdr.deserialize::<DestinationRow>().enumerate() {
        let row = row.with_context(|| format!("Bad destination row {}", line + 1))?;
        if row.tag != END_POINT_TAG {
            debug!("Skipping '{}' tagged '{}'", row.name, row.tag);
            continue;
        }
        destinations.push(Destination {
            id: row.id,
            name: row.name,
            position: Vector3::new(row.x, row.y, row.z),
        });
    }

    let (store, rejected) = DestinationStore::from_destinations(destinations);
    for d in rejected {
        warn!("Duplicate destination name '{}' (ID {}) ignored", d.name, d.id);
    }
    Ok(store)
}

pub fn load_destinations<P: AsRef<Path>>(path: P) -> Result<DestinationStore> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    destinations_from_reader(file).with_context(|| format!("Invalid destinations in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_end_points_are_kept() {
        let csv = "\
ID,Name,PosX,PosY,PosZ,PointTag
1,Library,10.0,0.0,10.0,EndPoint
2,Corridor A,5.0,0.0,0.0,Waypoint
3,Cafe, -5.0, 0.0, 3.0, EndPoint
4,Library,1.0,0.0,1.0,EndPoint
";
        let store = destinations_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("Cafe").unwrap().position, Vector3::new(-5.0, 0.0, 3.0));
        assert_eq!(store.get("Library").unwrap().id, 1);
        assert!(store.get("Corridor A").is_none());
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let csv = "ID,Name,PosX,PosY,PosZ,PointTag\n1,Library,ten,0,0,EndPoint\n";
        assert!(destinations_from_reader(csv.as_bytes()).is_err());
    }
}
