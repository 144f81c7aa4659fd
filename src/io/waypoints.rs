//! Waypoint graph file (YAML).
//!
//! ```yaml
//! snap_radius: 2.0
//! nodes:
//!   - [0.0, 0.0, 0.0]
//!   - [10.0, 0.0, 0.0]
//! edges:
//!   - [0, 1]
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use nalgebra::Vector3;
use serde::Deserialize;

use crate::planning::{WaypointGraph, WaypointGraphPlanner};

fn default_snap_radius() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
struct WaypointFile {
    #[serde(default = "default_snap_radius")]
    snap_radius: f64,
    nodes: Vec<[f64; 3]>,
    #[serde(default)]
    edges: Vec<[usize; 2]>,
}

fn planner_from_file(file: WaypointFile) -> Result<WaypointGraphPlanner> {
    if !file.snap_radius.is_finite() || file.snap_radius < 0.0 {
        bail!("snap_radius must be a non-negative number, got {}", file.snap_radius);
    }
    let nodes = file
        .nodes
        .iter()
        .map(|&[x, y, z]| Vector3::new(x, y, z))
        .collect();
    let edges: Vec<(usize, usize)> = file.edges.iter().map(|&[a, b]| (a, b)).collect();
    let graph = WaypointGraph::new(nodes, &edges)?;
    Ok(WaypointGraphPlanner::new(graph, file.snap_radius))
}

pub fn waypoints_from_str(text: &str) -> Result<WaypointGraphPlanner> {
    let file: WaypointFile = serde_yaml::from_str(text).context("Malformed waypoint file")?;
    planner_from_file(file)
}

pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<WaypointGraphPlanner> {
    let path = path.as_ref();
    let file: WaypointFile = serde_yaml::from_reader(
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
    )
    .with_context(|| format!("Malformed waypoint file {}", path.display()))?;
    planner_from_file(file).with_context(|| format!("Invalid waypoints in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph() {
        let planner = waypoints_from_str(
            "nodes:\n  - [0, 0, 0]\n  - [10, 0, 0]\n  - [10, 0, 10]\nedges:\n  - [0, 1]\n  - [1, 2]\n",
        )
        .unwrap();

        assert_eq!(planner.snap_radius(), 2.0);
        assert_eq!(planner.graph().len(), 3);
        assert_eq!(planner.graph().edge_count(), 2);
    }

    #[test]
    fn test_bad_edge_is_rejected() {
        assert!(waypoints_from_str("nodes:\n  - [0, 0, 0]\nedges:\n  - [0, 5]\n").is_err());
        assert!(waypoints_from_str("snap_radius: -1\nnodes: []\n").is_err());
    }
}
