//! Anchor database file (YAML).
//!
//! ```yaml
//! anchors:
//!   - marker: AnchorLobby
//!     position: [0.0, 0.0, 2.0]
//!     rotation: [1.0, 0.0, 0.0, 0.0]   # w, x, y, z (optional)
//!   - marker: AnchorLibrary
//!     position: [12.0, 0.0, -4.0]
//!     yaw_deg: 90.0                     # alternative to `rotation`
//!   - marker: AnchorStairs
//!     transform: [1, 0, 0, 3,  0, 1, 0, 0,  0, 0, 1, 8,  0, 0, 0, 1]   # row-major 4x4
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use nalgebra::{Matrix4, Vector3};
use serde::Deserialize;

use crate::alignment::{AnchorDatabase, MarkerId};
use crate::geometry::{SE3, yaw_rotation};

#[derive(Debug, Deserialize)]
struct AnchorFile {
    anchors: Vec<AnchorEntry>,
}

#[derive(Debug, Deserialize)]
struct AnchorEntry {
    marker: MarkerId,
    #[serde(default)]
    position: Option<[f64; 3]>,
    /// Quaternion, w first.
    #[serde(default)]
    rotation: Option<[f64; 4]>,
    #[serde(default)]
    yaw_deg: Option<f64>,
    /// Row-major homogeneous matrix.
    #[serde(default)]
    transform: Option<Vec<f64>>,
}

impl AnchorEntry {
    fn pose(&self) -> Result<SE3> {
        if let Some(data) = &self.transform {
            if self.position.is_some() || self.rotation.is_some() || self.yaw_deg.is_some() {
                bail!("Anchor '{}': `transform` excludes position/rotation/yaw_deg", self.marker);
            }
            if data.len() != 16 {
                bail!(
                    "Anchor '{}': expected 16 elements for transform, got {}",
                    self.marker,
                    data.len()
                );
            }
            return Ok(SE3::from_matrix(Matrix4::from_row_slice(data)));
        }

        let [x, y, z] = self.position.unwrap_or([0.0; 3]);
        let translation = Vector3::new(x, y, z);
        match (self.rotation, self.yaw_deg) {
            (Some(_), Some(_)) => {
                bail!("Anchor '{}': give either `rotation` or `yaw_deg`, not both", self.marker)
            }
            (Some([w, qx, qy, qz]), None) => {
                if w * w + qx * qx + qy * qy + qz * qz < 1e-12 {
                    bail!("Anchor '{}': zero quaternion", self.marker);
                }
                Ok(SE3::from_quaternion(w, qx, qy, qz, translation))
            }
            (None, Some(yaw)) => Ok(SE3::new(yaw_rotation(yaw.to_radians()), translation)),
            (None, None) => Ok(SE3::from_translation(translation)),
        }
    }
}

/// Parse an anchor database from YAML text.
pub fn anchors_from_str(text: &str) -> Result<AnchorDatabase> {
    let file: AnchorFile = serde_yaml::from_str(text).context("Malformed anchor file")?;

    let mut entries: Vec<(MarkerId, SE3)> = Vec::with_capacity(file.anchors.len());
    for entry in &file.anchors {
        if entries.iter().any(|(m, _)| m == &entry.marker) {
            bail!("Duplicate anchor for marker '{}'", entry.marker);
        }
        entries.push((entry.marker.clone(), entry.pose()?));
    }
    Ok(AnchorDatabase::from_entries(entries))
}

/// Load an anchor database from a YAML file.
pub fn load_anchors<P: AsRef<Path>>(path: P) -> Result<AnchorDatabase> {
    let path = path.as_ref();
    let mut text = String::new();
    File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    anchors_from_str(&text).with_context(|| format!("Invalid anchors in {}", path.display()))
}
