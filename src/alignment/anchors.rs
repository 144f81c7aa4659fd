//! Marker identifiers and the static anchor database.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::SE3;

/// Name of a reference image in the detector's image library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl MarkerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Read-only mapping from marker to its anchor offset inside the map.
///
/// Each offset is the pose of the virtual anchor relative to the map's
/// local origin. Offsets are fixed at configuration time.
#[derive(Debug, Clone, Default)]
pub struct AnchorDatabase {
    anchors: HashMap<MarkerId, SE3>,
}

impl AnchorDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (marker, offset) pairs. Later duplicates replace earlier ones.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (MarkerId, SE3)>,
    {
        Self {
            anchors: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, marker: &MarkerId) -> Option<&SE3> {
        self.anchors.get(marker)
    }

    pub fn contains(&self, marker: &MarkerId) -> bool {
        self.anchors.contains_key(marker)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Marker names in sorted order.
    pub fn markers(&self) -> Vec<&MarkerId> {
        let mut ids: Vec<_> = self.anchors.keys().collect();
        ids.sort();
        ids
    }
}
