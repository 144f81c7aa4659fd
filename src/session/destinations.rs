//! Named navigation destinations, stored relative to the environment origin.

use std::collections::BTreeMap;

use nalgebra::Vector3;

/// A navigable destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub id: u32,
    pub name: String,
    /// Map-local position.
    pub position: Vector3<f64>,
}

/// Read-only lookup of destinations by name.
#[derive(Debug, Clone, Default)]
pub struct DestinationStore {
    by_name: BTreeMap<String, Destination>,
}

impl DestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list. Later entries with a duplicate name are rejected
    /// and returned.
    pub fn from_destinations<I>(destinations: I) -> (Self, Vec<Destination>)
    where
        I: IntoIterator<Item = Destination>,
    {
        let mut store = Self::new();
        let mut rejected = Vec::new();
        for d in destinations {
            if store.by_name.contains_key(&d.name) {
                rejected.push(d);
            } else {
                store.by_name.insert(d.name.clone(), d);
            }
        }
        (store, rejected)
    }

    pub fn get(&self, name: &str) -> Option<&Destination> {
        self.by_name.get(name)
    }

    /// Destinations sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
