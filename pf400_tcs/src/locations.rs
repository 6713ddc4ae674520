use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{JointPose, TcsError};

/// Named taught locations, loaded from an external JSON store. The driver
/// never validates the store's provenance; it only reads poses out of it and
/// appends taught ones.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LocationRegistry {
    locations: BTreeMap<String, JointPose>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TcsError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            TcsError::Configuration(format!("cannot read location store {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            TcsError::Configuration(format!("cannot parse location store {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TcsError> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(self).map_err(|e| {
            TcsError::Configuration(format!("cannot serialize location store: {}", e))
        })?;
        fs::write(path, raw).map_err(|e| {
            TcsError::Configuration(format!("cannot write location store {}: {}", path.display(), e))
        })
    }

    pub fn get(&self, name: &str) -> Option<&JointPose> {
        self.locations.get(name)
    }

    /// Records a new taught location. Teaching overwrites an existing entry
    /// of the same name; the registry is append-only otherwise.
    pub fn teach(&mut self, name: impl Into<String>, pose: JointPose) {
        self.locations.insert(name.into(), pose);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
