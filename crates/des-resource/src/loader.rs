//! CSV resource loader.
//!
//! # CSV format
//!
//! One row per resource.  Optional `set` names group resources into sets
//! using the default cyclic rule; a resource may join at most one set this
//! way.
//!
//! ```csv
//! name,capacity,set
//! nurse_a,1,nurses
//! nurse_b,1,nurses
//! scanner,2,
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::{ResourceError, ResourceManager, ResourceResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ResourceRecord {
    name:     String,
    capacity: u32,
    #[serde(default)]
    set:      Option<String>,
}

/// One resource to register, as read from CSV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name:     String,
    pub capacity: u32,
    /// Name of the set this resource joins, if any.
    pub set:      Option<String>,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self { name: name.into(), capacity, set: None }
    }

    pub fn in_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read resource specs from a CSV file.
pub fn load_resources_csv(path: &Path) -> ResourceResult<Vec<ResourceSpec>> {
    let file = std::fs::File::open(path).map_err(ResourceError::Io)?;
    load_resources_reader(file)
}

/// Like [`load_resources_csv`] but accepts any `Read` source.
pub fn load_resources_reader<R: Read>(reader: R) -> ResourceResult<Vec<ResourceSpec>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut specs = Vec::new();
    for result in csv_reader.deserialize::<ResourceRecord>() {
        let row = result.map_err(|e| ResourceError::Parse(e.to_string()))?;
        let name = row.name.trim().to_owned();
        if name.is_empty() {
            return Err(ResourceError::Parse("resource name must not be empty".into()));
        }
        specs.push(ResourceSpec {
            name,
            capacity: row.capacity,
            set: row.set.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()),
        });
    }
    Ok(specs)
}

impl ResourceManager {
    /// Register every spec, then one cyclic set per distinct `set` name in
    /// order of first appearance.
    pub fn load_specs(&mut self, specs: &[ResourceSpec]) -> ResourceResult<()> {
        let ids = self.add_resources(specs)?;
        let mut groups: Vec<(&str, Vec<des_core::ResourceId>)> = Vec::new();
        for (spec, id) in specs.iter().zip(ids) {
            let Some(set) = spec.set.as_deref() else { continue };
            match groups.iter_mut().find(|(name, _)| *name == set) {
                Some((_, members)) => members.push(id),
                None => groups.push((set, vec![id])),
            }
        }
        for (name, members) in groups {
            self.add_resource_set(name, &members)?;
        }
        Ok(())
    }
}
