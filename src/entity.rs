// 🎓 Entities - Selectable candidates (students, courses)
// Identity is the id; the label is only what the operator reads.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// ENTITY ID
// ============================================================================

/// Opaque identifier of a candidate record.
///
/// The server decides what the id looks like (numeric primary key, UUID...),
/// so it is kept as a string and only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId(id)
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// A selectable candidate record (student or course)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identity
    pub id: EntityId,

    /// Display string shown in the picker and in the selection table
    pub label: String,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            label: label.into(),
        }
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load candidates from a CSV file with `id,label` headers
pub fn load_candidates_csv(csv_path: &Path) -> Result<Vec<Entity>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open candidates CSV: {:?}", csv_path))?;

    let mut candidates = Vec::new();
    for result in rdr.deserialize() {
        let entity: Entity = result.context("Failed to deserialize candidate")?;
        candidates.push(entity);
    }

    Ok(candidates)
}

/// Load candidates from a JSON array of `{id, label}` objects
pub fn load_candidates_json(json_path: &Path) -> Result<Vec<Entity>> {
    let content = fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read candidates file: {:?}", json_path))?;

    serde_json::from_str(&content).context("Failed to parse candidates JSON")
}

// ============================================================================
// TESTS
// ============================================================================
