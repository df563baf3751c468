// 🔁 Selection Synchronizer - Picker ⇄ table, with inverse removal
//
// An entity lives in exactly one place: the option pool (not chosen yet) or
// the selection table (chosen). Moving it is all-or-nothing.

use crate::entity::{Entity, EntityId};
use crate::option_pool::OptionPool;
use crate::picker::{Picker, PickerEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

// ============================================================================
// ASSOCIATION
// ============================================================================

/// Which side of the enrollment association the form edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    /// Course form: pick the students enrolled in it
    StudentsOfCourse,

    /// User form: pick the courses the student is enrolled in
    CoursesOfStudent,
}

impl Association {
    /// Name of the hidden field carrying each selected id
    pub fn hidden_field_name(&self) -> &'static str {
        match self {
            Association::StudentsOfCourse => "alumnos-ids[]",
            Association::CoursesOfStudent => "asignaturas-ids[]",
        }
    }

    /// Name of the read-only field showing each selected label
    pub fn label_field_name(&self) -> &'static str {
        "matricula_nombre[]"
    }
}

// ============================================================================
// SELECTION TABLE
// ============================================================================

/// A chosen entity, rendered as one table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRow {
    /// Bound entity; also the row's `data-id`
    pub entity_id: EntityId,

    /// Label copied from the entity when it was selected
    pub display_label: String,
}

impl SelectionRow {
    pub fn data_id(&self) -> &str {
        self.entity_id.as_str()
    }
}

/// Events delegated from the table container, keyed by `data-id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// The row's remove button was clicked
    Remove { data_id: String },
}

/// Chosen entities in selection order
#[derive(Debug, Default, Clone)]
pub struct SelectionTable {
    rows: Vec<SelectionRow>,
}

impl SelectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, row: SelectionRow) {
        self.rows.push(row);
    }

    fn take(&mut self, id: &EntityId) -> Option<SelectionRow> {
        let position = self.rows.iter().position(|r| &r.entity_id == id)?;
        Some(self.rows.remove(position))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.rows.iter().any(|r| &r.entity_id == id)
    }

    pub fn rows(&self) -> &[SelectionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// SYNCHRONIZER
// ============================================================================

pub struct SelectionSynchronizer<P: Picker> {
    association: Association,
    pool: OptionPool<P>,
    table: SelectionTable,

    /// Every candidate id the form was opened with
    candidates: BTreeSet<EntityId>,
}

impl<P: Picker> SelectionSynchronizer<P> {
    /// Open the synchronizer over the full candidate set
    ///
    /// `preselected` are ids already associated on the server; their rows are
    /// rendered up front and behave exactly like rows selected later.
    pub fn new(
        association: Association,
        candidates: Vec<Entity>,
        preselected: &[EntityId],
        picker: P,
    ) -> Self {
        let candidate_ids = candidates.iter().map(|e| e.id.clone()).collect();
        let mut sync = SelectionSynchronizer {
            association,
            pool: OptionPool::new(candidates, picker),
            table: SelectionTable::new(),
            candidates: candidate_ids,
        };

        for id in preselected {
            if sync.select(id).is_none() {
                debug!(id = %id, "preselected id is not a candidate");
            }
        }

        sync
    }

    /// Move an entity from the pool to the end of the table
    ///
    /// Ids not currently in the pool leave everything unchanged.
    pub fn select(&mut self, id: &EntityId) -> Option<&SelectionRow> {
        let Some(entity) = self.pool.remove(id) else {
            debug!(id = %id, "select ignored: id not in pool");
            return None;
        };

        self.table.append(SelectionRow {
            entity_id: entity.id,
            display_label: entity.label,
        });
        self.table.rows.last()
    }

    /// Move an entity from the table back into the pool
    ///
    /// The label comes from the row, since that is all the table keeps.
    /// Ids without a row leave everything unchanged.
    pub fn deselect(&mut self, id: &EntityId) -> Option<&Entity> {
        let Some(row) = self.table.take(id) else {
            debug!(id = %id, "deselect ignored: no row for id");
            return None;
        };

        let entity = Entity {
            id: row.entity_id,
            label: row.display_label,
        };
        let id = entity.id.clone();
        self.pool.insert(entity);
        self.pool.get(&id)
    }

    /// Dispatch a picker event
    pub fn handle_picker_event(&mut self, event: PickerEvent) -> bool {
        match event {
            PickerEvent::Selected { id, .. } => self.select(&id).is_some(),
        }
    }

    /// Dispatch an event delegated from the table container
    pub fn handle_table_event(&mut self, event: TableEvent) -> bool {
        match event {
            TableEvent::Remove { data_id } => self.deselect(&EntityId::new(data_id)).is_some(),
        }
    }

    /// Pool and table are disjoint and together cover every candidate
    pub fn partition_holds(&self) -> bool {
        let pool: BTreeSet<&EntityId> = self.pool.ids().collect();
        let table: BTreeSet<&EntityId> = self.table.rows().iter().map(|r| &r.entity_id).collect();

        pool.len() == self.pool.len()
            && table.len() == self.table.len()
            && pool.is_disjoint(&table)
            && pool.len() + table.len() == self.candidates.len()
            && pool.iter().chain(table.iter()).all(|id| self.candidates.contains(*id))
    }

    /// Ids in selection order
    pub fn selected_ids(&self) -> Vec<&EntityId> {
        self.table.rows().iter().map(|r| &r.entity_id).collect()
    }

    /// Hidden-field pairs submitted with the form
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let name = self.association.hidden_field_name();
        self.table
            .rows()
            .iter()
            .map(|r| (name.to_string(), r.entity_id.to_string()))
            .collect()
    }

    pub fn association(&self) -> Association {
        self.association
    }

    pub fn pool(&self) -> &OptionPool<P> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut OptionPool<P> {
        &mut self.pool
    }

    pub fn table(&self) -> &SelectionTable {
        &self.table
    }
}

// ============================================================================
// TESTS
// ============================================================================
