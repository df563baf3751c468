// 🔎 Picker capability - searchable, single-select candidate widget
// The synchronizer only talks to this trait, never to a concrete widget.

use crate::collation::folded_contains;
use crate::entity::{Entity, EntityId};

// ============================================================================
// PICKER EVENTS
// ============================================================================

/// Events emitted by a picker widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// The user picked a candidate
    Selected { id: EntityId, display_text: String },
}

// ============================================================================
// PICKER CAPABILITY
// ============================================================================

/// What a picker widget must offer to the selection synchronizer
pub trait Picker {
    /// Rebuild the internal search index from the new, already sorted options
    fn rebuild_index(&mut self, options: &[Entity]);

    /// Drop any transient search text the user typed
    fn clear_search(&mut self);
}

// ============================================================================
// HEADLESS PICKER
// ============================================================================

/// In-memory picker: keeps a search query and an index of the options
///
/// Used by the CLI, the TUI and tests. Matching is a case- and
/// accent-insensitive substring test on the label.
#[derive(Debug, Default, Clone)]
pub struct HeadlessPicker {
    index: Vec<Entity>,
    query: String,
    rebuilds: usize,
}

impl HeadlessPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search text
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Options matching the current query, in index order
    pub fn matches(&self) -> Vec<&Entity> {
        self.index
            .iter()
            .filter(|e| folded_contains(&e.label, &self.query))
            .collect()
    }

    /// Emit a selection event for the n-th visible match
    pub fn pick(&self, visible_position: usize) -> Option<PickerEvent> {
        self.matches()
            .get(visible_position)
            .map(|e| PickerEvent::Selected {
                id: e.id.clone(),
                display_text: e.label.clone(),
            })
    }

    /// Emit a selection event for an id currently listed in the index
    pub fn pick_id(&self, id: &EntityId) -> Option<PickerEvent> {
        self.index
            .iter()
            .find(|e| &e.id == id)
            .map(|e| PickerEvent::Selected {
                id: e.id.clone(),
                display_text: e.label.clone(),
            })
    }

    /// Options as last indexed
    pub fn indexed(&self) -> &[Entity] {
        &self.index
    }

    /// How many times the index has been rebuilt
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }
}

impl Picker for HeadlessPicker {
    fn rebuild_index(&mut self, options: &[Entity]) {
        self.index = options.to_vec();
        self.rebuilds += 1;
    }

    fn clear_search(&mut self) {
        self.query.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed_picker() -> HeadlessPicker {
        let mut picker = HeadlessPicker::new();
        picker.rebuild_index(&[
            Entity::new("1", "Alvarez, Ben"),
            Entity::new("2", "Pérez, José"),
            Entity::new("3", "Zapata, Ana"),
        ]);
        picker
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let picker = indexed_picker();
        assert_eq!(picker.matches().len(), 3);
    }

    #[test]
    fn test_query_filters_matches() {
        let mut picker = indexed_picker();
        picker.set_query("jose");

        let matches = picker.matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, EntityId::from("2"));
    }

    #[test]
    fn test_pick_uses_visible_position() {
        let mut picker = indexed_picker();
        picker.set_query("a");

        let event = picker.pick(1).unwrap();
        assert_eq!(
            event,
            PickerEvent::Selected {
                id: EntityId::from("3"),
                display_text: "Zapata, Ana".to_string(),
            }
        );
        assert!(picker.pick(5).is_none());
    }

    #[test]
    fn test_pick_id_only_for_listed_options() {
        let picker = indexed_picker();

        assert!(picker.pick_id(&EntityId::from("1")).is_some());
        assert!(picker.pick_id(&EntityId::from("99")).is_none());
    }

    #[test]
    fn test_clear_search() {
        let mut picker = indexed_picker();
        picker.set_query("zap");
        picker.clear_search();

        assert_eq!(picker.query(), "");
        assert_eq!(picker.rebuild_count(), 1);
    }
}
