// 🗂️ Option Pool - Candidates not yet selected, always sorted
//
// The pool owns its picker. Every mutation ends in `refresh()`, which
// re-sorts, clears the search text and rebuilds the picker index in one step,
// so the picker can never show a stale order or search a stale index.

use crate::collation::compare_labels;
use crate::entity::{Entity, EntityId};
use crate::picker::Picker;
use tracing::debug;

pub struct OptionPool<P: Picker> {
    /// Unselected entities, ordered by label collation
    options: Vec<Entity>,

    /// Widget rendering the options
    picker: P,
}

impl<P: Picker> OptionPool<P> {
    /// Build a pool from candidates in any order
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn new(candidates: Vec<Entity>, picker: P) -> Self {
        let mut options: Vec<Entity> = Vec::with_capacity(candidates.len());
        for entity in candidates {
            if options.iter().any(|e| e.id == entity.id) {
                debug!(id = %entity.id, "dropping duplicate candidate");
                continue;
            }
            options.push(entity);
        }

        let mut pool = OptionPool { options, picker };
        pool.refresh();
        pool
    }

    /// Take an entity out of the pool
    ///
    /// Returns `None` (and changes nothing) if the id is not listed.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let position = self.options.iter().position(|e| &e.id == id)?;
        let entity = self.options.remove(position);
        self.refresh();
        Some(entity)
    }

    /// Put an entity (back) into the pool at its sorted position
    ///
    /// Returns `false` if an entity with the same id is already listed.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(&entity.id) {
            debug!(id = %entity.id, "entity already in pool");
            return false;
        }
        self.options.push(entity);
        self.refresh();
        true
    }

    /// Re-sort, clear search text and rebuild the picker index
    pub fn refresh(&mut self) {
        self.options
            .sort_by(|a, b| compare_labels(&a.label, &b.label).then_with(|| a.id.cmp(&b.id)));
        self.picker.clear_search();
        self.picker.rebuild_index(&self.options);
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.options.iter().any(|e| &e.id == id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.options.iter().find(|e| &e.id == id)
    }

    /// Entities in display order
    pub fn options(&self) -> &[Entity] {
        &self.options
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.options.iter().map(|e| &e.id)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    /// Mutable access for typing search text; options stay untouched
    pub fn picker_mut(&mut self) -> &mut P {
        &mut self.picker
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::HeadlessPicker;

    #[test]
    fn test_insert_keeps_sorted_order() {
        let mut pool = OptionPool::new(Vec::new(), HeadlessPicker::new());

        pool.insert(Entity::new("1", "Zapata, Ana"));
        pool.insert(Entity::new("2", "Alvarez, Ben"));

        assert_eq!(pool.labels(), vec!["Alvarez, Ben", "Zapata, Ana"]);
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let pool = OptionPool::new(
            vec![
                Entity::new("1", "Zapata, Ana"),
                Entity::new("2", "Alvarez, Ben"),
                Entity::new("1", "Zapata, Ana (copy)"),
            ],
            HeadlessPicker::new(),
        );

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.labels(), vec!["Alvarez, Ben", "Zapata, Ana"]);
    }

    #[test]
    fn test_every_mutation_refreshes_picker() {
        let mut pool = OptionPool::new(vec![Entity::new("1", "Ana")], HeadlessPicker::new());
        assert_eq!(pool.picker().rebuild_count(), 1);

        pool.picker_mut().set_query("an");
        let removed = pool.remove(&EntityId::from("1"));

        assert!(removed.is_some());
        assert_eq!(pool.picker().rebuild_count(), 2);
        assert_eq!(pool.picker().query(), "");
        assert!(pool.picker().indexed().is_empty());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut pool = OptionPool::new(vec![Entity::new("1", "Ana")], HeadlessPicker::new());

        assert!(pool.remove(&EntityId::from("9")).is_none());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.picker().rebuild_count(), 1);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let mut pool = OptionPool::new(vec![Entity::new("1", "Ana")], HeadlessPicker::new());

        assert!(!pool.insert(Entity::new("1", "Ana")));
        assert_eq!(pool.len(), 1);
    }
}
