// ── Generic reactive entity collection ──
//
// Insertion-ordered storage with O(1) lookups and push-based change
// notification via `watch` channels. Mutations mark the collection dirty;
// the owning store publishes once per logical operation, so a batch is
// never observed half-applied.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::EntityId;

/// An ordered, reactive collection for a single entity type.
///
/// Iteration order is insertion order, which is the stable tie-break the
/// layout engine relies on. Every published mutation bumps a version
/// counter and rebuilds the snapshot subscribers receive.
pub(crate) struct EntityCollection<T: Clone + PartialEq + Send + Sync + 'static> {
    by_id: IndexMap<EntityId, Arc<T>>,

    /// Set by every mutation, cleared by `publish`.
    dirty: bool,

    /// Version counter, bumped on every publication.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on publication for cheap subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: IndexMap::new(),
            dirty: false,
            version,
            snapshot,
        }
    }

    /// Insert only if the id is unknown. Returns `true` if inserted.
    pub(crate) fn insert_new(&mut self, id: EntityId, entity: T) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }
        self.by_id.insert(id, Arc::new(entity));
        self.dirty = true;
        true
    }

    /// Insert or replace. Returns `true` if the stored value changed.
    pub(crate) fn upsert(&mut self, id: EntityId, entity: T) -> bool {
        if let Some(existing) = self.by_id.get(&id) {
            if **existing == entity {
                return false;
            }
        }
        self.by_id.insert(id, Arc::new(entity));
        self.dirty = true;
        true
    }

    /// Apply `f` to a copy of the entity and store it if anything changed.
    /// Returns `false` when the id is absent or `f` was a no-op.
    pub(crate) fn modify(&mut self, id: &EntityId, f: impl FnOnce(&mut T)) -> bool {
        let Some(slot) = self.by_id.get_mut(id) else {
            return false;
        };
        let mut updated = (**slot).clone();
        f(&mut updated);
        if updated == **slot {
            return false;
        }
        *slot = Arc::new(updated);
        self.dirty = true;
        true
    }

    /// Apply `f` to every entity, storing only the ones that changed.
    /// Returns the number of entities changed.
    pub(crate) fn modify_each(&mut self, mut f: impl FnMut(&mut T)) -> usize {
        let mut changed = 0;
        for slot in self.by_id.values_mut() {
            let mut updated = (**slot).clone();
            f(&mut updated);
            if updated != **slot {
                *slot = Arc::new(updated);
                changed += 1;
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    /// Remove an entity, preserving the order of the rest.
    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.shift_remove(id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Remove every entity matching `pred`, returning the removed ones.
    pub(crate) fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<Arc<T>> {
        let mut removed = Vec::new();
        self.by_id.retain(|_, entity| {
            if pred(entity) {
                removed.push(Arc::clone(entity));
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.dirty = true;
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(Arc::clone)
    }

    pub(crate) fn get_ref(&self, id: &EntityId) -> Option<&T> {
        self.by_id.get(id).map(|e| &**e)
    }

    pub(crate) fn contains(&self, id: &EntityId) -> bool {
        self.by_id.contains_key(id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.by_id.values().map(|e| &**e)
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.by_id.keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Get the last published snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Broadcast pending changes to subscribers. Returns `true` if there
    /// was anything to publish.
    pub(crate) fn publish(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        let values: Vec<Arc<T>> = self.by_id.values().map(Arc::clone).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    #[test]
    fn insert_new_is_idempotent() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        assert!(col.insert_new(id("a"), "first".into()));
        assert!(!col.insert_new(id("a"), "second".into()));
        assert_eq!(*col.get(&id("a")).unwrap(), "first");
    }

    #[test]
    fn upsert_reports_change_only_when_value_differs() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert(id("a"), "x".into()));
        assert!(!col.upsert(id("a"), "x".into()));
        assert!(col.upsert(id("a"), "y".into()));
    }

    #[test]
    fn modify_absent_is_noop() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        assert!(!col.modify(&id("missing"), |s| s.push('!')));
        assert!(!col.publish());
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        for key in ["a", "b", "c"] {
            col.insert_new(id(key), key.into());
        }
        col.remove(&id("b"));
        assert_eq!(col.ids(), vec![id("a"), id("c")]);
    }

    #[test]
    fn snapshot_only_changes_on_publish() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(id("a"), "x".into());
        col.insert_new(id("b"), "y".into());
        assert!(col.snapshot().is_empty());
        assert_eq!(col.version(), 0);

        assert!(col.publish());
        assert_eq!(col.snapshot().len(), 2);
        assert_eq!(col.version(), 1);

        assert!(!col.publish());
        assert_eq!(col.version(), 1);
    }

    #[test]
    fn remove_where_returns_removed() {
        let mut col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(id("a"), "keep".into());
        col.insert_new(id("b"), "drop".into());
        col.insert_new(id("c"), "drop".into());

        let removed = col.remove_where(|s| s == "drop");
        assert_eq!(removed.len(), 2);
        assert_eq!(col.len(), 1);
        assert!(!col.is_empty());
    }
}
