//! Lazy key-array reference

use crate::model::{Entity, Shared};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One tag slot: the key as loaded or last bound, plus the target once bound
#[derive(Debug)]
struct Slot<T: Entity> {
    key: T::Key,
    target: Option<Weak<RefCell<T>>>,
}

impl<T: Entity> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T: Entity> Slot<T> {
    fn live(&self) -> Option<Shared<T>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// The live target's key, or the stored key when unbound or dead
    fn current_key(&self) -> T::Key {
        match self.live() {
            Some(target) => target.borrow().key(),
            None => self.key.clone(),
        }
    }
}

/// A non-owning list of references stored as keys until resolved in one
/// pass against the candidate collection.
///
/// Every slot keeps its key next to the handle, so a target that was dropped
/// (e.g. the keyword collection was reloaded) still exports its key and puts
/// the list back into the unresolved state.
#[derive(Debug)]
pub struct LazyKeys<T: Entity> {
    slots: Vec<Slot<T>>,
}

impl<T: Entity> Clone for LazyKeys<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T: Entity> Default for LazyKeys<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Entity> LazyKeys<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys loaded from a record. An empty list counts as resolved.
    pub fn from_keys(keys: Vec<T::Key>) -> Self {
        Self {
            slots: keys.into_iter().map(|key| Slot { key, target: None }).collect(),
        }
    }

    /// True when every slot points at a live target
    pub fn is_resolved(&self) -> bool {
        self.slots.iter().all(|slot| slot.live().is_some())
    }

    /// Keys of the slots that still need binding
    pub fn pending_keys(&self) -> Vec<T::Key> {
        self.slots
            .iter()
            .filter(|slot| slot.live().is_none())
            .map(|slot| slot.key.clone())
            .collect()
    }

    /// Rebind the unbound slots to the objects found for them. Live slots
    /// stay in place; the found objects follow in candidate order and keys
    /// without a match are dropped. A no-op once resolved.
    /// Returns whether anything changed.
    pub fn resolve(&mut self, found: &[Shared<T>]) -> bool {
        if self.is_resolved() {
            return false;
        }
        let pending = self.pending_keys();
        self.slots.retain(|slot| slot.live().is_some());
        for target in found {
            let key = target.borrow().key();
            if pending.contains(&key) {
                self.slots.push(Slot {
                    key,
                    target: Some(Rc::downgrade(target)),
                });
            }
        }
        true
    }

    /// Live targets, in slot order
    pub fn objects(&self) -> Vec<Shared<T>> {
        self.slots.iter().filter_map(Slot::live).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a live target
    pub fn push(&mut self, target: &Shared<T>) {
        let key = target.borrow().key();
        self.slots.push(Slot {
            key,
            target: Some(Rc::downgrade(target)),
        });
    }

    /// Drop every reference with this key. The targets are not touched.
    pub fn remove(&mut self, key: &T::Key) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.current_key() != *key);
        before != self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Keys to write out, taken from the live targets where bound
    pub fn export_keys(&self) -> Vec<T::Key> {
        self.slots.iter().map(Slot::current_key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Keyword;

    fn shared(uuid: &str) -> Shared<Keyword> {
        Rc::new(RefCell::new(Keyword::with_uuid(uuid, uuid.to_uppercase())))
    }

    #[test]
    fn test_empty_is_resolved() {
        let keys: LazyKeys<Keyword> = LazyKeys::from_keys(Vec::new());
        assert!(keys.is_resolved());
        assert!(keys.is_empty());
    }

    #[test]
    fn test_resolve_once() {
        let a = shared("a");
        let c = shared("c");
        let mut keys: LazyKeys<Keyword> =
            LazyKeys::from_keys(vec!["a".into(), "b".into(), "c".into()]);
        assert!(!keys.is_resolved());
        assert_eq!(keys.export_keys(), vec!["a", "b", "c"]);

        // candidate order wins over key order
        assert!(keys.resolve(&[c.clone(), a.clone()]));
        assert_eq!(keys.objects().len(), 2);
        assert_eq!(keys.export_keys(), vec!["c", "a"]);

        // further calls change nothing
        assert!(!keys.resolve(&[a.clone()]));
        assert_eq!(keys.objects().len(), 2);
    }

    #[test]
    fn test_push_and_remove() {
        let a = shared("a");
        let b = shared("b");
        let mut keys: LazyKeys<Keyword> = LazyKeys::new();
        keys.push(&a);
        keys.push(&b);
        assert_eq!(keys.export_keys(), vec!["a", "b"]);

        assert!(keys.remove(&"a".to_string()));
        assert!(!keys.remove(&"x".to_string()));
        assert_eq!(keys.export_keys(), vec!["b"]);
        // the keyword itself survives
        assert_eq!(a.borrow().text, "A");
    }

    #[test]
    fn test_push_before_resolution_keeps_keys() {
        let d = shared("d");
        let mut keys: LazyKeys<Keyword> = LazyKeys::from_keys(vec!["a".into()]);
        keys.push(&d);
        assert_eq!(keys.export_keys(), vec!["a", "d"]);
        assert_eq!(keys.pending_keys(), vec!["a"]);
    }

    #[test]
    fn test_dropped_targets_keep_keys_and_rebind() {
        let mut keys: LazyKeys<Keyword> = LazyKeys::from_keys(vec!["a".into(), "c".into()]);
        {
            let a = shared("a");
            let c = shared("c");
            assert!(keys.resolve(&[a, c]));
            // the handles die with this scope
        }
        assert!(!keys.is_resolved());
        assert!(keys.objects().is_empty());
        assert_eq!(keys.export_keys(), vec!["a", "c"]);
        assert_eq!(keys.pending_keys(), vec!["a", "c"]);

        let a = shared("a");
        let c = shared("c");
        assert!(keys.resolve(&[a.clone(), c.clone()]));
        assert!(keys.is_resolved());
        assert!(Rc::ptr_eq(&keys.objects()[0], &a));
        assert_eq!(keys.export_keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_exported_key_follows_live_target() {
        let a = shared("a");
        let mut keys: LazyKeys<Keyword> = LazyKeys::from_keys(vec!["a".into()]);
        keys.resolve(&[a.clone()]);
        a.borrow_mut().uuid = "z".into();
        assert_eq!(keys.export_keys(), vec!["z"]);
        assert!(keys.remove(&"z".to_string()));
        assert!(keys.is_empty());
    }
}
