//! Lazy scalar reference by integer key

use crate::model::{Shared, UNSET_NR};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Resolution state of a [`LazyRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefStatus {
    /// Key is the sentinel
    Unset,
    /// Key present, nothing bound yet
    Pending,
    /// Bound to a live target
    Resolved,
    /// Resolution was attempted and the target was missing
    Invalid,
}

impl RefStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefStatus::Unset => "unset",
            RefStatus::Pending => "pending",
            RefStatus::Resolved => "resolved",
            RefStatus::Invalid => "invalid",
        }
    }
}

impl fmt::Display for RefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
enum Binding<T> {
    None,
    Bound(Weak<RefCell<T>>),
    Invalid,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        match self {
            Binding::None => Binding::None,
            Binding::Bound(weak) => Binding::Bound(weak.clone()),
            Binding::Invalid => Binding::Invalid,
        }
    }
}

/// A non-owning reference to a root entity, stored as its `nr` and bound
/// to the live object once resolved.
#[derive(Debug)]
pub struct LazyRef<T> {
    key: i64,
    binding: Binding<T>,
}

impl<T> Clone for LazyRef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            binding: self.binding.clone(),
        }
    }
}

impl<T> Default for LazyRef<T> {
    fn default() -> Self {
        Self {
            key: UNSET_NR,
            binding: Binding::None,
        }
    }
}

impl<T> LazyRef<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: i64) -> Self {
        Self {
            key,
            binding: Binding::None,
        }
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    /// Replace the key. Any bound target and the invalid mark are dropped;
    /// setting the current key again changes nothing.
    pub fn set_key(&mut self, key: i64) {
        if key == self.key {
            return;
        }
        self.key = key;
        self.binding = Binding::None;
    }

    /// Reset to the unset sentinel
    pub fn clear(&mut self) {
        self.set_key(UNSET_NR);
    }

    pub fn has_reference(&self) -> bool {
        self.key != UNSET_NR && !self.is_invalid()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&self.binding, Binding::Bound(weak) if weak.strong_count() > 0)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.binding, Binding::Invalid)
    }

    pub fn status(&self) -> RefStatus {
        match &self.binding {
            _ if self.key == UNSET_NR => RefStatus::Unset,
            Binding::Invalid => RefStatus::Invalid,
            Binding::Bound(weak) if weak.strong_count() > 0 => RefStatus::Resolved,
            _ => RefStatus::Pending,
        }
    }

    /// The bound target, if it is still alive
    pub fn get(&self) -> Option<Shared<T>> {
        match &self.binding {
            Binding::Bound(weak) => weak.upgrade(),
            _ => None,
        }
    }

    /// Bind the outcome of a lookup. `Some` binds the target and `None`
    /// marks the reference invalid. Returns whether a target was bound.
    pub fn bind(&mut self, target: Option<&Shared<T>>) -> bool {
        match target {
            Some(target) => {
                self.binding = Binding::Bound(Rc::downgrade(target));
                true
            }
            None => {
                self.binding = Binding::Invalid;
                false
            }
        }
    }

    /// Bind a target directly, adopting its key.
    pub fn set_target(&mut self, key: i64, target: &Shared<T>) {
        self.key = key;
        self.binding = Binding::Bound(Rc::downgrade(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states() {
        let target: Shared<String> = Rc::new(RefCell::new("k".to_string()));

        let mut reference: LazyRef<String> = LazyRef::new();
        assert_eq!(reference.status(), RefStatus::Unset);
        assert!(!reference.has_reference());

        reference.set_key(5);
        assert_eq!(reference.status(), RefStatus::Pending);
        assert!(reference.has_reference());
        assert!(!reference.is_resolved());

        assert!(!reference.bind(None));
        assert_eq!(reference.status(), RefStatus::Invalid);
        assert!(!reference.has_reference());

        // same key keeps the invalid mark
        reference.set_key(5);
        assert!(reference.is_invalid());

        reference.set_key(6);
        assert_eq!(reference.status(), RefStatus::Pending);

        assert!(reference.bind(Some(&target)));
        assert_eq!(reference.status(), RefStatus::Resolved);
        assert!(Rc::ptr_eq(&reference.get().unwrap(), &target));
    }

    #[test]
    fn test_dead_target_is_not_resolved() {
        let mut reference: LazyRef<String> = LazyRef::with_key(1);
        {
            let target: Shared<String> = Rc::new(RefCell::new("gone".to_string()));
            reference.bind(Some(&target));
            assert!(reference.is_resolved());
        }
        assert!(!reference.is_resolved());
        assert!(reference.get().is_none());
        assert_eq!(reference.status(), RefStatus::Pending);
    }

    #[test]
    fn test_key_change_drops_binding() {
        let target: Shared<String> = Rc::new(RefCell::new("k".to_string()));
        let mut reference: LazyRef<String> = LazyRef::with_key(1);
        reference.bind(Some(&target));

        reference.clear();
        assert_eq!(reference.status(), RefStatus::Unset);
        assert!(reference.get().is_none());
    }
}
