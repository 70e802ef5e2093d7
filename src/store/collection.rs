//! Ordered root collection of shared entity handles

use crate::model::{Entity, Shared, View};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Insertion-ordered collection of one root entity kind.
/// Keys are assumed unique; duplicates are not detected.
#[derive(Debug)]
pub struct Collection<T: Entity> {
    items: Vec<Shared<T>>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Shared<T>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shared<T>> {
        self.items.iter()
    }

    /// Wrap and append an entity, returning the owning handle
    pub fn push(&mut self, entity: T) -> Shared<T> {
        let handle = Rc::new(RefCell::new(entity));
        self.items.push(handle.clone());
        handle
    }

    /// First entity with this key
    pub fn find(&self, key: &T::Key) -> Option<Shared<T>> {
        self.items
            .iter()
            .find(|item| item.borrow().key() == *key)
            .cloned()
    }

    /// Remove this exact handle
    pub fn remove(&mut self, handle: &Shared<T>) -> Option<Shared<T>> {
        let index = self.items.iter().position(|item| Rc::ptr_eq(item, handle))?;
        Some(self.items.remove(index))
    }

    pub fn remove_by_key(&mut self, key: &T::Key) -> Option<Shared<T>> {
        let index = self
            .items
            .iter()
            .position(|item| item.borrow().key() == *key)?;
        Some(self.items.remove(index))
    }

    pub fn take_all(&mut self) -> Vec<Shared<T>> {
        std::mem::take(&mut self.items)
    }

    pub fn replace_all(&mut self, entities: Vec<T>) {
        self.items = entities
            .into_iter()
            .map(|entity| Rc::new(RefCell::new(entity)))
            .collect();
    }

    /// Entities whose key is in `keys`, in collection order.
    ///
    /// Duplicate keys collapse to one match. The scan stops once every
    /// key is found; keys with no match are logged and returned.
    pub fn list_for_keys(&self, keys: &[T::Key]) -> (Vec<Shared<T>>, Vec<T::Key>) {
        let mut wanted: Vec<T::Key> = Vec::with_capacity(keys.len());
        for key in keys {
            if !wanted.contains(key) {
                wanted.push(key.clone());
            }
        }

        let mut found = Vec::with_capacity(wanted.len());
        for item in &self.items {
            if wanted.is_empty() {
                break;
            }
            let key = item.borrow().key();
            if let Some(index) = wanted.iter().position(|k| *k == key) {
                wanted.swap_remove(index);
                found.push(item.clone());
            }
        }

        for missing in &wanted {
            warn!("{} {} not found", T::KIND, missing);
        }
        (found, wanted)
    }

    pub fn to_records(&self, view: View) -> Result<Vec<serde_json::Value>> {
        self.items
            .iter()
            .map(|item| item.borrow().to_record(view))
            .collect()
    }

    /// Decode every record, then replace the contents. A bad record
    /// leaves the collection unchanged.
    pub fn load_records(&mut self, view: View, records: Vec<serde_json::Value>) -> Result<usize> {
        let entities = records
            .into_iter()
            .map(|record| T::from_record(view, record))
            .collect::<Result<Vec<_>>>()?;
        let count = entities.len();
        self.replace_all(entities);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, Keyword};
    use serde_json::json;

    fn customers() -> Collection<Customer> {
        let mut collection = Collection::new();
        collection.push(Customer::new(1, "A", "X"));
        collection.push(Customer::new(2, "B", "Y"));
        collection.push(Customer::new(3, "C", "Z"));
        collection
    }

    #[test]
    fn test_find_and_remove() {
        let mut collection = customers();
        let two = collection.find(&2).unwrap();
        assert_eq!(two.borrow().name, "B");
        assert!(collection.find(&9).is_none());

        assert!(collection.remove(&two).is_some());
        assert!(collection.remove(&two).is_none());
        assert!(collection.remove_by_key(&3).is_some());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_list_for_keys() {
        let collection = customers();
        let (found, missing) = collection.list_for_keys(&[3, 1, 3, 7]);
        let nrs: Vec<i64> = found.iter().map(|c| c.borrow().nr).collect();
        // collection order, duplicates collapsed
        assert_eq!(nrs, vec![1, 3]);
        assert_eq!(missing, vec![7]);
    }

    #[test]
    fn test_bad_record_leaves_collection() {
        let mut collection: Collection<Keyword> = Collection::new();
        collection.push(Keyword::with_uuid("k", "alt"));

        let result = collection.load_records(
            View::Cache,
            vec![json!({"uuid": "a", "text": "x"}), json!("not an object")],
        );
        assert!(result.is_err());
        assert_eq!(collection.len(), 1);

        let count = collection
            .load_records(View::Cache, vec![json!({"uuid": "a", "text": "x"})])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(collection.items()[0].borrow().uuid, "a");
    }
}
