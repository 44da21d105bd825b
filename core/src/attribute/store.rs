//! Insert-once attribute store with a sentinel lookup.

use std::collections::HashMap;

use super::record::AttributeRecord;

/// Name-keyed cache of fetched attributes for one extraction run.
///
/// Names are inserted at most once. A second insertion under the same name
/// is rejected and leaves the first record in place.
#[derive(Debug, Default)]
pub struct AttributeStore {
    records: HashMap<String, AttributeRecord>,
    undefined: AttributeRecord,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored record for `name`, or an undefined record with no values.
    ///
    /// Never fails. Callers check value presence (e.g.
    /// [`AttributeRecord::vector3_values`]) rather than the return itself.
    pub fn get(&self, name: &str) -> &AttributeRecord {
        self.records.get(name).unwrap_or(&self.undefined)
    }

    /// Stored record for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&AttributeRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Insert `record` under `name` unless the name is already taken.
    ///
    /// Returns `false` without touching the store on a duplicate.
    pub fn try_insert(&mut self, name: impl Into<String>, record: AttributeRecord) -> bool {
        match self.records.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of all stored records, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeState, AttributeType, AttributeValues};
    use crate::session::AttributeInfo;

    fn record(name: &str, values: Vec<f32>) -> AttributeRecord {
        let info = AttributeInfo {
            count: values.len(),
            tuple_size: 1,
            ..Default::default()
        };
        AttributeRecord::synced(name, info, AttributeValues::Float(values))
    }

    #[test]
    fn get_missing_returns_undefined() {
        let store = AttributeStore::new();
        let r = store.get("never_registered");
        assert_eq!(r.state(), AttributeState::Unsynced);
        assert_eq!(r.attribute_type(), AttributeType::Undefined);
        assert!(r.values().is_none());
        assert!(store.lookup("never_registered").is_none());
    }

    #[test]
    fn try_insert_rejects_duplicates() {
        let mut store = AttributeStore::new();
        assert!(store.try_insert("pscale", record("pscale", vec![1.0])));
        assert!(!store.try_insert("pscale", record("pscale", vec![2.0, 3.0])));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("pscale").float_values(), Some(&[1.0][..]));
    }

    #[test]
    fn names_lists_inserted() {
        let mut store = AttributeStore::new();
        store.try_insert("a", record("a", vec![1.0]));
        store.try_insert("b", record("b", vec![2.0]));
        let mut names: Vec<_> = store.names().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert!(store.contains("a"));
        assert!(!store.is_empty());
    }
}
