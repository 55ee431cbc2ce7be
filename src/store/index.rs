//! Non-unique secondary index

use std::collections::HashMap;

use super::{IndexField, RecordId};

/// Maps an index key to the ids carrying it, in insertion order
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    field: IndexField,
    entries: HashMap<String, Vec<RecordId>>,
}

impl SecondaryIndex {
    pub fn new(field: IndexField) -> Self {
        Self {
            field,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: RecordId, display_name: &str, source: &str) {
        let key = self.field.key_of(display_name, source).to_string();
        self.entries.entry(key).or_default().push(id);
    }

    pub fn remove(&mut self, id: RecordId, display_name: &str, source: &str) {
        let key = self.field.key_of(display_name, source);
        if let Some(ids) = self.entries.get_mut(key) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    pub fn lookup(&self, key: &str) -> &[RecordId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
