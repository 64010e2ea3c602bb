// 🏷️ Category Index - relation id → display name
// Built once per run from the persisted `categorias` snapshot, read-only afterwards.

use crate::path::resolve;
use crate::schema::CATEGORY_NAME_PATH;
use crate::snapshot::read_json_snapshot;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    names: HashMap<String, String>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        CategoryIndex::default()
    }

    /// Index category pages by page `id`.
    /// Pages without an id or a title are skipped.
    pub fn from_records(records: &[Value]) -> Self {
        let mut index = CategoryIndex::new();

        for record in records {
            let id = resolve(record, "id").and_then(Value::as_str);
            let name = resolve(record, CATEGORY_NAME_PATH).and_then(Value::as_str);

            if let (Some(id), Some(name)) = (id, name) {
                index.insert(id, name);
            }
        }

        index
    }

    /// Load from a query snapshot (`{"results": [...]}`) written by a previous sync.
    pub fn from_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let document = read_json_snapshot(path)?;
        Ok(CategoryIndex::from_document(&document))
    }

    /// Index the `results` array of a query document; no `results` means an empty index
    pub fn from_document(document: &Value) -> Self {
        match resolve(document, "results").and_then(Value::as_array) {
            Some(records) => CategoryIndex::from_records(records),
            None => CategoryIndex::new(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CategoryIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = CategoryIndex::new();
        for (id, name) in iter {
            index.insert(id, name);
        }
        index
    }
}

// ============================================================================
// TESTS
// ============================================================================
