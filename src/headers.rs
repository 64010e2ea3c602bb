// 🗂️ Header Store - persisted column headers per table
// `{"headers": [{"categorias": [...]}, {"gastos": [...]}, ...]}`
//
// Created once with the built-in defaults when absent; after that it is
// configuration and the pipeline only reads it.

use crate::schema::{builtin_schema, TABLE_NAMES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of the header file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderDocument {
    #[serde(default)]
    pub headers: Vec<BTreeMap<String, Vec<String>>>,
}

impl HeaderDocument {
    /// Default document: one entry per built-in table, timestamp column included
    pub fn builtin() -> Self {
        let headers = TABLE_NAMES
            .iter()
            .filter_map(|name| {
                builtin_schema(name).map(|schema| {
                    let mut entry = BTreeMap::new();
                    entry.insert(name.to_string(), schema.header_row());
                    entry
                })
            })
            .collect();

        HeaderDocument { headers }
    }

    /// Headers of the first entry naming `table_name`, empty when none does
    pub fn headers_for(&self, table_name: &str) -> Vec<String> {
        self.headers
            .iter()
            .find_map(|entry| entry.get(table_name))
            .cloned()
            .unwrap_or_default()
    }

    /// Table names in file order
    pub fn table_names(&self) -> Vec<&str> {
        self.headers
            .iter()
            .flat_map(|entry| entry.keys().map(String::as_str))
            .collect()
    }
}

pub struct HeaderStore {
    path: PathBuf,
}

impl HeaderStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        HeaderStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header row for `table_name`; unknown tables yield an empty row
    pub fn headers_for(&self, table_name: &str) -> Result<Vec<String>> {
        Ok(self.load()?.headers_for(table_name))
    }

    /// Load the document, writing the built-in default first if the file is absent
    pub fn load(&self) -> Result<HeaderDocument> {
        if !self.path.exists() {
            return self.initialize();
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read header file: {:?}", self.path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse header file: {:?}", self.path))
    }

    fn initialize(&self) -> Result<HeaderDocument> {
        let document = HeaderDocument::builtin();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write header file: {:?}", self.path))?;

        log::info!("[Headers] Created default header file at {:?}", self.path);
        Ok(document)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_access_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        let store = HeaderStore::new(&path);

        let headers = store.headers_for("categorias").unwrap();

        assert!(path.exists());
        assert_eq!(
            headers,
            vec!["ID", "NAME", "MES ACTUAL", "MES ANTERIOR", "PRESUPUESTO", "LAST_UPDATED_TIME"]
        );
    }

    #[test]
    fn test_second_access_reads_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        let store = HeaderStore::new(&path);

        let first = store.headers_for("gastos").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        let second = store.headers_for("gastos").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_existing_file_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        fs::write(&path, r#"{"headers": [{"gastos": ["A", "B"]}, {"ingresos": []}]}"#).unwrap();
        let store = HeaderStore::new(&path);

        assert_eq!(store.headers_for("gastos").unwrap(), vec!["A", "B"]);
        assert!(store.headers_for("ingresos").unwrap().is_empty());
        // Not in the file, even though it is a built-in table
        assert!(store.headers_for("categorias").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HeaderStore::new(dir.path().join("headers.json"));
        assert!(store.headers_for("presupuestos").unwrap().is_empty());
    }

    #[test]
    fn test_nested_path_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("headers.json");
        HeaderStore::new(&path).load().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        fs::write(&path, "not json").unwrap();

        assert!(HeaderStore::new(&path).headers_for("gastos").is_err());
    }

    #[test]
    fn test_builtin_document_lists_all_tables() {
        let document = HeaderDocument::builtin();
        assert_eq!(document.table_names(), vec!["categorias", "gastos", "ingresos"]);
        assert_eq!(document.headers_for("ingresos").last().unwrap(), "LAST_UPDATED_TIME");
    }
}
