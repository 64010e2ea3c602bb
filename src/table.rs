// 📊 Table Assembler - extracted rows, sorted by ID, headers on top
// The finished Table is what gets handed to the spreadsheet.

use crate::category::CategoryIndex;
use crate::extract::{Row, RowExtractor};
use crate::headers::HeaderStore;
use crate::path::resolve;
use crate::schema::ColumnSchema;
use anyhow::Result;
use chrono::{DateTime, Local};
use serde_json::Value;

// ============================================================================
// SORT KEY ERROR
// ============================================================================

/// A row whose leading ID cell is not an integer. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyError {
    /// Position of the record in the query results
    pub row_index: usize,
    /// Notion page id of the record, when it has one
    pub record_id: Option<String>,
    /// Offending cell text
    pub value: String,
}

impl std::fmt::Display for SortKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "record #{} (page {}) has a non-numeric ID cell: {:?}",
            self.row_index,
            self.record_id.as_deref().unwrap_or("<no id>"),
            self.value
        )
    }
}

impl std::error::Error for SortKeyError {}

// ============================================================================
// TABLE
// ============================================================================

/// Header row followed by data rows sorted by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Row,
    rows: Vec<Row>,
}

impl Table {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, header excluded
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// All rows with the header at index 0, as the spreadsheet expects them
    pub fn values(&self) -> Vec<Row> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header.clone());
        values.extend(self.rows.iter().cloned());
        values
    }

    /// Every data row has the same number of cells
    pub fn is_rectangular(&self) -> bool {
        match self.rows.first() {
            Some(first) => self.rows.iter().all(|r| r.len() == first.len()),
            None => true,
        }
    }
}

// ============================================================================
// TABLE ASSEMBLER
// ============================================================================

pub struct TableAssembler<'a> {
    table_name: &'a str,
    schema: &'a ColumnSchema,
    headers: &'a HeaderStore,
}

impl<'a> TableAssembler<'a> {
    pub fn new(table_name: &'a str, schema: &'a ColumnSchema, headers: &'a HeaderStore) -> Self {
        TableAssembler {
            table_name,
            schema,
            headers,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table_name
    }

    pub fn assemble(&self, records: &[Value], categories: Option<&CategoryIndex>) -> Result<Table> {
        self.assemble_at(records, categories, Local::now())
    }

    /// Assemble with a fixed sync timestamp
    pub fn assemble_at(
        &self,
        records: &[Value],
        categories: Option<&CategoryIndex>,
        synced_at: DateTime<Local>,
    ) -> Result<Table> {
        let mut extractor = RowExtractor::new(self.schema);
        if let Some(categories) = categories {
            extractor = extractor.with_categories(categories);
        }

        let rows = extractor.extract_at(records, synced_at);
        let rows = sort_by_leading_id(rows, records)?;
        let header = self.headers.headers_for(self.table_name)?;

        log::debug!("[Table] Assembled {} rows for {}", rows.len(), self.table_name);
        Ok(Table { header, rows })
    }
}

/// Stable ascending sort on the integer value of each row's first cell
fn sort_by_leading_id(rows: Vec<Row>, records: &[Value]) -> Result<Vec<Row>, SortKeyError> {
    let mut keyed = Vec::with_capacity(rows.len());

    for (row_index, row) in rows.into_iter().enumerate() {
        let cell = row.first().map(String::as_str).unwrap_or_default();

        let key: i64 = cell.trim().parse().map_err(|_| SortKeyError {
            row_index,
            record_id: records
                .get(row_index)
                .and_then(|r| resolve(r, "id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            value: cell.to_string(),
        })?;

        keyed.push((key, row));
    }

    keyed.sort_by_key(|(key, _)| *key);
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn page(page_id: &str, id: Value, name: &str) -> Value {
        json!({
            "id": page_id,
            "properties": {
                "ID": {"unique_id": {"number": id}},
                "Name": {"title": [{"plain_text": name}]}
            }
        })
    }

    fn schema() -> ColumnSchema {
        ColumnSchema::new(
            ["properties.ID.unique_id.number", "properties.Name.title.0.plain_text"],
            ["ID", "NAME"],
        )
        .unwrap()
    }

    fn store_with(dir: &tempfile::TempDir, content: &str) -> HeaderStore {
        let path = dir.path().join("headers.json");
        std::fs::write(&path, content).unwrap();
        HeaderStore::new(path)
    }

    fn synced_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_end_to_end_sorted_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": [{"test": ["ID", "NAME", "LAST_UPDATED_TIME"]}]}"#);
        let schema = schema();
        let records = vec![page("p2", json!(2), "Second"), page("p1", json!(1), "First")];

        let table = TableAssembler::new("test", &schema, &store)
            .assemble_at(&records, None, synced_at())
            .unwrap();

        let values = table.values();
        assert_eq!(values[0], vec!["ID", "NAME", "LAST_UPDATED_TIME"]);
        assert_eq!(values[1][..2], ["1", "First"]);
        assert_eq!(values[2][..2], ["2", "Second"]);
        assert_eq!(values[1][2], "Fri Jan  2 03:04:05 2026");
        assert_eq!(table.row_count(), 2);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_sort_is_numeric_not_lexical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": []}"#);
        let schema = schema();
        let records = vec![
            page("a", json!(10), "Ten"),
            page("b", json!(9), "Nine"),
            page("c", json!(100), "Hundred"),
        ];

        let table = TableAssembler::new("test", &schema, &store).assemble(&records, None).unwrap();

        let ids: Vec<&str> = table.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["9", "10", "100"]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": []}"#);
        let schema = schema();
        let records = vec![
            page("a", json!(5), "first five"),
            page("b", json!(1), "one"),
            page("c", json!(5), "second five"),
        ];

        let table = TableAssembler::new("test", &schema, &store).assemble(&records, None).unwrap();

        let names: Vec<&str> = table.rows().iter().map(|r| r[1].as_str()).collect();
        assert_eq!(names, vec!["one", "first five", "second five"]);
    }

    #[test]
    fn test_missing_id_is_sort_key_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": []}"#);
        let schema = schema();
        let records = vec![
            page("ok-page", json!(1), "fine"),
            json!({"id": "broken-page", "properties": {}}),
        ];

        let err = TableAssembler::new("test", &schema, &store)
            .assemble(&records, None)
            .unwrap_err();

        let sort_err = err.downcast_ref::<SortKeyError>().expect("sort key error");
        assert_eq!(sort_err.row_index, 1);
        assert_eq!(sort_err.record_id.as_deref(), Some("broken-page"));
        assert_eq!(sort_err.value, "None");
        assert!(err.to_string().contains("broken-page"));
    }

    #[test]
    fn test_fractional_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": []}"#);
        let schema = schema();
        let records = vec![page("p", json!(1.5), "half")];

        let result = TableAssembler::new("test", &schema, &store).assemble(&records, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_table_gets_empty_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": [{"other": ["X"]}]}"#);
        let schema = schema();

        let table = TableAssembler::new("test", &schema, &store)
            .assemble(&[page("p", json!(1), "one")], None)
            .unwrap();

        assert!(table.header().is_empty());
        assert_eq!(table.values().len(), 2);
    }

    #[test]
    fn test_no_records_yields_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": [{"test": ["ID"]}]}"#);
        let schema = schema();

        let table = TableAssembler::new("test", &schema, &store).assemble(&[], None).unwrap();

        assert_eq!(table.values(), vec![vec!["ID".to_string()]]);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_categories_flow_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, r#"{"headers": []}"#);
        let schema = ColumnSchema::new(
            ["properties.ID.unique_id.number", "properties.Cat.relation.0.id"],
            ["ID", "CATEGORIA"],
        )
        .unwrap()
        .with_category_relation("properties.Cat.relation.0.id")
        .unwrap();
        let categories: CategoryIndex = [("abc123", "Food")].into_iter().collect();
        let records = vec![json!({
            "properties": {
                "ID": {"unique_id": {"number": 1}},
                "Cat": {"relation": [{"id": "abc123"}]}
            }
        })];

        let table = TableAssembler::new("test", &schema, &store)
            .assemble(&records, Some(&categories))
            .unwrap();

        assert_eq!(table.rows()[0][1], "Food");
    }
}
