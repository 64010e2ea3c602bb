// 🔎 Row Extractor - Notion pages → flat rows of cell text
// One row per page, in input order, with a trailing "last synced at" cell.

use crate::category::CategoryIndex;
use crate::path::{cell_text, resolve};
use crate::schema::ColumnSchema;
use chrono::{DateTime, Local};
use serde_json::Value;

/// One extracted row: cell text for every schema path, then the sync timestamp
pub type Row = Vec<String>;

/// asctime-style rendering, e.g. `Sun Oct 18 14:03:05 2026`
const SYNCED_AT_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Render the "last synced at" cell
pub fn synced_at_text(at: DateTime<Local>) -> String {
    at.format(SYNCED_AT_FORMAT).to_string()
}

pub struct RowExtractor<'a> {
    schema: &'a ColumnSchema,
    categories: Option<&'a CategoryIndex>,
}

impl<'a> RowExtractor<'a> {
    pub fn new(schema: &'a ColumnSchema) -> Self {
        RowExtractor {
            schema,
            categories: None,
        }
    }

    /// Builder pattern: substitute category relation ids with display names
    pub fn with_categories(mut self, categories: &'a CategoryIndex) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Extract every record, stamping rows with the current local time
    pub fn extract(&self, records: &[Value]) -> Vec<Row> {
        self.extract_at(records, Local::now())
    }

    /// Extract every record, stamping rows with `synced_at`
    pub fn extract_at(&self, records: &[Value], synced_at: DateTime<Local>) -> Vec<Row> {
        let stamp = synced_at_text(synced_at);

        records
            .iter()
            .map(|record| self.extract_record(record, &stamp))
            .collect()
    }

    fn extract_record(&self, record: &Value, stamp: &str) -> Row {
        let mut row = Row::with_capacity(self.schema.row_len());

        for (column, path) in self.schema.paths().iter().enumerate() {
            let value = resolve(record, path);

            if Some(column) == self.schema.relation_column() {
                row.push(self.category_cell(value));
            } else {
                row.push(cell_text(value));
            }
        }

        row.push(stamp.to_string());
        row
    }

    /// Unmapped relation ids pass through as raw id text
    fn category_cell(&self, value: Option<&Value>) -> String {
        let raw = cell_text(value);

        let (Some(categories), Some(id)) = (self.categories, value.and_then(Value::as_str)) else {
            return raw;
        };

        match categories.name_for(id) {
            Some(name) => name.to_string(),
            None => {
                log::debug!("[Extract] No category named for relation id {}", id);
                raw
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
