// 📐 Column Schemas - tables described as data
// One ColumnSchema per Notion database: which paths to pull and what to call them.

use anyhow::{bail, Result};

/// Header of the trailing "last synced at" cell appended to every row.
pub const LAST_UPDATED_HEADER: &str = "LAST_UPDATED_TIME";

pub const CATEGORIAS: &str = "categorias";
pub const GASTOS: &str = "gastos";
pub const INGRESOS: &str = "ingresos";

/// Table names in the order a full run syncs them.
/// `categorias` goes first so dependent tables see a fresh category snapshot.
pub const TABLE_NAMES: [&str; 3] = [CATEGORIAS, GASTOS, INGRESOS];

// Paths shared by the tracker's databases
const ID_PATH: &str = "properties.ID.unique_id.number";
const NAME_PATH: &str = "properties.Name.title.0.plain_text";
const AMOUNT_PATH: &str = "properties.Monto.number";
const DATE_PATH: &str = "properties.Fecha.date.start";
const CATEGORY_RELATION_PATH: &str = "properties.Categoria.relation.0.id";

// ============================================================================
// COLUMN SCHEMA
// ============================================================================

/// Ordered extraction paths plus the header for each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    paths: Vec<String>,
    headers: Vec<String>,
    /// Index into `paths` of the category relation column, if any
    relation: Option<usize>,
}

impl ColumnSchema {
    /// Build a schema; `paths` and `headers` must line up one to one.
    pub fn new<P, H>(paths: P, headers: H) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        H: IntoIterator,
        H::Item: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();

        if paths.len() != headers.len() {
            bail!(
                "Column schema mismatch: {} paths but {} headers",
                paths.len(),
                headers.len()
            );
        }

        Ok(ColumnSchema {
            paths,
            headers,
            relation: None,
        })
    }

    /// Builder pattern: mark one of the paths as the category relation column
    pub fn with_category_relation(mut self, path: &str) -> Result<Self> {
        match self.paths.iter().position(|p| p == path) {
            Some(index) => {
                self.relation = Some(index);
                Ok(self)
            }
            None => bail!("Category relation path '{}' is not a column of this schema", path),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column index of the category relation, if the schema has one
    pub fn relation_column(&self) -> Option<usize> {
        self.relation
    }

    /// Number of cells in an extracted row (paths + timestamp)
    pub fn row_len(&self) -> usize {
        self.paths.len() + 1
    }

    /// Full header row as written to the sheet, timestamp column included
    pub fn header_row(&self) -> Vec<String> {
        let mut row = self.headers.clone();
        row.push(LAST_UPDATED_HEADER.to_string());
        row
    }
}

// ============================================================================
// BUILT-IN SCHEMAS
// ============================================================================

/// Schema for one of the tracker's databases, `None` for unknown tables.
pub fn builtin_schema(table_name: &str) -> Option<ColumnSchema> {
    let schema = match table_name {
        CATEGORIAS => ColumnSchema::new(
            [
                ID_PATH,
                NAME_PATH,
                "properties.$ Mes actual.formula.number",
                "properties.$ Mes anterior.formula.number",
                "properties.Presupuesto.number",
            ],
            ["ID", "NAME", "MES ACTUAL", "MES ANTERIOR", "PRESUPUESTO"],
        ),
        GASTOS => ColumnSchema::new(
            [ID_PATH, NAME_PATH, AMOUNT_PATH, DATE_PATH, CATEGORY_RELATION_PATH],
            ["ID", "NAME", "MONTO", "FECHA", "CATEGORIA"],
        )
        .and_then(|s| s.with_category_relation(CATEGORY_RELATION_PATH)),
        INGRESOS => ColumnSchema::new(
            [ID_PATH, NAME_PATH, AMOUNT_PATH, DATE_PATH],
            ["ID", "NAME", "MONTO", "FECHA"],
        ),
        _ => return None,
    };

    // Built-in definitions are balanced; a mismatch here is a programming error
    schema.ok()
}

/// Display name of a `categorias` page, used to build the category index
pub const CATEGORY_NAME_PATH: &str = NAME_PATH;

/// Destination range for a table in the spreadsheet
pub fn sheet_range(table_name: &str) -> String {
    format!("Raw data {}!A1", table_name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_rejects_length_mismatch() {
        let result = ColumnSchema::new(["a", "b"], ["A"]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("2 paths but 1 headers"));
    }

    #[test]
    fn test_schema_row_len_counts_timestamp() {
        let schema = ColumnSchema::new(["a", "b"], ["A", "B"]).unwrap();
        assert_eq!(schema.row_len(), 3);
        assert_eq!(schema.header_row(), vec!["A", "B", "LAST_UPDATED_TIME"]);
    }

    #[test]
    fn test_relation_must_be_a_schema_path() {
        let schema = ColumnSchema::new(["a", "b"], ["A", "B"]).unwrap();
        assert!(schema.clone().with_category_relation("c").is_err());

        let schema = schema.with_category_relation("b").unwrap();
        assert_eq!(schema.relation_column(), Some(1));
    }

    #[test]
    fn test_builtin_schemas_exist_for_all_tables() {
        for name in TABLE_NAMES {
            let schema = builtin_schema(name).expect("builtin schema");
            assert_eq!(schema.paths().len(), schema.headers().len());
            assert_eq!(schema.headers()[0], "ID");
        }
        assert!(builtin_schema("presupuestos").is_none());
    }

    #[test]
    fn test_only_gastos_has_category_relation() {
        assert_eq!(builtin_schema(CATEGORIAS).unwrap().relation_column(), None);
        assert_eq!(builtin_schema(GASTOS).unwrap().relation_column(), Some(4));
        assert_eq!(builtin_schema(INGRESOS).unwrap().relation_column(), None);
    }

    #[test]
    fn test_categorias_header_row() {
        let schema = builtin_schema(CATEGORIAS).unwrap();
        assert_eq!(
            schema.header_row(),
            vec!["ID", "NAME", "MES ACTUAL", "MES ANTERIOR", "PRESUPUESTO", "LAST_UPDATED_TIME"]
        );
    }

    #[test]
    fn test_sheet_range() {
        assert_eq!(sheet_range("categorias"), "Raw data categorias!A1");
    }
}
