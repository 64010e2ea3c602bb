// Expense Sync - Core Library
// Notion finance tracker → flat tables → Google Sheets

pub mod path;       // Safe dotted-path lookups
pub mod schema;     // Column schemas per table
pub mod category;   // Relation id → category name
pub mod extract;    // Pages → rows
pub mod headers;    // Persisted header rows
pub mod table;      // Sorted table assembly
pub mod snapshot;   // Raw query dumps
pub mod config;     // .env / environment settings
pub mod notion;     // Notion database queries
pub mod auth;       // Google OAuth credentials
pub mod sheets;     // Google Sheets upload
pub mod export;     // Local CSV export
pub mod sync;       // Per-table sync jobs

// Re-export commonly used types
pub use path::{resolve, cell_text, MISSING_CELL};
pub use schema::{
    ColumnSchema, builtin_schema, sheet_range,
    CATEGORIAS, GASTOS, INGRESOS, TABLE_NAMES, LAST_UPDATED_HEADER,
};
pub use category::CategoryIndex;
pub use extract::{Row, RowExtractor, synced_at_text};
pub use headers::{HeaderDocument, HeaderStore};
pub use table::{SortKeyError, Table, TableAssembler};
pub use snapshot::{read_json_snapshot, snapshot_path, write_json_snapshot};
pub use config::Config;
pub use notion::{NotionClient, RecordSource};
pub use auth::{Credential, CredentialProvider};
pub use sheets::{SheetsClient, TableSink};
pub use export::{export_csv, write_csv};
pub use sync::{plan_jobs, SyncJob, SyncReport, Synchronizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
