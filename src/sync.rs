// 🔄 Sync - one job per table: query → snapshot → assemble → upload
// Every table is assembled before the first upload, so a failing job leaves the sheet untouched.

use crate::category::CategoryIndex;
use crate::config::Config;
use crate::headers::HeaderStore;
use crate::notion::{results_of, RecordSource};
use crate::schema::{builtin_schema, sheet_range, ColumnSchema, CATEGORIAS, TABLE_NAMES};
use crate::sheets::TableSink;
use crate::snapshot::{snapshot_path, write_json_snapshot};
use crate::table::{Table, TableAssembler};
use anyhow::{anyhow, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub table_name: String,
    pub database_id: String,
    pub schema: ColumnSchema,
    pub range: String,
}

impl SyncJob {
    /// Job for one of the tracker's built-in tables
    pub fn builtin(table_name: &str, config: &Config) -> Result<Self> {
        let schema = builtin_schema(table_name)
            .ok_or_else(|| anyhow!("Unknown table '{}' (expected one of {:?})", table_name, TABLE_NAMES))?;

        Ok(SyncJob {
            table_name: table_name.to_string(),
            database_id: config.require_database_id(table_name)?.to_string(),
            schema,
            range: sheet_range(table_name),
        })
    }
}

/// Jobs for the requested tables in sync order; every configured table when `requested` is empty
pub fn plan_jobs(config: &Config, requested: &[String]) -> Result<Vec<SyncJob>> {
    for name in requested {
        if !TABLE_NAMES.contains(&name.as_str()) {
            return Err(anyhow!("Unknown table '{}' (expected one of {:?})", name, TABLE_NAMES));
        }
    }

    if requested.is_empty() {
        return TABLE_NAMES
            .iter()
            .filter(|name| config.database_id(name).is_some())
            .map(|name| SyncJob::builtin(name, config))
            .collect();
    }

    TABLE_NAMES
        .iter()
        .filter(|name| requested.iter().any(|r| r.as_str() == **name))
        .map(|name| SyncJob::builtin(name, config))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub table_name: String,
    pub rows: usize,
    pub updated_cells: u64,
}

pub struct Synchronizer<'a> {
    source: &'a dyn RecordSource,
    headers: &'a HeaderStore,
    snapshot_dir: &'a Path,
}

impl<'a> Synchronizer<'a> {
    pub fn new(source: &'a dyn RecordSource, headers: &'a HeaderStore, snapshot_dir: &'a Path) -> Self {
        Synchronizer {
            source,
            headers,
            snapshot_dir,
        }
    }

    /// Query the job's database, dump the raw document, assemble the Table
    pub fn fetch_table(&self, job: &SyncJob) -> Result<Table> {
        let document = self
            .source
            .query(&job.database_id)
            .with_context(|| format!("Failed to query table '{}'", job.table_name))?;

        write_json_snapshot(self.snapshot_dir, &job.table_name, &document)?;

        let records = results_of(&document)?;
        let categories = self.categories_for(&job.schema);

        TableAssembler::new(&job.table_name, &job.schema, self.headers)
            .assemble(records, categories.as_ref())
            .with_context(|| format!("Failed to assemble table '{}'", job.table_name))
    }

    pub fn run_job(&self, job: &SyncJob, sink: &dyn TableSink) -> Result<SyncReport> {
        let table = self.fetch_table(job)?;
        upload_table(job, &table, sink)
    }

    /// Assemble every job's table, then upload them in order
    pub fn run(&self, jobs: &[SyncJob], sink: &dyn TableSink) -> Result<Vec<SyncReport>> {
        let tables = jobs
            .iter()
            .map(|job| self.fetch_table(job).map(|table| (job, table)))
            .collect::<Result<Vec<_>>>()?;

        log::info!("[Sync] Assembled {} table(s), uploading", tables.len());

        tables
            .iter()
            .map(|(job, table)| upload_table(job, table, sink))
            .collect()
    }

    /// Category names from the last `categorias` snapshot, for schemas with a relation column
    fn categories_for(&self, schema: &ColumnSchema) -> Option<CategoryIndex> {
        schema.relation_column()?;

        let path = snapshot_path(self.snapshot_dir, CATEGORIAS);
        match CategoryIndex::from_snapshot(&path) {
            Ok(index) => {
                log::debug!("[Sync] Loaded {} category names from {:?}", index.len(), path);
                Some(index)
            }
            Err(e) => {
                log::warn!("[Sync] No category names available, keeping raw relation ids: {:#}", e);
                None
            }
        }
    }
}

fn upload_table(job: &SyncJob, table: &Table, sink: &dyn TableSink) -> Result<SyncReport> {
    log::info!("[Sync] {} → {}", job.table_name, job.range);

    let updated_cells = sink
        .upload(table, &job.range)
        .with_context(|| format!("Failed to upload table '{}'", job.table_name))?;

    Ok(SyncReport {
        table_name: job.table_name.clone(),
        rows: table.row_count(),
        updated_cells,
    })
}

// ============================================================================
// TESTS
// ============================================================================
