use anyhow::{bail, Result};
use std::env;
use std::path::Path;
use std::time::Instant;

use expense_sync::config::load_dotenv;
use expense_sync::{
    export_csv, plan_jobs, Config, CredentialProvider, HeaderStore, NotionClient, SheetsClient,
    Synchronizer, TABLE_NAMES,
};

const USAGE: &str = "Usage:
  expense-sync [sync [TABLE...]]   Sync tables to Google Sheets (default: all configured)
  expense-sync export TABLE OUT    Write one table to a CSV file instead of uploading
  expense-sync headers             Show the header file (created with defaults if missing)";

fn main() {
    let start = Instant::now();

    // .env first so RUST_LOG can live there too
    let dotenv_path = load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Some(path) = dotenv_path {
        log::debug!("[Config] Loaded {:?}", path);
    }
    let config = Config::from_env();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = run(&config, &args);

    println!("\nExecution time: {:.2}s", start.elapsed().as_secs_f64());

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        None => run_sync(config, &[]),
        Some("sync") => run_sync(config, &args[1..]),
        Some("export") => match &args[1..] {
            [table, out] => run_export(config, table, Path::new(out)),
            _ => bail!("export needs a table and an output file\n\n{}", USAGE),
        },
        Some("headers") => run_headers(config),
        Some("help") | Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn run_sync(config: &Config, tables: &[String]) -> Result<()> {
    println!("🔄 Expense Sync v{} - Notion → Google Sheets", expense_sync::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let jobs = plan_jobs(config, tables)?;
    if jobs.is_empty() {
        bail!(
            "No Notion databases configured; set NOTION_DATABASE_ID_* for any of {:?}",
            TABLE_NAMES
        );
    }

    let notion = NotionClient::from_config(config)?;
    let headers = HeaderStore::new(&config.headers_file);
    let credentials = CredentialProvider::new(&config.credentials_file, &config.token_file);
    let sheets = SheetsClient::new(config.require_spreadsheet_id()?, &credentials)?;

    let reports = Synchronizer::new(&notion, &headers, &config.snapshot_dir).run(&jobs, &sheets)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for report in &reports {
        println!(
            "✓ {:<12} {:>5} rows  {:>6} cells updated",
            report.table_name, report.rows, report.updated_cells
        );
    }
    println!("✅ Synced {} table(s)", reports.len());

    Ok(())
}

fn run_export(config: &Config, table_name: &str, out: &Path) -> Result<()> {
    println!("📄 Exporting {} → {:?}", table_name, out);

    let jobs = plan_jobs(config, &[table_name.to_string()])?;
    let Some(job) = jobs.first() else {
        bail!("No job planned for table '{}'", table_name);
    };

    let notion = NotionClient::from_config(config)?;
    let headers = HeaderStore::new(&config.headers_file);
    let table = Synchronizer::new(&notion, &headers, &config.snapshot_dir).fetch_table(job)?;

    export_csv(&table, out)?;
    println!("✓ Wrote {} rows", table.row_count());

    Ok(())
}

fn run_headers(config: &Config) -> Result<()> {
    let store = HeaderStore::new(&config.headers_file);
    let document = store.load()?;

    println!("🗂️  Headers ({:?})", store.path());
    for name in document.table_names() {
        println!("  {:<12} {}", name, document.headers_for(name).join(" | "));
    }

    Ok(())
}
