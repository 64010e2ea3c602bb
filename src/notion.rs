// 📓 Notion collaborator - database queries over the public REST API
// Pagination is handled here; callers get one document with every page.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can return the pages of a Notion database
pub trait RecordSource {
    /// All pages of `database_id` as `{"object": "list", "results": [...]}`
    fn query(&self, database_id: &str) -> Result<Value>;
}

pub struct NotionClient {
    base_url: String,
    api_key: String,
    notion_version: String,
    client: reqwest::blocking::Client,
}

impl NotionClient {
    pub fn new(base_url: &str, api_key: &str, notion_version: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Notion HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            notion_version: notion_version.to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        NotionClient::new(
            &config.notion_api_url,
            config.require_notion_api_key()?,
            &config.notion_version,
        )
    }

    fn query_page(&self, database_id: &str, cursor: Option<&str>) -> Result<Value> {
        let resp = self
            .client
            .post(format!("{}/v1/databases/{}/query", self.base_url, database_id))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.notion_version)
            .json(&query_body(cursor))
            .send()
            .with_context(|| format!("Notion query failed for database {}", database_id))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("Notion query HTTP {}: {}", status, body));
        }

        resp.json::<Value>().context("Failed to parse Notion query response")
    }
}

impl RecordSource for NotionClient {
    fn query(&self, database_id: &str) -> Result<Value> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self.query_page(database_id, cursor.as_deref())?;
            pages += 1;

            if let Some(items) = page.get("results").and_then(Value::as_array) {
                results.extend(items.iter().cloned());
            }

            cursor = next_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        log::info!(
            "[Notion] Database {}: {} records in {} page(s)",
            database_id,
            results.len(),
            pages
        );

        Ok(json!({
            "object": "list",
            "results": results,
            "has_more": false,
            "next_cursor": null,
        }))
    }
}

/// Request body for one page of a database query
fn query_body(cursor: Option<&str>) -> Value {
    match cursor {
        Some(cursor) => json!({"page_size": PAGE_SIZE, "start_cursor": cursor}),
        None => json!({"page_size": PAGE_SIZE}),
    }
}

/// Cursor of the next page, `None` once `has_more` is false
fn next_cursor(page: &Value) -> Option<String> {
    let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    if !has_more {
        return None;
    }
    page.get("next_cursor").and_then(Value::as_str).map(str::to_string)
}

/// Pull the `results` array out of a query document
pub fn results_of(document: &Value) -> Result<&[Value]> {
    document
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| anyhow!("Query document has no 'results' array"))
}

// ============================================================================
// TESTS
// ============================================================================
