// 📤 Google Sheets collaborator - writes an assembled Table into a range

use crate::auth::CredentialProvider;
use crate::table::Table;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can receive a finished Table
pub trait TableSink {
    /// Write `table` starting at `range`; returns the number of updated cells
    fn upload(&self, table: &Table, range: &str) -> Result<u64>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_cells: Option<u64>,
    #[serde(default)]
    updated_range: Option<String>,
}

pub struct SheetsClient<'a> {
    base_url: String,
    spreadsheet_id: String,
    credentials: &'a CredentialProvider,
    client: reqwest::blocking::Client,
}

impl<'a> SheetsClient<'a> {
    pub fn new(spreadsheet_id: &str, credentials: &'a CredentialProvider) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Sheets HTTP client")?;

        Ok(Self {
            base_url: SHEETS_API_URL.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            credentials,
            client,
        })
    }

    fn update_url(&self, range: &str) -> String {
        update_url(&self.base_url, &self.spreadsheet_id, range)
    }
}

impl TableSink for SheetsClient<'_> {
    fn upload(&self, table: &Table, range: &str) -> Result<u64> {
        let credential = self.credentials.get_valid_credential()?;
        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values: table.values(),
        };

        let resp = self
            .client
            .put(self.update_url(range))
            .bearer_auth(&credential.access_token)
            .json(&body)
            .send()
            .with_context(|| format!("Sheets update failed for range {}", range))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("Sheets update HTTP {}: {}", status, body));
        }

        let update: UpdateValuesResponse = resp.json().context("Failed to parse Sheets update response")?;
        let cells = update.updated_cells.unwrap_or(0);

        log::info!(
            "[Sheets] Updated {} cells in {}",
            cells,
            update.updated_range.as_deref().unwrap_or(range)
        );
        Ok(cells)
    }
}

fn update_url(base_url: &str, spreadsheet_id: &str, range: &str) -> String {
    format!(
        "{}/v4/spreadsheets/{}/values/{}?valueInputOption=USER_ENTERED",
        base_url,
        spreadsheet_id,
        urlencoding::encode(range)
    )
}

// ============================================================================
// TESTS
// ============================================================================
