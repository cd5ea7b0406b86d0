// src/integrations/google_sheets.rs — Google Sheets adapter (REST API + OAuth2)
//
// Uses the Google Sheets API v4 (https://developers.google.com/sheets/api).
// Finished sessions are appended as rows to columns A:E of one sheet.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenSource;
use crate::infra::errors::WorklogError;
use crate::integrations::google_error_for_status;
use crate::integrations::types::{WorkLogAdapter, WorkLogRow};
use crate::util::encode_path_segment;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const SERVICE: &str = "sheets";

/// Column headers of the log, in order.
pub const LOG_COLUMNS: [&str; 5] = ["Date", "Name", "Worked From", "Worked Till", "Place"];

/// Google Sheets integration adapter.
pub struct GoogleSheetsAdapter {
    client: Client,
    tokens: Arc<dyn TokenSource>,
    spreadsheet_id: String,
    sheet_name: String,
    api_base: String,
}

impl GoogleSheetsAdapter {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            tokens,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            api_base: SHEETS_API_BASE.into(),
        }
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point the adapter at a different API root.
    pub fn with_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn append_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}:append",
            self.api_base,
            encode_path_segment(&self.spreadsheet_id),
            encode_path_segment(&append_range(&self.sheet_name))
        )
    }

    /// Validate access and check that the configured sheet exists.
    pub async fn validate(&self) -> Result<String, WorklogError> {
        let token = self.tokens.access_token().await?;
        let resp = self
            .client
            .get(format!(
                "{}/spreadsheets/{}",
                self.api_base,
                encode_path_segment(&self.spreadsheet_id)
            ))
            .bearer_auth(token)
            .query(&[("fields", "properties.title,sheets.properties.title")])
            .send()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        let resp = google_error_for_status(SERVICE, resp).await?;

        let spreadsheet: SpreadsheetResp = resp
            .json()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;

        let title = spreadsheet
            .properties
            .and_then(|p| p.title)
            .unwrap_or_else(|| "Untitled".into());
        let has_sheet = spreadsheet
            .sheets
            .unwrap_or_default()
            .iter()
            .filter_map(|s| s.properties.as_ref().and_then(|p| p.title.as_deref()))
            .any(|t| t == self.sheet_name);

        if !has_sheet {
            return Err(WorklogError::Config(format!(
                "Spreadsheet '{title}' has no sheet named '{}'",
                self.sheet_name
            )));
        }

        Ok(format!("Google Sheets: {title} / {}", self.sheet_name))
    }
}

// -- Google Sheets API types --

#[derive(Deserialize)]
struct SpreadsheetResp {
    properties: Option<SpreadsheetProperties>,
    sheets: Option<Vec<SheetMeta>>,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: Option<String>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: Option<SpreadsheetProperties>,
}

#[derive(Deserialize)]
struct AppendResp {
    updates: Option<AppendUpdates>,
}

#[derive(Deserialize)]
struct AppendUpdates {
    #[serde(rename = "updatedRange")]
    updated_range: Option<String>,
}

/// A1 range covering the five log columns.
fn append_range(sheet_name: &str) -> String {
    format!("{sheet_name}!A:E")
}

fn append_body(row: &WorkLogRow) -> serde_json::Value {
    serde_json::json!({
        "majorDimension": "ROWS",
        "values": [row.cells()],
    })
}

// -- WorkLogAdapter implementation --

#[async_trait]
impl WorkLogAdapter for GoogleSheetsAdapter {
    async fn append_row(&self, row: &WorkLogRow) -> Result<String, WorklogError> {
        let token = self.tokens.access_token().await?;
        let resp = self
            .client
            .post(self.append_url())
            .bearer_auth(token)
            // USER_ENTERED lets the sheet parse the timestamps as dates
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&append_body(row))
            .send()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        let resp = google_error_for_status(SERVICE, resp).await?;

        let appended: AppendResp = resp
            .json()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;

        Ok(appended
            .updates
            .and_then(|u| u.updated_range)
            .unwrap_or_else(|| append_range(&self.sheet_name)))
    }
}
