use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SheetsConfig;
use crate::error::StoreError;
use crate::table::{Table, TableBackend};

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: Vec<Vec<Value>>,
}

// ---------------- Google Sheets v4 `values` client ----------------
pub struct SheetsTable {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    token: Option<String>,
}

impl SheetsTable {
    pub fn new(cfg: &SheetsConfig) -> anyhow::Result<Self> {
        if cfg.spreadsheet_id.trim().is_empty() {
            return Err(anyhow::anyhow!("SHEETS_SPREADSHEET_ID must not be empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()?;
        info!(
            "Sheets backend: spreadsheet={} range={} base={}",
            cfg.spreadsheet_id, cfg.range, cfg.api_base
        );
        Ok(Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            range: cfg.range.clone(),
            token: cfg.token.clone(),
        })
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.api_base,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range),
            suffix
        )
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn send(&self, what: &str, req: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = self.authorized(req).send().await.map_err(|e| {
            error!("sheets {what} request failed: {e:?}");
            StoreError::Transport(format!("{what}: {e}"))
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        error!("sheets {what} returned {status}: {snippet}");
        Err(StoreError::Transport(format!("{what} returned {status}: {snippet}")))
    }
}

#[async_trait]
impl TableBackend for SheetsTable {
    async fn fetch_all_rows(&self) -> Result<Table, StoreError> {
        let req = self.client.get(self.values_url("")).query(&[
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "FORMATTED_STRING"),
        ]);
        let resp = self.send("fetch", req).await?;
        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!("sheets fetch returned {} grid rows", range.values.len());
        Ok(Table::from_grid(range.values))
    }

    async fn replace_all_rows(&self, table: &Table) -> Result<(), StoreError> {
        // Clear first so rows beyond the new length do not linger.
        let clear = self
            .client
            .post(self.values_url(":clear"))
            .json(&serde_json::json!({}));
        self.send("clear", clear).await?;

        let grid = table.to_grid();
        if grid.is_empty() {
            return Ok(());
        }
        let rows = grid.len();
        let body = ValueRangeBody { range: &self.range, major_dimension: "ROWS", values: grid };
        let put = self
            .client
            .put(self.values_url(""))
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send("update", put).await?;
        debug!("sheets update wrote {rows} grid rows");
        Ok(())
    }
}
