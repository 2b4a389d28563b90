use crate::errors::FunnelError;
use crate::models::ApplicationTable;
use anyhow::{Context, Result};
use std::fs;

pub struct SheetFetcher {
    client: reqwest::Client,
}

impl SheetFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the applications sheet through the Google Sheets CSV export
    pub async fn fetch_sheet(&self, sheet_id: &str, sheet_name: &str) -> Result<ApplicationTable> {
        let url = format!(
            "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
            sheet_id, sheet_name
        );
        println!("🌐 Fetching data from: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }

        let content = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        let table = parse_csv(content.as_bytes())
            .with_context(|| format!("Failed to parse CSV from: {}", url))?;

        if table.is_empty() {
            return Err(FunnelError::DataUnavailable { origin: url }.into());
        }

        Ok(table)
    }

    /// Read the applications table from a local CSV export
    pub fn read_file(&self, file_path: &str) -> Result<ApplicationTable> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file: {}", file_path))?;

        let table = parse_csv(content.as_bytes())
            .with_context(|| format!("Failed to parse CSV from: {}", file_path))?;

        if table.is_empty() {
            return Err(FunnelError::DataUnavailable {
                origin: file_path.to_string(),
            }
            .into());
        }

        Ok(table)
    }
}

/// Parse CSV bytes into a table. Cells are trimmed; an empty cell becomes
/// None. Short rows are padded with None so every row matches the header.
pub fn parse_csv(data: &[u8]) -> Result<ApplicationTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .context("CSV data has no header row")?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let row = (0..headers.len())
            .map(|index| {
                record
                    .get(index)
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string)
            })
            .collect();
        rows.push(row);
    }

    Ok(ApplicationTable { headers, rows })
}

/// Basic cleaning before analysis: drop the configured identifying columns,
/// drop columns with no values at all, then drop rows with no values left.
pub fn clean_table(
    table: &ApplicationTable,
    drop_columns: &[String],
) -> Result<ApplicationTable, FunnelError> {
    let kept_columns: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(index, header)| {
            if drop_columns.contains(header) {
                return false;
            }
            table
                .rows
                .iter()
                .any(|row| row.get(*index).map(|c| c.is_some()).unwrap_or(false))
        })
        .map(|(index, _)| index)
        .collect();

    let headers = kept_columns
        .iter()
        .map(|&index| table.headers[index].clone())
        .collect();

    let rows: Vec<Vec<Option<String>>> = table
        .rows
        .iter()
        .map(|row| {
            kept_columns
                .iter()
                .map(|&index| row.get(index).cloned().flatten())
                .collect::<Vec<Option<String>>>()
        })
        .filter(|row| row.iter().any(|cell| cell.is_some()))
        .collect();

    if rows.is_empty() {
        return Err(FunnelError::DataUnavailable {
            origin: "cleaned application table".to_string(),
        });
    }

    Ok(ApplicationTable { headers, rows })
}
