use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::PriceSample;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::EngineError;

/// Reads a ticker list: one symbol per line, `#` starts a comment anywhere on
/// the line. Symbols are upper-cased and de-duplicated, keeping the first occurrence.
pub fn load_ticker_list(path: &Path) -> std::result::Result<Vec<String>, EngineError> {
    let file = File::open(path).map_err(|e| {
        EngineError::ConfigError(format!("Failed to open ticker list '{}': {}", path.display(), e))
    })?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(symbol) = record.get(0).and_then(strip_comment) else {
            continue;
        };
        let symbol = symbol.to_uppercase();
        if seen.insert(symbol.clone()) {
            tickers.push(symbol);
        }
    }
    Ok(tickers)
}

fn strip_comment(field: &str) -> Option<&str> {
    let code = field.split('#').next().unwrap_or_default().trim();
    (!code.is_empty()).then_some(code)
}

pub struct PriceCsvParser;

impl PriceCsvParser {
    // CSV Header: Date,Close (extra columns are ignored)
    // Example Row: 2024-03-28,171.48
    pub fn load_price_history(file_path: &Path) -> Result<Vec<PriceSample>> {
        let file = File::open(file_path)
            .map_err(|e| anyhow!("Failed to open CSV file '{}': {}", file_path.display(), e))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut samples = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;

            let date_str = Self::get_field(&record, &headers, "Date")
                .ok_or_else(|| anyhow!("Missing 'Date' field in CSV record at line {}", line))?;
            let close_str = Self::get_field(&record, &headers, "Close")
                .ok_or_else(|| anyhow!("Missing 'Close' field in CSV record at line {}", line))?;

            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| anyhow!("Error parsing 'Date' at line {}: {}", line, e))?;
            let close = close_str
                .parse::<f64>()
                .map_err(|e| anyhow!("Error parsing 'Close' at line {}: {}", line, e))?;

            samples.push(PriceSample::new(date, close));
        }
        Ok(samples)
    }

    // Header lookup is case-insensitive so "date"/"close" exports also load.
    fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .and_then(|pos| record.get(pos))
    }
}
