//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Lei.
//! The Lei project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::errors::{LeiError, Result};
use crate::record::{LeiCRecord, LeiCRecordBatch, LeiCValue};

/// Reader options.
#[derive(Clone, Debug)]
pub struct LeiCReaderOptions {
    /// Maximum records loaded from one file.
    pub limit: usize,
    /// Explicit CSV delimiter; sniffed from the header line when unset.
    pub delimiter: Option<u8>,
}

impl Default for LeiCReaderOptions {
    fn default() -> Self {
        LeiCReaderOptions {
            limit: 1000,
            delimiter: None,
        }
    }
}

/// Loads row-dictionary batches from files by extension.
#[derive(Clone, Debug, Default)]
pub struct LeiCRecordReader {
    options: LeiCReaderOptions,
}

impl LeiCRecordReader {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCRecordReader::default()
    }

    #[allow(non_snake_case)]
    pub fn LeiFWithOptions(mut self, options: LeiCReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Dispatches on the file extension.
    #[allow(non_snake_case)]
    pub fn LeiFLoad(&self, path: &Path) -> Result<LeiCRecordBatch> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "jsonl" | "ndjson" => self.LeiFLoadJsonl(path),
            "json" => self.LeiFLoadJson(path),
            "csv" => self.LeiFLoadCsv(path),
            "tsv" => {
                let mut reader = self.clone();
                if reader.options.delimiter.is_none() {
                    reader.options.delimiter = Some(b'\t');
                }
                reader.LeiFLoadCsv(path)
            }
            other => Err(LeiError::config(format!(
                "unsupported file type '{}'; supported types are csv, tsv, json, jsonl, ndjson",
                other
            ))),
        }
    }

    /// One JSON object per line.
    #[allow(non_snake_case)]
    pub fn LeiFLoadJsonl(&self, path: &Path) -> Result<LeiCRecordBatch> {
        let file = File::open(path)?;
        let mut batch = LeiCRecordBatch::new();
        for line in BufReader::new(file).lines() {
            if batch.len() >= self.options.limit {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line).map_err(|err| {
                LeiError::file_parse(path.display().to_string(), err.to_string())
            })?;
            batch.push(LeiCRecord::LeiFFromJson(&value));
        }
        Ok(batch)
    }

    /// A single JSON array of objects.
    #[allow(non_snake_case)]
    pub fn LeiFLoadJson(&self, path: &Path) -> Result<LeiCRecordBatch> {
        let file = File::open(path)?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| LeiError::file_parse(path.display().to_string(), err.to_string()))?;
        let items = value.as_array().ok_or_else(|| {
            LeiError::file_parse(
                path.display().to_string(),
                "expected a JSON array of objects".to_string(),
            )
        })?;
        Ok(items
            .iter()
            .take(self.options.limit)
            .map(LeiCRecord::LeiFFromJson)
            .collect())
    }

    /// Header-driven CSV; every cell arrives as a string value and type
    /// inference is left to the analyzer.
    #[allow(non_snake_case)]
    pub fn LeiFLoadCsv(&self, path: &Path) -> Result<LeiCRecordBatch> {
        let delimiter = match self.options.delimiter {
            Some(d) => d,
            None => {
                let file = File::open(path)?;
                let mut first_line = String::new();
                BufReader::new(file).read_line(&mut first_line)?;
                LeiFDetectDelimiter(&first_line)
            }
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|err| LeiError::file_parse(path.display().to_string(), err.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|err| LeiError::file_parse(path.display().to_string(), err.to_string()))?
            .clone();

        let mut batch = LeiCRecordBatch::new();
        for row in reader.records() {
            if batch.len() >= self.options.limit {
                break;
            }
            let row = row
                .map_err(|err| LeiError::file_parse(path.display().to_string(), err.to_string()))?;
            let mut record = LeiCRecord::LeiFNew();
            for (idx, cell) in row.iter().enumerate() {
                let name = headers
                    .get(idx)
                    .map(|h| h.to_string())
                    .unwrap_or_else(|| format!("column_{}", idx));
                record.LeiFInsert(name, LeiCValue::Str(cell.to_string()));
            }
            batch.push(record);
        }
        Ok(batch)
    }
}

/// Picks the most frequent of `, ; \t |` in the header line.
#[allow(non_snake_case)]
pub fn LeiFDetectDelimiter(line: &str) -> u8 {
    let candidates: [(u8, usize); 4] = [
        (b',', line.matches(',').count()),
        (b';', line.matches(';').count()),
        (b'\t', line.matches('\t').count()),
        (b'|', line.matches('|').count()),
    ];
    candidates
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(delim, _)| *delim)
        .unwrap_or(b',')
}
