//! Copyright © 2025 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Lei.
//! The Lei project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#![allow(non_snake_case)]

use std::path::{Path, PathBuf};

use Lei::ingest::{LeiCReaderOptions, LeiCRecordReader, LeiFDetectDelimiter};
use Lei::record::LeiCValue;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn LeiFTIngestJsonlKeepsFieldOrder() {
    let batch = LeiCRecordReader::LeiFNew()
        .LeiFLoad(&fixture("library_input.jsonl"))
        .unwrap();
    assert_eq!(batch.len(), 5);
    let names: Vec<&str> = batch[0].LeiFIter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        names,
        vec!["id", "Email", "code", "yr", "inn", "registered"]
    );
    assert_eq!(
        batch[0].LeiFGet("Email"),
        Some(&LeiCValue::Str("anna@example.com".to_string()))
    );
    assert_eq!(batch[0].LeiFGet("id"), Some(&LeiCValue::Int(1)));
}

#[test]
fn LeiFTIngestJsonlHonorsLimit() {
    let batch = LeiCRecordReader::LeiFNew()
        .LeiFWithOptions(LeiCReaderOptions {
            limit: 2,
            ..LeiCReaderOptions::default()
        })
        .LeiFLoad(&fixture("library_input.jsonl"))
        .unwrap();
    assert_eq!(batch.len(), 2);
}

#[test]
fn LeiFTIngestCsvSniffsDelimiter() {
    let batch = LeiCRecordReader::LeiFNew()
        .LeiFLoad(&fixture("sample.csv"))
        .unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(
        batch[0].LeiFGet("name"),
        Some(&LeiCValue::Str("Anna".to_string()))
    );
    assert_eq!(
        batch[2].LeiFGet("city"),
        Some(&LeiCValue::Str("Munich".to_string()))
    );
    // CSV cells stay strings; typing is the analyzer's job.
    assert_eq!(
        batch[0].LeiFGet("age"),
        Some(&LeiCValue::Str("34".to_string()))
    );
}

#[test]
fn LeiFTIngestUnsupportedExtension() {
    let err = LeiCRecordReader::LeiFNew()
        .LeiFLoad(Path::new("data.parquet"))
        .unwrap_err();
    assert!(matches!(err, Lei::LeiError::Config { .. }));
}

#[test]
fn LeiFTIngestDelimiterDetection() {
    assert_eq!(LeiFDetectDelimiter("a,b,c"), b',');
    assert_eq!(LeiFDetectDelimiter("a;b;c"), b';');
    assert_eq!(LeiFDetectDelimiter("a\tb\tc"), b'\t');
    assert_eq!(LeiFDetectDelimiter("a|b|c"), b'|');
}
