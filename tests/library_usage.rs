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

use std::path::Path;
use std::sync::Arc;

use Lei::classify::{LeiCClassifier, LeiCScanOptions};
use Lei::dates::{LeiCDatePattern, LeiCFormatDateParser};
use Lei::ingest::LeiCRecordReader;
use Lei::rules::LeiCRuleCatalog;

#[test]
fn library_end_to_end_classifies_dataset() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let fixture_path = manifest.join("tests/fixtures/library_input.jsonl");
    assert!(fixture_path.exists(), "expected fixture to exist");

    let batch = LeiCRecordReader::LeiFNew()
        .LeiFLoad(&fixture_path)
        .expect("load fixture");
    assert_eq!(batch.len(), 5, "fixture should contain five records");

    let catalog = LeiCRuleCatalog::LeiFLoad(&[manifest.join("tests/fixtures/rules")])
        .expect("load catalog");
    let dates = LeiCFormatDateParser::LeiFNew(vec![
        LeiCDatePattern::LeiFDate("iso.date", "%Y-%m-%d"),
        LeiCDatePattern::LeiFDateTime("iso.datetime", "%Y-%m-%d %H:%M:%S"),
    ]);
    let classifier =
        LeiCClassifier::LeiFNew(Arc::new(catalog)).LeiFWithDateParser(Arc::new(dates));

    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .expect("scan");

    let column = |name: &str| {
        report
            .data
            .iter()
            .find(|c| c.field == name)
            .unwrap_or_else(|| panic!("column {} missing", name))
    };

    // Field-name rule at full confidence.
    let email = column("Email");
    assert!(email
        .matches
        .iter()
        .any(|m| m.key == "email" && (m.confidence - 100.0).abs() < 1e-9));

    // Data text rule: 4 of 5 candidates accepted.
    let code = column("code");
    assert!(code
        .matches
        .iter()
        .any(|m| m.key == "countrycode_alpha2" && (m.confidence - 80.0).abs() < 1e-9));

    // Grammar rule: 3 of 5 candidates accepted.
    let yr = column("yr");
    assert!(yr
        .matches
        .iter()
        .any(|m| m.key == "year" && (m.confidence - 60.0).abs() < 1e-9));

    // Registered function rule over integer-typed identifiers.
    let inn = column("inn");
    assert!(inn
        .matches
        .iter()
        .any(|m| m.key == "ru_inn" && (m.confidence - 100.0).abs() < 1e-9));

    // Uniform date column resolves through the date pass with its format.
    let registered = column("registered");
    assert_eq!(registered.ftype.as_str(), "date");
    assert!(registered
        .matches
        .iter()
        .any(|m| m.rule_id == "iso.date" && m.format.as_deref() == Some("%Y-%m-%d")));

    // The flat projection carries one row per column, in field order.
    let fields: Vec<&str> = report.results.iter().map(|r| r.0.as_str()).collect();
    assert_eq!(
        fields,
        vec!["id", "Email", "code", "yr", "inn", "registered"]
    );

    // Catalog problems surface as issues without failing the scan.
    assert!(!report.issues.is_empty());
}
