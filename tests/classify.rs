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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use Lei::classify::{LeiCCancelToken, LeiCClassifier, LeiCScanOptions};
use Lei::dates::{LeiCDatePattern, LeiCFormatDateParser};
use Lei::errors::LeiError;
use Lei::record::{LeiCRecordBatch, LeiFBatchFromJson};
use Lei::rules::LeiCRuleCatalog;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rules")
}

fn fixture_classifier() -> LeiCClassifier {
    let catalog = LeiCRuleCatalog::LeiFLoad(&[fixtures()]).unwrap();
    LeiCClassifier::LeiFNew(Arc::new(catalog))
}

static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

fn write_rules_dir(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "lei-classify-{}-{}-{}",
        std::process::id(),
        name,
        DIR_SEQ.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).expect("create temp rules dir");
    std::fs::write(dir.join("rules.yaml"), content).expect("write rules file");
    dir
}

fn column_batch(field: &str, values: &[&str]) -> LeiCRecordBatch {
    let rows: Vec<serde_json::Value> = values.iter().map(|v| json!({ field: v })).collect();
    LeiFBatchFromJson(&rows)
}

// S1: a text field rule matches the column name at full confidence.
#[test]
fn LeiFTClassifyEmailByFieldName() {
    let classifier = fixture_classifier();
    let batch = LeiFBatchFromJson(&[json!({"Email": "a@b"}), json!({"Email": "c@d"})]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    assert_eq!(report.data.len(), 1);
    let column = &report.data[0];
    assert_eq!(column.field, "Email");
    assert_eq!(column.matches.len(), 1);
    assert_eq!(column.matches[0].key, "email");
    assert_eq!(column.matches[0].rule_type, "field");
    assert!((column.matches[0].confidence - 100.0).abs() < f64::EPSILON);
    assert_eq!(
        column.datatype_url.as_deref(),
        Some("https://registry.apicrafter.io/datatype/email")
    );
}

// S2: data text rule confidence is the share of accepted candidates.
#[test]
fn LeiFTClassifyCountryCodeConfidence() {
    let classifier = fixture_classifier();
    let batch = column_batch("code", &["us", "ca", "de", "zz", "fr"]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    let column = &report.data[0];
    assert_eq!(column.matches.len(), 1);
    let m = &column.matches[0];
    assert_eq!(m.key, "countrycode_alpha2");
    assert_eq!(m.rule_type, "data");
    assert!((m.confidence - 80.0).abs() < 1e-9);
}

// S3: the year grammar with the longest-alternative operator.
#[test]
fn LeiFTClassifyYearGrammar() {
    let classifier = fixture_classifier();
    let batch = column_batch("yr", &["1999", "2012", "2100", "2200", "abcd"]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    let column = &report.data[0];
    assert_eq!(column.matches.len(), 1);
    let m = &column.matches[0];
    assert_eq!(m.key, "year");
    assert!((m.confidence - 60.0).abs() < 1e-9);
}

#[test]
fn LeiFTClassifyThresholdIsInclusive() {
    let classifier = fixture_classifier();
    let batch = column_batch("yr", &["1999", "2012", "2100", "2200", "abcd"]);
    let exactly = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                confidence_threshold: 60.0,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert_eq!(exactly.data[0].matches.len(), 1);

    let above = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                confidence_threshold: 60.5,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert!(above.data[0].matches.is_empty());
}

// S4: imprecise rules only fire when the caller opts in.
#[test]
fn LeiFTClassifyImpreciseGating() {
    let dir = write_rules_dir(
        "imprecise",
        r#"name: loose
description: imprecise country rule
context: geo
lang: common
rules:
  countrycode_loose:
    key: countrycode_alpha2
    name: Loose country code
    type: data
    match: text
    rule: us,ca,de,fr
    imprecise: 1
"#,
    );
    let catalog = Arc::new(LeiCRuleCatalog::LeiFLoad(&[dir]).unwrap());
    let classifier = LeiCClassifier::LeiFNew(catalog);
    let batch = column_batch("code", &["us", "ca", "de", "zz", "fr"]);

    let default_scan = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    assert!(default_scan.data[0].matches.is_empty());

    let opted_in = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                ignore_imprecise: false,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert_eq!(opted_in.data[0].matches.len(), 1);
    assert!((opted_in.data[0].matches[0].confidence - 80.0).abs() < 1e-9);
}

// S5: stop_on_match keeps only the first data match in rule order.
#[test]
fn LeiFTClassifyStopOnMatch() {
    let dir = write_rules_dir(
        "stop",
        r#"name: stop
description: two overlapping rules
context: common
lang: common
rules:
  wide:
    key: wide
    type: data
    match: text
    rule: a1,a2,a3,a4,a5,a6,a7,a8,a9
    minlen: 2
    maxlen: 3
  narrow:
    key: narrow
    type: data
    match: text
    rule: a1,a2,a3,a4,a5,a6,a7,a8
    minlen: 2
    maxlen: 3
"#,
    );
    let catalog = Arc::new(LeiCRuleCatalog::LeiFLoad(&[dir]).unwrap());
    let classifier = LeiCClassifier::LeiFNew(catalog);
    let batch = column_batch(
        "x",
        &["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10"],
    );

    let both = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    let keys: Vec<&str> = both.data[0]
        .matches
        .iter()
        .map(|m| m.key.as_str())
        .collect();
    assert_eq!(keys, vec!["wide", "narrow"]);
    assert!((both.data[0].matches[0].confidence - 90.0).abs() < 1e-9);
    assert!((both.data[0].matches[1].confidence - 80.0).abs() < 1e-9);

    let first_only = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                stop_on_match: true,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert_eq!(first_only.data[0].matches.len(), 1);
    assert_eq!(first_only.data[0].matches[0].key, "wide");
}

// Property 6: a gated data rule fires iff its field rule accepts the
// column name, case-insensitively.
#[test]
fn LeiFTClassifyFieldRuleGating() {
    let classifier = fixture_classifier();
    let values = ["112-233-445-95", "112-233-445-95"];

    let gated = classifier
        .LeiFScan(&column_batch("SNILS", &values), &LeiCScanOptions::default())
        .unwrap();
    assert!(gated.data[0]
        .matches
        .iter()
        .any(|m| m.key == "ru_snils" && (m.confidence - 100.0).abs() < 1e-9));

    let ungated = classifier
        .LeiFScan(&column_batch("other", &values), &LeiCScanOptions::default())
        .unwrap();
    assert!(!ungated.data[0].matches.iter().any(|m| m.key == "ru_snils"));
}

// A validator failure must turn a grammar hit into a miss.
#[test]
fn LeiFTClassifyValidatorRejectsBadChecksum() {
    let classifier = fixture_classifier();
    let batch = column_batch("snils", &["112-233-445-96", "112-233-445-96"]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    assert!(!report.data[0].matches.iter().any(|m| m.key == "ru_snils"));
}

// Property 1: identical inputs produce byte-identical reports.
#[test]
fn LeiFTClassifyDeterminism() {
    let classifier = fixture_classifier();
    let batch = LeiFBatchFromJson(&[
        json!({"Email": "a@b.co", "code": "us", "yr": "1999", "inn": "7707083893"}),
        json!({"Email": "c@d.co", "code": "zz", "yr": "2012", "inn": "7830002293"}),
        json!({"Email": "e@f.co", "code": "de", "yr": "abcd", "inn": "7707083893"}),
    ]);
    let options = LeiCScanOptions::default();
    let first = classifier.LeiFScan(&batch, &options).unwrap();
    let second = classifier.LeiFScan(&batch, &options).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// Property 5: every reported confidence lies in [threshold, 100].
#[test]
fn LeiFTClassifyConfidenceBounds() {
    let classifier = fixture_classifier();
    let batch = LeiFBatchFromJson(&[
        json!({"code": "us", "yr": "1999"}),
        json!({"code": "ca", "yr": "2012"}),
        json!({"code": "zz", "yr": "abcd"}),
        json!({"code": "de", "yr": "2100"}),
    ]);
    let options = LeiCScanOptions {
        confidence_threshold: 50.0,
        ..LeiCScanOptions::default()
    };
    let report = classifier.LeiFScan(&batch, &options).unwrap();
    let mut reported = 0;
    for column in &report.data {
        for m in &column.matches {
            reported += 1;
            assert!(m.confidence >= 50.0 && m.confidence <= 100.0);
        }
    }
    assert!(reported > 0);
}

#[test]
fn LeiFTClassifyExceptEmptyDenominator() {
    let classifier = fixture_classifier();
    let rows = vec![
        json!({"code": "us"}),
        json!({"code": "us"}),
        json!({"code": ""}),
        json!({"code": null}),
        json!({"code": "N/A"}),
    ];
    let batch = LeiFBatchFromJson(&rows);

    let except = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    let m = &except.data[0].matches[0];
    assert!((m.confidence - 100.0).abs() < 1e-9);

    let counted = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                except_empty: false,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    let m = &counted.data[0].matches[0];
    assert!((m.confidence - 40.0).abs() < 1e-9);
}

#[test]
fn LeiFTClassifyFieldsAllowList() {
    let classifier = fixture_classifier();
    let batch = LeiFBatchFromJson(&[json!({"code": "us", "yr": "1999"})]);
    let report = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                fields: Some(vec!["code".to_string()]),
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert_eq!(report.data.len(), 1);
    assert_eq!(report.data[0].field, "code");
    // Stats still cover every sampled field.
    assert_eq!(report.stats.len(), 2);
}

#[test]
fn LeiFTClassifyBooleanAndFloatShortcuts() {
    let classifier = fixture_classifier();
    let batch = LeiFBatchFromJson(&[
        json!({"active": true, "price": 1.5}),
        json!({"active": false, "price": 2.25}),
    ]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    let active = report.data.iter().find(|c| c.field == "active").unwrap();
    assert_eq!(active.matches.len(), 1);
    assert_eq!(active.matches[0].rule_type, "fieldtype");
    assert_eq!(active.matches[0].key, "boolean");

    let price = report.data.iter().find(|c| c.field == "price").unwrap();
    assert!(price.matches.is_empty());
}

#[test]
fn LeiFTClassifyDatePassPerPattern() {
    let parser = LeiCFormatDateParser::LeiFNew(vec![
        LeiCDatePattern::LeiFDate("iso.date", "%Y-%m-%d"),
        LeiCDatePattern::LeiFDate("dot.date", "%d.%m.%Y"),
    ]);
    let classifier = fixture_classifier().LeiFWithDateParser(Arc::new(parser));

    // Uniform date column: inferred as date, per-pattern match at 100.
    let uniform = column_batch("d", &["2021-03-05", "2020-11-17"]);
    let report = classifier
        .LeiFScan(&uniform, &LeiCScanOptions::default())
        .unwrap();
    let column = &report.data[0];
    assert_eq!(column.ftype.as_str(), "date");
    assert_eq!(column.matches.len(), 1);
    let m = &column.matches[0];
    assert_eq!(m.rule_id, "iso.date");
    assert_eq!(m.key, "datetime");
    assert_eq!(m.format.as_deref(), Some("%Y-%m-%d"));
    assert!((m.confidence - 100.0).abs() < 1e-9);

    // Mixed column: one match per detected pattern, ordered by first
    // detection, confidences proportional to hits.
    let mixed = column_batch(
        "d",
        &["2021-03-05", "2020-11-17", "2019-06-02", "05.03.2021", "hello"],
    );
    let report = classifier
        .LeiFScan(&mixed, &LeiCScanOptions::default())
        .unwrap();
    let column = &report.data[0];
    let ids: Vec<&str> = column.matches.iter().map(|m| m.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["iso.date", "dot.date"]);
    assert!((column.matches[0].confidence - 60.0).abs() < 1e-9);
    assert!((column.matches[1].confidence - 20.0).abs() < 1e-9);

    // Date matches render with their pattern and format token.
    let row = &report.results[0];
    assert!(row.3.contains("(dt:iso.date:%Y-%m-%d)"), "row: {:?}", row);

    // Disabling the date pass removes date matches.
    let disabled = classifier
        .LeiFScan(
            &mixed,
            &LeiCScanOptions {
                parse_dates: false,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap();
    assert!(disabled.data[0].matches.is_empty());
}

#[test]
fn LeiFTClassifyCancellationDiscardsScan() {
    let classifier = fixture_classifier();
    let batch = column_batch("code", &["us", "ca"]);
    let token = LeiCCancelToken::LeiFNew();
    token.LeiFCancel();
    let err = classifier
        .LeiFScanCancellable(&batch, &LeiCScanOptions::default(), Some(&token))
        .unwrap_err();
    assert!(matches!(err, LeiError::Cancelled));
}

#[test]
fn LeiFTClassifyInvalidOptionsRejectedUpfront() {
    let classifier = fixture_classifier();
    let batch = column_batch("code", &["us"]);
    let err = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                confidence_threshold: 150.0,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LeiError::Config { .. }));

    let err = classifier
        .LeiFScan(
            &batch,
            &LeiCScanOptions {
                limit: 0,
                ..LeiCScanOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LeiError::Config { .. }));
}

#[test]
fn LeiFTClassifyCatalogIssuesRideAlong() {
    let classifier = fixture_classifier();
    let batch = column_batch("code", &["us"]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.kind == "rule.compile.unsafe"));
}

#[test]
fn LeiFTClassifyResultRowsProjection() {
    let classifier = fixture_classifier();
    let batch = column_batch("code", &["us", "ca", "de", "zz", "fr"]);
    let report = classifier
        .LeiFScan(&batch, &LeiCScanOptions::default())
        .unwrap();
    assert_eq!(report.results.len(), 1);
    let row = &report.results[0];
    assert_eq!(row.0, "code");
    assert_eq!(row.1, "str");
    assert_eq!(row.3, "countrycode_alpha2 80.00");
    assert_eq!(
        row.4,
        "https://registry.apicrafter.io/datatype/countrycode_alpha2"
    );
}
