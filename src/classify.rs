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

//! # Lei Classification Engine
//!
//! Composes the rule catalog, the field analyzer and the date parser into
//! per-field semantic datatype detection. For every column the engine runs
//! a field-name pass (matching rules score 100), a gated data-value pass
//! (confidence is the share of accepted candidates) and a date pass
//! (per-pattern confidences), then assembles a priority-sorted report.
//!
//! The engine is re-entrant: the catalog and compiled matchers are
//! immutable, all per-scan state lives on the stack of the scanning
//! thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analyze::{LeiCAnalyzer, LeiCAnalyzerOptions, LeiCFieldStat, LeiCFieldType};
use crate::dates::LeiCDateParser;
use crate::errors::{LeiError, Result};
use crate::log::{LeiCLogLevel, LeiCLogger};
use crate::record::{LeiCRecordBatch, LeiCValue, LeiFColumns};
use crate::rules::{
    LeiCRule, LeiCRuleCatalog, LeiCRuleFilter, LeiCRuleIssue, LeiCRuleMatcher, LeiCRuleView,
    LeiFDatatypeUrl,
};

/// Cooperative cancellation signal, checked between fields and between
/// rules. A tripped scan returns [`LeiError::Cancelled`] and discards all
/// partial state.
#[derive(Clone, Debug, Default)]
pub struct LeiCCancelToken(Arc<AtomicBool>);

impl LeiCCancelToken {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCCancelToken::default()
    }

    #[allow(non_snake_case)]
    pub fn LeiFCancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[allow(non_snake_case)]
    pub fn LeiFIsCancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Scan options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeiCScanOptions {
    /// Maximum rows consumed from the record source.
    pub limit: usize,
    /// Minimum confidence a match must reach to be reported, in [0, 100].
    pub confidence_threshold: f64,
    /// Stop after the first data-rule match per field.
    pub stop_on_match: bool,
    /// Whether the date pass runs.
    pub parse_dates: bool,
    /// Whether imprecise rules are excluded.
    pub ignore_imprecise: bool,
    /// Whether empty values are excluded from confidence denominators.
    pub except_empty: bool,
    /// Optional allow-list of field names; other fields are skipped.
    pub fields: Option<Vec<String>>,
    /// Context filters; empty means no restriction.
    pub contexts: Vec<String>,
    /// Language filters; empty means no restriction.
    pub langs: Vec<String>,
    /// Country filters; empty means no restriction.
    pub countries: Vec<String>,
    /// Dictionary detection threshold forwarded to the analyzer.
    pub dict_share: f64,
}

impl Default for LeiCScanOptions {
    fn default() -> Self {
        LeiCScanOptions {
            limit: 1000,
            confidence_threshold: 5.0,
            stop_on_match: false,
            parse_dates: true,
            ignore_imprecise: true,
            except_empty: true,
            fields: None,
            contexts: Vec::new(),
            langs: Vec::new(),
            countries: Vec::new(),
            dict_share: 10.0,
        }
    }
}

impl LeiCScanOptions {
    /// Validates option ranges before a scan begins.
    #[allow(non_snake_case)]
    pub fn LeiFValidate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(LeiError::config(format!(
                "confidence_threshold {} is outside [0, 100]",
                self.confidence_threshold
            )));
        }
        if self.limit == 0 {
            return Err(LeiError::config("limit must be positive"));
        }
        if self.dict_share <= 0.0 || self.dict_share > 100.0 {
            return Err(LeiError::config(format!(
                "dict_share {} is outside (0, 100]",
                self.dict_share
            )));
        }
        Ok(())
    }

    /// Rule filter projection of these options.
    #[allow(non_snake_case)]
    pub fn LeiFRuleFilter(&self) -> LeiCRuleFilter {
        LeiCRuleFilter {
            contexts: self.contexts.clone(),
            langs: self.langs.clone(),
            countries: self.countries.clone(),
            ignore_imprecise: self.ignore_imprecise,
        }
    }

    fn analyzer_options(&self) -> LeiCAnalyzerOptions {
        LeiCAnalyzerOptions {
            limit: self.limit,
            dict_share: self.dict_share,
            except_empty: self.except_empty,
            ..LeiCAnalyzerOptions::default()
        }
    }
}

/// One reported rule match for a column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeiCMatchResult {
    pub rule_id: String,
    /// Semantic datatype key.
    pub key: String,
    /// "field", "data" or "fieldtype".
    pub rule_type: String,
    /// Confidence percentage in [0, 100].
    pub confidence: f64,
    /// Date format token, present only for date matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub is_pii: bool,
    pub priority: i64,
}

impl LeiCMatchResult {
    /// URL of the public registry entry for the matched datatype.
    #[allow(non_snake_case)]
    pub fn LeiFClassUrl(&self) -> String {
        LeiFDatatypeUrl(&self.key)
    }
}

/// Classification report for one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeiCColumnReport {
    pub field: String,
    pub ftype: LeiCFieldType,
    pub tags: Vec<String>,
    pub matches: Vec<LeiCMatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype_url: Option<String>,
}

/// One row of the flat result projection:
/// `(field, ftype, tags_csv, matches_csv, datatype_url)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeiCResultRow(pub String, pub String, pub String, pub String, pub String);

/// Complete result of one scan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeiCScanReport {
    /// Flat table projection, one row per reported column.
    pub results: Vec<LeiCResultRow>,
    /// Structured per-column reports.
    pub data: Vec<LeiCColumnReport>,
    /// Analyzer statistics for every sampled field.
    pub stats: Vec<LeiCFieldStat>,
    /// Catalog and runtime issues encountered; never fatal.
    pub issues: Vec<LeiCRuleIssue>,
}

/// The classification engine. Cheap to clone; safe to share across scan
/// threads together with its catalog.
#[derive(Clone, Debug)]
pub struct LeiCClassifier {
    catalog: Arc<LeiCRuleCatalog>,
    dates: Option<Arc<dyn LeiCDateParser>>,
}

impl LeiCClassifier {
    #[allow(non_snake_case)]
    pub fn LeiFNew(catalog: Arc<LeiCRuleCatalog>) -> Self {
        LeiCClassifier {
            catalog,
            dates: None,
        }
    }

    #[allow(non_snake_case)]
    pub fn LeiFWithDateParser(mut self, dates: Arc<dyn LeiCDateParser>) -> Self {
        self.dates = Some(dates);
        self
    }

    #[allow(non_snake_case)]
    pub fn LeiFCatalog(&self) -> &Arc<LeiCRuleCatalog> {
        &self.catalog
    }

    /// Runs a full scan: analyze, select rules, match, assemble.
    #[allow(non_snake_case)]
    pub fn LeiFScan(
        &self,
        batch: &LeiCRecordBatch,
        options: &LeiCScanOptions,
    ) -> Result<LeiCScanReport> {
        self.LeiFScanCancellable(batch, options, None)
    }

    /// Like [`LeiCClassifier::LeiFScan`] with a cooperative cancellation
    /// token. A tripped token fails the scan; no partial report escapes.
    #[allow(non_snake_case)]
    pub fn LeiFScanCancellable(
        &self,
        batch: &LeiCRecordBatch,
        options: &LeiCScanOptions,
        cancel: Option<&LeiCCancelToken>,
    ) -> Result<LeiCScanReport> {
        options.LeiFValidate()?;

        let mut analyzer = LeiCAnalyzer::LeiFNew().LeiFWithOptions(options.analyzer_options());
        if options.parse_dates {
            if let Some(dates) = &self.dates {
                analyzer = analyzer.LeiFWithDateParser(Arc::clone(dates));
            }
        }
        let stats = analyzer.LeiFAnalyze(batch);
        let view = self.catalog.LeiFSelect(&options.LeiFRuleFilter());
        let mut issues = self.catalog.LeiFIssues().to_vec();

        let data = self.match_columns(batch, &stats, &view, options, cancel, &mut issues)?;
        let results = data.iter().map(_LeiFResultRow).collect();

        LeiCLogger::LeiFEvent(
            LeiCLogLevel::Info,
            "scan.done",
            "scan finished",
            [
                ("fields".to_string(), serde_json::json!(stats.len())),
                (
                    "matched".to_string(),
                    serde_json::json!(data.iter().filter(|c| !c.matches.is_empty()).count()),
                ),
            ],
        );

        Ok(LeiCScanReport {
            results,
            data,
            stats,
            issues,
        })
    }

    /// Core matching pass over precomputed statistics and a rule view.
    /// Exposed for callers that manage analysis and rule selection
    /// themselves.
    #[allow(non_snake_case)]
    pub fn LeiFMatchColumns(
        &self,
        batch: &LeiCRecordBatch,
        stats: &[LeiCFieldStat],
        view: &LeiCRuleView,
        options: &LeiCScanOptions,
        cancel: Option<&LeiCCancelToken>,
    ) -> Result<Vec<LeiCColumnReport>> {
        options.LeiFValidate()?;
        let mut issues = Vec::new();
        self.match_columns(batch, stats, view, options, cancel, &mut issues)
    }

    fn match_columns(
        &self,
        batch: &LeiCRecordBatch,
        stats: &[LeiCFieldStat],
        view: &LeiCRuleView,
        options: &LeiCScanOptions,
        cancel: Option<&LeiCCancelToken>,
        issues: &mut Vec<LeiCRuleIssue>,
    ) -> Result<Vec<LeiCColumnReport>> {
        let columns = LeiFColumns(batch, options.limit);
        let empty_column: Vec<LeiCValue> = Vec::new();
        let analyzer_options = options.analyzer_options();
        let mut reports = Vec::with_capacity(stats.len());

        for stat in stats {
            if let Some(allowed) = &options.fields {
                if !allowed.iter().any(|f| f == &stat.field) {
                    continue;
                }
            }
            _LeiFCheckCancel(cancel)?;

            let values = columns.get(&stat.field).unwrap_or(&empty_column);
            let short_field = stat
                .field
                .rsplit('.')
                .next()
                .unwrap_or(stat.field.as_str())
                .trim()
                .to_string();
            let mut matches: Vec<LeiCMatchResult> = Vec::new();

            // Field-name pass: a satisfied field rule is a full-confidence
            // match.
            for rule in view.LeiFFieldRules() {
                _LeiFCheckCancel(cancel)?;
                if _LeiFFieldNameMatches(&rule.matcher, &short_field, &stat.field) {
                    matches.push(_LeiFRuleMatch(rule, "field", 100.0, None));
                    if options.stop_on_match {
                        break;
                    }
                }
            }

            // Fields whose primitive type already settles the question
            // skip the data pass entirely.
            let mut run_data_pass = true;
            let run_date_pass = options.parse_dates
                && matches!(stat.ftype, LeiCFieldType::Str | LeiCFieldType::Date);
            match stat.ftype {
                LeiCFieldType::Bool => {
                    matches.push(_LeiFFieldTypeMatch("_int_fieldtype_boolean", "boolean"));
                    run_data_pass = false;
                }
                LeiCFieldType::Float => {
                    run_data_pass = false;
                }
                LeiCFieldType::Date => {
                    run_data_pass = false;
                }
                _ => {}
            }

            if run_data_pass {
                for rule in view.LeiFDataRules() {
                    _LeiFCheckCancel(cancel)?;
                    if let Some(gate) = &rule.field_gate {
                        if !_LeiFFieldNameMatches(gate, &short_field, &stat.field) {
                            continue;
                        }
                    }
                    if let Some(result) =
                        _LeiFEvaluateDataRule(rule, values, options, &analyzer_options, issues)
                    {
                        matches.push(result);
                        if options.stop_on_match {
                            break;
                        }
                    }
                }
            }

            if run_date_pass {
                if let Some(dates) = &self.dates {
                    _LeiFDatePass(
                        dates.as_ref(),
                        values,
                        options,
                        &analyzer_options,
                        &mut matches,
                    );
                }
            }

            matches.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
            });
            let datatype_url = matches.first().map(|m| m.LeiFClassUrl());

            reports.push(LeiCColumnReport {
                field: stat.field.clone(),
                ftype: stat.ftype,
                tags: stat.tags.clone(),
                matches,
                datatype_url,
            });
        }
        Ok(reports)
    }
}

fn _LeiFCheckCancel(cancel: Option<&LeiCCancelToken>) -> Result<()> {
    match cancel {
        Some(token) if token.LeiFIsCancelled() => Err(LeiError::Cancelled),
        _ => Ok(()),
    }
}

/// Field rules and field gates test the trailing path segment first, then
/// the full dotted field name; text matching is case-insensitive.
fn _LeiFFieldNameMatches(matcher: &LeiCRuleMatcher, short_field: &str, field: &str) -> bool {
    let hit = matcher.LeiFMatches(&short_field.to_lowercase()).unwrap_or(false);
    if hit {
        return true;
    }
    matcher.LeiFMatches(&field.to_lowercase()).unwrap_or(false)
}

fn _LeiFRuleMatch(
    rule: &LeiCRule,
    rule_type: &str,
    confidence: f64,
    format: Option<String>,
) -> LeiCMatchResult {
    LeiCMatchResult {
        rule_id: rule.id.clone(),
        key: rule.key.clone(),
        rule_type: rule_type.to_string(),
        confidence,
        format,
        is_pii: rule.is_pii,
        priority: rule.priority,
    }
}

fn _LeiFFieldTypeMatch(rule_id: &str, key: &str) -> LeiCMatchResult {
    LeiCMatchResult {
        rule_id: rule_id.to_string(),
        key: key.to_string(),
        rule_type: "fieldtype".to_string(),
        confidence: 100.0,
        format: None,
        is_pii: false,
        priority: 0,
    }
}

/// Evaluates one data rule over a column sample, returning a match when
/// the confidence threshold is reached.
fn _LeiFEvaluateDataRule(
    rule: &LeiCRule,
    values: &[LeiCValue],
    options: &LeiCScanOptions,
    analyzer_options: &LeiCAnalyzerOptions,
    issues: &mut Vec<LeiCRuleIssue>,
) -> Option<LeiCMatchResult> {
    let mut hits = 0usize;
    let mut considered = 0usize;
    let mut errors = 0usize;

    for value in values {
        let text = value.LeiFToText();
        if value.LeiFIsNull() || analyzer_options.LeiFIsEmptyText(&text) {
            if !options.except_empty {
                considered += 1;
            }
            continue;
        }
        // Length filter applies before matching; out-of-window values are
        // not candidates.
        if !rule.LeiFLengthAccepts(text.chars().count()) {
            continue;
        }
        considered += 1;
        match rule.matcher.LeiFMatches(&text) {
            Ok(true) => {
                let valid = match &rule.validator {
                    Some(validator) => (validator.func)(&text).unwrap_or(false),
                    None => true,
                };
                if valid {
                    hits += 1;
                }
            }
            Ok(false) => {}
            Err(err) => {
                errors += 1;
                // A rule failing on most of its candidates is degraded and
                // stops consuming the sample.
                if errors * 2 > considered {
                    log::warn!("rule '{}' degraded: {}", rule.id, err);
                    issues.push(LeiCRuleIssue {
                        file: rule.group.clone(),
                        rule_id: Some(rule.id.clone()),
                        kind: "rule.degraded".to_string(),
                        detail: err.to_string(),
                    });
                    return None;
                }
            }
        }
    }

    let confidence = hits as f64 * 100.0 / considered.max(1) as f64;
    if hits > 0 && confidence >= options.confidence_threshold {
        Some(_LeiFRuleMatch(rule, "data", confidence, None))
    } else {
        None
    }
}

/// Date pass: per-pattern hit counting over the sampled values. One match
/// is emitted per detected pattern that clears the threshold, carrying the
/// pattern's format token.
fn _LeiFDatePass(
    dates: &dyn LeiCDateParser,
    values: &[LeiCValue],
    options: &LeiCScanOptions,
    analyzer_options: &LeiCAnalyzerOptions,
    matches: &mut Vec<LeiCMatchResult>,
) {
    let mut considered = 0usize;
    let mut order: Vec<(String, String)> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for value in values {
        let text = value.LeiFToText();
        if value.LeiFIsNull() || analyzer_options.LeiFIsEmptyText(&text) {
            if !options.except_empty {
                considered += 1;
            }
            continue;
        }
        considered += 1;
        if let Some(detected) = dates.match_date(&text) {
            if !counts.contains_key(&detected.pattern_id) {
                order.push((detected.pattern_id.clone(), detected.format.clone()));
            }
            *counts.entry(detected.pattern_id).or_insert(0) += 1;
        }
    }

    for (pattern_id, format) in order {
        let hits = counts.get(&pattern_id).copied().unwrap_or(0);
        let confidence = hits as f64 * 100.0 / considered.max(1) as f64;
        if hits > 0 && confidence >= options.confidence_threshold {
            matches.push(LeiCMatchResult {
                rule_id: pattern_id,
                key: "datetime".to_string(),
                rule_type: "data".to_string(),
                confidence,
                format: Some(format),
                is_pii: false,
                priority: 0,
            });
        }
    }
}

/// Flat projection of one column report.
fn _LeiFResultRow(report: &LeiCColumnReport) -> LeiCResultRow {
    let matches = report
        .matches
        .iter()
        .map(|m| {
            let mut cell = format!("{} {:.2}", m.key, m.confidence);
            if let Some(format) = &m.format {
                cell.push_str(&format!(" (dt:{}:{})", m.rule_id, format));
            }
            cell
        })
        .collect::<Vec<_>>()
        .join(",");
    LeiCResultRow(
        report.field.clone(),
        report.ftype.as_str().to_string(),
        report.tags.join(","),
        matches,
        report.datatype_url.clone().unwrap_or_default(),
    )
}
