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

//! # Lei Field Analyzer
//!
//! Computes per-field statistics over a bounded sample of records: a
//! primitive type inferred from the values (widened to string on
//! disagreement), string-length statistics, uniqueness, character-class
//! flags and dictionary detection. The classification engine consumes
//! these statistics to pick candidate rules and to tag columns.
//!
//! All statistics are deterministic for a fixed record iteration order
//! and limit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dates::LeiCDateParser;
use crate::record::{LeiCRecordBatch, LeiCValue};

/// Primitive field type inferred from sampled values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeiCFieldType {
    Str,
    Int,
    Float,
    Bool,
    Date,
    Other,
}

impl LeiCFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeiCFieldType::Str => "str",
            LeiCFieldType::Int => "int",
            LeiCFieldType::Float => "float",
            LeiCFieldType::Bool => "bool",
            LeiCFieldType::Date => "date",
            LeiCFieldType::Other => "other",
        }
    }
}

/// Analyzer options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeiCAnalyzerOptions {
    /// Maximum rows sampled per scan.
    pub limit: usize,
    /// Dictionary detection threshold: a field is a dictionary when
    /// `unique / non_empty * 100 <= dict_share`.
    pub dict_share: f64,
    /// Tokens treated as empty in addition to null and the empty string.
    pub empty_values: Vec<String>,
    /// Whether confidence denominators downstream exclude empties.
    pub except_empty: bool,
    /// Retention cap for dictionary value sets.
    pub dict_values_cap: usize,
}

impl Default for LeiCAnalyzerOptions {
    fn default() -> Self {
        LeiCAnalyzerOptions {
            limit: 1000,
            dict_share: 10.0,
            empty_values: vec![
                "None".to_string(),
                "NaN".to_string(),
                "-".to_string(),
                "N/A".to_string(),
            ],
            except_empty: true,
            dict_values_cap: 256,
        }
    }
}

impl LeiCAnalyzerOptions {
    /// Whether a stringified value counts as empty.
    #[allow(non_snake_case)]
    pub fn LeiFIsEmptyText(&self, text: &str) -> bool {
        text.is_empty() || self.empty_values.iter().any(|token| token == text)
    }
}

/// Statistical summary of one field over the sampled records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeiCFieldStat {
    pub field: String,
    pub ftype: LeiCFieldType,
    /// Sampled occurrences (including empties).
    pub count: usize,
    pub non_empty: usize,
    /// Distinct non-empty string forms.
    pub unique: usize,
    pub share_unique: f64,
    pub min_len: usize,
    pub max_len: usize,
    pub avg_len: f64,
    pub has_digit: bool,
    pub has_alpha: bool,
    pub has_special: bool,
    pub is_dictionary: bool,
    pub is_unique: bool,
    pub all_empty: bool,
    /// Distinct values of a dictionary field, first-seen order, capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dict_values: Option<Vec<String>>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct _LeiCFieldAccumulator {
    ftype: Option<LeiCFieldType>,
    count: usize,
    non_empty: usize,
    total_len: usize,
    min_len: Option<usize>,
    max_len: usize,
    has_digit: bool,
    has_alpha: bool,
    has_special: bool,
    seen: HashSet<String>,
    distinct: Vec<String>,
}

/// Field analyzer over a bounded record sample.
#[derive(Clone, Debug, Default)]
pub struct LeiCAnalyzer {
    options: LeiCAnalyzerOptions,
    dates: Option<Arc<dyn LeiCDateParser>>,
}

impl LeiCAnalyzer {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCAnalyzer::default()
    }

    #[allow(non_snake_case)]
    pub fn LeiFWithOptions(mut self, options: LeiCAnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables the date trial during type inference.
    #[allow(non_snake_case)]
    pub fn LeiFWithDateParser(mut self, dates: Arc<dyn LeiCDateParser>) -> Self {
        self.dates = Some(dates);
        self
    }

    #[allow(non_snake_case)]
    pub fn LeiFOptions(&self) -> &LeiCAnalyzerOptions {
        &self.options
    }

    /// Produces a stat for every field seen in the sample, in first-seen
    /// field order.
    #[allow(non_snake_case)]
    pub fn LeiFAnalyze(&self, batch: &LeiCRecordBatch) -> Vec<LeiCFieldStat> {
        let mut order: Vec<String> = Vec::new();
        let mut accumulators: HashMap<String, _LeiCFieldAccumulator> = HashMap::new();

        for record in batch.iter().take(self.options.limit) {
            for (field, value) in record.LeiFIter() {
                if !accumulators.contains_key(field) {
                    order.push(field.clone());
                    accumulators.insert(field.clone(), _LeiCFieldAccumulator::default());
                }
                let acc = accumulators.get_mut(field).expect("accumulator present");
                self.accumulate(acc, value);
            }
        }

        order
            .into_iter()
            .map(|field| {
                let acc = accumulators.remove(&field).expect("accumulator present");
                self.build_stat(field, acc)
            })
            .collect()
    }

    fn accumulate(&self, acc: &mut _LeiCFieldAccumulator, value: &LeiCValue) {
        acc.count += 1;
        let text = value.LeiFToText();
        if value.LeiFIsNull() || self.options.LeiFIsEmptyText(&text) {
            return;
        }
        acc.non_empty += 1;

        let len = text.chars().count();
        acc.total_len += len;
        acc.min_len = Some(acc.min_len.map_or(len, |m| m.min(len)));
        acc.max_len = acc.max_len.max(len);

        acc.has_digit |= text.chars().any(|c| c.is_ascii_digit());
        acc.has_alpha |= text.chars().any(|c| c.is_alphabetic());
        acc.has_special |= text.chars().any(|c| !c.is_alphanumeric());

        if !acc.seen.contains(&text) {
            acc.seen.insert(text.clone());
            if acc.distinct.len() < self.options.dict_values_cap {
                acc.distinct.push(text);
            }
        }

        let inferred = self.infer_value_type(value);
        match acc.ftype {
            None => acc.ftype = Some(inferred),
            Some(current) if current != inferred => acc.ftype = Some(LeiCFieldType::Str),
            Some(_) => {}
        }
    }

    fn infer_value_type(&self, value: &LeiCValue) -> LeiCFieldType {
        match value {
            LeiCValue::Null => LeiCFieldType::Other,
            LeiCValue::Bool(_) => LeiCFieldType::Bool,
            LeiCValue::Int(_) => LeiCFieldType::Int,
            LeiCValue::Float(_) => LeiCFieldType::Float,
            LeiCValue::Str(s) => {
                let trimmed = s.trim();
                if trimmed.parse::<i64>().is_ok() {
                    // Digit strings with a leading zero are identifiers,
                    // not numbers.
                    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
                    if digits.len() > 1 && digits.starts_with('0') {
                        return LeiCFieldType::Str;
                    }
                    return LeiCFieldType::Int;
                }
                if trimmed.chars().any(|c| c.is_ascii_digit())
                    && trimmed.parse::<f64>().is_ok()
                {
                    return LeiCFieldType::Float;
                }
                if matches!(
                    trimmed.to_ascii_lowercase().as_str(),
                    "true" | "false" | "yes" | "no"
                ) {
                    return LeiCFieldType::Bool;
                }
                if let Some(dates) = &self.dates {
                    if dates.match_date(trimmed).is_some() {
                        return LeiCFieldType::Date;
                    }
                }
                LeiCFieldType::Str
            }
        }
    }

    fn build_stat(&self, field: String, acc: _LeiCFieldAccumulator) -> LeiCFieldStat {
        let unique = acc.seen.len();
        let share_unique = if acc.non_empty > 0 {
            unique as f64 * 100.0 / acc.non_empty as f64
        } else {
            0.0
        };
        let is_dictionary = acc.non_empty > 0 && share_unique <= self.options.dict_share;
        let is_unique = acc.non_empty > 0 && unique == acc.non_empty;
        let all_empty = acc.count > 0 && acc.non_empty == 0;

        let mut tags = Vec::new();
        if is_unique {
            tags.push("uniq".to_string());
        }
        if all_empty {
            tags.push("empty".to_string());
        } else if is_dictionary {
            tags.push("dict".to_string());
        }

        LeiCFieldStat {
            field,
            ftype: acc.ftype.unwrap_or(LeiCFieldType::Str),
            count: acc.count,
            non_empty: acc.non_empty,
            unique,
            share_unique,
            min_len: acc.min_len.unwrap_or(0),
            max_len: acc.max_len,
            avg_len: if acc.non_empty > 0 {
                acc.total_len as f64 / acc.non_empty as f64
            } else {
                0.0
            },
            has_digit: acc.has_digit,
            has_alpha: acc.has_alpha,
            has_special: acc.has_special,
            is_dictionary,
            is_unique,
            all_empty,
            dict_values: if is_dictionary && !all_empty {
                Some(acc.distinct)
            } else {
                None
            },
            tags,
        }
    }
}
