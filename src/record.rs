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

//! # Lei Record Module
//!
//! This module provides the core data structures for representing tabular
//! rows in the Lei framework. LeiCRecord is the fundamental unit of data
//! consumed by the analyzer and the classification engine.
//!
//! ## Design Principles
//!
//! - **Closed value model**: field values are a small scalar sum
//!   (null, bool, int, float, string); stringification for matching is an
//!   explicit operation, never an implicit coercion
//! - **Stable field order**: a record remembers the order its fields were
//!   inserted in, and the first record of a batch defines the column order
//!   of every downstream report
//! - **Nested input flattening**: JSON objects are flattened to dotted
//!   field paths at conversion time, so the core only ever sees flat rows

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar value carried by a single record field.
///
/// Mixed-type columns are allowed; the analyzer widens the inferred field
/// type when values disagree. Matching always happens on [`LeiCValue::LeiFToText`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeiCValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl LeiCValue {
    #[allow(non_snake_case)]
    pub fn LeiFIsNull(&self) -> bool {
        matches!(self, LeiCValue::Null)
    }

    /// String form used for rule matching and length statistics.
    ///
    /// Null renders as the empty string so that empty-value filtering treats
    /// missing and blank cells alike.
    #[allow(non_snake_case)]
    pub fn LeiFToText(&self) -> String {
        match self {
            LeiCValue::Null => String::new(),
            LeiCValue::Bool(v) => v.to_string(),
            LeiCValue::Int(v) => v.to_string(),
            LeiCValue::Float(v) => v.to_string(),
            LeiCValue::Str(v) => v.clone(),
        }
    }

    /// Converts a scalar JSON value. Arrays and objects are not scalars and
    /// map to [`LeiCValue::Null`]; nested structure is handled by the record
    /// flattener instead.
    #[allow(non_snake_case)]
    pub fn LeiFFromJson(value: &Value) -> LeiCValue {
        match value {
            Value::Null => LeiCValue::Null,
            Value::Bool(b) => LeiCValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    LeiCValue::Int(i)
                } else {
                    LeiCValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => LeiCValue::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => LeiCValue::Null,
        }
    }
}

/// A single tabular row: an ordered mapping from field name to scalar value.
///
/// Duplicate field names may occur when nested arrays of objects are
/// flattened; column extraction keeps every occurrence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeiCRecord {
    fields: Vec<(String, LeiCValue)>,
}

impl LeiCRecord {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCRecord { fields: Vec::new() }
    }

    #[allow(non_snake_case)]
    pub fn LeiFFromPairs(fields: Vec<(String, LeiCValue)>) -> Self {
        LeiCRecord { fields }
    }

    /// Appends a field, preserving insertion order.
    #[allow(non_snake_case)]
    pub fn LeiFInsert(&mut self, name: impl Into<String>, value: LeiCValue) {
        self.fields.push((name.into(), value));
    }

    /// First value stored under the given field name, if any.
    #[allow(non_snake_case)]
    pub fn LeiFGet(&self, name: &str) -> Option<&LeiCValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    #[allow(non_snake_case)]
    pub fn LeiFLen(&self) -> usize {
        self.fields.len()
    }

    #[allow(non_snake_case)]
    pub fn LeiFIsEmpty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in insertion order.
    #[allow(non_snake_case)]
    pub fn LeiFIter(&self) -> std::slice::Iter<'_, (String, LeiCValue)> {
        self.fields.iter()
    }

    /// Converts a JSON object into a flat record.
    ///
    /// Nested objects contribute dotted paths (`a.b.c`); arrays of objects
    /// are descended into and their members contribute under the parent
    /// path; scalar array members and the `_id` key are skipped.
    #[allow(non_snake_case)]
    pub fn LeiFFromJson(value: &Value) -> LeiCRecord {
        let mut record = LeiCRecord::LeiFNew();
        if let Value::Object(map) = value {
            _LeiFFlattenInto(map, None, &mut record);
        }
        record
    }
}

fn _LeiFFlattenInto(
    map: &serde_json::Map<String, Value>,
    prefix: Option<&str>,
    record: &mut LeiCRecord,
) {
    for (key, value) in map {
        if key == "_id" {
            continue;
        }
        let path = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => _LeiFFlattenInto(inner, Some(&path), record),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(inner) = item {
                        _LeiFFlattenInto(inner, Some(&path), record);
                    }
                }
            }
            scalar => record.LeiFInsert(path, LeiCValue::LeiFFromJson(scalar)),
        }
    }
}

/// Convenience alias for working on batches of records.
pub type LeiCRecordBatch = Vec<LeiCRecord>;

/// Converts a slice of JSON objects into a record batch.
#[allow(non_snake_case)]
pub fn LeiFBatchFromJson(values: &[Value]) -> LeiCRecordBatch {
    values.iter().map(LeiCRecord::LeiFFromJson).collect()
}

/// Field names in first-seen order across the sampled batch.
#[allow(non_snake_case)]
pub fn LeiFHeaders(batch: &LeiCRecordBatch, limit: usize) -> Vec<String> {
    let mut order = Vec::new();
    for record in batch.iter().take(limit) {
        for (name, _) in record.LeiFIter() {
            if !order.iter().any(|k| k == name) {
                order.push(name.clone());
            }
        }
    }
    order
}

/// Transposes a record batch into per-field value vectors.
///
/// A field missing from a record contributes nothing for that row, matching
/// the sparse nature of flattened semi-structured input.
#[allow(non_snake_case)]
pub fn LeiFColumns(
    batch: &LeiCRecordBatch,
    limit: usize,
) -> std::collections::HashMap<String, Vec<LeiCValue>> {
    let mut columns: std::collections::HashMap<String, Vec<LeiCValue>> =
        std::collections::HashMap::new();
    for record in batch.iter().take(limit) {
        for (name, value) in record.LeiFIter() {
            columns.entry(name.clone()).or_default().push(value.clone());
        }
    }
    columns
}
