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

//! # Lei Date Parser Capability
//!
//! The classification engine consults a date parser per sampled value to
//! detect date/time columns. The capability is deliberately thin: a lookup
//! that either names the pattern a value matched or returns nothing. Lei
//! does not ship a pattern set; callers provide one (or disable the date
//! pass entirely with [`LeiCNullDateParser`]).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A successful date detection: which pattern fired and its format token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeiCDateMatch {
    pub pattern_id: String,
    pub format: String,
}

/// Capability consumed by the classification engine.
///
/// Implementations must be side-effect free and thread safe; a scan may
/// probe the same parser from several concurrent scans sharing one catalog.
pub trait LeiCDateParser: std::fmt::Debug + Send + Sync {
    /// Returns the matched pattern for a value, or None.
    fn match_date(&self, value: &str) -> Option<LeiCDateMatch>;
}

/// Disabled date parsing; every lookup misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeiCNullDateParser;

impl LeiCDateParser for LeiCNullDateParser {
    fn match_date(&self, _value: &str) -> Option<LeiCDateMatch> {
        None
    }
}

/// Which chrono parsing entry point a pattern goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeiCDatePatternKind {
    Date,
    DateTime,
    Time,
}

/// One caller-supplied pattern: a stable id plus a chrono format string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeiCDatePattern {
    pub id: String,
    pub format: String,
    pub kind: LeiCDatePatternKind,
}

impl LeiCDatePattern {
    #[allow(non_snake_case)]
    pub fn LeiFDate(id: impl Into<String>, format: impl Into<String>) -> Self {
        LeiCDatePattern {
            id: id.into(),
            format: format.into(),
            kind: LeiCDatePatternKind::Date,
        }
    }

    #[allow(non_snake_case)]
    pub fn LeiFDateTime(id: impl Into<String>, format: impl Into<String>) -> Self {
        LeiCDatePattern {
            id: id.into(),
            format: format.into(),
            kind: LeiCDatePatternKind::DateTime,
        }
    }

    #[allow(non_snake_case)]
    pub fn LeiFTime(id: impl Into<String>, format: impl Into<String>) -> Self {
        LeiCDatePattern {
            id: id.into(),
            format: format.into(),
            kind: LeiCDatePatternKind::Time,
        }
    }
}

/// Date parser evaluating a fixed table of chrono format patterns in order.
///
/// First accepting pattern wins, so callers should order patterns from most
/// to least specific.
#[derive(Clone, Debug, Default)]
pub struct LeiCFormatDateParser {
    patterns: Vec<LeiCDatePattern>,
}

// Values longer than this cannot be dates under any reasonable format and
// are rejected before chrono is consulted.
const MAX_DATE_CANDIDATE_LEN: usize = 64;

impl LeiCFormatDateParser {
    #[allow(non_snake_case)]
    pub fn LeiFNew(patterns: Vec<LeiCDatePattern>) -> Self {
        LeiCFormatDateParser { patterns }
    }

    #[allow(non_snake_case)]
    pub fn LeiFPatternCount(&self) -> usize {
        self.patterns.len()
    }
}

impl LeiCDateParser for LeiCFormatDateParser {
    fn match_date(&self, value: &str) -> Option<LeiCDateMatch> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_DATE_CANDIDATE_LEN {
            return None;
        }
        for pattern in &self.patterns {
            let accepted = match pattern.kind {
                LeiCDatePatternKind::Date => {
                    NaiveDate::parse_from_str(trimmed, &pattern.format).is_ok()
                }
                LeiCDatePatternKind::DateTime => {
                    NaiveDateTime::parse_from_str(trimmed, &pattern.format).is_ok()
                }
                LeiCDatePatternKind::Time => {
                    NaiveTime::parse_from_str(trimmed, &pattern.format).is_ok()
                }
            };
            if accepted {
                return Some(LeiCDateMatch {
                    pattern_id: pattern.id.clone(),
                    format: pattern.format.clone(),
                });
            }
        }
        None
    }
}
