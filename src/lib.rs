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

#![allow(non_snake_case)]

pub mod errors;
pub mod record;
pub mod analyze;
pub mod classify;
pub mod dates;
pub mod grammar;
pub mod ingest;
pub mod log;
pub mod rules;

pub use analyze::{LeiCAnalyzer, LeiCAnalyzerOptions, LeiCFieldStat, LeiCFieldType};
pub use classify::{
    LeiCCancelToken, LeiCClassifier, LeiCColumnReport, LeiCMatchResult, LeiCResultRow,
    LeiCScanOptions, LeiCScanReport,
};
pub use dates::{
    LeiCDateMatch, LeiCDateParser, LeiCDatePattern, LeiCDatePatternKind, LeiCFormatDateParser,
    LeiCNullDateParser,
};
pub use errors::{LeiCCompileErrorKind, LeiError, Result};
pub use grammar::{LeiCGrammarMatcher, LeiFCompileCacheSize, LeiFCompileGrammar};
pub use ingest::{LeiCReaderOptions, LeiCRecordReader};
pub use record::{LeiCRecord, LeiCRecordBatch, LeiCValue, LeiFBatchFromJson};
pub use rules::{
    LeiCCatalogStats, LeiCMatchFn, LeiCMatchKind, LeiCRule, LeiCRuleCatalog, LeiCRuleFilter,
    LeiCRuleIssue, LeiCRuleMatcher, LeiCRuleType, LeiCRuleView, LeiFRegisterMatchFunc,
    LeiFResolveMatchFunc,
};
