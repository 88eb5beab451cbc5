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

//! # Lei Rule Catalog
//!
//! Rules are loaded once from YAML files, compiled into one of three
//! matcher kinds, and treated as read-only afterwards. A scan does not see
//! the catalog directly; it works through a [`LeiCRuleView`], the filtered
//! and deterministically ordered projection produced by
//! [`LeiCRuleCatalog::LeiFSelect`].

pub mod loader;
pub mod registry;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::grammar::LeiCGrammarMatcher;
pub use registry::{LeiCMatchFn, LeiFRegisterMatchFunc, LeiFRegisteredNames, LeiFResolveMatchFunc};

/// URL template for the public datatype registry entry of a semantic key.
pub const DATATYPE_BASE_URL: &str = "https://registry.apicrafter.io/datatype/{key}";

/// Renders the registry URL for a semantic datatype key.
#[allow(non_snake_case)]
pub fn LeiFDatatypeUrl(key: &str) -> String {
    DATATYPE_BASE_URL.replace("{key}", key)
}

/// Lang token that passes every language filter.
pub const NEUTRAL_LANG: &str = "common";

/// Whether a rule applies to field names or to data values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeiCRuleType {
    Field,
    Data,
}

impl LeiCRuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeiCRuleType::Field => "field",
            LeiCRuleType::Data => "data",
        }
    }
}

/// How a rule body is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeiCMatchKind {
    /// Comma-separated token list, matched case-insensitively as a set.
    Text,
    /// Grammar expression compiled by the safe grammar compiler.
    Grammar,
    /// Registered function reference.
    Func,
}

impl LeiCMatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeiCMatchKind::Text => "text",
            LeiCMatchKind::Grammar => "ppr",
            LeiCMatchKind::Func => "func",
        }
    }
}

/// Compiled matcher behind a rule: a tagged variant instead of an
/// inheritance hierarchy, dispatched with a match.
#[derive(Clone, Debug)]
pub enum LeiCRuleMatcher {
    Text(HashSet<String>),
    Grammar(Arc<LeiCGrammarMatcher>),
    Func { name: String, func: LeiCMatchFn },
}

impl LeiCRuleMatcher {
    /// Pure acceptance test of a candidate string.
    ///
    /// Text sets match the lowered input as a whole (tokens containing
    /// whitespace are matched literally, the input is never tokenized).
    #[allow(non_snake_case)]
    pub fn LeiFMatches(&self, value: &str) -> Result<bool> {
        match self {
            LeiCRuleMatcher::Text(tokens) => Ok(tokens.contains(&value.to_lowercase())),
            LeiCRuleMatcher::Grammar(matcher) => Ok(matcher.LeiFMatches(value)),
            LeiCRuleMatcher::Func { func, .. } => func(value),
        }
    }
}

/// A resolved validator reference attached to a data rule.
#[derive(Clone, Debug)]
pub struct LeiCValidator {
    pub name: String,
    pub func: LeiCMatchFn,
}

/// One classification rule, immutable after load.
#[derive(Clone, Debug)]
pub struct LeiCRule {
    /// Unique id within the catalog.
    pub id: String,
    /// Semantic datatype identifier this rule detects.
    pub key: String,
    /// Human label.
    pub name: String,
    pub rule_type: LeiCRuleType,
    pub match_kind: LeiCMatchKind,
    /// Raw rule body as written in the YAML file.
    pub body: String,
    pub matcher: LeiCRuleMatcher,
    /// Inclusive candidate length bounds; None means unbounded.
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    /// Higher priority fires first on tie-breaks.
    pub priority: i64,
    /// Imprecise rules are skipped unless the caller opts in.
    pub imprecise: bool,
    pub is_pii: bool,
    /// Context tags (the file-level context split on '.'; `pii` is added
    /// automatically for PII rules).
    pub contexts: Vec<String>,
    pub lang: String,
    /// Lowercased country codes; None means the rule is country-neutral.
    pub country_codes: Option<Vec<String>>,
    /// Secondary condition on the field name gating a data rule.
    pub field_gate: Option<LeiCRuleMatcher>,
    /// Extra per-value validation required on top of the matcher.
    pub validator: Option<LeiCValidator>,
    /// Name of the rule file group this rule came from.
    pub group: String,
    pub group_desc: String,
    /// Position in catalog load order, the secondary sort key.
    pub load_order: usize,
}

impl LeiCRule {
    /// Whether a candidate string length falls inside the rule's bounds.
    #[allow(non_snake_case)]
    pub fn LeiFLengthAccepts(&self, len: usize) -> bool {
        if let Some(min) = self.min_len {
            if len < min {
                return false;
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return false;
            }
        }
        true
    }
}

/// A problem found while loading or evaluating rules. Issues never abort
/// a catalog load; they ride along as a side channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeiCRuleIssue {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub kind: String,
    pub detail: String,
}

/// Catalog-wide rule counts for diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LeiCCatalogStats {
    pub field_rules: usize,
    pub data_rules: usize,
    pub langs: BTreeMap<String, usize>,
    pub contexts: BTreeMap<String, usize>,
    pub countries: BTreeMap<String, usize>,
}

/// Runtime filters narrowing which rules a scan evaluates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LeiCRuleFilter {
    /// Contexts to keep; empty keeps everything.
    pub contexts: Vec<String>,
    /// Languages to keep; empty keeps everything, `common` always passes.
    pub langs: Vec<String>,
    /// Country codes to keep; empty keeps everything, country-neutral
    /// rules always pass.
    pub countries: Vec<String>,
    /// Whether imprecise rules are excluded.
    pub ignore_imprecise: bool,
}

impl LeiCRuleFilter {
    #[allow(non_snake_case)]
    pub fn LeiFAccepts(&self, rule: &LeiCRule) -> bool {
        if self.ignore_imprecise && rule.imprecise {
            return false;
        }
        if !self.contexts.is_empty()
            && !rule.contexts.iter().any(|c| self.contexts.contains(c))
        {
            return false;
        }
        if !self.langs.is_empty()
            && rule.lang != NEUTRAL_LANG
            && !self.langs.contains(&rule.lang)
        {
            return false;
        }
        if !self.countries.is_empty() {
            if let Some(codes) = &rule.country_codes {
                if !codes.iter().any(|c| self.countries.contains(c)) {
                    return false;
                }
            }
        }
        true
    }
}

/// Filtered, ordered projection of a catalog used by one scan.
#[derive(Clone, Debug, Default)]
pub struct LeiCRuleView {
    field_rules: Vec<Arc<LeiCRule>>,
    data_rules: Vec<Arc<LeiCRule>>,
}

impl LeiCRuleView {
    #[allow(non_snake_case)]
    pub fn LeiFFieldRules(&self) -> &[Arc<LeiCRule>] {
        &self.field_rules
    }

    #[allow(non_snake_case)]
    pub fn LeiFDataRules(&self) -> &[Arc<LeiCRule>] {
        &self.data_rules
    }

    #[allow(non_snake_case)]
    pub fn LeiFIsEmpty(&self) -> bool {
        self.field_rules.is_empty() && self.data_rules.is_empty()
    }
}

/// The loaded rule catalog: immutable after load, shareable between
/// concurrent scans.
#[derive(Clone, Debug, Default)]
pub struct LeiCRuleCatalog {
    pub(crate) field_rules: Vec<Arc<LeiCRule>>,
    pub(crate) data_rules: Vec<Arc<LeiCRule>>,
    pub(crate) issues: Vec<LeiCRuleIssue>,
    pub(crate) stats: LeiCCatalogStats,
}

impl LeiCRuleCatalog {
    /// Loads every acceptable YAML rule file under the given directories
    /// (recursively). Files and rules that fail to load surface as issues,
    /// never as a failed catalog.
    #[allow(non_snake_case)]
    pub fn LeiFLoad(paths: &[impl AsRef<std::path::Path>]) -> Result<Self> {
        loader::LeiCRuleLoader::LeiFNew().LeiFLoadPaths(paths)
    }

    #[allow(non_snake_case)]
    pub fn LeiFIsEmpty(&self) -> bool {
        self.field_rules.is_empty() && self.data_rules.is_empty()
    }

    #[allow(non_snake_case)]
    pub fn LeiFRuleCount(&self) -> usize {
        self.field_rules.len() + self.data_rules.len()
    }

    #[allow(non_snake_case)]
    pub fn LeiFIssues(&self) -> &[LeiCRuleIssue] {
        &self.issues
    }

    #[allow(non_snake_case)]
    pub fn LeiFStats(&self) -> &LeiCCatalogStats {
        &self.stats
    }

    /// Finds a rule by id across both rule types.
    #[allow(non_snake_case)]
    pub fn LeiFFindRule(&self, id: &str) -> Option<&Arc<LeiCRule>> {
        self.field_rules
            .iter()
            .chain(self.data_rules.iter())
            .find(|rule| rule.id == id)
    }

    /// Produces the filtered projection a scan iterates: grouped by rule
    /// type, ordered by priority descending then load order ascending.
    #[allow(non_snake_case)]
    pub fn LeiFSelect(&self, filter: &LeiCRuleFilter) -> LeiCRuleView {
        let mut field_rules: Vec<Arc<LeiCRule>> = self
            .field_rules
            .iter()
            .filter(|rule| filter.LeiFAccepts(rule))
            .cloned()
            .collect();
        let mut data_rules: Vec<Arc<LeiCRule>> = self
            .data_rules
            .iter()
            .filter(|rule| filter.LeiFAccepts(rule))
            .cloned()
            .collect();
        let order = |a: &Arc<LeiCRule>, b: &Arc<LeiCRule>| {
            b.priority
                .cmp(&a.priority)
                .then(a.load_order.cmp(&b.load_order))
        };
        field_rules.sort_by(order);
        data_rules.sort_by(order);
        LeiCRuleView {
            field_rules,
            data_rules,
        }
    }
}
