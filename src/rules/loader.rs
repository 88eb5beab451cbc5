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

//! # Rule File Loader
//!
//! Walks rule directories, parses YAML rule files and compiles their rules
//! into the catalog. The loader is deliberately forgiving at the file and
//! rule level (a broken rule becomes an issue, not a failed load) and
//! deliberately strict about the YAML dialect: only plain scalars,
//! mappings and sequences are honored, any typed tag rejects the file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::errors::Result;
use crate::grammar::LeiFCompileGrammar;
use crate::log::{LeiCLogLevel, LeiCLogger};
use crate::rules::registry::LeiFResolveMatchFunc;
use crate::rules::{
    LeiCCatalogStats, LeiCMatchKind, LeiCRule, LeiCRuleCatalog, LeiCRuleIssue, LeiCRuleMatcher,
    LeiCRuleType, LeiCValidator, NEUTRAL_LANG,
};

/// Loader state accumulated while walking rule directories.
#[derive(Debug, Default)]
pub struct LeiCRuleLoader {
    catalog: LeiCRuleCatalog,
    seen_ids: HashSet<String>,
    load_order: usize,
}

impl LeiCRuleLoader {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCRuleLoader::default()
    }

    /// Walks each path recursively and returns the loaded catalog.
    #[allow(non_snake_case)]
    pub fn LeiFLoadPaths(mut self, paths: &[impl AsRef<Path>]) -> Result<LeiCRuleCatalog> {
        for path in paths {
            self.load_path(path.as_ref());
        }
        self.catalog.stats.field_rules = self.catalog.field_rules.len();
        self.catalog.stats.data_rules = self.catalog.data_rules.len();
        LeiCLogger::LeiFEvent(
            LeiCLogLevel::Info,
            "rules.load",
            "rule catalog loaded",
            [
                (
                    "field_rules".to_string(),
                    serde_json::json!(self.catalog.field_rules.len()),
                ),
                (
                    "data_rules".to_string(),
                    serde_json::json!(self.catalog.data_rules.len()),
                ),
                (
                    "issues".to_string(),
                    serde_json::json!(self.catalog.issues.len()),
                ),
            ],
        );
        Ok(self.catalog)
    }

    fn load_path(&mut self, path: &Path) {
        if path.is_file() {
            if _LeiFIsYamlFile(path) {
                self.load_file(path);
            }
            return;
        }
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("cannot read rule path {}: {}", path.display(), err);
                self.push_issue(path, None, "file.read", err.to_string());
                return;
            }
        };
        // Sort directory entries so load order (and therefore rule
        // tie-breaking) does not depend on filesystem iteration order.
        let mut children: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        children.sort();
        for child in children {
            self.load_path(&child);
        }
    }

    fn load_file(&mut self, path: &Path) {
        log::debug!("loading rules file {}", path.display());
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.push_issue(path, None, "file.read", err.to_string());
                return;
            }
        };
        let document: Value = match serde_yaml::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                self.push_issue(path, None, "file.parse", err.to_string());
                return;
            }
        };
        if let Some(tag) = _LeiFFindTag(&document) {
            self.push_issue(
                path,
                None,
                "file.parse",
                format!("typed YAML tag '{}' is not allowed in rule files", tag),
            );
            return;
        }
        let mapping = match document.as_mapping() {
            Some(mapping) => mapping,
            None => return,
        };
        let rules = match _LeiFMapGet(mapping, "rules").and_then(Value::as_mapping) {
            Some(rules) => rules,
            // Not a rule file; other YAML files may legitimately live in
            // the same tree.
            None => return,
        };

        let group = _LeiFMapStr(mapping, "name").unwrap_or_default();
        let group_desc = _LeiFMapStr(mapping, "description").unwrap_or_default();
        let file_context =
            _LeiFMapStr(mapping, "context").unwrap_or_else(|| NEUTRAL_LANG.to_string());
        let file_lang = _LeiFMapStr(mapping, "lang").unwrap_or_else(|| NEUTRAL_LANG.to_string());
        let file_countries = _LeiFMapStr(mapping, "country_code")
            .as_deref()
            .and_then(_LeiFNormalizeCountryCodes);

        for (key, spec) in rules {
            let rule_id = match _LeiFStr(key) {
                Some(id) => id,
                None => {
                    self.push_issue(
                        path,
                        None,
                        "rule.validation",
                        "rule id is not a scalar".to_string(),
                    );
                    continue;
                }
            };
            if self.seen_ids.contains(&rule_id) {
                self.push_issue(
                    path,
                    Some(&rule_id),
                    "rule.duplicate",
                    "rule id already defined by an earlier file".to_string(),
                );
                continue;
            }
            let spec = match spec.as_mapping() {
                Some(spec) => spec,
                None => {
                    self.push_issue(
                        path,
                        Some(&rule_id),
                        "rule.validation",
                        "rule body is not a mapping".to_string(),
                    );
                    continue;
                }
            };
            match self.build_rule(
                path,
                &rule_id,
                spec,
                &group,
                &group_desc,
                &file_context,
                &file_lang,
                file_countries.as_deref(),
            ) {
                Ok(rule) => {
                    self.seen_ids.insert(rule_id);
                    self.register_stats(&rule);
                    match rule.rule_type {
                        LeiCRuleType::Field => {
                            self.catalog.field_rules.push(std::sync::Arc::new(rule))
                        }
                        LeiCRuleType::Data => {
                            self.catalog.data_rules.push(std::sync::Arc::new(rule))
                        }
                    }
                }
                Err((kind, detail)) => {
                    log::warn!("skipping rule '{}' from {}: {}", rule_id, path.display(), detail);
                    self.push_issue(path, Some(&rule_id), &kind, detail);
                }
            }
        }
        log::debug!("loaded rules from {}", path.display());
    }

    #[allow(clippy::too_many_arguments)]
    fn build_rule(
        &mut self,
        path: &Path,
        rule_id: &str,
        spec: &Mapping,
        group: &str,
        group_desc: &str,
        file_context: &str,
        file_lang: &str,
        file_countries: Option<&[String]>,
    ) -> std::result::Result<LeiCRule, (String, String)> {
        let validation = |message: String| ("rule.validation".to_string(), message);

        let key = _LeiFMapStr(spec, "key")
            .ok_or_else(|| validation("missing required field 'key'".to_string()))?;
        let name = _LeiFMapStr(spec, "name").unwrap_or_else(|| key.clone());
        let rule_type = match _LeiFMapStr(spec, "type").as_deref() {
            Some("field") => LeiCRuleType::Field,
            Some("data") => LeiCRuleType::Data,
            Some(other) => {
                return Err(validation(format!("unknown rule type '{}'", other)));
            }
            None => return Err(validation("missing required field 'type'".to_string())),
        };
        let match_kind = match _LeiFMapStr(spec, "match").as_deref() {
            Some("text") => LeiCMatchKind::Text,
            Some("ppr") => LeiCMatchKind::Grammar,
            Some("func") => LeiCMatchKind::Func,
            Some(other) => {
                return Err(validation(format!("unknown match kind '{}'", other)));
            }
            None => return Err(validation("missing required field 'match'".to_string())),
        };
        let body = _LeiFMapStr(spec, "rule")
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| validation("missing required field 'rule'".to_string()))?;

        let priority = _LeiFMapInt(spec, "priority").unwrap_or(0);
        let imprecise = _LeiFMapBool(spec, "imprecise").unwrap_or(false);
        let is_pii = _LeiFMapBool(spec, "is_pii").unwrap_or(false);

        let mut min_len = _LeiFMapUsize(spec, "minlen");
        let mut max_len = _LeiFMapUsize(spec, "maxlen");
        if let (Some(min), Some(max)) = (min_len, max_len) {
            if min > max {
                return Err(validation(format!(
                    "minlen {} exceeds maxlen {}",
                    min, max
                )));
            }
        }

        let matcher = match match_kind {
            LeiCMatchKind::Text => {
                let tokens: Vec<String> = body
                    .split(',')
                    .map(|token| token.to_lowercase())
                    .filter(|token| !token.is_empty())
                    .collect();
                if tokens.is_empty() {
                    return Err(validation("text rule has an empty token list".to_string()));
                }
                // A text rule can only ever match strings no shorter than
                // its shortest token and no longer than its longest one.
                if min_len.is_none() {
                    min_len = tokens.iter().map(|t| t.chars().count()).min();
                }
                if max_len.is_none() {
                    max_len = tokens.iter().map(|t| t.chars().count()).max();
                }
                LeiCRuleMatcher::Text(tokens.into_iter().collect())
            }
            LeiCMatchKind::Grammar => match LeiFCompileGrammar(&body) {
                Ok(matcher) => LeiCRuleMatcher::Grammar(matcher),
                Err(err) => {
                    let kind = match err.compile_kind() {
                        Some(kind) => format!("rule.compile.{}", kind.as_str()),
                        None => "rule.compile".to_string(),
                    };
                    return Err((kind, err.to_string()));
                }
            },
            LeiCMatchKind::Func => match LeiFResolveMatchFunc(&body) {
                Some(func) => LeiCRuleMatcher::Func {
                    name: body.clone(),
                    func,
                },
                None => {
                    return Err((
                        "rule.resolve".to_string(),
                        format!("function '{}' is not registered", body),
                    ));
                }
            },
        };

        // A validator that does not resolve downgrades the rule instead of
        // dropping it.
        let validator = match _LeiFMapStr(spec, "validator") {
            Some(reference) => match LeiFResolveMatchFunc(&reference) {
                Some(func) => Some(LeiCValidator {
                    name: reference,
                    func,
                }),
                None => {
                    self.push_issue(
                        path,
                        Some(rule_id),
                        "validator.resolve",
                        format!("validator '{}' is not registered", reference),
                    );
                    None
                }
            },
            None => None,
        };

        let field_gate = match _LeiFMapStr(spec, "fieldrule") {
            Some(gate_body) => {
                let gate_kind = _LeiFMapStr(spec, "fieldrulematch")
                    .unwrap_or_else(|| "text".to_string());
                match gate_kind.as_str() {
                    "text" => Some(LeiCRuleMatcher::Text(
                        gate_body
                            .split(',')
                            .map(|token| token.to_lowercase())
                            .filter(|token| !token.is_empty())
                            .collect(),
                    )),
                    "ppr" => match LeiFCompileGrammar(&gate_body) {
                        Ok(matcher) => Some(LeiCRuleMatcher::Grammar(matcher)),
                        Err(err) => {
                            self.push_issue(
                                path,
                                Some(rule_id),
                                "fieldrule.compile",
                                err.to_string(),
                            );
                            None
                        }
                    },
                    other => {
                        self.push_issue(
                            path,
                            Some(rule_id),
                            "rule.validation",
                            format!("unknown fieldrulematch kind '{}'", other),
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let context = _LeiFMapStr(spec, "context").unwrap_or_else(|| file_context.to_string());
        let mut contexts: Vec<String> = context
            .split('.')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if is_pii && !contexts.iter().any(|c| c == "pii") {
            contexts.push("pii".to_string());
        }
        let lang = _LeiFMapStr(spec, "lang").unwrap_or_else(|| file_lang.to_string());
        let country_codes = match _LeiFMapStr(spec, "country_code") {
            Some(raw) => _LeiFNormalizeCountryCodes(&raw),
            None => file_countries.map(|codes| codes.to_vec()),
        };

        let rule = LeiCRule {
            id: rule_id.to_string(),
            key,
            name,
            rule_type,
            match_kind,
            body,
            matcher,
            min_len,
            max_len,
            priority,
            imprecise,
            is_pii,
            contexts,
            lang,
            country_codes,
            field_gate,
            validator,
            group: group.to_string(),
            group_desc: group_desc.to_string(),
            load_order: self.load_order,
        };
        self.load_order += 1;
        Ok(rule)
    }

    fn register_stats(&mut self, rule: &LeiCRule) {
        let stats: &mut LeiCCatalogStats = &mut self.catalog.stats;
        *stats.langs.entry(rule.lang.clone()).or_insert(0) += 1;
        for context in &rule.contexts {
            *stats.contexts.entry(context.clone()).or_insert(0) += 1;
        }
        match &rule.country_codes {
            Some(codes) => {
                for code in codes {
                    *stats.countries.entry(code.clone()).or_insert(0) += 1;
                }
            }
            None => {
                *stats.countries.entry("unknown".to_string()).or_insert(0) += 1;
            }
        }
    }

    fn push_issue(&mut self, path: &Path, rule_id: Option<&str>, kind: &str, detail: String) {
        self.catalog.issues.push(LeiCRuleIssue {
            file: path.display().to_string(),
            rule_id: rule_id.map(|id| id.to_string()),
            kind: kind.to_string(),
            detail,
        });
    }
}

fn _LeiFIsYamlFile(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Depth-first search for a YAML typed tag anywhere in the document.
fn _LeiFFindTag(value: &Value) -> Option<String> {
    match value {
        Value::Tagged(tagged) => Some(tagged.tag.to_string()),
        Value::Sequence(items) => items.iter().find_map(_LeiFFindTag),
        Value::Mapping(mapping) => mapping
            .iter()
            .find_map(|(k, v)| _LeiFFindTag(k).or_else(|| _LeiFFindTag(v))),
        _ => None,
    }
}

fn _LeiFMapGet<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.iter().find_map(|(k, v)| match k {
        Value::String(s) if s == key => Some(v),
        _ => None,
    })
}

/// Scalar-to-string coercion: rule files routinely write numbers and
/// booleans where strings are expected.
fn _LeiFStr(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn _LeiFMapStr(mapping: &Mapping, key: &str) -> Option<String> {
    _LeiFMapGet(mapping, key).and_then(_LeiFStr)
}

fn _LeiFMapInt(mapping: &Mapping, key: &str) -> Option<i64> {
    match _LeiFMapGet(mapping, key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn _LeiFMapUsize(mapping: &Mapping, key: &str) -> Option<usize> {
    _LeiFMapInt(mapping, key).and_then(|v| usize::try_from(v).ok())
}

/// Boolean coercion accepting YAML bools, `0`/`1` style integers and their
/// string spellings.
fn _LeiFMapBool(mapping: &Mapping, key: &str) -> Option<bool> {
    match _LeiFMapGet(mapping, key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Normalizes a comma/semicolon separated country list to lowercase codes.
fn _LeiFNormalizeCountryCodes(raw: &str) -> Option<Vec<String>> {
    let codes: Vec<String> = raw
        .replace(';', ",")
        .split(',')
        .map(|code| code.trim().to_lowercase())
        .filter(|code| !code.is_empty())
        .collect();
    if codes.is_empty() {
        None
    } else {
        Some(codes)
    }
}
