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

//! # Grammar Compiler and Matcher
//!
//! Turns grammar IR into an executable matcher and memoizes compiles in a
//! process-wide LRU cache keyed on the textual rule body. The same rule
//! body shared by many files compiles once for the whole process.
//!
//! ## Matching semantics
//!
//! Execution is greedy and non-backtracking: a `Word` consumes the longest
//! run its bounds allow and never gives characters back to later elements.
//! `^` evaluates every branch and keeps the longest accepting one; `|`
//! keeps the leftmost. Whitespace (space/tab) is skipped before each
//! atom. A rule matches a value only when the whole input is consumed;
//! trailing whitespace is tolerated only when the expression explicitly
//! ends with `lineEnd`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::errors::Result;
use crate::grammar::ir::LeiCGrammarNode;
use crate::grammar::parser::LeiFParseGrammar;

/// Executable form of a compiled grammar expression.
#[derive(Clone, Debug)]
pub struct LeiCGrammarMatcher {
    root: LeiCGrammarNode,
    allow_trailing_ws: bool,
}

impl LeiCGrammarMatcher {
    #[allow(non_snake_case)]
    pub fn LeiFNew(root: LeiCGrammarNode) -> Self {
        let allow_trailing_ws = root.LeiFEndsWithLineEnd();
        LeiCGrammarMatcher {
            root,
            allow_trailing_ws,
        }
    }

    #[allow(non_snake_case)]
    pub fn LeiFRoot(&self) -> &LeiCGrammarNode {
        &self.root
    }

    /// Whether the whole input is accepted by the expression.
    #[allow(non_snake_case)]
    pub fn LeiFMatches(&self, input: &str) -> bool {
        let chars: Vec<char> = input.chars().collect();
        match _LeiFEval(&self.root, &chars, 0) {
            Some(end) => {
                if end == chars.len() {
                    return true;
                }
                self.allow_trailing_ws && chars[end..].iter().all(|c| c.is_whitespace())
            }
            None => false,
        }
    }
}

fn _LeiFSkipWs(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && (chars[pos] == ' ' || chars[pos] == '\t') {
        pos += 1;
    }
    pos
}

fn _LeiFEval(node: &LeiCGrammarNode, chars: &[char], pos: usize) -> Option<usize> {
    match node {
        LeiCGrammarNode::Word { class, min, max } => {
            let start = _LeiFSkipWs(chars, pos);
            let mut taken = 0usize;
            let mut p = start;
            while p < chars.len() && class.LeiFContains(chars[p]) {
                if let Some(m) = max {
                    if taken >= *m {
                        break;
                    }
                }
                taken += 1;
                p += 1;
            }
            if taken < *min {
                None
            } else {
                Some(p)
            }
        }
        LeiCGrammarNode::Literal { text, caseless } => {
            let start = _LeiFSkipWs(chars, pos);
            let expected: Vec<char> = text.chars().collect();
            if start + expected.len() > chars.len() {
                return None;
            }
            for (offset, want) in expected.iter().enumerate() {
                let have = chars[start + offset];
                let equal = if *caseless {
                    have.to_lowercase().eq(want.to_lowercase())
                } else {
                    have == *want
                };
                if !equal {
                    return None;
                }
            }
            Some(start + expected.len())
        }
        LeiCGrammarNode::Optional(inner) => _LeiFEval(inner, chars, pos).or(Some(pos)),
        LeiCGrammarNode::Suppress(inner) => _LeiFEval(inner, chars, pos),
        LeiCGrammarNode::Sequence(items) => {
            let mut p = pos;
            for item in items {
                p = _LeiFEval(item, chars, p)?;
            }
            Some(p)
        }
        LeiCGrammarNode::Longest(branches) => branches
            .iter()
            .filter_map(|branch| _LeiFEval(branch, chars, pos))
            .max(),
        LeiCGrammarNode::First(branches) => branches
            .iter()
            .find_map(|branch| _LeiFEval(branch, chars, pos)),
        LeiCGrammarNode::LineEnd => {
            let p = _LeiFSkipWs(chars, pos);
            if p == chars.len() {
                Some(p)
            } else if chars[p] == '\n' {
                Some(p + 1)
            } else {
                None
            }
        }
    }
}

const COMPILE_CACHE_CAPACITY: usize = 256;

struct _LeiCCacheEntry {
    matcher: Arc<LeiCGrammarMatcher>,
    last_used: u64,
}

struct _LeiCCompileCache {
    entries: HashMap<String, _LeiCCacheEntry>,
    tick: u64,
}

impl _LeiCCompileCache {
    fn lookup(&mut self, body: &str) -> Option<Arc<LeiCGrammarMatcher>> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(body).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.matcher)
        })
    }

    fn store(&mut self, body: String, matcher: Arc<LeiCGrammarMatcher>) {
        while self.entries.len() >= COMPILE_CACHE_CAPACITY {
            self.evict_lru();
        }
        self.tick += 1;
        self.entries.insert(
            body,
            _LeiCCacheEntry {
                matcher,
                last_used: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

// Compile results are shared across catalogs and scans; the cache is the
// only mutable process-wide state besides the function registry.
static COMPILE_CACHE: OnceLock<Mutex<_LeiCCompileCache>> = OnceLock::new();

fn _LeiFCache() -> &'static Mutex<_LeiCCompileCache> {
    COMPILE_CACHE.get_or_init(|| {
        Mutex::new(_LeiCCompileCache {
            entries: HashMap::new(),
            tick: 0,
        })
    })
}

/// Compiles a grammar rule body, going through the memoization cache.
///
/// Only successful compiles are cached; a failing body is re-screened on
/// every attempt so callers always get the precise error back.
#[allow(non_snake_case)]
pub fn LeiFCompileGrammar(body: &str) -> Result<Arc<LeiCGrammarMatcher>> {
    if let Ok(mut cache) = _LeiFCache().lock() {
        if let Some(matcher) = cache.lookup(body) {
            return Ok(matcher);
        }
    }
    let root = LeiFParseGrammar(body)?;
    let matcher = Arc::new(LeiCGrammarMatcher::LeiFNew(root));
    if let Ok(mut cache) = _LeiFCache().lock() {
        cache.store(body.to_string(), Arc::clone(&matcher));
    }
    Ok(matcher)
}

/// Number of cached compiles. Exposed for diagnostics and tests.
#[allow(non_snake_case)]
pub fn LeiFCompileCacheSize() -> usize {
    _LeiFCache()
        .lock()
        .map(|cache| cache.entries.len())
        .unwrap_or(0)
}
