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

//! # Grammar Intermediate Representation (IR)
//!
//! This module defines the intermediate representation for the restricted
//! grammar expression language used by `ppr` rules. The IR is the in-memory
//! form of a parsed rule body, consisting of a tree of combinator nodes.
//!
//! ## Data Flow
//!
//! ```text
//! Rule body string (YAML)
//!          |
//!          v
//!       Parser
//!          |
//!          v
//!   LeiCGrammarNode (IR)
//!          |
//!          v
//!      Compiler
//!          |
//!          v
//!  LeiCGrammarMatcher
//! ```

use serde::{Deserialize, Serialize};

/// Named character class constants recognized by the expression language,
/// plus custom sets written as string literals (`Word('01')`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeiCCharClass {
    Nums,
    Alphas,
    Alphanums,
    Printables,
    Hexnums,
    Punc8bit,
    Custom(String),
}

impl LeiCCharClass {
    /// Resolves a bare identifier to a named class.
    #[allow(non_snake_case)]
    pub fn LeiFFromName(name: &str) -> Option<LeiCCharClass> {
        match name {
            "nums" => Some(LeiCCharClass::Nums),
            "alphas" => Some(LeiCCharClass::Alphas),
            "alphanums" => Some(LeiCCharClass::Alphanums),
            "printables" => Some(LeiCCharClass::Printables),
            "hexnums" => Some(LeiCCharClass::Hexnums),
            "punc8bit" => Some(LeiCCharClass::Punc8bit),
            _ => None,
        }
    }

    /// Class membership test for a single character.
    ///
    /// `Printables` is every visible ASCII character (space excluded);
    /// `Punc8bit` is the non-alphanumeric range of Latin-1 above 0xA0.
    #[allow(non_snake_case)]
    pub fn LeiFContains(&self, ch: char) -> bool {
        match self {
            LeiCCharClass::Nums => ch.is_ascii_digit(),
            LeiCCharClass::Alphas => ch.is_ascii_alphabetic(),
            LeiCCharClass::Alphanums => ch.is_ascii_alphanumeric(),
            LeiCCharClass::Printables => ch.is_ascii_graphic(),
            LeiCCharClass::Hexnums => ch.is_ascii_hexdigit(),
            LeiCCharClass::Punc8bit => {
                ('\u{00a1}'..='\u{00ff}').contains(&ch) && !ch.is_alphanumeric()
            }
            LeiCCharClass::Custom(set) => set.contains(ch),
        }
    }
}

/// A single node of a compiled grammar expression.
///
/// The node set mirrors the expression language exactly: anything the
/// parser cannot express as one of these variants is rejected at compile
/// time, never improvised at match time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LeiCGrammarNode {
    /// A greedy run of characters from one class. `min`/`max` bound the
    /// run length; `exact=N` in the surface syntax sets both to N.
    Word {
        class: LeiCCharClass,
        min: usize,
        max: Option<usize>,
    },
    /// A fixed text, matched verbatim or case-insensitively.
    Literal { text: String, caseless: bool },
    /// Inner expression may be absent.
    Optional(Box<LeiCGrammarNode>),
    /// Inner expression must match; its output is dropped. Matching
    /// behavior is identical to the inner node since Lei matchers only
    /// test acceptance.
    Suppress(Box<LeiCGrammarNode>),
    /// `a + b`: all elements in order.
    Sequence(Vec<LeiCGrammarNode>),
    /// `a ^ b`: every alternative is tried and the longest accepting
    /// one wins.
    Longest(Vec<LeiCGrammarNode>),
    /// `a | b`: the leftmost accepting alternative wins.
    First(Vec<LeiCGrammarNode>),
    /// End of input (a trailing newline is consumed).
    LineEnd,
}

impl LeiCGrammarNode {
    /// Whether the expression explicitly terminates with `lineEnd`, which
    /// permits trailing whitespace at match time.
    #[allow(non_snake_case)]
    pub fn LeiFEndsWithLineEnd(&self) -> bool {
        match self {
            LeiCGrammarNode::LineEnd => true,
            LeiCGrammarNode::Sequence(items) => items
                .last()
                .map(|n| n.LeiFEndsWithLineEnd())
                .unwrap_or(false),
            LeiCGrammarNode::Longest(items) | LeiCGrammarNode::First(items) => {
                items.iter().any(|n| n.LeiFEndsWithLineEnd())
            }
            LeiCGrammarNode::Suppress(inner) => inner.LeiFEndsWithLineEnd(),
            _ => false,
        }
    }
}
