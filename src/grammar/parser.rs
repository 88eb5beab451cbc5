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

//! # Grammar Expression Parser
//!
//! Hand-rolled tokenizer and recursive-descent parser for the restricted
//! expression language of `ppr` rule bodies. The language is a closed
//! namespace: seven character-class constants, five constructors, the
//! `.suppress()` postfix, and the `+` / `^` / `|` combinators. Everything
//! else is rejected before any evaluation takes place, so a rule body can
//! never execute code.
//!
//! Operator precedence follows the source expression language:
//! `+` binds tightest, then `^`, then `|`.

use crate::errors::{LeiCCompileErrorKind, LeiError, Result};
use crate::grammar::ir::{LeiCCharClass, LeiCGrammarNode};

// Substrings that disqualify an expression outright, checked on the
// lowercased raw text before tokenization. The list intentionally errs on
// the side of rejection.
const DANGEROUS_PATTERNS: &[&str] = &[
    "__",
    "import",
    "exec",
    "eval",
    "compile",
    "open",
    "file",
    "input",
    "reload",
    "getattr",
    "setattr",
    "delattr",
    "hasattr",
    "globals",
    "locals",
    "vars",
    "dir",
];

// Every identifier the expression language knows. Anything outside this
// set is an unsafe reference, not a typo to guess around.
const ALLOWED_IDENTIFIERS: &[&str] = &[
    "Word",
    "Literal",
    "CaselessLiteral",
    "Optional",
    "Suppress",
    "suppress",
    "nums",
    "alphas",
    "alphanums",
    "printables",
    "hexnums",
    "punc8bit",
    "lineEnd",
    "exact",
    "min",
    "max",
];

#[derive(Clone, Debug, PartialEq)]
enum _LeiCToken {
    Ident(String),
    Int(usize),
    Str(String),
    Plus,
    Caret,
    Pipe,
    LParen,
    RParen,
    Comma,
    Eq,
    Dot,
}

impl _LeiCToken {
    fn describe(&self) -> String {
        match self {
            _LeiCToken::Ident(name) => format!("identifier '{}'", name),
            _LeiCToken::Int(v) => format!("integer {}", v),
            _LeiCToken::Str(_) => "string literal".to_string(),
            _LeiCToken::Plus => "'+'".to_string(),
            _LeiCToken::Caret => "'^'".to_string(),
            _LeiCToken::Pipe => "'|'".to_string(),
            _LeiCToken::LParen => "'('".to_string(),
            _LeiCToken::RParen => "')'".to_string(),
            _LeiCToken::Comma => "','".to_string(),
            _LeiCToken::Eq => "'='".to_string(),
            _LeiCToken::Dot => "'.'".to_string(),
        }
    }
}

fn _LeiFSyntax(detail: impl Into<String>) -> LeiError {
    LeiError::compile(LeiCCompileErrorKind::Syntax, detail)
}

fn _LeiFUnsafe(detail: impl Into<String>) -> LeiError {
    LeiError::compile(LeiCCompileErrorKind::Unsafe, detail)
}

fn _LeiFUnsupported(detail: impl Into<String>) -> LeiError {
    LeiError::compile(LeiCCompileErrorKind::Unsupported, detail)
}

/// Rejects expressions containing any dangerous substring. Runs on the raw
/// text so that nothing objectionable survives into tokenization.
fn _LeiFScreen(expr: &str) -> Result<()> {
    let lowered = expr.to_lowercase();
    for pattern in DANGEROUS_PATTERNS {
        if lowered.contains(pattern) {
            return Err(_LeiFUnsafe(format!(
                "expression contains forbidden pattern '{}'",
                pattern
            )));
        }
    }
    Ok(())
}

fn _LeiFTokenize(expr: &str) -> Result<Vec<_LeiCToken>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut pos = 0usize;
    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(_LeiCToken::Ident(chars[start..pos].iter().collect()));
            continue;
        }
        if ch.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let value = text
                .parse::<usize>()
                .map_err(|_| _LeiFSyntax(format!("integer literal '{}' out of range", text)))?;
            tokens.push(_LeiCToken::Int(value));
            continue;
        }
        if ch == '\'' || ch == '"' {
            let quote = ch;
            pos += 1;
            let mut text = String::new();
            let mut closed = false;
            while pos < chars.len() {
                let c = chars[pos];
                if c == '\\' && pos + 1 < chars.len() {
                    let escaped = chars[pos + 1];
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    pos += 2;
                    continue;
                }
                if c == quote {
                    closed = true;
                    pos += 1;
                    break;
                }
                text.push(c);
                pos += 1;
            }
            if !closed {
                return Err(_LeiFSyntax("unterminated string literal"));
            }
            tokens.push(_LeiCToken::Str(text));
            continue;
        }
        let token = match ch {
            '+' => _LeiCToken::Plus,
            '^' => _LeiCToken::Caret,
            '|' => _LeiCToken::Pipe,
            '(' => _LeiCToken::LParen,
            ')' => _LeiCToken::RParen,
            ',' => _LeiCToken::Comma,
            '=' => _LeiCToken::Eq,
            '.' => _LeiCToken::Dot,
            other => {
                return Err(_LeiFSyntax(format!(
                    "unexpected character '{}' in expression",
                    other
                )))
            }
        };
        tokens.push(token);
        pos += 1;
    }
    Ok(tokens)
}

/// Every identifier in the token stream must be on the allow-list; an
/// unknown name means the expression tried to reach outside the closed
/// namespace.
fn _LeiFCheckIdentifiers(tokens: &[_LeiCToken]) -> Result<()> {
    for token in tokens {
        if let _LeiCToken::Ident(name) = token {
            if !ALLOWED_IDENTIFIERS.contains(&name.as_str()) {
                return Err(_LeiFUnsafe(format!(
                    "identifier '{}' is not part of the grammar namespace",
                    name
                )));
            }
        }
    }
    Ok(())
}

struct _LeiCTokenCursor {
    tokens: Vec<_LeiCToken>,
    pos: usize,
}

impl _LeiCTokenCursor {
    fn peek(&self) -> Option<&_LeiCToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<_LeiCToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &_LeiCToken) -> Result<()> {
        match self.next() {
            Some(token) if token == *expected => Ok(()),
            Some(token) => Err(_LeiFSyntax(format!(
                "expected {} but found {}",
                expected.describe(),
                token.describe()
            ))),
            None => Err(_LeiFSyntax(format!(
                "expected {} but expression ended",
                expected.describe()
            ))),
        }
    }
}

/// Parser for grammar rule bodies.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeiCGrammarParser;

impl LeiCGrammarParser {
    #[allow(non_snake_case)]
    pub fn LeiFNew() -> Self {
        LeiCGrammarParser
    }

    /// Parses an expression into grammar IR under the safety contract.
    #[allow(non_snake_case)]
    pub fn LeiFParse(&self, expr: &str) -> Result<LeiCGrammarNode> {
        if expr.trim().is_empty() {
            return Err(_LeiFSyntax("empty grammar expression"));
        }
        _LeiFScreen(expr)?;
        let tokens = _LeiFTokenize(expr)?;
        _LeiFCheckIdentifiers(&tokens)?;
        let mut cursor = _LeiCTokenCursor { tokens, pos: 0 };
        let node = self.parse_alternation(&mut cursor)?;
        if let Some(trailing) = cursor.peek() {
            return Err(_LeiFSyntax(format!(
                "unexpected trailing {}",
                trailing.describe()
            )));
        }
        Ok(node)
    }

    // expr := xor ('|' xor)*
    fn parse_alternation(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        let mut branches = vec![self.parse_longest(cursor)?];
        while cursor.peek() == Some(&_LeiCToken::Pipe) {
            cursor.next();
            branches.push(self.parse_longest(cursor)?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().expect("single branch"))
        } else {
            Ok(LeiCGrammarNode::First(branches))
        }
    }

    // xor := seq ('^' seq)*
    fn parse_longest(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        let mut branches = vec![self.parse_sequence(cursor)?];
        while cursor.peek() == Some(&_LeiCToken::Caret) {
            cursor.next();
            branches.push(self.parse_sequence(cursor)?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().expect("single branch"))
        } else {
            Ok(LeiCGrammarNode::Longest(branches))
        }
    }

    // seq := postfix ('+' postfix)*
    fn parse_sequence(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        let mut items = vec![self.parse_postfix(cursor)?];
        while cursor.peek() == Some(&_LeiCToken::Plus) {
            cursor.next();
            items.push(self.parse_postfix(cursor)?);
        }
        if items.len() == 1 {
            Ok(items.pop().expect("single item"))
        } else {
            Ok(LeiCGrammarNode::Sequence(items))
        }
    }

    // postfix := atom ('.suppress()')*
    //
    // The postfix is the only attribute access the language admits; any
    // other dotted name is an escape attempt.
    fn parse_postfix(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        let mut node = self.parse_atom(cursor)?;
        while cursor.peek() == Some(&_LeiCToken::Dot) {
            cursor.next();
            match cursor.next() {
                Some(_LeiCToken::Ident(name)) if name == "suppress" => {
                    cursor.expect(&_LeiCToken::LParen)?;
                    cursor.expect(&_LeiCToken::RParen)?;
                    node = LeiCGrammarNode::Suppress(Box::new(node));
                }
                Some(token) => {
                    return Err(_LeiFUnsafe(format!(
                        "attribute access {} is not allowed; only .suppress() is recognized",
                        token.describe()
                    )))
                }
                None => return Err(_LeiFSyntax("dangling '.' at end of expression")),
            }
        }
        Ok(node)
    }

    fn parse_atom(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        match cursor.next() {
            Some(_LeiCToken::LParen) => {
                let node = self.parse_alternation(cursor)?;
                cursor.expect(&_LeiCToken::RParen)?;
                Ok(node)
            }
            // Bare strings combine as verbatim literals, matching the
            // source language's implicit conversion.
            Some(_LeiCToken::Str(text)) => {
                if text.is_empty() {
                    return Err(_LeiFSyntax("empty literal"));
                }
                Ok(LeiCGrammarNode::Literal {
                    text,
                    caseless: false,
                })
            }
            Some(_LeiCToken::Ident(name)) => self.parse_named_atom(cursor, &name),
            Some(token) => Err(_LeiFSyntax(format!(
                "expected an expression but found {}",
                token.describe()
            ))),
            None => Err(_LeiFSyntax("expected an expression but input ended")),
        }
    }

    fn parse_named_atom(
        &self,
        cursor: &mut _LeiCTokenCursor,
        name: &str,
    ) -> Result<LeiCGrammarNode> {
        match name {
            "Word" => self.parse_word(cursor),
            "Literal" | "CaselessLiteral" => {
                cursor.expect(&_LeiCToken::LParen)?;
                let text = match cursor.next() {
                    Some(_LeiCToken::Str(text)) => text,
                    Some(token) => {
                        return Err(_LeiFSyntax(format!(
                            "{} takes a string argument, found {}",
                            name,
                            token.describe()
                        )))
                    }
                    None => return Err(_LeiFSyntax(format!("{} missing its argument", name))),
                };
                if text.is_empty() {
                    return Err(_LeiFSyntax(format!("{} cannot be empty", name)));
                }
                cursor.expect(&_LeiCToken::RParen)?;
                Ok(LeiCGrammarNode::Literal {
                    text,
                    caseless: name == "CaselessLiteral",
                })
            }
            "Optional" | "Suppress" => {
                cursor.expect(&_LeiCToken::LParen)?;
                let inner = self.parse_alternation(cursor)?;
                cursor.expect(&_LeiCToken::RParen)?;
                if name == "Optional" {
                    Ok(LeiCGrammarNode::Optional(Box::new(inner)))
                } else {
                    Ok(LeiCGrammarNode::Suppress(Box::new(inner)))
                }
            }
            "lineEnd" => Ok(LeiCGrammarNode::LineEnd),
            "nums" | "alphas" | "alphanums" | "printables" | "hexnums" | "punc8bit" => {
                Err(_LeiFSyntax(format!(
                    "character class '{}' can only appear inside Word(...)",
                    name
                )))
            }
            other => Err(_LeiFUnsafe(format!(
                "'{}' cannot start an expression",
                other
            ))),
        }
    }

    // Word(cls) | Word(cls, exact=N) | Word(cls, min=M, max=N)
    fn parse_word(&self, cursor: &mut _LeiCTokenCursor) -> Result<LeiCGrammarNode> {
        cursor.expect(&_LeiCToken::LParen)?;
        let class = match cursor.next() {
            Some(_LeiCToken::Ident(name)) => LeiCCharClass::LeiFFromName(&name).ok_or_else(|| {
                _LeiFSyntax(format!("'{}' is not a character class", name))
            })?,
            Some(_LeiCToken::Str(chars)) => {
                if chars.is_empty() {
                    return Err(_LeiFSyntax("Word character set cannot be empty"));
                }
                LeiCCharClass::Custom(chars)
            }
            Some(token) => {
                return Err(_LeiFSyntax(format!(
                    "Word takes a character class, found {}",
                    token.describe()
                )))
            }
            None => return Err(_LeiFSyntax("Word missing its character class")),
        };

        let mut exact: Option<usize> = None;
        let mut min: Option<usize> = None;
        let mut max: Option<usize> = None;
        while cursor.peek() == Some(&_LeiCToken::Comma) {
            cursor.next();
            let key = match cursor.next() {
                Some(_LeiCToken::Ident(key)) => key,
                Some(token) => {
                    return Err(_LeiFUnsupported(format!(
                        "Word only supports keyword bounds, found {}",
                        token.describe()
                    )))
                }
                None => return Err(_LeiFSyntax("unterminated Word argument list")),
            };
            cursor.expect(&_LeiCToken::Eq)?;
            let value = match cursor.next() {
                Some(_LeiCToken::Int(value)) => value,
                Some(token) => {
                    return Err(_LeiFSyntax(format!(
                        "Word bound '{}' expects an integer, found {}",
                        key,
                        token.describe()
                    )))
                }
                None => return Err(_LeiFSyntax("unterminated Word argument list")),
            };
            match key.as_str() {
                "exact" => exact = Some(value),
                "min" => min = Some(value),
                "max" => max = Some(value),
                other => {
                    return Err(_LeiFUnsupported(format!(
                        "Word does not support keyword '{}'",
                        other
                    )))
                }
            }
        }
        cursor.expect(&_LeiCToken::RParen)?;

        if let Some(n) = exact {
            if min.is_some() || max.is_some() {
                return Err(_LeiFUnsupported(
                    "Word cannot combine exact= with min=/max=",
                ));
            }
            if n == 0 {
                return Err(_LeiFSyntax("Word exact bound must be positive"));
            }
            return Ok(LeiCGrammarNode::Word {
                class,
                min: n,
                max: Some(n),
            });
        }
        let min = min.unwrap_or(1);
        if min == 0 {
            return Err(_LeiFSyntax("Word min bound must be positive"));
        }
        if let Some(m) = max {
            if m < min {
                return Err(_LeiFSyntax("Word max bound is below its min bound"));
            }
        }
        Ok(LeiCGrammarNode::Word { class, min, max })
    }
}

/// Parses a grammar rule body into IR.
#[allow(non_snake_case)]
pub fn LeiFParseGrammar(expr: &str) -> Result<LeiCGrammarNode> {
    LeiCGrammarParser::LeiFNew().LeiFParse(expr)
}
