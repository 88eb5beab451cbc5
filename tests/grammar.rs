//! Copyright © 2025 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Lei.
//! The Lei project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#![allow(non_snake_case)]

use Lei::errors::LeiCCompileErrorKind;
use Lei::grammar::{LeiFCompileCacheSize, LeiFCompileGrammar};

#[test]
fn LeiFTGrammarWordExactConsumesWholeInput() {
    let matcher = LeiFCompileGrammar("Word(nums, exact=4)").unwrap();
    assert!(matcher.LeiFMatches("1999"));
    assert!(!matcher.LeiFMatches("199"));
    assert!(!matcher.LeiFMatches("19995"));
    assert!(!matcher.LeiFMatches("199a"));
}

#[test]
fn LeiFTGrammarWordMinMaxBounds() {
    let matcher = LeiFCompileGrammar("Word(alphas, min=2, max=4)").unwrap();
    assert!(!matcher.LeiFMatches("a"));
    assert!(matcher.LeiFMatches("ab"));
    assert!(matcher.LeiFMatches("abcd"));
    assert!(!matcher.LeiFMatches("abcde"));
}

#[test]
fn LeiFTGrammarSequenceAndLiteral() {
    let matcher = LeiFCompileGrammar("Word(nums, exact=2) + Literal(':') + Word(nums, exact=2)")
        .unwrap();
    assert!(matcher.LeiFMatches("12:34"));
    assert!(!matcher.LeiFMatches("12-34"));
    assert!(!matcher.LeiFMatches("12:345"));
}

#[test]
fn LeiFTGrammarCaselessLiteral() {
    let matcher = LeiFCompileGrammar("CaselessLiteral('ID') + Word(nums)").unwrap();
    assert!(matcher.LeiFMatches("ID42"));
    assert!(matcher.LeiFMatches("id42"));
    assert!(matcher.LeiFMatches("Id42"));
    assert!(!matcher.LeiFMatches("XX42"));
}

#[test]
fn LeiFTGrammarOptionalAndSuppress() {
    let matcher =
        LeiFCompileGrammar("Optional(Literal('+')) + Word(nums, min=1, max=3)").unwrap();
    assert!(matcher.LeiFMatches("+42"));
    assert!(matcher.LeiFMatches("42"));
    assert!(!matcher.LeiFMatches("+"));

    let suppressed = LeiFCompileGrammar("Suppress(Literal('#')) + Word(hexnums, exact=6)").unwrap();
    assert!(suppressed.LeiFMatches("#a1b2c3"));
    assert!(!suppressed.LeiFMatches("a1b2c3"));

    let postfix = LeiFCompileGrammar("Literal('#').suppress() + Word(hexnums, exact=3)").unwrap();
    assert!(postfix.LeiFMatches("#abc"));
}

// The year grammar from the catalog: `^` must pick the longest accepting
// branch and `Word('01', exact=1)` must reject every digit outside its set.
#[test]
fn LeiFTGrammarLongestAlternativeYearShape() {
    let matcher = LeiFCompileGrammar(
        "(Literal('1') + Word(nums, exact=3)) ^ (Literal('2') + Word('01', exact=1) + Word(nums, exact=2))",
    )
    .unwrap();
    assert!(matcher.LeiFMatches("1999"));
    assert!(matcher.LeiFMatches("2012"));
    assert!(matcher.LeiFMatches("2100"));
    assert!(!matcher.LeiFMatches("2200"));
    assert!(!matcher.LeiFMatches("abcd"));
}

#[test]
fn LeiFTGrammarFirstAlternativeKeepsLeftmost() {
    let matcher = LeiFCompileGrammar("Literal('aa') | Literal('aab')").unwrap();
    // The leftmost branch accepts only "aa"; for the full input "aab" the
    // first branch leaves a trailing byte, so the whole match fails even
    // though the second branch would consume everything.
    assert!(matcher.LeiFMatches("aa"));
    assert!(!matcher.LeiFMatches("aab"));

    let longest = LeiFCompileGrammar("Literal('aa') ^ Literal('aab')").unwrap();
    assert!(longest.LeiFMatches("aab"));
}

#[test]
fn LeiFTGrammarLineEndAllowsTrailingWhitespace() {
    let matcher = LeiFCompileGrammar("Word(nums, exact=3) + lineEnd").unwrap();
    assert!(matcher.LeiFMatches("123"));
    assert!(matcher.LeiFMatches("123  "));
    assert!(matcher.LeiFMatches("123\n"));

    let strict = LeiFCompileGrammar("Word(nums, exact=3)").unwrap();
    assert!(!strict.LeiFMatches("123  "));
}

#[test]
fn LeiFTGrammarRejectsImportAsUnsafe() {
    let err = LeiFCompileGrammar("__import__('os').system('x')").unwrap_err();
    assert_eq!(err.compile_kind(), Some(LeiCCompileErrorKind::Unsafe));
}

#[test]
fn LeiFTGrammarRejectsDangerousSubstrings() {
    for expr in [
        "open('/etc/passwd')",
        "eval('1+1')",
        "exec('x')",
        "compile('x')",
        "Word(nums) + __x",
    ] {
        let err = LeiFCompileGrammar(expr).unwrap_err();
        assert_eq!(
            err.compile_kind(),
            Some(LeiCCompileErrorKind::Unsafe),
            "expected unsafe for {}",
            expr
        );
    }
}

#[test]
fn LeiFTGrammarRejectsUnknownIdentifiers() {
    let err = LeiFCompileGrammar("Word(nums) + mystery").unwrap_err();
    assert_eq!(err.compile_kind(), Some(LeiCCompileErrorKind::Unsafe));
}

#[test]
fn LeiFTGrammarRejectsForeignAttributeAccess() {
    let err = LeiFCompileGrammar("Word(nums).leaveWhitespace()").unwrap_err();
    assert_eq!(err.compile_kind(), Some(LeiCCompileErrorKind::Unsafe));
}

#[test]
fn LeiFTGrammarSyntaxErrors() {
    for expr in ["Word(", "Literal()", "Word(nums) +", "()", "nums"] {
        let err = LeiFCompileGrammar(expr).unwrap_err();
        assert_eq!(
            err.compile_kind(),
            Some(LeiCCompileErrorKind::Syntax),
            "expected syntax error for {}",
            expr
        );
    }
}

#[test]
fn LeiFTGrammarUnsupportedForms() {
    let positional = LeiFCompileGrammar("Word(nums, 'abc')").unwrap_err();
    assert_eq!(
        positional.compile_kind(),
        Some(LeiCCompileErrorKind::Unsupported)
    );

    let combined = LeiFCompileGrammar("Word(nums, exact=2, min=1)").unwrap_err();
    assert_eq!(
        combined.compile_kind(),
        Some(LeiCCompileErrorKind::Unsupported)
    );
}

#[test]
fn LeiFTGrammarCompileIsMemoized() {
    let body = "Word(nums, exact=9) + Literal('z')";
    let first = LeiFCompileGrammar(body).unwrap();
    let second = LeiFCompileGrammar(body).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(LeiFCompileCacheSize() >= 1);
    // Cache hits preserve semantics.
    assert!(first.LeiFMatches("123456789z"));
    assert!(second.LeiFMatches("123456789z"));
    assert!(!second.LeiFMatches("12345678z"));
}

#[test]
fn LeiFTGrammarWhitespaceSkippedBetweenElements() {
    let matcher = LeiFCompileGrammar("Word(alphas, exact=2) + Word(nums, exact=2)").unwrap();
    assert!(matcher.LeiFMatches("ab12"));
    assert!(matcher.LeiFMatches("ab 12"));
    assert!(!matcher.LeiFMatches("ab  1"));
}
