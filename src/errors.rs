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

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convience result type used throughout Lei Core.
pub type Result<T> = std::result::Result<T, LeiError>;

/// Failure class for grammar compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeiCCompileErrorKind {
    /// Expression does not parse under the grammar expression language.
    Syntax,
    /// Expression references a construct outside the closed namespace.
    Unsafe,
    /// Expression uses a recognized but unsupported combinator form.
    Unsupported,
}

impl LeiCCompileErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeiCCompileErrorKind::Syntax => "syntax",
            LeiCCompileErrorKind::Unsafe => "unsafe",
            LeiCCompileErrorKind::Unsupported => "unsupported",
        }
    }
}

/// Canonical error enumeration for Lei Core.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum LeiError {
    /// A grammar rule body was rejected by the safe compiler.
    #[error("rule compile error ({}): {detail}", .kind.as_str())]
    RuleCompile {
        kind: LeiCCompileErrorKind,
        detail: String,
    },

    /// A `func` or `validator` reference could not be resolved in the
    /// registration table.
    #[error("cannot resolve function '{name}': {detail}")]
    RuleResolve { name: String, detail: String },

    /// A rule definition is missing required fields or carries
    /// contradictory bounds.
    #[error("invalid rule '{rule}': {message}")]
    RuleValidation { rule: String, message: String },

    /// A rule file could not be parsed at all.
    #[error("cannot parse rule file '{file}': {message}")]
    FileParse { file: String, message: String },

    /// A matcher failed while evaluating a single candidate value.
    #[error("matcher runtime error: {0}")]
    MatcherRuntime(String),

    /// A scan was cancelled cooperatively; partial state is discarded.
    #[error("scan cancelled")]
    Cancelled,

    /// Caller passed invalid option ranges.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for LeiError {
    fn from(err: io::Error) -> Self {
        LeiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LeiError {
    fn from(err: serde_json::Error) -> Self {
        LeiError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for LeiError {
    fn from(err: serde_yaml::Error) -> Self {
        LeiError::Serde(err.to_string())
    }
}

impl LeiError {
    /// Helper to construct grammar compile errors.
    pub fn compile(kind: LeiCCompileErrorKind, detail: impl Into<String>) -> Self {
        LeiError::RuleCompile {
            kind,
            detail: detail.into(),
        }
    }

    /// Helper to construct resolve errors.
    pub fn resolve(name: impl Into<String>, detail: impl Into<String>) -> Self {
        LeiError::RuleResolve {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Helper to construct rule validation errors.
    pub fn rule_validation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        LeiError::RuleValidation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Helper to construct file parse errors.
    pub fn file_parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        LeiError::FileParse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        LeiError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        LeiError::Internal(message.into())
    }

    /// Returns the compile error kind when this error came out of the
    /// grammar compiler.
    pub fn compile_kind(&self) -> Option<LeiCCompileErrorKind> {
        match self {
            LeiError::RuleCompile { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
