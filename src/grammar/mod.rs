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

//! Safe grammar compiler for `ppr` rule bodies: a restricted expression
//! language parsed by hand and executed as a parser-combinator matcher,
//! with a process-wide compile cache.

pub mod compiler;
pub mod ir;
pub mod parser;

pub use compiler::{LeiCGrammarMatcher, LeiFCompileCacheSize, LeiFCompileGrammar};
pub use ir::{LeiCCharClass, LeiCGrammarNode};
pub use parser::{LeiCGrammarParser, LeiFParseGrammar};
