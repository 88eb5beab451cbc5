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

//! Structured logging for Lei: leveled JSON/text records emitted through a
//! process-global logger with stdout and file handlers. Catalog loading
//! and scans report their lifecycle here.

pub mod config;
pub mod core;
pub mod formatters;
pub mod handlers;

pub use config::LeiCLogConfig;
pub use core::{LeiCLogLevel, LeiCLogRecord, LeiCLogger};
pub use formatters::{LeiCJsonFormatter, LeiCTextFormatter};
pub use handlers::{LeiCFileHandler, LeiCLogHandler, LeiCStdoutHandler};
