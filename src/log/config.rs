//! Copyright © 2025 Wenze Wei. All Rights Reserved.
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

use serde::{Deserialize, Serialize};

use super::core::{LeiCLogLevel, LeiCLogRecord};

/// Configuration for the LeiCLogger: console/file enablement, default
/// level, JSON formatting and size-based rotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeiCLogConfig {
    pub default_level: String,
    pub console_enabled: bool,
    pub json_format_console: bool,
    /// Whether file logging is enabled.
    pub file_enabled: bool,
    /// Optional log file path when file logging is enabled.
    pub file_path: Option<String>,
    /// Rolling/rotation strategy (currently only "size").
    pub rotate_when: Option<String>,
    /// Maximum file size in bytes when size-based rotation is used.
    pub max_bytes: Option<u64>,
    /// Number of backup files to keep when rotating.
    pub backup_count: Option<u32>,
}

impl Default for LeiCLogConfig {
    fn default() -> Self {
        LeiCLogConfig {
            default_level: "INFO".to_string(),
            console_enabled: true,
            json_format_console: true,
            file_enabled: false,
            file_path: None,
            rotate_when: Some("size".to_string()),
            max_bytes: Some(10 * 1024 * 1024),
            backup_count: Some(7),
        }
    }
}

impl LeiCLogConfig {
    #[allow(non_snake_case)]
    pub fn LeiFShouldLog(&self, record: &LeiCLogRecord) -> bool {
        let threshold = self.LeiFParseLevel(&self.default_level);
        self.LeiFLevelValue(record.level) >= self.LeiFLevelValue(threshold)
    }

    fn LeiFParseLevel(&self, s: &str) -> LeiCLogLevel {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => LeiCLogLevel::Debug,
            "WARNING" => LeiCLogLevel::Warning,
            "ERROR" => LeiCLogLevel::Error,
            "SUCCESS" => LeiCLogLevel::Success,
            _ => LeiCLogLevel::Info,
        }
    }

    fn LeiFLevelValue(&self, level: LeiCLogLevel) -> i32 {
        match level {
            LeiCLogLevel::Debug => 10,
            LeiCLogLevel::Info => 20,
            LeiCLogLevel::Success => 25,
            LeiCLogLevel::Warning => 30,
            LeiCLogLevel::Error => 40,
        }
    }
}
