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

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};

use crate::log::config::LeiCLogConfig;
use crate::log::handlers::{LeiCFileHandler, LeiCLogHandler, LeiCStdoutHandler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeiCLogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Success,
}

impl LeiCLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeiCLogLevel::Debug => "DEBUG",
            LeiCLogLevel::Info => "INFO",
            LeiCLogLevel::Warning => "WARNING",
            LeiCLogLevel::Error => "ERROR",
            LeiCLogLevel::Success => "SUCCESS",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LeiCLogRecord {
    pub level: LeiCLogLevel,
    pub event: String,
    pub message: String,
    pub fields: Map<String, Value>,
    pub timestamp: SystemTime,
}

impl LeiCLogRecord {
    #[allow(non_snake_case)]
    pub fn LeiFToJson(&self) -> Value {
        let ts = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let mut data = Map::new();
        data.insert("level".into(), json!(self.level.as_str()));
        data.insert("event".into(), json!(self.event));
        data.insert("message".into(), json!(self.message));
        data.insert("timestamp_ms".into(), json!(ts));
        data.insert("fields".into(), Value::Object(self.fields.clone()));
        Value::Object(data)
    }
}

struct LeiCLoggerInner {
    config: LeiCLogConfig,
    handlers: Vec<Box<dyn LeiCLogHandler + Send + Sync>>,
}

impl LeiCLoggerInner {
    fn emit(&self, record: LeiCLogRecord) {
        if !self.config.LeiFShouldLog(&record) {
            return;
        }
        for handler in &self.handlers {
            handler.handle(&record);
        }
    }
}

static LOGGER: OnceLock<LeiCLoggerInner> = OnceLock::new();

#[derive(Debug, Default)]
pub struct LeiCLogger;

impl LeiCLogger {
    /// Initialize the global logger with a configuration. Safe to call
    /// multiple times; the first call wins.
    #[allow(non_snake_case)]
    pub fn LeiFInit(config: LeiCLogConfig) {
        let _ = LOGGER.get_or_init(|| {
            let mut handlers: Vec<Box<dyn LeiCLogHandler + Send + Sync>> = Vec::new();
            if config.console_enabled {
                handlers.push(Box::new(LeiCStdoutHandler::LeiFNew(
                    config.json_format_console,
                )));
            }
            if config.file_enabled {
                if let Some(path) = &config.file_path {
                    handlers.push(Box::new(LeiCFileHandler::LeiFNew(
                        path.clone(),
                        config.json_format_console,
                        config.rotate_when.clone(),
                        config.max_bytes,
                        config.backup_count,
                    )));
                }
            }
            LeiCLoggerInner { config, handlers }
        });
    }

    /// Emit a structured log event. A no-op until the logger is
    /// initialized, so library code can log unconditionally.
    #[allow(non_snake_case)]
    pub fn LeiFEvent<L, S>(level: LeiCLogLevel, event: S, message: S, fields: L)
    where
        L: IntoIterator<Item = (String, Value)>,
        S: Into<String>,
    {
        if let Some(inner) = LOGGER.get() {
            let mut field_map = Map::new();
            for (k, v) in fields {
                field_map.insert(k, v);
            }
            inner.emit(LeiCLogRecord {
                level,
                event: event.into(),
                message: message.into(),
                fields: field_map,
                timestamp: SystemTime::now(),
            });
        }
    }
}
