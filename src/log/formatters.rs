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

use crate::log::core::LeiCLogRecord;

pub struct LeiCJsonFormatter;

impl LeiCJsonFormatter {
    #[allow(non_snake_case)]
    pub fn LeiFFormat(record: &LeiCLogRecord) -> String {
        record.LeiFToJson().to_string()
    }
}

pub struct LeiCTextFormatter;

impl LeiCTextFormatter {
    #[allow(non_snake_case)]
    pub fn LeiFFormat(record: &LeiCLogRecord) -> String {
        let fields = if record.fields.is_empty() {
            String::new()
        } else {
            format!(
                " {}",
                serde_json::Value::Object(record.fields.clone())
            )
        };
        format!(
            "{} [{}] {}{}",
            record.level.as_str(),
            record.event,
            record.message,
            fields
        )
    }
}
