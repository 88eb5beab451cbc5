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

//! # Match Function Registry
//!
//! `func` rules and `validator` references name a function by dotted path.
//! Instead of resolving such paths dynamically, every callable is
//! registered here under a stable name at startup; YAML references resolve
//! against this table and unknown names fail as resolve errors. Callers
//! may register additional functions before loading a catalog.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

use crate::errors::Result;

/// Signature every registered match/validator function fulfills.
pub type LeiCMatchFn = fn(&str) -> Result<bool>;

static REGISTRY: OnceLock<Mutex<HashMap<String, LeiCMatchFn>>> = OnceLock::new();

fn _LeiFRegistry() -> &'static Mutex<HashMap<String, LeiCMatchFn>> {
    REGISTRY.get_or_init(|| {
        let mut table: HashMap<String, LeiCMatchFn> = HashMap::new();
        table.insert("validators.email".to_string(), _LeiFIsEmail as LeiCMatchFn);
        table.insert("validators.url".to_string(), _LeiFIsUrl as LeiCMatchFn);
        table.insert("validators.uuid".to_string(), _LeiFIsUuid as LeiCMatchFn);
        table.insert("validators.luhn".to_string(), _LeiFLuhn as LeiCMatchFn);
        table.insert("validators.ru.inn".to_string(), _LeiFRuInn as LeiCMatchFn);
        table.insert("validators.ru.ogrn".to_string(), _LeiFRuOgrn as LeiCMatchFn);
        table.insert(
            "validators.ru.snils".to_string(),
            _LeiFRuSnils as LeiCMatchFn,
        );
        Mutex::new(table)
    })
}

/// Registers a function under a dotted name. Re-registering a name
/// replaces the previous entry; registration after catalog load has no
/// effect on already-compiled rules.
#[allow(non_snake_case)]
pub fn LeiFRegisterMatchFunc(name: impl Into<String>, func: LeiCMatchFn) {
    if let Ok(mut table) = _LeiFRegistry().lock() {
        table.insert(name.into(), func);
    }
}

/// Looks a dotted name up in the table.
#[allow(non_snake_case)]
pub fn LeiFResolveMatchFunc(name: &str) -> Option<LeiCMatchFn> {
    _LeiFRegistry()
        .lock()
        .ok()
        .and_then(|table| table.get(name).copied())
}

/// Names currently registered, sorted for deterministic reporting.
#[allow(non_snake_case)]
pub fn LeiFRegisteredNames() -> Vec<String> {
    let mut names: Vec<String> = _LeiFRegistry()
        .lock()
        .map(|table| table.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();
static UUID_RE: OnceLock<Regex> = OnceLock::new();

fn _LeiFIsEmail(value: &str) -> Result<bool> {
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").expect("email regex")
    });
    Ok(re.is_match(value.trim()))
}

fn _LeiFIsUrl(value: &str) -> Result<bool> {
    let re = URL_RE.get_or_init(|| {
        Regex::new(r"^https?://[A-Za-z0-9.-]+(:\d+)?(/[^\s]*)?$").expect("url regex")
    });
    Ok(re.is_match(value.trim()))
}

fn _LeiFIsUuid(value: &str) -> Result<bool> {
    let re = UUID_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("uuid regex")
    });
    Ok(re.is_match(value.trim()))
}

fn _LeiFDigits(value: &str) -> Option<Vec<u32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(trimmed.chars().filter_map(|c| c.to_digit(10)).collect())
}

/// Luhn checksum over a plain digit string (payment cards, IMEI and
/// similar identifiers).
fn _LeiFLuhn(value: &str) -> Result<bool> {
    let digits = match _LeiFDigits(value) {
        Some(d) if d.len() >= 2 => d,
        _ => return Ok(false),
    };
    let mut sum = 0u32;
    for (idx, digit) in digits.iter().rev().enumerate() {
        let mut d = *digit;
        if idx % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    Ok(sum % 10 == 0)
}

/// Russian taxpayer number (INN), 10 digits for organizations and 12 for
/// individuals, each with its own weighted checksum.
fn _LeiFRuInn(value: &str) -> Result<bool> {
    let digits = match _LeiFDigits(value) {
        Some(d) => d,
        None => return Ok(false),
    };
    let weighted = |weights: &[u32], digits: &[u32]| -> u32 {
        let sum: u32 = weights
            .iter()
            .zip(digits.iter())
            .map(|(w, d)| w * d)
            .sum();
        (sum % 11) % 10
    };
    match digits.len() {
        10 => {
            let check = weighted(&[2, 4, 10, 3, 5, 9, 4, 6, 8], &digits[..9]);
            Ok(check == digits[9])
        }
        12 => {
            let first = weighted(&[7, 2, 4, 10, 3, 5, 9, 4, 6, 8], &digits[..10]);
            let second = weighted(&[3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8], &digits[..11]);
            Ok(first == digits[10] && second == digits[11])
        }
        _ => Ok(false),
    }
}

/// Russian company registration number (OGRN, 13 digits) or individual
/// entrepreneur registration number (OGRNIP, 15 digits).
fn _LeiFRuOgrn(value: &str) -> Result<bool> {
    let digits = match _LeiFDigits(value) {
        Some(d) => d,
        None => return Ok(false),
    };
    let as_number = |digits: &[u32]| -> u64 {
        digits.iter().fold(0u64, |acc, d| acc * 10 + *d as u64)
    };
    match digits.len() {
        13 => {
            let check = (as_number(&digits[..12]) % 11 % 10) as u32;
            Ok(check == digits[12])
        }
        15 => {
            let check = (as_number(&digits[..14]) % 13 % 10) as u32;
            Ok(check == digits[14])
        }
        _ => Ok(false),
    }
}

/// Russian pension insurance number (SNILS), 11 digits; separators are
/// tolerated since the number is usually written `XXX-XXX-XXX YY`.
fn _LeiFRuSnils(value: &str) -> Result<bool> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    let digits = match _LeiFDigits(&cleaned) {
        Some(d) if d.len() == 11 => d,
        _ => return Ok(false),
    };
    let sum: u32 = digits[..9]
        .iter()
        .enumerate()
        .map(|(idx, d)| d * (9 - idx as u32))
        .sum();
    let mut check = sum % 101;
    if check == 100 {
        check = 0;
    }
    Ok(check == digits[9] * 10 + digits[10])
}
