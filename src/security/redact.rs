/*
 * This file is part of the Obvia ERP.
 *
 * Copyright (C) 2025 Kovács Dávid <kapcsolat@kovacsdavid.dev>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

pub const REDACTED: &str = "***REDACTED***";

static SECRET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(secret|key|password)").expect("valid regex"));

/// Recursively walks a JSON value, replacing the value of any object key matching
/// `/(secret|key|password)/i` with [`REDACTED`]. Generalizes the fixed-field
/// redaction `TenantAdminService::export_config` applies to `database.password`
/// and the `security.*` secrets so the same rule covers arbitrary config exports,
/// logged request bodies, and environment dumps.
pub fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if SECRET_KEY.is_match(key) {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact_value(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_value(item);
            }
        }
        _ => {}
    }
}

/// Redacts a flat key/value map the same way, for env files and header dumps.
pub fn redact_map(map: &mut std::collections::HashMap<String, String>) {
    for (key, value) in map.iter_mut() {
        if SECRET_KEY.is_match(key) {
            *value = REDACTED.to_string();
        }
    }
}

/// Whether a header name is sensitive enough to drop from audit/log output
/// entirely (as opposed to redacting a value) — `Authorization` and cookies carry
/// the bearer token / refresh cookie itself, not a labeled secret field.
pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "authorization" || lower == "cookie" || lower == "set-cookie" || SECRET_KEY.is_match(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_nested_secret_fields() {
        let mut value = json!({
            "database": { "password": "hunter2", "host": "localhost" },
            "security": { "jwtSecret": "abc", "apiKey": "def" },
        });
        redact_value(&mut value);
        assert_eq!(value["database"]["password"], REDACTED);
        assert_eq!(value["database"]["host"], "localhost");
        assert_eq!(value["security"]["jwtSecret"], REDACTED);
        assert_eq!(value["security"]["apiKey"], REDACTED);
    }

    #[test]
    fn redacts_array_elements() {
        let mut value = json!([{ "password": "a" }, { "password": "b" }]);
        redact_value(&mut value);
        assert_eq!(value[0]["password"], REDACTED);
        assert_eq!(value[1]["password"], REDACTED);
    }

    #[test]
    fn flags_sensitive_headers() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("X-Api-Key"));
        assert!(!is_sensitive_header("Content-Type"));
    }
}
