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

use regex::{Regex, RegexBuilder};

/// Closed set of dangerous patterns stripped from ad-hoc query input before it is
/// forwarded anywhere near a database: a trailing destructive statement, `UNION
/// SELECT`, and comment syntax that could otherwise truncate or splice a query.
/// Case-insensitive, since SQL keywords are case-insensitive in practice.
static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r";\s*(DROP|DELETE|TRUNCATE|ALTER|CREATE|INSERT|UPDATE)\b",
        r"\bUNION\s+SELECT\b",
        r"--.*$",
        r"/\*.*?\*/",
    ]
    .iter()
    .map(|pattern| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .expect("dangerous-pattern regex is valid")
    })
    .collect()
});

/// Result of running [`sanitize`]: the cleaned string plus whether anything was
/// actually stripped. A non-empty `stripped` is itself a security event (§4.8) —
/// callers should route it to [`crate::security::audit::security_violation`].
pub struct SanitizeResult {
    pub cleaned: String,
    pub stripped: bool,
}

pub fn sanitize(input: &str) -> SanitizeResult {
    let mut cleaned = input.to_string();
    let mut stripped = false;
    for pattern in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            stripped = true;
            cleaned = pattern.replace_all(&cleaned, "").to_string();
        }
    }
    SanitizeResult { cleaned, stripped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_benign_input() {
        let result = sanitize("acme-tenant-42");
        assert!(!result.stripped);
        assert_eq!(result.cleaned, "acme-tenant-42");
    }

    #[test]
    fn strips_trailing_drop_statement() {
        let result = sanitize("acme; DROP TABLE tenants");
        assert!(result.stripped);
        assert!(!result.cleaned.to_uppercase().contains("DROP TABLE"));
    }

    #[test]
    fn strips_union_select() {
        let result = sanitize("id=1 UNION SELECT password FROM users");
        assert!(result.stripped);
        assert!(!result.cleaned.to_uppercase().contains("UNION SELECT"));
    }

    #[test]
    fn strips_line_comments() {
        let result = sanitize("acme' -- ignore rest");
        assert!(result.stripped);
        assert!(!result.cleaned.contains("--"));
    }
}
