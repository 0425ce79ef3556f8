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
use crate::common::types::value_object::ValueObjectable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const RESERVED_LABELS: &[&str] = &[
    "www", "api", "admin", "app", "mail", "ftp", "localhost", "test", "dev", "staging",
    "console", "dashboard", "portal", "support", "help", "docs", "blog", "news",
];

/// A tenant `subdomain`, validated against the reserved-label list shared with `TenantId`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Subdomain(pub String);

impl Subdomain {
    pub fn is_reserved(label: &str) -> bool {
        RESERVED_LABELS.contains(&label.to_ascii_lowercase().as_str())
    }
}

impl ValueObjectable for Subdomain {
    type DataType = String;

    fn validate(&self) -> Result<(), String> {
        if !(2..=63).contains(&self.0.len()) {
            return Err(String::from("A subdomain must be 2-63 characters long"));
        }
        let re = Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap();
        if !re.is_match(&self.0) {
            return Err(String::from(
                "A subdomain may only contain lowercase letters, digits and hyphens",
            ));
        }
        if Subdomain::is_reserved(&self.0) {
            return Err(format!("'{}' is a reserved subdomain", self.0));
        }
        Ok(())
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl Display for Subdomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::value_object::ValueObject;

    #[test]
    fn accepts_a_plain_label() {
        assert!(ValueObject::new(Subdomain("acme".to_string())).is_ok());
    }

    #[test]
    fn rejects_reserved_labels() {
        assert!(ValueObject::new(Subdomain("www".to_string())).is_err());
    }

    #[test]
    fn rejects_uppercase() {
        assert!(ValueObject::new(Subdomain("Acme".to_string())).is_err());
    }

    #[test]
    fn rejects_leading_hyphen() {
        assert!(ValueObject::new(Subdomain("-acme".to_string())).is_err());
    }
}
