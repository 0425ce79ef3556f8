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
use crate::common::types::subdomain::Subdomain;
use crate::common::types::value_object::ValueObjectable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The stable, file-system-safe identifier for a tenant: `[a-z0-9-]{2,63}`, not reserved.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl ValueObjectable for TenantId {
    type DataType = String;

    fn validate(&self) -> Result<(), String> {
        if !(2..=63).contains(&self.0.len()) {
            return Err(String::from("tenantId must be 2-63 characters long"));
        }
        let re = Regex::new(r"^[a-z0-9-]{2,63}$").unwrap();
        if !re.is_match(&self.0) {
            return Err(String::from(
                "tenantId may only contain lowercase letters, digits and hyphens",
            ));
        }
        if Subdomain::is_reserved(&self.0) {
            return Err(format!("'{}' is a reserved tenantId", self.0));
        }
        Ok(())
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
