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

/// A branding colour in `#RRGGBB` form.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HexColor(pub String);

impl ValueObjectable for HexColor {
    type DataType = String;

    fn validate(&self) -> Result<(), String> {
        let re = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
        if re.is_match(&self.0) {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid #RRGGBB colour", self.0))
        }
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::value_object::ValueObject;

    #[test]
    fn accepts_valid_hex() {
        assert!(ValueObject::new(HexColor("#1A2B3C".to_string())).is_ok());
    }

    #[test]
    fn rejects_missing_hash() {
        assert!(ValueObject::new(HexColor("1A2B3C".to_string())).is_err());
    }

    #[test]
    fn rejects_short_values() {
        assert!(ValueObject::new(HexColor("#FFF".to_string())).is_err());
    }
}
