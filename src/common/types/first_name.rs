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
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FirstName(pub String);

impl ValueObjectable for FirstName {
    type DataType = String;

    fn validate(&self) -> Result<(), String> {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            Err("A keresztnév nem lehet üres".to_string())
        } else if trimmed.chars().count() > 100 {
            Err("A keresztnév legfeljebb 100 karakter hosszú lehet".to_string())
        } else {
            Ok(())
        }
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl Display for FirstName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::value_object::ValueObject;

    #[test]
    fn accepts_a_plain_name() {
        assert!(ValueObject::new(FirstName("Dávid".to_string())).is_ok());
    }

    #[test]
    fn rejects_an_empty_name() {
        assert!(ValueObject::new(FirstName("  ".to_string())).is_err());
    }
}
