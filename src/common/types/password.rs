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
use std::fmt;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Password(pub String);

impl ValueObjectable for Password {
    type DataType = String;

    fn validate(&self) -> Result<(), String> {
        let len_ok = self.0.len() >= 8;
        let has_letter = self.0.chars().any(|c| c.is_alphabetic());
        let has_digit = self.0.chars().any(|c| c.is_ascii_digit());
        if len_ok && has_letter && has_digit {
            Ok(())
        } else {
            Err("A jelszónak legalább 8 karakter hosszúnak kell lennie és tartalmaznia kell betűket és számokat".to_string())
        }
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::value_object::ValueObject;

    #[test]
    fn accepts_a_password_with_letter_and_digit() {
        assert!(ValueObject::new(Password("abc12345".to_string())).is_ok());
    }

    #[test]
    fn rejects_too_short() {
        assert!(ValueObject::new(Password("a1b2c3".to_string())).is_err());
    }

    #[test]
    fn rejects_missing_digit() {
        assert!(ValueObject::new(Password("abcdefgh".to_string())).is_err());
    }

    #[test]
    fn display_masks_the_password() {
        let pw = Password("abc12345".to_string());
        assert_eq!(format!("{pw}"), "********");
    }
}
