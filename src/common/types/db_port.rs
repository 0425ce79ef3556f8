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

/// A TCP port number restricted to the 1-65535 range accepted for tenant databases.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct DbPort(pub u16);

impl ValueObjectable for DbPort {
    type DataType = u16;

    fn validate(&self) -> Result<(), String> {
        if self.0 == 0 {
            Err(String::from("port must be between 1 and 65535"))
        } else {
            Ok(())
        }
    }

    fn get_value(&self) -> &Self::DataType {
        &self.0
    }
}

impl Display for DbPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
