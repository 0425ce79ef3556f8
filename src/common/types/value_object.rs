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
use serde::Deserialize;
use std::fmt::Display;

/// A trait representing a container for value object data. This trait combines functionality
/// for display and deserialization and provides methods for data validation and retrieval.
///
/// # Associated Types
/// * `DataType` - The type of the data contained within the value object.
///
/// # Provided Methods
///
/// ## `fn validate(&self) -> Result<(), String>`
/// Validates the contained data.
///
/// ## `fn get_value(&self) -> &Self::DataType`
/// Retrieves a reference to the contained data.
pub trait ValueObjectable: Display {
    type DataType;
    /// Validates the implementing type.
    ///
    /// # Returns
    /// - `Ok(())`: If the validation is successful.
    /// - `Err(String)`: If the validation fails, containing an error message.
    fn validate(&self) -> Result<(), String>;
    /// Retrieves a reference to the data associated with the current instance.
    #[allow(dead_code)]
    fn get_value(&self) -> &Self::DataType;
}

/// A generic `ValueObject` struct that wraps a single data type, `DataType`.
///
/// Holds only a single data item and does not provide any additional behavior
/// beyond encapsulation. Used to enforce type safety for domain concepts where
/// primitive types alone would not provide adequate clarity or constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueObject<DataType>(DataType);

impl<DataType> ValueObject<DataType>
where
    DataType: ValueObjectable,
{
    /// Creates a new `ValueObject` instance from the provided `data`.
    ///
    /// # Errors
    /// Returns an error `String` if `data.validate()` fails.
    pub fn new(data: DataType) -> Result<ValueObject<DataType>, String> {
        data.validate()?;
        Ok(ValueObject(data))
    }
}

impl<DataType> ValueObject<DataType> {
    /// Retrieves a reference to the inner data stored within the wrapper.
    #[allow(dead_code)]
    pub fn extract(&self) -> &DataType {
        &self.0
    }
}

impl<DataType> Display for ValueObject<DataType>
where
    DataType: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de, DataType> Deserialize<'de> for ValueObject<DataType>
where
    DataType: ValueObjectable + Deserialize<'de>,
{
    /// Deserialises the inner `DataType` and validates it before wrapping.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = DataType::deserialize(deserializer)?;
        ValueObject::new(data).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Flag(bool);

    impl Display for Flag {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl ValueObjectable for Flag {
        type DataType = bool;

        fn validate(&self) -> Result<(), String> {
            if self.0 { Ok(()) } else { Err(String::from("must be true")) }
        }

        fn get_value(&self) -> &Self::DataType {
            &self.0
        }
    }

    #[test]
    fn rejects_failing_validation() {
        let res = serde_json::from_str::<ValueObject<Flag>>("false").unwrap_err();
        assert_eq!(res.to_string(), "must be true");
    }

    #[test]
    fn accepts_passing_validation() {
        let vo = serde_json::from_str::<ValueObject<Flag>>("true").unwrap();
        assert!(vo.extract().get_value());
    }
}
