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

use crate::common::error::FormErrorResponse;
use crate::common::types::value_object::{ValueObject, ValueObjectable};
use crate::common::types::{Email, FirstName, LastName, Password};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Permissive deserialisation target for a registration payload, validated field-by-field
/// into [`RegisterRequest`] so the caller gets back exactly which fields were wrong.
#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct RegisterRequestHelper {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize, Default)]
pub struct RegisterRequestError {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl RegisterRequestError {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password.is_none()
            && self.password_confirm.is_none()
    }
}

impl Display for RegisterRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "registration request validation failed")
    }
}

impl FormErrorResponse for RegisterRequestError {}

impl IntoResponse for RegisterRequestError {
    fn into_response(self) -> Response {
        self.get_error_response()
    }
}

/// A registration payload with every field validated and wrapped in its value object.
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: ValueObject<Email>,
    pub first_name: ValueObject<FirstName>,
    pub last_name: ValueObject<LastName>,
    pub password: ValueObject<Password>,
}

impl TryFrom<RegisterRequestHelper> for RegisterRequest {
    type Error = RegisterRequestError;

    fn try_from(value: RegisterRequestHelper) -> Result<Self, Self::Error> {
        let mut error = RegisterRequestError::default();

        let email_result = ValueObject::new(Email(value.email)).inspect_err(|e| {
            error.email = Some(e.to_string());
        });
        let first_name_result = ValueObject::new(FirstName(value.first_name)).inspect_err(|e| {
            error.first_name = Some(e.to_string());
        });
        let last_name_result = ValueObject::new(LastName(value.last_name)).inspect_err(|e| {
            error.last_name = Some(e.to_string());
        });
        let password_result = ValueObject::new(Password(value.password)).inspect_err(|e| {
            error.password = Some(e.to_string());
        });

        if let Ok(password) = &password_result
            && *password.extract().get_value() != value.password_confirm
        {
            error.password_confirm =
                Some("A jelszó és a jelszó megerősítés mező nem egyezik".to_string());
        }

        if error.is_empty() {
            Ok(RegisterRequest {
                email: email_result.map_err(|_| RegisterRequestError::default())?,
                first_name: first_name_result.map_err(|_| RegisterRequestError::default())?,
                last_name: last_name_result.map_err(|_| RegisterRequestError::default())?,
                password: password_result.map_err(|_| RegisterRequestError::default())?,
            })
        } else {
            Err(error)
        }
    }
}

/// Permissive deserialisation target for a "resend verification e-mail" request.
#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct ResendEmailValidationRequestHelper {
    pub email: String,
}

#[derive(Debug, Serialize, Default)]
pub struct ResendEmailValidationRequestError {
    pub email: Option<String>,
}

impl Display for ResendEmailValidationRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resend-verification request validation failed")
    }
}

impl FormErrorResponse for ResendEmailValidationRequestError {}

impl IntoResponse for ResendEmailValidationRequestError {
    fn into_response(self) -> Response {
        self.get_error_response()
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct ResendEmailValidationRequest {
    pub email: ValueObject<Email>,
}

impl TryFrom<ResendEmailValidationRequestHelper> for ResendEmailValidationRequest {
    type Error = ResendEmailValidationRequestError;

    fn try_from(value: ResendEmailValidationRequestHelper) -> Result<Self, Self::Error> {
        match ValueObject::new(Email(value.email)) {
            Ok(email) => Ok(ResendEmailValidationRequest { email }),
            Err(e) => Err(ResendEmailValidationRequestError { email: Some(e) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_helper() -> RegisterRequestHelper {
        RegisterRequestHelper {
            email: "testuser@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "Password1!".to_string(),
            password_confirm: "Password1!".to_string(),
        }
    }

    #[test]
    fn accepts_a_valid_registration() {
        assert!(RegisterRequest::try_from(valid_helper()).is_ok());
    }

    #[test]
    fn rejects_mismatched_password_confirmation() {
        let mut helper = valid_helper();
        helper.password_confirm = "Different1!".to_string();
        let err = RegisterRequest::try_from(helper).unwrap_err();
        assert!(err.password_confirm.is_some());
    }

    #[test]
    fn rejects_invalid_email() {
        let mut helper = valid_helper();
        helper.email = "not-an-email".to_string();
        let err = RegisterRequest::try_from(helper).unwrap_err();
        assert!(err.email.is_some());
    }

    #[test]
    fn resend_request_validates_email() {
        let helper = ResendEmailValidationRequestHelper {
            email: "not-an-email".to_string(),
        };
        assert!(ResendEmailValidationRequest::try_from(helper).is_err());
    }
}
