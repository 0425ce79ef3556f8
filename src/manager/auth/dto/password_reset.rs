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
use crate::common::types::{Email, Password};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct ForgottenPasswordRequestHelper {
    pub email: String,
}

#[derive(Debug, Serialize, Default)]
pub struct ForgottenPasswordRequestError {
    pub email: Option<String>,
}

impl Display for ForgottenPasswordRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "forgotten-password request validation failed")
    }
}

impl FormErrorResponse for ForgottenPasswordRequestError {}

impl IntoResponse for ForgottenPasswordRequestError {
    fn into_response(self) -> Response {
        self.get_error_response()
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct ForgottenPasswordRequest {
    pub email: ValueObject<Email>,
}

impl TryFrom<ForgottenPasswordRequestHelper> for ForgottenPasswordRequest {
    type Error = ForgottenPasswordRequestError;

    fn try_from(value: ForgottenPasswordRequestHelper) -> Result<Self, Self::Error> {
        match ValueObject::new(Email(value.email)) {
            Ok(email) => Ok(ForgottenPasswordRequest { email }),
            Err(e) => Err(ForgottenPasswordRequestError { email: Some(e) }),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct NewPasswordRequestHelper {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize, Default)]
pub struct NewPasswordRequestError {
    pub token: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl NewPasswordRequestError {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.password.is_none() && self.password_confirm.is_none()
    }
}

impl Display for NewPasswordRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "new-password request validation failed")
    }
}

impl FormErrorResponse for NewPasswordRequestError {}

impl IntoResponse for NewPasswordRequestError {
    fn into_response(self) -> Response {
        self.get_error_response()
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct NewPasswordRequest {
    pub token: uuid::Uuid,
    pub password: ValueObject<Password>,
}

impl TryFrom<NewPasswordRequestHelper> for NewPasswordRequest {
    type Error = NewPasswordRequestError;

    fn try_from(value: NewPasswordRequestHelper) -> Result<Self, Self::Error> {
        let mut error = NewPasswordRequestError::default();

        let token_result = uuid::Uuid::parse_str(&value.token).inspect_err(|_| {
            error.token = Some("Hibás visszaállító hivatkozás".to_string());
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
            Ok(NewPasswordRequest {
                token: token_result.map_err(|_| NewPasswordRequestError::default())?,
                password: password_result.map_err(|_| NewPasswordRequestError::default())?,
            })
        } else {
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgotten_password_validates_email() {
        let helper = ForgottenPasswordRequestHelper {
            email: "not-an-email".to_string(),
        };
        assert!(ForgottenPasswordRequest::try_from(helper).is_err());
    }

    #[test]
    fn new_password_rejects_mismatched_confirmation() {
        let helper = NewPasswordRequestHelper {
            token: uuid::Uuid::new_v4().to_string(),
            password: "Password1!".to_string(),
            password_confirm: "Different1!".to_string(),
        };
        let err = NewPasswordRequest::try_from(helper).unwrap_err();
        assert!(err.password_confirm.is_some());
    }

    #[test]
    fn new_password_accepts_a_valid_request() {
        let helper = NewPasswordRequestHelper {
            token: uuid::Uuid::new_v4().to_string(),
            password: "Password1!".to_string(),
            password_confirm: "Password1!".to_string(),
        };
        assert!(NewPasswordRequest::try_from(helper).is_ok());
    }
}
