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
use crate::common::error::BuilderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::marker::PhantomData;

/// A JSON error body carrying no structured fields, just a human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct GeneralError {
    pub message: String,
}

impl Display for GeneralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A JSON error body pairing a global message with a caller-supplied structured fields report,
/// typically a per-field validation issues list.
#[derive(Debug, Clone, Serialize)]
pub struct FormError<T> {
    pub message: String,
    pub fields: T,
}

impl<T: Display> Display for FormError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.fields)
    }
}

/// Wraps an error body with the status code it should be served under, and renders
/// the wire shape `{"success": false, "error": ...}`.
pub struct ErrorResponse<T: Serialize> {
    pub status_code: StatusCode,
    pub error: T,
}

impl<T: Serialize> IntoResponse for ErrorResponse<T> {
    fn into_response(self) -> Response {
        (
            self.status_code,
            Json(json!({ "success": false, "error": self.error })),
        )
            .into_response()
    }
}

/// Wraps a success payload, rendering the wire shape `{"success": true, "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> IntoResponse for OkResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A bare `{"message": "..."}` body for operations with no payload worth returning,
/// e.g. `suspend`/`activate`/`archive`/`delete`.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleMessageResponse {
    pub message: String,
}

/// Marker type for [`SuccessResponseBuilder`] calls that carry no payload.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyType;

/// Builds a success response in the same chained-setter style as this codebase's
/// config builders (`AppConfigBuilder`, `MailConfigBuilder`): a status code plus an
/// optional JSON payload, defaulting to `200 OK` with an empty object.
pub struct SuccessResponseBuilder<T: Serialize, S = EmptyType> {
    status_code: StatusCode,
    data: Option<T>,
    _state: PhantomData<S>,
}

impl<T: Serialize> SuccessResponseBuilder<T, EmptyType> {
    pub fn new() -> Self {
        Self {
            status_code: StatusCode::OK,
            data: None,
            _state: PhantomData,
        }
    }
}

impl<T: Serialize> Default for SuccessResponseBuilder<T, EmptyType> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize, S> SuccessResponseBuilder<T, S> {
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn build(self) -> Result<Response, BuilderError> {
        let data = self.data.ok_or(BuilderError::MissingRequired("data"))?;
        Ok((self.status_code, Json(json!({ "success": true, "data": data }))).into_response())
    }
}

pub type HandlerResult = Result<Response, Response>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_data() {
        let res = SuccessResponseBuilder::<EmptyType>::new().build();
        assert!(res.is_err());
    }

    #[test]
    fn builder_accepts_data() {
        let res = SuccessResponseBuilder::new()
            .status_code(StatusCode::CREATED)
            .data(EmptyType)
            .build();
        assert!(res.is_ok());
    }
}
