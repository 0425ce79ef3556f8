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

use super::AuthModule;
use crate::common::dto::{EmptyType, HandlerResult, SimpleMessageResponse, SuccessResponseBuilder};
use crate::common::error::IntoFriendlyError;
use crate::common::extractors::UserInput;
use crate::manager::auth::dto::password_reset::{
    ForgottenPasswordRequest, ForgottenPasswordRequestHelper, NewPasswordRequest,
    NewPasswordRequestHelper,
};
use crate::manager::auth::dto::register::{
    RegisterRequestHelper, ResendEmailValidationRequest, ResendEmailValidationRequestHelper,
};
use crate::manager::auth::dto::{login::LoginRequest, register::RegisterRequest};
use crate::manager::auth::service::{AuthService, AuthServiceError};
use axum::extract::Query;
use axum::{Json, debug_handler, extract::State, http::StatusCode, response::IntoResponse, response::Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use std::sync::Arc;

/// Path the refresh/logout cookie is scoped to, matching the `/auth/t/*` route nest —
/// the browser never attaches it to any other request.
const REFRESH_COOKIE_PATH: &str = "/auth/t";
const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Session-scoped: carries no explicit Max-Age/Expires, since the refresh token's
/// own lifetime is enforced server-side against `refresh_tokens.exp`.
fn refresh_cookie(token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

fn refresh_cookie_key() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .path(REFRESH_COOKIE_PATH)
        .build()
}

async fn friendly(auth_module: &Arc<dyn AuthModule>, error: AuthServiceError) -> Response {
    error.into_friendly_error(auth_module.clone()).await.into_response()
}

#[debug_handler]
pub async fn login(
    State(auth_module): State<Arc<dyn AuthModule>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> HandlerResult {
    let (login_response, refresh_token) =
        match AuthService::try_login(auth_module.clone(), payload).await {
            Ok(v) => v,
            Err(e) => return Err(friendly(&auth_module, e).await),
        };

    Ok((
        jar.add(refresh_cookie(refresh_token)),
        SuccessResponseBuilder::<EmptyType, _>::new()
            .status_code(StatusCode::OK)
            .data(login_response)
            .build()
            .map_err(|e| e.into_response())?,
    )
        .into_response())
}

#[debug_handler]
pub async fn register(
    State(auth_module): State<Arc<dyn AuthModule>>,
    UserInput(user_input, _): UserInput<RegisterRequest, RegisterRequestHelper>,
) -> HandlerResult {
    if let Err(e) = AuthService::try_register(auth_module.clone(), user_input).await {
        return Err(friendly(&auth_module, e).await);
    }
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::CREATED)
        .data(SimpleMessageResponse {
            message: "A felhasználó sikeresen létrehozva".to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[debug_handler]
pub async fn verify_email(
    State(auth_module): State<Arc<dyn AuthModule>>,
    Query(query): Query<VerifyEmailQuery>,
) -> HandlerResult {
    if let Err(e) = AuthService::verify_email(auth_module.clone(), &query.token).await {
        return Err(friendly(&auth_module, e).await);
    }
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(SimpleMessageResponse {
            message: "Az e-mail cím sikeresen megerősítve".to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn resend_email_verification(
    State(auth_module): State<Arc<dyn AuthModule>>,
    UserInput(user_input, _): UserInput<
        ResendEmailValidationRequest,
        ResendEmailValidationRequestHelper,
    >,
) -> HandlerResult {
    if let Err(e) = AuthService::resend_email_verification(auth_module.clone(), user_input).await {
        return Err(friendly(&auth_module, e).await);
    }
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(SimpleMessageResponse {
            message: "A megerősítő e-mail újraküldve".to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn forgotten_password(
    State(auth_module): State<Arc<dyn AuthModule>>,
    UserInput(user_input, _): UserInput<ForgottenPasswordRequest, ForgottenPasswordRequestHelper>,
) -> HandlerResult {
    if let Err(e) = AuthService::forgotten_password(auth_module.clone(), user_input).await {
        return Err(friendly(&auth_module, e).await);
    }
    // Always succeeds from the caller's point of view, regardless of whether the
    // address is registered — see AuthService::forgotten_password.
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(SimpleMessageResponse {
            message: "Amennyiben az e-mail cím regisztrálva van, elküldtük a visszaállító hivatkozást"
                .to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn new_password(
    State(auth_module): State<Arc<dyn AuthModule>>,
    UserInput(user_input, _): UserInput<NewPasswordRequest, NewPasswordRequestHelper>,
) -> HandlerResult {
    if let Err(e) = AuthService::new_password(auth_module.clone(), user_input).await {
        return Err(friendly(&auth_module, e).await);
    }
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(SimpleMessageResponse {
            message: "A jelszó sikeresen megváltoztatva".to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn refresh(
    State(auth_module): State<Arc<dyn AuthModule>>,
    jar: CookieJar,
) -> HandlerResult {
    let Some(refresh_cookie_value) = jar.get(REFRESH_COOKIE_NAME) else {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    };
    let refresh_token = refresh_cookie_value.value().to_string();

    let (login_response, new_refresh_token) =
        match AuthService::refresh(auth_module.clone(), &refresh_token).await {
            Ok(v) => v,
            Err(e) => return Err(friendly(&auth_module, e).await),
        };

    Ok((
        jar.add(refresh_cookie(new_refresh_token)),
        SuccessResponseBuilder::<EmptyType, _>::new()
            .status_code(StatusCode::OK)
            .data(login_response)
            .build()
            .map_err(|e| e.into_response())?,
    )
        .into_response())
}

#[debug_handler]
pub async fn logout(
    State(auth_module): State<Arc<dyn AuthModule>>,
    jar: CookieJar,
) -> HandlerResult {
    if let Some(refresh_cookie_value) = jar.get(REFRESH_COOKIE_NAME) {
        let _ = AuthService::logout(auth_module.clone(), refresh_cookie_value.value()).await;
    }

    Ok((
        jar.remove(refresh_cookie_key()),
        SuccessResponseBuilder::<EmptyType, _>::new()
            .status_code(StatusCode::OK)
            .data(SimpleMessageResponse {
                message: "Sikeres kijelentkezés".to_string(),
            })
            .build()
            .map_err(|e| e.into_response())?,
    )
        .into_response())
}
