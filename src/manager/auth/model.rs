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

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use sqlx::types::JsonValue;

/// An operator account in the control-plane database (C0) — the identity that signs
/// in to `/admin/*` and the other manager-scoped routes. Distinct from a tenant's own
/// end users, which live in the tenant's own database and are out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub last_login_at: Option<DateTime<Local>>,
    pub profile_picture_url: Option<String>,
    pub locale: Option<String>,
    pub invited_by: Option<Uuid>,
    pub email_verified_at: Option<DateTime<Local>>,
    pub is_mfa_enabled: bool,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    pub deleted_at: Option<DateTime<Local>>,
}

impl User {
    /// False for an account locked, soft-deleted, or still gated behind closed-beta
    /// approval — these never complete login even with a correct password.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && self.status != "locked" && self.status != "deleted"
    }

    pub fn need_email_verification(&self) -> bool {
        self.status == "unchecked_email"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub valid_until: DateTime<Local>,
    pub created_at: DateTime<Local>,
    pub deleted_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForgottenPassword {
    pub id: Uuid,
    pub user_id: Uuid,
    pub valid_until: DateTime<Local>,
    pub created_at: DateTime<Local>,
    pub deleted_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub jti: Uuid,
    pub iat: DateTime<Local>,
    pub exp: DateTime<Local>,
    pub replaced_by: Option<Uuid>,
    pub consumed_at: Option<DateTime<Local>>,
    pub revoked_at: Option<DateTime<Local>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum AccountEventType {
    Login,
    Logout,
    PasswordChange,
    EmailChange,
    MfaEnable,
    MfaDisable,
    PasswordResetRequest,
    AccountLocked,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum AccountEventStatus {
    Success,
    Failure,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountEventLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub event_type: AccountEventType,
    pub status: AccountEventStatus,
    pub user_agent: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Local>
}
