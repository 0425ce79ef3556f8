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
use std::net::IpAddr;

use tracing::{Level, event};

/// The fixed set of structured audit events (§4.8), mirroring
/// `FriendlyError::trace`'s per-level `event!` dispatch rather than adding a new
/// logging path. Each event always carries `event=<name>` so these can be
/// filtered out of general application logs downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    TenantAccess,
    ConfigLoaded,
    DbConnection,
    RateLimit,
    Unauthorized,
    SecurityViolation,
}

impl AuditEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::TenantAccess => "TENANT_ACCESS",
            Self::ConfigLoaded => "CONFIG_LOADED",
            Self::DbConnection => "DB_CONNECTION",
            Self::RateLimit => "RATE_LIMIT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::SecurityViolation => "SECURITY_VIOLATION",
        }
    }
}

pub fn tenant_access(tenant_id: &str, method: &str, ip: IpAddr) {
    event!(
        Level::INFO,
        event = AuditEvent::TenantAccess.name(),
        tenant_id,
        method,
        %ip,
        "tenant resolved for request"
    );
}

pub fn config_loaded(tenant_id: &str, from_cache: bool) {
    event!(
        Level::DEBUG,
        event = AuditEvent::ConfigLoaded.name(),
        tenant_id,
        from_cache,
        "tenant descriptor loaded"
    );
}

pub fn db_connection(tenant_id: &str, created: bool) {
    event!(
        Level::DEBUG,
        event = AuditEvent::DbConnection.name(),
        tenant_id,
        created,
        "tenant database connection acquired"
    );
}

pub fn rate_limit(ip: IpAddr, exceeded: bool) {
    event!(
        Level::WARN,
        event = AuditEvent::RateLimit.name(),
        %ip,
        exceeded,
        "rate limit checked"
    );
}

pub fn unauthorized(ip: IpAddr, reason: &str) {
    event!(
        Level::WARN,
        event = AuditEvent::Unauthorized.name(),
        %ip,
        reason,
        "unauthorized access attempt"
    );
}

pub fn security_violation(detail: &str) {
    event!(
        Level::ERROR,
        event = AuditEvent::SecurityViolation.name(),
        detail,
        "security violation detected"
    );
}
