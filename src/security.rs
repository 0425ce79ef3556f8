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

//! C9, the Security Gate: rate limiting, query sanitisation, secret redaction,
//! IP allow-listing and the structured audit log, grounded on
//! `common::extractors::{ClientIp, ClientContext}` for client identity and
//! `FriendlyError::trace`'s per-level `event!` dispatch for the audit events.

pub(crate) mod audit;
pub(crate) mod ip_allow;
pub(crate) mod rate_limit;
pub(crate) mod redact;
pub(crate) mod sanitize;
