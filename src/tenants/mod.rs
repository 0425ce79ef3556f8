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

//! The tenancy domain: descriptor model and lifecycle state machine (C0/C3 data
//! model), validation (C1), the config store (C2), the env file manager and
//! domain mapper (C3/C4), the identification pipeline (C5), the per-tenant pool
//! manager (C6), the context materialiser (C7) and the admin service (C8), plus
//! the [`registry`] that bundles the stateful pieces for HTTP wiring.

pub(crate) mod admin_service;
pub(crate) mod config_store;
pub(crate) mod context;
pub(crate) mod domain_map;
pub(crate) mod env_file;
pub(crate) mod handler;
pub(crate) mod identification;
pub(crate) mod model;
pub(crate) mod pool_manager;
pub(crate) mod registry;
pub(crate) mod routes;
pub(crate) mod validator;
