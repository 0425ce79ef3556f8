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
use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{get, post, put},
};

use crate::manager::auth::AuthModule;
use crate::manager::auth::middleware::require_auth;
use crate::tenants::admin_service::{DatabaseProvisioner, TenantAdminService};
use crate::tenants::handler::{
    activate_tenant, archive_tenant, check_tenant_usage, create_tenant, delete_tenant,
    execute_tenant_query, export_tenant_config, get_tenant, health, list_tenants, suspend_tenant,
    tenant_info, tenant_stats, update_tenant,
};

/// `GET /health`, `GET /api/health` — these are also listed in the context
/// middleware's default bypass paths, so they never require a resolved tenant.
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
}

/// `GET /tenant/info`, `GET /tenant/stats` — gated by [`crate::tenants::context::tenant_context_middleware`]
/// as a layer applied by the caller, not by this router directly, since the
/// middleware's state (the registry) is shared across both tenant-scoped and
/// admin routes.
pub fn tenant_routes() -> Router {
    Router::new()
        .route("/tenant/info", get(tenant_info))
        .route("/tenant/stats", get(tenant_stats))
        .route("/tenant/query", post(execute_tenant_query))
}

/// `/admin/tenant*` — bypasses default tenant identification (the fixed tenant id
/// `admin` stands in for a resolved tenant) and instead requires the operator JWT
/// issued by `POST /admin/auth/login`, the same `require_auth` middleware that
/// gates the control plane's own `/admin/*` surface.
pub fn admin_routes<P: DatabaseProvisioner + 'static>(
    auth_module: Arc<dyn AuthModule>,
    admin_service: Arc<TenantAdminService<P>>,
) -> Router {
    Router::new()
        .route("/admin/tenants", get(list_tenants::<P>))
        .route("/admin/tenant/create", post(create_tenant::<P>))
        .route("/admin/tenant/{tenant_id}", get(get_tenant::<P>))
        .route("/admin/tenant/{tenant_id}", put(update_tenant::<P>))
        .route("/admin/tenant/{tenant_id}/suspend", post(suspend_tenant::<P>))
        .route("/admin/tenant/{tenant_id}/activate", post(activate_tenant::<P>))
        .route("/admin/tenant/{tenant_id}/archive", post(archive_tenant::<P>))
        .route("/admin/tenant/{tenant_id}/delete", post(delete_tenant::<P>))
        .route("/admin/tenant/{tenant_id}/export", get(export_tenant_config::<P>))
        .route("/admin/tenant/{tenant_id}/usage", get(check_tenant_usage::<P>))
        .layer(middleware::from_fn_with_state(auth_module, require_auth))
        .with_state(admin_service)
}
