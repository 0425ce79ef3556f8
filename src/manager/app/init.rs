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

use crate::common::{ConfigProvider, DefaultAppState};
use crate::manager::app::config::AppConfig;
use crate::manager::app::database::{ControlPlanePool, DatabaseMigrator};
use crate::security::rate_limit::RateLimiter;
use crate::tenants::registry::TenantRegistry;
use anyhow::Result;
use axum::{Router, middleware};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_subscriber() {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(Level::TRACE) //TODO: make configurable
            .finish(),
    )
    .expect("setting default subscriber failed");
}

/// Boots the control plane (auth, migrations) and the tenant registry (C2/C4/C6),
/// then wires everything into a single router: public health, tenant-scoped
/// introspection behind the context middleware (C7), and admin CRUD behind the
/// operator JWT (C0) and fixed `admin` tenant id (§6).
pub async fn init_default_app() -> Result<(Arc<AppConfig>, Router)> {
    let app_state = Arc::new(DefaultAppState::new().await?);
    app_state.migrate_main_db().await?;

    let config = app_state.config();
    let registry = Arc::new(TenantRegistry::new(&config).await?);
    let admin_service = Arc::new(registry.admin_service_pg(app_state.get_main_pool()));
    let context_state = registry.context_state(&config);
    let rate_limiter = Arc::new(RateLimiter::default_policy());

    let auth_module: Arc<dyn crate::manager::auth::AuthModule> = app_state.clone();

    let api_routes = Router::new()
        .merge(crate::manager::auth::routes::routes(auth_module.clone()))
        .merge(crate::tenants::routes::tenant_routes())
        .merge(crate::tenants::routes::admin_routes(
            auth_module,
            admin_service,
        ))
        .layer(middleware::from_fn_with_state(
            context_state,
            crate::tenants::context::tenant_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            crate::security::rate_limit::rate_limit_middleware,
        ));

    Ok((
        config,
        Router::new()
            .merge(crate::tenants::routes::health_routes())
            .nest("/api", api_routes)
            .layer(TraceLayer::new_for_http()),
    ))
}
