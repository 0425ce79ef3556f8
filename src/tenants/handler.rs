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

use axum::extract::{Path, Query, State};
use axum::{Json, debug_handler, http::StatusCode, response::IntoResponse, response::Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::common::dto::{EmptyType, HandlerResult, SimpleMessageResponse, SuccessResponseBuilder};
use crate::tenants::admin_service::{TenantAdminService, DatabaseProvisioner};
use crate::tenants::context::TenantContext;
use crate::tenants::model::{TenantCreateRequest, TenantDescriptor};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
    pub version: &'static str,
}

#[debug_handler]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The public view handed back by `GET /tenant/info`: enough for a client to confirm
/// which tenant it was resolved as, without leaking secrets.
#[derive(Debug, Serialize)]
pub struct TenantInfoResponse {
    pub tenant_id: String,
    pub subdomain: String,
    pub name: String,
    pub database_name: String,
    pub status: crate::tenants::model::TenantStatus,
    pub features: crate::tenants::model::FeatureMap,
    pub method: &'static str,
}

#[debug_handler]
pub async fn tenant_info(tenant: TenantContext) -> Json<TenantInfoResponse> {
    Json(TenantInfoResponse {
        tenant_id: tenant.tenant_id,
        subdomain: tenant.subdomain,
        name: tenant.descriptor.name.clone(),
        database_name: tenant.descriptor.database.database.clone(),
        status: tenant.descriptor.status,
        features: tenant.descriptor.features.clone(),
        method: tenant.method.as_str(),
    })
}

#[derive(Debug, Serialize)]
pub struct TenantStatsResponse {
    pub tenant_id: String,
    pub pool_size: u32,
    pub limits: crate::tenants::model::UsageLimits,
}

#[debug_handler]
pub async fn tenant_stats(tenant: TenantContext) -> Json<TenantStatsResponse> {
    Json(TenantStatsResponse {
        tenant_id: tenant.tenant_id.clone(),
        pool_size: tenant.pool.size(),
        limits: tenant.descriptor.limits,
    })
}

fn admin_error(e: impl IntoResponse) -> Response {
    e.into_response()
}

#[debug_handler]
pub async fn list_tenants<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
) -> HandlerResult {
    let summaries = service
        .list_summary()
        .await
        .map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::OK)
        .data(summaries)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn create_tenant<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Json(payload): Json<TenantCreateRequest>,
) -> HandlerResult {
    let descriptor = service.create(payload).await.map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::CREATED)
        .data(descriptor)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn get_tenant<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Path(tenant_id): Path<String>,
) -> HandlerResult {
    let descriptor = service.get(&tenant_id).await.map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::OK)
        .data(descriptor)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn update_tenant<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Json(payload): Json<TenantDescriptor>,
) -> HandlerResult {
    let descriptor = service.update(payload).await.map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::OK)
        .data(descriptor)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

macro_rules! lifecycle_handler {
    ($name:ident, $method:ident, $message:expr) => {
        #[debug_handler]
        pub async fn $name<P: DatabaseProvisioner + 'static>(
            State(service): State<Arc<TenantAdminService<P>>>,
            Path(tenant_id): Path<String>,
        ) -> HandlerResult {
            service.$method(&tenant_id).await.map_err(admin_error)?;
            Ok(SuccessResponseBuilder::<EmptyType, _>::new()
                .status_code(StatusCode::OK)
                .data(SimpleMessageResponse {
                    message: $message.to_string(),
                })
                .build()
                .map_err(|e| e.into_response())?
                .into_response())
        }
    };
}

lifecycle_handler!(suspend_tenant, suspend, "Tenant suspended");
lifecycle_handler!(activate_tenant, activate, "Tenant activated");
lifecycle_handler!(archive_tenant, archive, "Tenant archived");

#[debug_handler]
pub async fn delete_tenant<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Path(tenant_id): Path<String>,
) -> HandlerResult {
    service.delete(&tenant_id).await.map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<EmptyType, _>::new()
        .status_code(StatusCode::OK)
        .data(SimpleMessageResponse {
            message: "Tenant deleted".to_string(),
        })
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[debug_handler]
pub async fn export_tenant_config<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Path(tenant_id): Path<String>,
) -> HandlerResult {
    let value = service.export_config(&tenant_id).await.map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::OK)
        .data(value)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct UsageStatsQuery {
    pub users: u32,
    pub pages: u32,
    pub posts: u32,
    pub storage_mb: u32,
    pub api_calls: u32,
    #[serde(default)]
    pub largest_file_mb: u32,
    #[serde(default)]
    pub menus: u32,
    #[serde(default)]
    pub galleries: u32,
    #[serde(default)]
    pub sliders: u32,
}

impl From<UsageStatsQuery> for crate::tenants::admin_service::UsageStats {
    fn from(value: UsageStatsQuery) -> Self {
        Self {
            users: value.users,
            pages: value.pages,
            posts: value.posts,
            storage_mb: value.storage_mb,
            api_calls: value.api_calls,
            largest_file_mb: value.largest_file_mb,
            menus: value.menus,
            galleries: value.galleries,
            sliders: value.sliders,
        }
    }
}

#[debug_handler]
pub async fn check_tenant_usage<P: DatabaseProvisioner + 'static>(
    State(service): State<Arc<TenantAdminService<P>>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<UsageStatsQuery>,
) -> HandlerResult {
    let check = service
        .check_usage_limits(&tenant_id, query.into())
        .await
        .map_err(admin_error)?;
    Ok(SuccessResponseBuilder::<_, EmptyType>::new()
        .status_code(StatusCode::OK)
        .data(check)
        .build()
        .map_err(|e| e.into_response())?
        .into_response())
}

/// A single ad-hoc statement submitted against the caller's own tenant pool.
/// Power-user feature, gated by the `admin` tenant id and its own `customQuery`
/// feature flag; the sanitiser it runs through is defence-in-depth, not a
/// substitute for parametrised queries.
#[derive(Debug, Deserialize)]
pub struct AdHocQueryRequest {
    pub sql: String,
}

#[derive(Debug, Serialize)]
pub struct AdHocQueryResponse {
    pub rows_affected: u64,
}

#[debug_handler]
pub async fn execute_tenant_query(
    tenant: TenantContext,
    Json(payload): Json<AdHocQueryRequest>,
) -> Response {
    use crate::common::error::{TenantError, TenantErrorKind};

    if tenant.tenant_id != "admin" || !tenant.descriptor.features.custom_query {
        return TenantError::new(
            TenantErrorKind::SecurityViolation,
            "the ad-hoc query endpoint requires the admin tenant and its customQuery feature flag",
        )
        .into_response();
    }

    let result = crate::security::sanitize::sanitize(&payload.sql);
    if result.stripped {
        crate::security::audit::security_violation(&payload.sql);
        return TenantError::new(
            TenantErrorKind::SecurityViolation,
            "the submitted query contains a disallowed pattern",
        )
        .into_response();
    }

    match sqlx::query(&result.cleaned).execute(&tenant.pool).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AdHocQueryResponse {
                rows_affected: outcome.rows_affected(),
            }),
        )
            .into_response(),
        Err(e) => TenantError::new(TenantErrorKind::TenantDatabaseError, e.to_string())
            .into_response(),
    }
}
