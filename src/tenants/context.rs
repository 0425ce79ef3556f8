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
use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sqlx::PgPool;

use crate::common::error::{TenantError, TenantErrorKind};
use crate::common::extractors::client_ip::ClientIp;
use crate::security::rate_limit::{RateLimitDecision, TenantRateLimiters};
use crate::tenants::config_store::ConfigStore;
use crate::tenants::domain_map::{DomainMap, DomainResolution};
use crate::tenants::env_file::{self, EnvFileError};
use crate::tenants::identification::{
    Identification, IdentificationMethod, IdentificationRequest, domain_pairs, identify,
    is_bypassed,
};
use crate::tenants::model::{DomainTenantType, TenantDescriptor, TenantStatus};
use crate::tenants::pool_manager::TenantPoolProvider;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TenantContextError {
    #[error("tenant identification is required but no strategy resolved a tenant")]
    TenantRequired,
    #[error("no tenant is registered for id '{0}'")]
    TenantNotFound(String),
    #[error("tenant '{0}' is not available: status is {1}")]
    TenantUnavailable(String, TenantStatus),
    #[error("could not establish a database connection for tenant '{0}'")]
    DatabaseConnectionFailed(String),
}

impl From<TenantContextError> for TenantError {
    fn from(value: TenantContextError) -> Self {
        let message = value.to_string();
        match value {
            TenantContextError::TenantRequired => {
                TenantError::new(TenantErrorKind::TenantRequired, message)
            }
            TenantContextError::TenantNotFound(id) => {
                TenantError::new(TenantErrorKind::TenantNotFound, message).with_tenant_id(id)
            }
            TenantContextError::TenantUnavailable(id, _) => {
                TenantError::new(TenantErrorKind::TenantUnavailable, message).with_tenant_id(id)
            }
            TenantContextError::DatabaseConnectionFailed(id) => {
                TenantError::new(TenantErrorKind::DatabaseConnectionFailed, message)
                    .with_tenant_id(id)
            }
        }
    }
}

impl IntoResponse for TenantContextError {
    fn into_response(self) -> Response {
        TenantError::from(self).into_response()
    }
}

/// `{tenantId, subdomain, config, pool}` attached to the request by [`materialise`],
/// read back out by downstream handlers via `req.extensions()`.
#[derive(Clone)]
pub struct TenantContext {
    pub tenant_id: String,
    pub subdomain: String,
    pub descriptor: Arc<TenantDescriptor>,
    pub env: Arc<HashMap<String, String>>,
    pub pool: PgPool,
    pub method: IdentificationMethod,
}

/// Mirrors `AuthenticatedUser`: pulls the value [`tenant_context_middleware`] stashed
/// in extensions back out for any handler that declares it as a parameter.
impl<S> axum::extract::FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| TenantContextError::TenantRequired.into_response())
    }
}

/// Falls back on the domain mapping file's lenient substring-contains policy when
/// none of the six identification strategies resolved a tenant from the descriptor
/// set directly — covers a mapping row registered via
/// [`crate::tenants::env_file::generate_pair`] that has no matching descriptor
/// `domain` field for [`identify`]'s exact-match strategy to find.
fn domain_map_identification(domain_map: &DomainMap, host: &str) -> Option<Identification> {
    match domain_map.resolve(host) {
        DomainResolution::Matched(entry) => {
            let (label, _) = entry.domain.split_once('.')?;
            let tenant_id = match entry.tenant_type {
                DomainTenantType::Admin => label.strip_suffix("admin").unwrap_or(label),
                DomainTenantType::Website => label,
            };
            Some(Identification {
                tenant_id: tenant_id.to_string(),
                method: IdentificationMethod::CustomDomain,
            })
        }
        DomainResolution::BareSubdomain(label) => Some(Identification {
            tenant_id: label,
            method: IdentificationMethod::Subdomain,
        }),
        DomainResolution::Unresolved => None,
    }
}

pub struct ContextMaterialiserConfig {
    pub require_tenant: bool,
    pub fallback_tenant: Option<String>,
    pub env_file_root: std::path::PathBuf,
    pub extra_bypass_paths: Vec<String>,
    pub jwt_secret: Vec<u8>,
}

/// Runs C5 → C2 → status check → C3 env load → C6 pool acquisition, in that order,
/// halting on first failure. Mirrors the shape of `require_auth`: a `State` extractor
/// plus a request/`Next` pair, with the result stashed in `req.extensions_mut()`.
pub async fn materialise(
    config_store: &dyn ConfigStore,
    domain_map: &DomainMap,
    pool_manager: &dyn TenantPoolProvider,
    settings: &ContextMaterialiserConfig,
    host: &str,
    path: &str,
    query: &str,
    tenant_id_header: Option<&str>,
    authorization_header: Option<&str>,
) -> Result<Option<TenantContext>, TenantContextError> {
    let descriptors = config_store
        .list()
        .await
        .map_err(|_| TenantContextError::TenantNotFound(String::new()))?;
    let domains = domain_pairs(&descriptors);
    let request = IdentificationRequest {
        host,
        path,
        query,
        tenant_id_header,
        authorization_header,
        known_domains: &domains,
        jwt_secret: &settings.jwt_secret,
        extra_bypass_paths: &settings.extra_bypass_paths,
    };

    let resolved = identify(&request)
        .or_else(|| domain_map_identification(domain_map, host))
        .or_else(|| {
            settings
                .fallback_tenant
                .as_ref()
                .map(|tenant_id| Identification {
                    tenant_id: tenant_id.clone(),
                    method: IdentificationMethod::QueryParameter,
                })
        });

    let Identification { tenant_id, method } = match resolved {
        Some(resolution) => resolution,
        None => {
            return if settings.require_tenant {
                Err(TenantContextError::TenantRequired)
            } else {
                Ok(None)
            };
        }
    };

    let descriptor = config_store
        .get(&tenant_id)
        .await
        .map_err(|_| TenantContextError::TenantNotFound(tenant_id.clone()))?
        .ok_or_else(|| TenantContextError::TenantNotFound(tenant_id.clone()))?;

    if descriptor.status != TenantStatus::Active {
        return Err(TenantContextError::TenantUnavailable(
            tenant_id.clone(),
            descriptor.status,
        ));
    }

    let domain_for_env = descriptor.domain.clone().unwrap_or_else(|| {
        format!("{}.{}", descriptor.subdomain, domain_map.base_domain())
    });
    let env = match env_file::read_env(&settings.env_file_root, &domain_for_env).await {
        Ok(vars) => vars,
        Err(EnvFileError::Io(_)) => HashMap::new(),
        Err(e) => {
            tracing::event!(
                tracing::Level::WARN,
                "could not load env file for tenant {tenant_id}: {e}"
            );
            HashMap::new()
        }
    };

    let pool = pool_manager
        .get_or_create(&tenant_id, &descriptor.database)
        .await
        .map_err(|_| TenantContextError::DatabaseConnectionFailed(tenant_id.clone()))?;

    Ok(Some(TenantContext {
        tenant_id,
        subdomain: descriptor.subdomain.clone(),
        descriptor: Arc::new(descriptor),
        env: Arc::new(env),
        pool,
        method,
    }))
}

pub struct ContextMaterialiserState {
    pub config_store: Arc<dyn ConfigStore>,
    pub domain_map: Arc<DomainMap>,
    pub pool_manager: Arc<dyn TenantPoolProvider>,
    pub tenant_rate_limiters: Arc<TenantRateLimiters>,
    pub settings: ContextMaterialiserConfig,
}

/// axum middleware wrapping [`materialise`]: bypassed paths pass through untouched,
/// everything else gets a `TenantContext` in extensions plus the public
/// `X-Tenant-ID`/`X-Tenant-Method` response annotations. A resolved tenant is also
/// checked against its own `security.rateLimitRequests` budget, independent of the
/// platform-wide limiter layered around the whole API.
pub async fn tenant_context_middleware(
    State(state): State<Arc<ContextMaterialiserState>>,
    ClientIp(ip): ClientIp,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_bypassed(&path, &state.settings.extra_bypass_paths) {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let tenant_id_header = req
        .headers()
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let authorization_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let result = materialise(
        state.config_store.as_ref(),
        state.domain_map.as_ref(),
        state.pool_manager.as_ref(),
        &state.settings,
        &host,
        &path,
        &query,
        tenant_id_header.as_deref(),
        authorization_header.as_deref(),
    )
    .await;

    match result {
        Ok(Some(context)) => {
            let tenant_id = context.tenant_id.clone();
            let method = context.method.as_str().to_string();

            let limiter = state
                .tenant_rate_limiters
                .get_or_create(&tenant_id, context.descriptor.security.rate_limit_requests);
            if let RateLimitDecision::Exceeded { retry_after, .. } = limiter.check(ip) {
                state.pool_manager.release(&tenant_id);
                crate::security::audit::rate_limit(ip, true);
                let mut response = TenantError::new(
                    TenantErrorKind::RateLimitExceeded,
                    format!("tenant '{tenant_id}' has exceeded its own request budget"),
                )
                .into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string()) {
                    response.headers_mut().insert("retry-after", value);
                }
                return response;
            }

            req.extensions_mut().insert(context);
            let mut response = next.run(req).await;
            state.pool_manager.release(&tenant_id);
            if let Ok(value) = HeaderValue::from_str(&tenant_id) {
                response.headers_mut().insert("x-tenant-id", value);
            }
            if let Ok(value) = HeaderValue::from_str(&method) {
                response.headers_mut().insert("x-tenant-method", value);
            }
            response
        }
        Ok(None) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_unavailable_maps_to_forbidden() {
        let err = TenantContextError::TenantUnavailable("acme".to_string(), TenantStatus::Suspended);
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn tenant_not_found_maps_to_404() {
        let err = TenantContextError::TenantNotFound("acme".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_connection_failed_maps_to_503() {
        let err = TenantContextError::DatabaseConnectionFailed("acme".to_string());
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
