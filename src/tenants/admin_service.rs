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
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde_json::{Value, json};

use crate::common::services::{generate_hex_secret, generate_string_csprng};
use crate::tenants::config_store::{ConfigStore, ConfigStoreError};
use crate::tenants::domain_map::{DomainMap, DomainMapError, admin_mapping_entry, default_mapping_entry};
use crate::tenants::env_file::{self, DatabaseInputs, EnvFileError, EnvTemplate};
use crate::tenants::model::{
    DatabaseDescriptor, SecurityTriple, StorageDescriptor, StorageKind, TenantCreateRequest,
    TenantDescriptor, TenantStatus, TenantTier, UsageLimits,
};
use crate::tenants::pool_manager::TenantPoolProvider;
use crate::tenants::validator::{validate_create_request, validate_descriptor};

const REDACTED: &str = "***REDACTED***";

#[derive(Debug, thiserror::Error)]
pub enum TenantAdminError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<crate::tenants::validator::ValidationError>),
    #[error("subdomain '{0}' is already in use")]
    SubdomainTaken(String),
    #[error("domain '{0}' is already in use")]
    DomainTaken(String),
    #[error("tenant '{0}' was not found")]
    NotFound(String),
    #[error("provisioning failed: {0}")]
    Provisioning(String),
    #[error("config store error: {0}")]
    ConfigStore(#[from] ConfigStoreError),
    #[error("env file error: {0}")]
    EnvFile(#[from] EnvFileError),
    #[error("domain map error: {0}")]
    DomainMap(#[from] DomainMapError),
}

impl From<TenantAdminError> for crate::common::error::TenantError {
    fn from(value: TenantAdminError) -> Self {
        use crate::common::error::{TenantError, TenantErrorKind};
        let message = value.to_string();
        match value {
            TenantAdminError::Validation(errors) => {
                TenantError::new(TenantErrorKind::TenantConfigInvalid, message).with_details(
                    serde_json::to_value(errors).unwrap_or(Value::Null),
                )
            }
            TenantAdminError::SubdomainTaken(_) | TenantAdminError::DomainTaken(_) => {
                TenantError::new(TenantErrorKind::TenantConfigInvalid, message)
            }
            TenantAdminError::NotFound(id) => {
                TenantError::new(TenantErrorKind::TenantNotFound, message).with_tenant_id(id)
            }
            TenantAdminError::Provisioning(_) => {
                TenantError::new(TenantErrorKind::TenantCreationFailed, message)
            }
            TenantAdminError::ConfigStore(_)
            | TenantAdminError::EnvFile(_)
            | TenantAdminError::DomainMap(_) => {
                TenantError::new(TenantErrorKind::TenantDatabaseError, message)
            }
        }
    }
}

impl axum::response::IntoResponse for TenantAdminError {
    fn into_response(self) -> axum::response::Response {
        crate::common::error::TenantError::from(self).into_response()
    }
}

/// Connects to the target database server and provisions a fresh tenant database,
/// user, and baseline schema. A real implementation reaches an external collaborator
/// (the DB server's system catalog); tests substitute a fake.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseProvisioner: Send + Sync {
    async fn create(&self, descriptor: &DatabaseDescriptor) -> Result<(), String>;
    async fn drop(&self, descriptor: &DatabaseDescriptor) -> Result<(), String>;
}

pub struct NoopProvisioner;

#[async_trait]
impl DatabaseProvisioner for NoopProvisioner {
    async fn create(&self, _descriptor: &DatabaseDescriptor) -> Result<(), String> {
        Ok(())
    }
    async fn drop(&self, _descriptor: &DatabaseDescriptor) -> Result<(), String> {
        Ok(())
    }
}

/// Provisions a dedicated Postgres database per tenant using the control-plane's
/// admin pool. `CREATE DATABASE`/`DROP DATABASE` cannot run inside a transaction,
/// so these go through a plain `execute` on a pooled connection.
pub struct PgDatabaseProvisioner {
    admin_pool: sqlx::PgPool,
}

impl PgDatabaseProvisioner {
    pub fn new(admin_pool: sqlx::PgPool) -> Self {
        Self { admin_pool }
    }
}

#[async_trait]
impl DatabaseProvisioner for PgDatabaseProvisioner {
    async fn create(&self, descriptor: &DatabaseDescriptor) -> Result<(), String> {
        if descriptor.kind != crate::tenants::model::DatabaseKind::Postgresql {
            return Ok(());
        }
        let ident = quote_database_identifier(&descriptor.database);
        sqlx::query(&format!("CREATE DATABASE {ident}"))
            .execute(&self.admin_pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn drop(&self, descriptor: &DatabaseDescriptor) -> Result<(), String> {
        if descriptor.kind != crate::tenants::model::DatabaseKind::Postgresql {
            return Ok(());
        }
        let ident = quote_database_identifier(&descriptor.database);
        sqlx::query(&format!("DROP DATABASE IF EXISTS {ident}"))
            .execute(&self.admin_pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Double-quotes a Postgres identifier, doubling any embedded quote — descriptor
/// names are already bounds- and charset-checked by [`crate::tenants::validator`],
/// this just guards against the literal SQL injection shape.
fn quote_database_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantSummary {
    pub tenant_id: String,
    pub name: String,
    pub subdomain: String,
    pub domain: Option<String>,
    pub status: TenantStatus,
}

impl From<&TenantDescriptor> for TenantSummary {
    fn from(d: &TenantDescriptor) -> Self {
        Self {
            tenant_id: d.tenant_id.clone(),
            name: d.name.clone(),
            subdomain: d.subdomain.clone(),
            domain: d.domain.clone(),
            status: d.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub users: u32,
    pub pages: u32,
    pub posts: u32,
    pub storage_mb: u32,
    pub api_calls: u32,
    pub largest_file_mb: u32,
    pub menus: u32,
    pub galleries: u32,
    pub sliders: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageLimitCheck {
    pub within_limits: bool,
    pub violations: Vec<String>,
}

fn check_usage_limits(stats: &UsageStats, limits: &UsageLimits) -> UsageLimitCheck {
    let mut violations = Vec::new();
    if stats.users > limits.max_users {
        violations.push(format!("users {} exceeds limit {}", stats.users, limits.max_users));
    }
    if stats.pages > limits.max_pages {
        violations.push(format!("pages {} exceeds limit {}", stats.pages, limits.max_pages));
    }
    if stats.posts > limits.max_posts {
        violations.push(format!("posts {} exceeds limit {}", stats.posts, limits.max_posts));
    }
    if stats.storage_mb > limits.max_storage_mb {
        violations.push(format!(
            "storage {}MB exceeds limit {}MB",
            stats.storage_mb, limits.max_storage_mb
        ));
    }
    if stats.api_calls > limits.max_api_calls {
        violations.push(format!(
            "api calls {} exceeds limit {}",
            stats.api_calls, limits.max_api_calls
        ));
    }
    if stats.largest_file_mb > limits.max_file_size_mb {
        violations.push(format!(
            "file size {}MB exceeds limit {}MB",
            stats.largest_file_mb, limits.max_file_size_mb
        ));
    }
    if stats.menus > limits.max_menus {
        violations.push(format!("menus {} exceeds limit {}", stats.menus, limits.max_menus));
    }
    if stats.galleries > limits.max_galleries {
        violations.push(format!(
            "galleries {} exceeds limit {}",
            stats.galleries, limits.max_galleries
        ));
    }
    if stats.sliders > limits.max_sliders {
        violations.push(format!("sliders {} exceeds limit {}", stats.sliders, limits.max_sliders));
    }
    UsageLimitCheck {
        within_limits: violations.is_empty(),
        violations,
    }
}

/// Tenant lifecycle management: create, update, suspend/activate/archive, delete,
/// plus read-only introspection (list, exportConfig, usageStats). Grounded on the
/// source's static-method `TenantsService` shape, with compensation on create
/// failure modeled after the `IntoFriendlyError` error-mapping idiom used throughout.
pub struct TenantAdminService<P: DatabaseProvisioner> {
    config_store: Arc<dyn ConfigStore>,
    domain_map: Arc<DomainMap>,
    pool_manager: Arc<dyn TenantPoolProvider>,
    env_file_root: std::path::PathBuf,
    provisioner: P,
}

impl<P: DatabaseProvisioner> TenantAdminService<P> {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        domain_map: Arc<DomainMap>,
        pool_manager: Arc<dyn TenantPoolProvider>,
        env_file_root: std::path::PathBuf,
        provisioner: P,
    ) -> Self {
        Self {
            config_store,
            domain_map,
            pool_manager,
            env_file_root,
            provisioner,
        }
    }

    pub async fn create(
        &self,
        request: TenantCreateRequest,
    ) -> Result<TenantDescriptor, TenantAdminError> {
        let report = validate_create_request(&request);
        if !report.is_valid {
            return Err(TenantAdminError::Validation(report.errors));
        }

        if self
            .config_store
            .find_by_subdomain(&request.subdomain)
            .await?
            .is_some()
        {
            return Err(TenantAdminError::SubdomainTaken(request.subdomain.clone()));
        }
        if let Some(domain) = &request.domain
            && self.config_store.find_by_domain(domain).await?.is_some()
        {
            return Err(TenantAdminError::DomainTaken(domain.clone()));
        }

        let tenant_id = format!("{}-{}", request.subdomain, generate_string_csprng(8));
        let tier = request.tier.unwrap_or(TenantTier::Starter);

        let mut database = request.database.clone();
        database.password = generate_hex_secret(16);

        let security = SecurityTriple {
            jwt_secret: generate_hex_secret(32),
            encryption_key: generate_hex_secret(32),
            session_secret: generate_hex_secret(32),
            api_key: Some(generate_hex_secret(16)),
            cors_allow_list: Vec::new(),
            rate_limit_requests: 100,
        };

        if let Err(e) = self.provisioner.create(&database).await {
            return Err(TenantAdminError::Provisioning(e));
        }

        let base_domain = self.domain_map.base_domain().to_string();
        let domain_for_env = request
            .domain
            .clone()
            .unwrap_or_else(|| format!("{}.{}", request.subdomain, base_domain));

        let template = EnvTemplate {
            tenant_id: tenant_id.clone(),
            tenant_name: request.name.clone(),
            database: DatabaseInputs {
                host: Some(database.host.clone()),
                port: Some(database.port.to_string()),
                name: Some(database.database.clone()),
                user: Some(database.username.clone()),
                password: Some(database.password.clone()),
                charset: None,
                scheme: None,
            },
            extra: BTreeMap::new(),
        };

        let pair_result = env_file::generate_pair(&self.env_file_root, &base_domain, &tenant_id, &template).await;
        let pair = match pair_result {
            Ok(p) => p,
            Err(e) => {
                self.compensate_after_db(&database).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .domain_map
            .upsert(admin_mapping_entry(&pair.admin.domain, &pair.admin.env_file))
            .await
        {
            self.compensate_after_env(&database, &pair.admin.domain, &pair.website.domain)
                .await;
            return Err(e.into());
        }
        if let Err(e) = self
            .domain_map
            .upsert(default_mapping_entry(&pair.website.domain, &pair.website.env_file))
            .await
        {
            self.compensate_after_mapping(&database, &pair.admin.domain, &pair.website.domain)
                .await;
            return Err(e.into());
        }

        if request.domain.is_some()
            && let Err(e) = self
                .domain_map
                .upsert(default_mapping_entry(&domain_for_env, &pair.website.env_file))
                .await
        {
            self.compensate_after_both_mappings(&database, &pair.admin.domain, &pair.website.domain)
                .await;
            return Err(e.into());
        }

        let now = Utc::now();
        let descriptor = TenantDescriptor {
            tenant_id: tenant_id.clone(),
            name: request.name,
            subdomain: request.subdomain,
            domain: request.domain,
            status: TenantStatus::Active,
            database,
            features: request.features.unwrap_or_default(),
            limits: tier.into(),
            branding: request.branding.unwrap_or_default(),
            seo: request.seo.unwrap_or_default(),
            security,
            storage: request
                .storage
                .unwrap_or_else(|| StorageDescriptor {
                    kind: StorageKind::Local,
                    base_path: Some(format!("/data/{tenant_id}")),
                    bucket: None,
                    access_key: None,
                    secret_key: None,
                    region: None,
                }),
            smtp: request.smtp,
            environment: request.environment.unwrap_or_default(),
            admin_contact: request.admin_contact,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.config_store.save(&descriptor).await {
            self.compensate_after_both_mappings(&descriptor.database, &pair.admin.domain, &pair.website.domain)
                .await;
            return Err(e.into());
        }

        Ok(descriptor)
    }

    async fn compensate_after_db(&self, database: &DatabaseDescriptor) {
        if let Err(e) = self.provisioner.drop(database).await {
            tracing::event!(tracing::Level::ERROR, "compensation: failed to drop provisioned database: {e}");
        }
    }

    async fn compensate_after_env(&self, database: &DatabaseDescriptor, admin_domain: &str, website_domain: &str) {
        self.compensate_after_db(database).await;
        for domain in [admin_domain, website_domain] {
            if let Err(e) = env_file::delete(&self.env_file_root, domain).await {
                tracing::event!(tracing::Level::ERROR, "compensation: failed to delete env file: {e}");
            }
        }
    }

    /// Only the admin row landed before the website upsert failed; remove it and
    /// clean up both generated env files.
    async fn compensate_after_mapping(&self, database: &DatabaseDescriptor, admin_domain: &str, website_domain: &str) {
        self.compensate_after_env(database, admin_domain, website_domain).await;
        if let Err(e) = self.domain_map.remove(admin_domain).await {
            tracing::event!(tracing::Level::ERROR, "compensation: failed to remove domain mapping: {e}");
        }
    }

    /// Both the admin and website rows landed before a later step failed; remove both.
    async fn compensate_after_both_mappings(
        &self,
        database: &DatabaseDescriptor,
        admin_domain: &str,
        website_domain: &str,
    ) {
        self.compensate_after_env(database, admin_domain, website_domain).await;
        for domain in [admin_domain, website_domain] {
            if let Err(e) = self.domain_map.remove(domain).await {
                tracing::event!(tracing::Level::ERROR, "compensation: failed to remove domain mapping: {e}");
            }
        }
    }

    pub async fn update(&self, descriptor: TenantDescriptor) -> Result<TenantDescriptor, TenantAdminError> {
        let report = validate_descriptor(&descriptor);
        if !report.is_valid {
            return Err(TenantAdminError::Validation(report.errors));
        }
        let mut descriptor = descriptor;
        descriptor.updated_at = Utc::now();
        self.config_store.save(&descriptor).await?;
        Ok(descriptor)
    }

    async fn set_status(&self, tenant_id: &str, status: TenantStatus) -> Result<TenantDescriptor, TenantAdminError> {
        let mut descriptor = self
            .config_store
            .get(tenant_id)
            .await?
            .ok_or_else(|| TenantAdminError::NotFound(tenant_id.to_string()))?;
        descriptor.status = status;
        descriptor.updated_at = Utc::now();
        self.config_store.save(&descriptor).await?;
        Ok(descriptor)
    }

    pub async fn suspend(&self, tenant_id: &str) -> Result<TenantDescriptor, TenantAdminError> {
        self.set_status(tenant_id, TenantStatus::Suspended).await
    }

    pub async fn activate(&self, tenant_id: &str) -> Result<TenantDescriptor, TenantAdminError> {
        self.set_status(tenant_id, TenantStatus::Active).await
    }

    pub async fn archive(&self, tenant_id: &str) -> Result<TenantDescriptor, TenantAdminError> {
        self.set_status(tenant_id, TenantStatus::Archived).await
    }

    pub async fn delete(&self, tenant_id: &str) -> Result<(), TenantAdminError> {
        let descriptor = self
            .config_store
            .get(tenant_id)
            .await?
            .ok_or_else(|| TenantAdminError::NotFound(tenant_id.to_string()))?;
        self.pool_manager.remove(tenant_id).await;
        if let Err(e) = self.provisioner.drop(&descriptor.database).await {
            tracing::event!(tracing::Level::ERROR, "delete: failed to drop tenant database: {e}");
        }
        let base_domain = self.domain_map.base_domain().to_string();
        let admin_domain = format!("{}admin.{}", descriptor.tenant_id, base_domain);
        let website_domain = format!("{}.{}", descriptor.tenant_id, base_domain);
        for domain in [admin_domain.as_str(), website_domain.as_str()] {
            let _ = env_file::delete(&self.env_file_root, domain).await;
            let _ = self.domain_map.remove(domain).await;
        }
        if let Some(custom_domain) = &descriptor.domain {
            let _ = self.domain_map.remove(custom_domain).await;
        }
        self.config_store.delete(tenant_id).await?;
        Ok(())
    }

    pub async fn get(&self, tenant_id: &str) -> Result<TenantDescriptor, TenantAdminError> {
        self.config_store
            .get(tenant_id)
            .await?
            .ok_or_else(|| TenantAdminError::NotFound(tenant_id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<TenantDescriptor>, TenantAdminError> {
        Ok(self.config_store.list().await?)
    }

    pub async fn list_summary(&self) -> Result<Vec<TenantSummary>, TenantAdminError> {
        Ok(self
            .config_store
            .list()
            .await?
            .iter()
            .map(TenantSummary::from)
            .collect())
    }

    /// Redacted JSON export: `security.*`, `database.password`, and `smtp.password`
    /// replaced by a fixed marker, never the live secret values.
    pub async fn export_config(&self, tenant_id: &str) -> Result<Value, TenantAdminError> {
        let descriptor = self.get(tenant_id).await?;
        let mut value = serde_json::to_value(&descriptor)
            .map_err(|e| TenantAdminError::Provisioning(e.to_string()))?;
        if let Some(obj) = value.as_object_mut() {
            if let Some(db) = obj.get_mut("database").and_then(|v| v.as_object_mut()) {
                db.insert("password".to_string(), json!(REDACTED));
            }
            if let Some(security) = obj.get_mut("security").and_then(|v| v.as_object_mut()) {
                for key in ["jwtSecret", "encryptionKey", "sessionSecret", "apiKey"] {
                    if security.contains_key(key) {
                        security.insert(key.to_string(), json!(REDACTED));
                    }
                }
            }
            if let Some(smtp) = obj.get_mut("smtp").and_then(|v| v.as_object_mut())
                && smtp.contains_key("password")
            {
                smtp.insert("password".to_string(), json!(REDACTED));
            }
        }
        Ok(value)
    }

    pub async fn usage_stats(&self, tenant_id: &str, stats: UsageStats) -> Result<UsageStats, TenantAdminError> {
        self.get(tenant_id).await?;
        Ok(stats)
    }

    pub async fn check_usage_limits(
        &self,
        tenant_id: &str,
        stats: UsageStats,
    ) -> Result<UsageLimitCheck, TenantAdminError> {
        let descriptor = self.get(tenant_id).await?;
        Ok(check_usage_limits(&stats, &descriptor.limits))
    }

    /// Probes every live tenant pool and reports which were closed as unhealthy.
    /// Distinct from the idle reaper: this is a connectivity check, not an activity one.
    pub async fn health_check(&self) -> crate::tenants::pool_manager::PoolHealthReport {
        self.pool_manager.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_limits_flag_violations() {
        let stats = UsageStats {
            users: 10,
            pages: 1,
            posts: 1,
            storage_mb: 1,
            api_calls: 1,
            largest_file_mb: 1,
            menus: 1,
            galleries: 1,
            sliders: 1,
        };
        let limits = UsageLimits::from(TenantTier::Starter);
        let check = check_usage_limits(&stats, &limits);
        assert!(!check.within_limits);
        assert!(check.violations.iter().any(|v| v.contains("users")));
    }

    #[test]
    fn usage_limits_pass_within_bounds() {
        let stats = UsageStats {
            users: 1,
            pages: 1,
            posts: 1,
            storage_mb: 1,
            api_calls: 1,
            largest_file_mb: 1,
            menus: 1,
            galleries: 1,
            sliders: 1,
        };
        let limits = UsageLimits::from(TenantTier::Starter);
        let check = check_usage_limits(&stats, &limits);
        assert!(check.within_limits);
        assert!(check.violations.is_empty());
    }
}
