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

use crate::manager::app::config::AppConfig;
use crate::tenants::admin_service::{NoopProvisioner, PgDatabaseProvisioner, TenantAdminService};
use crate::tenants::config_store::{ConfigStore, FileConfigStore};
use crate::tenants::context::{ContextMaterialiserConfig, ContextMaterialiserState};
use crate::tenants::domain_map::DomainMap;
use crate::tenants::pool_manager::{TenantPoolManager, TenantPoolProvider};
use crate::security::rate_limit::TenantRateLimiters;

/// Owns the pieces that every tenant-facing request needs but that have no home
/// in the control-plane `AppState`: the config store (C2), the domain map (C4)
/// and the per-tenant pool manager (C6). Built once at startup from [`AppConfig`]
/// and handed to both the admin service (C8) and the context middleware (C7).
pub struct TenantRegistry {
    pub config_store: Arc<dyn ConfigStore>,
    pub domain_map: Arc<DomainMap>,
    pub pool_manager: Arc<dyn TenantPoolProvider>,
    pub env_file_root: std::path::PathBuf,
}

impl TenantRegistry {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let registry_config = config.tenant_registry();
        let config_root = registry_config.config_root().to_path_buf();
        let env_file_root = registry_config.env_file_root().to_path_buf();
        tokio::fs::create_dir_all(&config_root).await?;
        tokio::fs::create_dir_all(&env_file_root).await?;

        let config_store: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::new(
            config_root.clone(),
            registry_config.cache_ttl(),
        ));
        let domain_map = Arc::new(
            DomainMap::load(&config_root, config.server().host().to_string()).await?,
        );
        let pool_manager: Arc<dyn TenantPoolProvider> =
            Arc::new(TenantPoolManager::new(config.pool().clone()));

        Ok(Self {
            config_store,
            domain_map,
            pool_manager,
            env_file_root,
        })
    }

    /// Assembles a [`ContextMaterialiserState`] (C7) against this registry's stores.
    pub fn context_state(&self, config: &AppConfig) -> Arc<ContextMaterialiserState> {
        Arc::new(ContextMaterialiserState {
            config_store: self.config_store.clone(),
            domain_map: self.domain_map.clone(),
            pool_manager: self.pool_manager.clone(),
            tenant_rate_limiters: Arc::new(TenantRateLimiters::new()),
            settings: ContextMaterialiserConfig {
                require_tenant: false,
                fallback_tenant: None,
                env_file_root: self.env_file_root.clone(),
                extra_bypass_paths: Vec::new(),
                jwt_secret: config.auth().jwt_secret().as_bytes().to_vec(),
            },
        })
    }

    /// Assembles a [`TenantAdminService`] (C8) backed by a real provisioner when the
    /// control-plane pool is available, falling back to a no-op provisioner otherwise
    /// (used in tests and for descriptor-only dry runs).
    pub fn admin_service_pg(
        &self,
        admin_pool: sqlx::PgPool,
    ) -> TenantAdminService<PgDatabaseProvisioner> {
        TenantAdminService::new(
            self.config_store.clone(),
            self.domain_map.clone(),
            self.pool_manager.clone(),
            self.env_file_root.clone(),
            PgDatabaseProvisioner::new(admin_pool),
        )
    }

    pub fn admin_service_noop(&self) -> TenantAdminService<NoopProvisioner> {
        TenantAdminService::new(
            self.config_store.clone(),
            self.domain_map.clone(),
            self.pool_manager.clone(),
            self.env_file_root.clone(),
            NoopProvisioner,
        )
    }
}
