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

use crate::common::error::RepositoryError;
use crate::manager::app::config::{BasicDatabaseConfig, DatabasePoolSizeProvider, DatabaseUrlProvider};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;

/// Owns the single connection pool backing the operator control plane (operator
/// accounts, sessions, and the tenant registry's own bookkeeping tables). Distinct
/// from the per-tenant pools kept by `tenants::pool_manager::TenantPoolManager`,
/// which point at databases this process does not own.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ControlPlanePool: Send + Sync {
    fn get_main_pool(&self) -> PgPool;
}

pub struct PgControlPlanePool {
    main_pool: PgPool,
}

impl PgControlPlanePool {
    pub async fn new(main_database_config: &BasicDatabaseConfig) -> Result<Self, RepositoryError> {
        let main_pool = PgPoolOptions::new()
            .max_connections(main_database_config.max_pool_size())
            .acquire_timeout(Duration::from_secs(3))
            .connect(&main_database_config.url())
            .await?;
        Ok(Self { main_pool })
    }
}

#[async_trait]
impl ControlPlanePool for PgControlPlanePool {
    fn get_main_pool(&self) -> PgPool {
        self.main_pool.clone()
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseMigrator: Send + Sync {
    async fn migrate_main_db(&self) -> Result<(), RepositoryError>;
}

pub struct PgDatabaseMigrator {
    main_pool: PgPool,
}

impl PgDatabaseMigrator {
    pub fn new(main_pool: PgPool) -> Self {
        Self { main_pool }
    }
}

#[async_trait]
impl DatabaseMigrator for PgDatabaseMigrator {
    async fn migrate_main_db(&self) -> Result<(), RepositoryError> {
        Ok(sqlx::migrate!("./migrations/main").run(&self.main_pool).await?)
    }
}

/// Verifies that a tenant-supplied database target is actually reachable, and that
/// it is empty, before the tenant's descriptor is accepted. Grounded on the
/// reachability and conflict checks in §2 (C1 Tenant Validator).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn test_connect(
        &self,
        config: &BasicDatabaseConfig,
        ssl_mode: PgSslMode,
    ) -> Result<PgPool, RepositoryError>;

    async fn is_empty_database(&self, pool: &PgPool) -> Result<(), RepositoryError>;
}

pub struct PgConnectionTester;

#[async_trait]
impl ConnectionTester for PgConnectionTester {
    async fn test_connect(
        &self,
        config: &BasicDatabaseConfig,
        ssl_mode: PgSslMode,
    ) -> Result<PgPool, RepositoryError> {
        let conn = PgConnectOptions::from_str(&config.url())?.ssl_mode(ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_pool_size())
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(conn)
            .await?;
        Ok(pool)
    }

    async fn is_empty_database(&self, pool: &PgPool) -> Result<(), RepositoryError> {
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) as number_of_tables
                    FROM information_schema.tables
                    WHERE table_schema = 'public'",
        )
        .fetch_one(pool)
        .await?;
        if result == 0 {
            Ok(())
        } else {
            Err(RepositoryError::Custom("Database is not empty".to_string()))
        }
    }
}
