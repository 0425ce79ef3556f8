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
use crate::manager::app::config::PoolConfig;
use crate::tenants::model::{DatabaseDescriptor, DatabaseKind};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct LiveEntry {
    pool: PgPool,
    descriptor_fingerprint: u64,
    last_used_at: Instant,
    in_flight: u32,
}

/// Result of probing every live entry with a trivial query. Entries that fail are
/// closed and dropped from the map before this is returned.
#[derive(Debug, Clone, Default)]
pub struct PoolHealthReport {
    pub healthy: usize,
    pub unhealthy: Vec<String>,
}

/// Holds one live `PgPool` per tenant, keyed by tenant id. Caps total live entries
/// across all tenants at `PoolConfig::total_connection_cap` and entries held by a
/// single tenant id at `PoolConfig::per_tenant_cap`, reaps pools whose `lastUsedAt`
/// exceeds `PoolConfig::idle_timeout`, and rebuilds a tenant's pool whenever its
/// `DatabaseDescriptor` changes byte-for-byte (I3). Grounded on the source's
/// tenant-pool `HashMap` index, split out of the single-pool control plane
/// (`manager::app::database::PgControlPlanePool`) because these pools point at
/// databases this process does not own.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TenantPoolProvider: Send + Sync {
    async fn get_or_create(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
    ) -> Result<PgPool, RepositoryError>;
    fn release(&self, tenant_id: &str);
    async fn evict_idle(&self) -> usize;
    fn active_count(&self) -> usize;
    async fn remove(&self, tenant_id: &str);
    async fn execute_query(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
        sql: &str,
    ) -> Result<u64, RepositoryError>;
    async fn execute_transaction(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
        statements: &[String],
    ) -> Result<(), RepositoryError>;
    async fn health_check(&self) -> PoolHealthReport;
}

pub struct TenantPoolManager {
    entries: RwLock<HashMap<String, LiveEntry>>,
    config: PoolConfig,
}

fn fingerprint(descriptor: &DatabaseDescriptor) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    descriptor.kind.hash_discriminant().hash(&mut hasher);
    descriptor.host.hash(&mut hasher);
    descriptor.port.hash(&mut hasher);
    descriptor.database.hash(&mut hasher);
    descriptor.username.hash(&mut hasher);
    descriptor.password.hash(&mut hasher);
    descriptor.ssl.hash(&mut hasher);
    descriptor.connection_limit.hash(&mut hasher);
    hasher.finish()
}

impl DatabaseKind {
    fn hash_discriminant(&self) -> u8 {
        match self {
            DatabaseKind::Mysql => 0,
            DatabaseKind::Postgresql => 1,
            DatabaseKind::Sqlite => 2,
        }
    }
}

impl TenantPoolManager {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Count of live pool *entries*, not sqlx's established-connection count per pool
    /// (`PgPool::size`) — the global cap bounds how many tenants hold a pool at all.
    fn entry_count(&self) -> u32 {
        self.entries.read().expect("tenant pool map poisoned").len() as u32
    }

    /// Entries held by a single tenant id. The map key is the tenant id itself, so
    /// this is always 0 or 1 today; it stays a count rather than a boolean so a
    /// future multi-pool-per-tenant scheme is capped by the same setting without a
    /// signature change here.
    fn tenant_entry_count(&self, tenant_id: &str) -> u32 {
        u32::from(
            self.entries
                .read()
                .expect("tenant pool map poisoned")
                .contains_key(tenant_id),
        )
    }

    async fn build_pool(&self, descriptor: &DatabaseDescriptor) -> Result<PgPool, RepositoryError> {
        if descriptor.kind != DatabaseKind::Postgresql {
            return Err(RepositoryError::Custom(format!(
                "unsupported database kind for a live pool: {:?}",
                descriptor.kind
            )));
        }
        let max_connections = if descriptor.connection_limit > 0 {
            descriptor.connection_limit
        } else {
            self.config.default_max_connections()
        };
        let ssl_mode = if descriptor.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        let conn = PgConnectOptions::from_str(&descriptor.connection_url())
            .map_err(RepositoryError::Database)?
            .ssl_mode(ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(conn)
            .await
            .map_err(RepositoryError::Database)?;
        Ok(pool)
    }
}

#[async_trait]
impl TenantPoolProvider for TenantPoolManager {
    async fn get_or_create(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
    ) -> Result<PgPool, RepositoryError> {
        let fp = fingerprint(descriptor);
        {
            let mut entries = self.entries.write().expect("tenant pool map poisoned");
            if let Some(entry) = entries.get_mut(tenant_id)
                && entry.descriptor_fingerprint == fp
            {
                entry.last_used_at = Instant::now();
                entry.in_flight += 1;
                return Ok(entry.pool.clone());
            }
        }
        if self.entry_count() >= self.config.total_connection_cap() {
            return Err(RepositoryError::Custom(
                "tenant pool connection cap reached".to_string(),
            ));
        }
        if self.tenant_entry_count(tenant_id) >= self.config.per_tenant_cap() {
            return Err(RepositoryError::Custom(format!(
                "tenant '{tenant_id}' has reached its per-tenant pool cap"
            )));
        }
        let pool = self.build_pool(descriptor).await?;
        let mut entries = self.entries.write().expect("tenant pool map poisoned");
        entries.insert(
            tenant_id.to_string(),
            LiveEntry {
                pool: pool.clone(),
                descriptor_fingerprint: fp,
                last_used_at: Instant::now(),
                in_flight: 1,
            },
        );
        Ok(pool)
    }

    fn release(&self, tenant_id: &str) {
        let mut entries = self.entries.write().expect("tenant pool map poisoned");
        if let Some(entry) = entries.get_mut(tenant_id) {
            entry.in_flight = entry.in_flight.saturating_sub(1);
            entry.last_used_at = Instant::now();
        }
    }

    async fn evict_idle(&self) -> usize {
        let idle_timeout = self.config.idle_timeout();
        let mut entries = self.entries.write().expect("tenant pool map poisoned");
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.in_flight > 0 || entry.last_used_at.elapsed() < idle_timeout
        });
        before - entries.len()
    }

    fn active_count(&self) -> usize {
        self.entries.read().expect("tenant pool map poisoned").len()
    }

    async fn remove(&self, tenant_id: &str) {
        self.entries
            .write()
            .expect("tenant pool map poisoned")
            .remove(tenant_id);
    }

    /// Runs a single statement against the tenant's pool. No map lock is held while
    /// the query runs — `get_or_create`/`release` only guard the map slot.
    async fn execute_query(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
        sql: &str,
    ) -> Result<u64, RepositoryError> {
        let pool = self.get_or_create(tenant_id, descriptor).await?;
        let outcome = sqlx::query(sql).execute(&pool).await;
        self.release(tenant_id);
        outcome
            .map(|result| result.rows_affected())
            .map_err(RepositoryError::Database)
    }

    /// Runs every statement inside a single `BEGIN`/`COMMIT`. Any failure aborts the
    /// transaction; sqlx rolls it back when the `Transaction` guard drops without a
    /// commit, so a failed statement never leaves a partial write behind.
    async fn execute_transaction(
        &self,
        tenant_id: &str,
        descriptor: &DatabaseDescriptor,
        statements: &[String],
    ) -> Result<(), RepositoryError> {
        let pool = self.get_or_create(tenant_id, descriptor).await?;
        let outcome = async {
            let mut tx = pool.begin().await.map_err(RepositoryError::Database)?;
            for statement in statements {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(RepositoryError::Database)?;
            }
            tx.commit().await.map_err(RepositoryError::Database)
        }
        .await;
        self.release(tenant_id);
        outcome
    }

    /// Probes every live entry with `SELECT 1`, closing and dropping any that fail.
    /// Distinct from `evict_idle`, which reaps by inactivity rather than connectivity.
    async fn health_check(&self) -> PoolHealthReport {
        let snapshot: Vec<(String, PgPool)> = {
            let entries = self.entries.read().expect("tenant pool map poisoned");
            entries
                .iter()
                .map(|(tenant_id, entry)| (tenant_id.clone(), entry.pool.clone()))
                .collect()
        };

        let mut unhealthy = Vec::new();
        for (tenant_id, pool) in &snapshot {
            if sqlx::query("SELECT 1").execute(pool).await.is_err() {
                unhealthy.push(tenant_id.clone());
            }
        }

        if !unhealthy.is_empty() {
            let mut entries = self.entries.write().expect("tenant pool map poisoned");
            for tenant_id in &unhealthy {
                entries.remove(tenant_id);
            }
        }

        PoolHealthReport {
            healthy: snapshot.len() - unhealthy.len(),
            unhealthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::app::config::PoolConfigBuilder;

    fn sample_config() -> PoolConfig {
        PoolConfigBuilder::new()
            .default_max_connections(3)
            .idle_timeout_secs(300)
            .total_connection_cap(10)
            .build()
            .unwrap()
    }

    fn sample_descriptor() -> DatabaseDescriptor {
        DatabaseDescriptor {
            kind: DatabaseKind::Postgresql,
            host: "localhost".to_string(),
            port: 5432,
            database: "acme".to_string(),
            username: "acme".to_string(),
            password: "secret".to_string(),
            ssl: false,
            connection_limit: 3,
        }
    }

    #[test]
    fn fingerprint_is_stable_for_identical_descriptors() {
        assert_eq!(fingerprint(&sample_descriptor()), fingerprint(&sample_descriptor()));
    }

    #[test]
    fn fingerprint_changes_when_password_changes() {
        let mut other = sample_descriptor();
        other.password = "different".to_string();
        assert_ne!(fingerprint(&sample_descriptor()), fingerprint(&other));
    }

    #[tokio::test]
    async fn active_count_starts_at_zero() {
        let manager = TenantPoolManager::new(sample_config());
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn evict_idle_on_empty_map_is_noop() {
        let manager = TenantPoolManager::new(sample_config());
        assert_eq!(manager.evict_idle().await, 0);
    }

    #[tokio::test]
    async fn non_postgres_descriptor_is_rejected() {
        let manager = TenantPoolManager::new(sample_config());
        let mut descriptor = sample_descriptor();
        descriptor.kind = DatabaseKind::Mysql;
        let result = manager.get_or_create("acme", &descriptor).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn per_tenant_cap_of_zero_rejects_every_new_entry() {
        let config = PoolConfigBuilder::new()
            .default_max_connections(3)
            .idle_timeout_secs(300)
            .total_connection_cap(10)
            .per_tenant_cap(0)
            .build()
            .unwrap();
        let manager = TenantPoolManager::new(config);
        let result = manager.get_or_create("acme", &sample_descriptor()).await;
        let Err(RepositoryError::Custom(message)) = result else {
            panic!("expected a custom capacity error, got {result:?}");
        };
        assert!(message.contains("per-tenant pool cap"));
    }

    #[tokio::test]
    async fn health_check_on_empty_map_reports_no_entries() {
        let manager = TenantPoolManager::new(sample_config());
        let report = manager.health_check().await;
        assert_eq!(report.healthy, 0);
        assert!(report.unhealthy.is_empty());
    }
}
