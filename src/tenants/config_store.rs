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
use crate::tenants::model::TenantDescriptor;
use crate::tenants::validator::validate_descriptor;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed descriptor for '{0}': {1}")]
    Malformed(String, String),
    #[error("invalid descriptor for '{0}': {1}")]
    Invalid(String, String),
}

struct CacheEntry {
    descriptor: TenantDescriptor,
    loaded_at: Instant,
}

/// Reads and writes tenant descriptors under `<configRoot>/<tenantId>.json`, backed by
/// a TTL cache so the hot path (C5/C7) rarely touches disk. Grounded on the source's
/// file-backed config layering (`config::Config::builder().add_source(File::...)`) and
/// its `Arc<RwLock<HashMap<...>>>` pool-index idiom, applied here to descriptors instead
/// of pools.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, tenant_id: &str) -> Result<Option<TenantDescriptor>, ConfigStoreError>;
    async fn find_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<TenantDescriptor>, ConfigStoreError>;
    async fn find_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<TenantDescriptor>, ConfigStoreError>;
    async fn list(&self) -> Result<Vec<TenantDescriptor>, ConfigStoreError>;
    async fn save(&self, descriptor: &TenantDescriptor) -> Result<(), ConfigStoreError>;
    async fn delete(&self, tenant_id: &str) -> Result<bool, ConfigStoreError>;
    async fn exists(&self, tenant_id: &str) -> Result<bool, ConfigStoreError>;
}

pub struct FileConfigStore {
    config_root: PathBuf,
    ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(config_root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            config_root: config_root.into(),
            ttl,
            cache: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, tenant_id: &str) -> PathBuf {
        self.config_root.join(format!("{tenant_id}.json"))
    }

    fn cache_get(&self, tenant_id: &str) -> Option<TenantDescriptor> {
        let guard = self.cache.read().expect("config store cache poisoned");
        guard.get(tenant_id).and_then(|entry| {
            if entry.loaded_at.elapsed() <= self.ttl {
                Some(entry.descriptor.clone())
            } else {
                None
            }
        })
    }

    fn cache_put(&self, tenant_id: &str, descriptor: TenantDescriptor) {
        let mut guard = self.cache.write().expect("config store cache poisoned");
        guard.insert(
            tenant_id.to_string(),
            CacheEntry {
                descriptor,
                loaded_at: Instant::now(),
            },
        );
    }

    fn cache_evict(&self, tenant_id: &str) {
        let mut guard = self.cache.write().expect("config store cache poisoned");
        guard.remove(tenant_id);
    }

    async fn read_from_disk(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantDescriptor>, ConfigStoreError> {
        let path = self.path_for(tenant_id);
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                let descriptor: TenantDescriptor = serde_json::from_str(&contents)
                    .map_err(|e| ConfigStoreError::Malformed(tenant_id.to_string(), e.to_string()))?;
                self.cache_put(tenant_id, descriptor.clone());
                Ok(Some(descriptor))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigStoreError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<TenantDescriptor>, ConfigStoreError> {
        if let Some(cached) = self.cache_get(tenant_id) {
            return Ok(Some(cached));
        }
        self.read_from_disk(tenant_id).await
    }

    async fn find_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<TenantDescriptor>, ConfigStoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|d| d.subdomain == subdomain))
    }

    async fn find_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<TenantDescriptor>, ConfigStoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|d| d.domain.as_deref() == Some(domain)))
    }

    async fn list(&self) -> Result<Vec<TenantDescriptor>, ConfigStoreError> {
        let mut entries = Vec::new();
        let mut read_dir = match fs::read_dir(&self.config_root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConfigStoreError::Io(e.to_string())),
        };
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| ConfigStoreError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if path.file_stem().and_then(|s| s.to_str()) == Some("domain-mappings") {
                continue;
            }
            if let Some(tenant_id) = path.file_stem().and_then(|s| s.to_str())
                && let Some(descriptor) = self.get(tenant_id).await?
            {
                entries.push(descriptor);
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn save(&self, descriptor: &TenantDescriptor) -> Result<(), ConfigStoreError> {
        let report = validate_descriptor(descriptor);
        if !report.is_valid {
            return Err(ConfigStoreError::Invalid(
                descriptor.tenant_id.clone(),
                report.to_string(),
            ));
        }
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(&descriptor.tenant_id);
        let tmp_path = atomic_tmp_path(&path);
        let contents = serde_json::to_string_pretty(descriptor)
            .map_err(|e| ConfigStoreError::Malformed(descriptor.tenant_id.clone(), e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigStoreError::Io(e.to_string()))?;
        }
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| ConfigStoreError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ConfigStoreError::Io(e.to_string()))?;
        self.cache_evict(&descriptor.tenant_id);
        self.cache_put(&descriptor.tenant_id, descriptor.clone());
        Ok(())
    }

    async fn delete(&self, tenant_id: &str) -> Result<bool, ConfigStoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(tenant_id);
        self.cache_evict(tenant_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigStoreError::Io(e.to_string())),
        }
    }

    async fn exists(&self, tenant_id: &str) -> Result<bool, ConfigStoreError> {
        Ok(self.get(tenant_id).await?.is_some())
    }
}

fn atomic_tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| format!("{}.{}.tmp", n.to_string_lossy(), Uuid::new_v4()))
        .unwrap_or_else(|| format!("{}.tmp", Uuid::new_v4()));
    tmp.set_file_name(file_name);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenants::model::{
        Branding, DatabaseDescriptor, DatabaseKind, FeatureMap, SecurityTriple, SeoSettings,
        StorageDescriptor, StorageKind, TenantStatus, UsageLimits,
    };
    use chrono::Utc;

    fn sample(tenant_id: &str) -> TenantDescriptor {
        TenantDescriptor {
            tenant_id: tenant_id.to_string(),
            name: "Acme".to_string(),
            subdomain: tenant_id.to_string(),
            domain: None,
            status: TenantStatus::Active,
            database: DatabaseDescriptor {
                kind: DatabaseKind::Postgresql,
                host: "localhost".to_string(),
                port: 5432,
                database: "acme".to_string(),
                username: "acme".to_string(),
                password: "secret".to_string(),
                ssl: false,
                connection_limit: 10,
            },
            features: FeatureMap::default(),
            limits: UsageLimits {
                max_users: 5,
                max_pages: 100,
                max_posts: 1000,
                max_storage_mb: 1000,
                max_api_calls: 10_000,
                max_file_size_mb: 25,
                max_menus: 10,
                max_galleries: 10,
                max_sliders: 10,
            },
            branding: Branding::default(),
            seo: SeoSettings::default(),
            security: SecurityTriple {
                jwt_secret: "a".repeat(32),
                encryption_key: "b".repeat(32),
                session_secret: "c".repeat(32),
                api_key: None,
                cors_allow_list: vec![],
                rate_limit_requests: 100,
            },
            storage: StorageDescriptor {
                kind: StorageKind::Local,
                base_path: Some("/data".to_string()),
                bucket: None,
                access_key: None,
                secret_key: None,
                region: None,
            },
            smtp: None,
            environment: Default::default(),
            admin_contact: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let dir = std::env::temp_dir().join(format!("tgw-configstore-{}", Uuid::new_v4()));
        let store = FileConfigStore::new(dir.clone(), Duration::from_secs(60));
        let descriptor = sample("acme");
        store.save(&descriptor).await.unwrap();
        let loaded = store.get("acme").await.unwrap().unwrap();
        assert_eq!(loaded.tenant_id, "acme");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_tenant_is_none_not_error() {
        let dir = std::env::temp_dir().join(format!("tgw-configstore-{}", Uuid::new_v4()));
        let store = FileConfigStore::new(dir.clone(), Duration::from_secs(60));
        assert!(store.get("nope").await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn delete_missing_tenant_returns_false() {
        let dir = std::env::temp_dir().join(format!("tgw-configstore-{}", Uuid::new_v4()));
        let store = FileConfigStore::new(dir.clone(), Duration::from_secs(60));
        assert_eq!(store.delete("nope").await.unwrap(), false);
        let _ = std::fs::remove_dir_all(dir);
    }
}
