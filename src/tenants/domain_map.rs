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
use crate::tenants::model::{DomainMappingEntry, DomainTenantType};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const MAPPING_FILE_NAME: &str = "domain-mappings.json";

#[derive(Debug, thiserror::Error)]
pub enum DomainMapError {
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed domain mapping file: {0}")]
    Malformed(String),
}

/// Where host-header resolution lands when no entry in the mapping matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainResolution {
    /// An exact, active match for the presented host.
    Matched(DomainMappingEntry),
    /// The host carries a recognized subdomain but no explicit mapping row exists.
    BareSubdomain(String),
    /// Neither an explicit mapping nor a recognizable subdomain shape.
    Unresolved,
}

/// Persists the `{domain, envFile, tenantType, isActive}` rows backing host-header
/// resolution (C5's first strategy). Grounded on the source's
/// `Arc<RwLock<HashMap<...>>>` in-memory index paired with a JSON file on disk, the
/// same shape [`crate::tenants::config_store::FileConfigStore`] uses for descriptors.
pub struct DomainMap {
    path: PathBuf,
    base_domain: String,
    entries: RwLock<Vec<DomainMappingEntry>>,
    write_lock: Mutex<()>,
}

impl DomainMap {
    /// Loads `<configRoot>/domain-mappings.json`, creating an empty mapping file if
    /// none exists yet.
    pub async fn load(config_root: &Path, base_domain: impl Into<String>) -> Result<Self, DomainMapError> {
        let path = config_root.join(MAPPING_FILE_NAME);
        let entries = match fs::read_to_string(&path).await {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| DomainMapError::Malformed(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(DomainMapError::Io(e.to_string())),
        };
        let map = Self {
            path,
            base_domain: base_domain.into(),
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        };
        if !map.path.exists() {
            map.persist().await?;
        }
        Ok(map)
    }

    async fn persist(&self) -> Result<(), DomainMapError> {
        let snapshot = self
            .entries
            .read()
            .expect("domain map poisoned")
            .clone();
        let contents = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| DomainMapError::Malformed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainMapError::Io(e.to_string()))?;
        }
        let tmp = self.path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, contents)
            .await
            .map_err(|e| DomainMapError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| DomainMapError::Io(e.to_string()))?;
        Ok(())
    }

    /// Resolves a request `Host` header: strip the port, then an exact active mapping
    /// wins. Otherwise the host splits into `label.baseDomain`; any active mapping
    /// whose own domain shares that same base-domain suffix matches if its label is
    /// identical to, or a substring of (either direction), the host's label — this
    /// is what lets rows like `${tenantId}admin.${baseDomain}` resolve a request for
    /// `${tenantId}.${baseDomain}` and vice versa. Falls back to a bare-subdomain
    /// result against the configured platform base domain when nothing matches.
    pub fn resolve(&self, host: &str) -> DomainResolution {
        let host = host.split(':').next().unwrap_or(host);
        let entries = self.entries.read().expect("domain map poisoned");
        if let Some(entry) = entries.iter().find(|e| e.domain == host && e.is_active) {
            return DomainResolution::Matched(entry.clone());
        }

        if let Some((label, base)) = split_label(host) {
            for entry in entries.iter().filter(|e| e.is_active) {
                let Some((entry_label, entry_base)) = split_label(&entry.domain) else {
                    continue;
                };
                if entry_base == base
                    && (entry_label == label
                        || entry_label.contains(label)
                        || label.contains(entry_label))
                {
                    return DomainResolution::Matched(entry.clone());
                }
            }
            if base == self.base_domain {
                return DomainResolution::BareSubdomain(label.to_string());
            }
        }
        DomainResolution::Unresolved
    }

    /// Inserts or replaces the row for `entry.domain`.
    pub async fn upsert(&self, entry: DomainMappingEntry) -> Result<(), DomainMapError> {
        let _guard = self.write_lock.lock().await;
        {
            let mut entries = self.entries.write().expect("domain map poisoned");
            entries.retain(|e| e.domain != entry.domain);
            entries.push(entry);
        }
        self.persist().await
    }

    /// Removes the row for `domain`, returning whether one existed.
    pub async fn remove(&self, domain: &str) -> Result<bool, DomainMapError> {
        let _guard = self.write_lock.lock().await;
        let removed = {
            let mut entries = self.entries.write().expect("domain map poisoned");
            let before = entries.len();
            entries.retain(|e| e.domain != domain);
            entries.len() != before
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    pub fn list(&self) -> Vec<DomainMappingEntry> {
        self.entries.read().expect("domain map poisoned").clone()
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }
}

/// Splits a host into its leading label and the remaining base domain, e.g.
/// `"acme.tenants.example.com"` -> `("acme", "tenants.example.com")`. Returns `None`
/// for a bare, unqualified host with no dot.
fn split_label(host: &str) -> Option<(&str, &str)> {
    let (label, base) = host.split_once('.')?;
    if label.is_empty() || base.is_empty() {
        return None;
    }
    Some((label, base))
}

/// Builds the website mapping row registered for a freshly provisioned tenant,
/// pointing at the env file the C3 generator produced for it.
pub fn default_mapping_entry(domain: &str, env_file: &str) -> DomainMappingEntry {
    DomainMappingEntry {
        domain: domain.to_string(),
        env_file: env_file.to_string(),
        tenant_type: DomainTenantType::Website,
        is_active: true,
    }
}

/// Builds the admin mapping row for the `${tenantId}admin.${baseDomain}` half of a
/// [`crate::tenants::env_file::generate_pair`] call.
pub fn admin_mapping_entry(domain: &str, env_file: &str) -> DomainMappingEntry {
    DomainMappingEntry {
        domain: domain.to_string(),
        env_file: env_file.to_string(),
        tenant_type: DomainTenantType::Admin,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(domain: &str) -> DomainMappingEntry {
        DomainMappingEntry {
            domain: domain.to_string(),
            env_file: ".env.acmeexamplecom".to_string(),
            tenant_type: DomainTenantType::Website,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn resolve_matches_exact_active_domain() {
        let dir = std::env::temp_dir().join(format!("tgw-domainmap-{}", Uuid::new_v4()));
        let map = DomainMap::load(&dir, "tenants.example.com").await.unwrap();
        map.upsert(sample_entry("acme.example.com")).await.unwrap();
        match map.resolve("acme.example.com") {
            DomainResolution::Matched(entry) => assert_eq!(entry.domain, "acme.example.com"),
            other => panic!("expected Matched, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn resolve_falls_back_to_bare_subdomain() {
        let dir = std::env::temp_dir().join(format!("tgw-domainmap-{}", Uuid::new_v4()));
        let map = DomainMap::load(&dir, "tenants.example.com").await.unwrap();
        match map.resolve("acme.tenants.example.com") {
            DomainResolution::BareSubdomain(label) => assert_eq!(label, "acme"),
            other => panic!("expected BareSubdomain, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn resolve_matches_sibling_entry_by_label_containment() {
        let dir = std::env::temp_dir().join(format!("tgw-domainmap-{}", Uuid::new_v4()));
        let map = DomainMap::load(&dir, "tenants.example.com").await.unwrap();
        map.upsert(admin_mapping_entry(
            "acmeadmin.tenants.example.com",
            ".env.acmeadmintenantsexamplecom",
        ))
        .await
        .unwrap();
        match map.resolve("acme.tenants.example.com") {
            DomainResolution::Matched(entry) => {
                assert_eq!(entry.domain, "acmeadmin.tenants.example.com");
                assert_eq!(entry.tenant_type, DomainTenantType::Admin);
            }
            other => panic!("expected Matched, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn resolve_is_unresolved_for_unrelated_host() {
        let dir = std::env::temp_dir().join(format!("tgw-domainmap-{}", Uuid::new_v4()));
        let map = DomainMap::load(&dir, "tenants.example.com").await.unwrap();
        assert_eq!(map.resolve("unrelated.org"), DomainResolution::Unresolved);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn remove_missing_domain_returns_false() {
        let dir = std::env::temp_dir().join(format!("tgw-domainmap-{}", Uuid::new_v4()));
        let map = DomainMap::load(&dir, "tenants.example.com").await.unwrap();
        assert!(!map.remove("nope.example.com").await.unwrap());
        let _ = std::fs::remove_dir_all(dir);
    }
}
