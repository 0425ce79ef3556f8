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
use crate::common::services::generate_hex_secret;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const REQUIRED_KEYS: &[&str] = &["DATABASE_URL", "TENANT_ID", "JWT_SECRET"];
pub const RECOMMENDED_KEYS: &[&str] = &[
    "DATABASE_HOST",
    "DATABASE_PORT",
    "DATABASE_NAME",
    "DATABASE_USER",
    "DATABASE_PASSWORD",
    "DATABASE_CHARSET",
    "TENANT_NAME",
    "ENCRYPTION_KEY",
    "SESSION_SECRET",
];

#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    #[error("io error: {0}")]
    Io(String),
    #[error("{0}")]
    Invalid(String),
}

/// The seven inputs `update` watches to decide whether `DATABASE_URL` needs regenerating.
#[derive(Debug, Clone, Default)]
pub struct DatabaseInputs {
    pub host: Option<String>,
    pub port: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    pub scheme: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnvTemplate {
    pub tenant_id: String,
    pub tenant_name: String,
    pub database: DatabaseInputs,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedEnv {
    pub env_file: String,
    pub env_path: PathBuf,
    pub database_url: String,
    pub tenant_id: String,
    pub domain: String,
    pub generated_at: DateTime<Utc>,
}

/// `.env.<domain-with-dots-stripped>` — the per-domain env file name, e.g.
/// `hirayadmin.whitecodetech.com` -> `.env.hirayadminwhitecodetechcom`.
pub fn env_file_name(domain: &str) -> String {
    format!(".env.{}", domain.replace('.', ""))
}

fn render_database_url(db: &DatabaseInputs) -> String {
    let scheme = db.scheme.as_deref().unwrap_or("postgresql");
    format!(
        "{scheme}://{}:{}@{}:{}/{}",
        db.user.as_deref().unwrap_or(""),
        db.password.as_deref().unwrap_or(""),
        db.host.as_deref().unwrap_or("localhost"),
        db.port.as_deref().unwrap_or("5432"),
        db.name.as_deref().unwrap_or(""),
    )
}

fn render_sections(template: &EnvTemplate) -> Vec<(String, String)> {
    let db = &template.database;
    let mut lines = vec![
        ("DATABASE_URL".to_string(), render_database_url(db)),
        (
            "DATABASE_HOST".to_string(),
            db.host.clone().unwrap_or_else(|| "localhost".to_string()),
        ),
        (
            "DATABASE_PORT".to_string(),
            db.port.clone().unwrap_or_else(|| "5432".to_string()),
        ),
        (
            "DATABASE_NAME".to_string(),
            db.name.clone().unwrap_or_default(),
        ),
        (
            "DATABASE_USER".to_string(),
            db.user.clone().unwrap_or_default(),
        ),
        (
            "DATABASE_PASSWORD".to_string(),
            db.password.clone().unwrap_or_default(),
        ),
        (
            "DATABASE_CHARSET".to_string(),
            db.charset.clone().unwrap_or_else(|| "utf8mb4".to_string()),
        ),
        ("TENANT_ID".to_string(), template.tenant_id.clone()),
        ("TENANT_NAME".to_string(), template.tenant_name.clone()),
        ("JWT_SECRET".to_string(), generate_hex_secret(32)),
        ("ENCRYPTION_KEY".to_string(), generate_hex_secret(32)),
        ("SESSION_SECRET".to_string(), generate_hex_secret(32)),
    ];
    for (k, v) in &template.extra {
        lines.push((k.clone(), v.clone()));
    }
    lines
}

fn serialize_lines(lines: &[(String, String)]) -> String {
    let mut out = String::new();
    out.push_str("# database\n");
    for (k, v) in lines.iter().take(7) {
        out.push_str(&format!("{k}={v}\n"));
    }
    out.push_str("\n# tenant\n");
    for (k, v) in lines.iter().skip(7).take(2) {
        out.push_str(&format!("{k}={v}\n"));
    }
    out.push_str("\n# security\n");
    for (k, v) in lines.iter().skip(9).take(3) {
        out.push_str(&format!("{k}={v}\n"));
    }
    if lines.len() > 12 {
        out.push_str("\n# additional\n");
        for (k, v) in lines.iter().skip(12) {
            out.push_str(&format!("{k}={v}\n"));
        }
    }
    out
}

/// Parses `KEY=VALUE` lines, stripping optional surrounding quotes and skipping
/// `#` comments and blank lines. Preserves insertion order.
pub fn parse_env(contents: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        entries.push((key.trim().to_string(), value.to_string()));
    }
    entries
}

async fn atomic_write(path: &Path, contents: &str) -> Result<(), EnvFileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| EnvFileError::Io(e.to_string()))?;
    }
    let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    fs::write(&tmp, contents)
        .await
        .map_err(|e| EnvFileError::Io(e.to_string()))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| EnvFileError::Io(e.to_string()))?;
    Ok(())
}

/// Generates and writes one env file for `domain`, returning the summary the Env File
/// Manager's `generate` operation must produce. Does not touch the domain mapping —
/// callers pair this with [`crate::tenants::domain_map::DomainMap::upsert`].
pub async fn generate(
    env_file_root: &Path,
    domain: &str,
    template: &EnvTemplate,
) -> Result<GeneratedEnv, EnvFileError> {
    let file_name = env_file_name(domain);
    let path = env_file_root.join(&file_name);
    let lines = render_sections(template);
    let database_url = lines
        .iter()
        .find(|(k, _)| k == "DATABASE_URL")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    atomic_write(&path, &serialize_lines(&lines)).await?;
    Ok(GeneratedEnv {
        env_file: file_name,
        env_path: path,
        database_url,
        tenant_id: template.tenant_id.clone(),
        domain: domain.to_string(),
        generated_at: Utc::now(),
    })
}

/// The admin/website pair a fresh tenant provisioning run produces.
#[derive(Debug, Clone)]
pub struct GeneratedPair {
    pub admin: GeneratedEnv,
    pub website: GeneratedEnv,
}

/// Creates the two env files a freshly provisioned tenant needs:
/// `${tenantId}admin.${baseDomain}` (database `${tenantId}_admin_cms`) and
/// `${tenantId}.${baseDomain}` (database `${tenantId}_cms`). If the website file
/// fails to write, the admin file already written is removed so neither persists
/// alone — callers still need to pair each half with a
/// [`crate::tenants::domain_map::DomainMap::upsert`] of its own.
pub async fn generate_pair(
    env_file_root: &Path,
    base_domain: &str,
    tenant_id: &str,
    template: &EnvTemplate,
) -> Result<GeneratedPair, EnvFileError> {
    let admin_domain = format!("{tenant_id}admin.{base_domain}");
    let website_domain = format!("{tenant_id}.{base_domain}");

    let mut admin_template = template.clone();
    admin_template.database.name = Some(format!("{tenant_id}_admin_cms"));
    let admin = generate(env_file_root, &admin_domain, &admin_template).await?;

    let mut website_template = template.clone();
    website_template.database.name = Some(format!("{tenant_id}_cms"));
    let website = match generate(env_file_root, &website_domain, &website_template).await {
        Ok(generated) => generated,
        Err(e) => {
            let _ = delete(env_file_root, &admin_domain).await;
            return Err(e);
        }
    };

    Ok(GeneratedPair { admin, website })
}

/// Loads `domain`'s file, replaces matching keys from `partial`, appends missing ones,
/// and refreshes `DATABASE_URL` if any of the seven database inputs changed.
pub async fn update(
    env_file_root: &Path,
    domain: &str,
    partial: &BTreeMap<String, String>,
    db_inputs_changed: Option<&DatabaseInputs>,
) -> Result<(), EnvFileError> {
    let path = env_file_root.join(env_file_name(domain));
    let contents = fs::read_to_string(&path)
        .await
        .map_err(|e| EnvFileError::Io(e.to_string()))?;
    let mut entries = parse_env(&contents);
    for (key, value) in partial {
        if let Some(existing) = entries.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.clone();
        } else {
            entries.push((key.clone(), value.clone()));
        }
    }
    if let Some(db) = db_inputs_changed {
        let url = render_database_url(db);
        if let Some(existing) = entries.iter_mut().find(|(k, _)| k == "DATABASE_URL") {
            existing.1 = url;
        } else {
            entries.push(("DATABASE_URL".to_string(), url));
        }
    }
    atomic_write(&path, &serialize_lines(&entries)).await
}

/// Reads and parses `domain`'s env file into a key/value map for request-scoped
/// application by the Context Materialiser (C7 step 4).
pub async fn read_env(
    env_file_root: &Path,
    domain: &str,
) -> Result<HashMap<String, String>, EnvFileError> {
    let path = env_file_root.join(env_file_name(domain));
    let contents = fs::read_to_string(&path)
        .await
        .map_err(|e| EnvFileError::Io(e.to_string()))?;
    Ok(parse_env(&contents).into_iter().collect())
}

/// Removes `domain`'s env file; a missing file is treated as success.
pub async fn delete(env_file_root: &Path, domain: &str) -> Result<(), EnvFileError> {
    let path = env_file_root.join(env_file_name(domain));
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EnvFileError::Io(e.to_string())),
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvValidationReport {
    pub missing_required: Vec<String>,
    pub warnings: Vec<String>,
}

impl EnvValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Checks key presence, `DATABASE_URL` scheme validity, and secret-length warnings.
pub fn validate_contents(contents: &str) -> EnvValidationReport {
    let entries = parse_env(contents);
    let mut report = EnvValidationReport::default();
    for key in REQUIRED_KEYS {
        if !entries.iter().any(|(k, _)| k == key) {
            report.missing_required.push(key.to_string());
        }
    }
    if let Some((_, url)) = entries.iter().find(|(k, _)| k == "DATABASE_URL")
        && !["mysql://", "postgresql://", "sqlite://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
    {
        report
            .warnings
            .push("DATABASE_URL does not start with a known scheme".to_string());
    }
    for key in ["JWT_SECRET", "ENCRYPTION_KEY", "SESSION_SECRET"] {
        if let Some((_, v)) = entries.iter().find(|(k, _)| k == key)
            && v.len() < 32
        {
            report
                .warnings
                .push(format!("{key} is shorter than the recommended 32 characters"));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_name_strips_dots() {
        assert_eq!(
            env_file_name("hirayadmin.whitecodetech.com"),
            ".env.hirayadminwhitecodetechcom"
        );
    }

    #[test]
    fn parse_env_strips_quotes_and_comments() {
        let contents = "# a comment\nFOO=\"bar\"\nBAZ=qux\n\nEMPTY_SKIPPED\n";
        let parsed = parse_env(contents);
        assert_eq!(parsed[0], ("FOO".to_string(), "bar".to_string()));
        assert_eq!(parsed[1], ("BAZ".to_string(), "qux".to_string()));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn validate_contents_flags_missing_required_keys() {
        let report = validate_contents("FOO=bar\n");
        assert!(!report.is_valid());
        assert!(report.missing_required.contains(&"DATABASE_URL".to_string()));
    }

    #[test]
    fn validate_contents_accepts_full_file() {
        let contents = "DATABASE_URL=postgresql://u:p@h:5432/d\nTENANT_ID=acme\nJWT_SECRET=abcdefghijklmnopqrstuvwxyz012345\n";
        let report = validate_contents(contents);
        assert!(report.is_valid());
    }

    #[tokio::test]
    async fn generate_pair_creates_distinct_admin_and_website_files() {
        let dir = std::env::temp_dir().join(format!("tgw-envfile-{}", Uuid::new_v4()));
        let template = EnvTemplate {
            tenant_id: "acme".to_string(),
            tenant_name: "Acme".to_string(),
            database: DatabaseInputs {
                host: Some("db".to_string()),
                port: Some("5432".to_string()),
                name: None,
                user: Some("acme".to_string()),
                password: Some("secret".to_string()),
                charset: None,
                scheme: None,
            },
            extra: BTreeMap::new(),
        };
        let pair = generate_pair(&dir, "example.com", "acme", &template)
            .await
            .unwrap();
        assert_eq!(pair.admin.domain, "acmeadmin.example.com");
        assert_eq!(pair.website.domain, "acme.example.com");
        assert!(pair.admin.database_url.ends_with("/acme_admin_cms"));
        assert!(pair.website.database_url.ends_with("/acme_cms"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn generate_then_parse_round_trips_required_keys() {
        let dir = std::env::temp_dir().join(format!("tgw-envfile-{}", Uuid::new_v4()));
        let template = EnvTemplate {
            tenant_id: "acme".to_string(),
            tenant_name: "Acme".to_string(),
            database: DatabaseInputs {
                host: Some("db".to_string()),
                port: Some("5432".to_string()),
                name: Some("acme_cms".to_string()),
                user: Some("acme".to_string()),
                password: Some("secret".to_string()),
                charset: None,
                scheme: None,
            },
            extra: BTreeMap::new(),
        };
        let generated = generate(&dir, "acme.example.com", &template).await.unwrap();
        let contents = fs::read_to_string(&generated.env_path).await.unwrap();
        let report = validate_contents(&contents);
        assert!(report.is_valid(), "{:?}", report);
        let _ = std::fs::remove_dir_all(dir);
    }
}
