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
use crate::common::types::hex_color::HexColor;
use crate::common::types::subdomain::Subdomain;
use crate::common::types::value_object::{ValueObject, ValueObjectable};
use crate::tenants::model::{
    DatabaseDescriptor, DatabaseKind, SecurityTriple, StorageDescriptor, StorageKind,
    TenantCreateRequest, TenantDescriptor,
};
use regex::Regex;
use serde::Serialize;

/// One field-level validation failure, as required by §4.1's `{field, message}` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for e in &self.errors {
            writeln!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }
    fn check_value_object<T: ValueObjectable + Clone>(&mut self, field: &str, value: &T) {
        if let Err(message) = ValueObject::new(value.clone()) {
            self.push(field, message);
        }
    }
    fn into_report(self) -> ValidationReport {
        ValidationReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
        }
    }
}

fn bounded_len(field: &str, value: &str, min: usize, max: usize, c: &mut Collector) {
    if value.trim().is_empty() {
        c.push(field, format!("{field} must not be blank"));
    } else if !(min..=max).contains(&value.chars().count()) {
        c.push(field, format!("{field} must be {min}-{max} characters long"));
    }
}

fn check_database(db: &DatabaseDescriptor, c: &mut Collector) {
    if !(1..=65535).contains(&db.port) {
        c.push("database.port", "port must be between 1 and 65535");
    }
    if !(1..=100).contains(&db.connection_limit) {
        c.push(
            "database.connectionLimit",
            "connectionLimit must be between 1 and 100",
        );
    }
    bounded_len("database.host", &db.host, 1, 255, c);
    bounded_len("database.database", &db.database, 1, 100, c);
    bounded_len("database.username", &db.username, 1, 100, c);
    if db.password.trim().is_empty() {
        c.push("database.password", "password must not be blank");
    }
    if matches!(db.kind, DatabaseKind::Sqlite) && db.database.trim().is_empty() {
        c.push("database.database", "sqlite requires a file path");
    }
}

fn check_limits(limits_ok: bool, c: &mut Collector) {
    if !limits_ok {
        c.push("limits", "one or more usage limits are out of bounds");
    }
}

fn check_usage_limits(
    limits: &crate::tenants::model::UsageLimits,
    c: &mut Collector,
) {
    let bounds: [(u32, u32, u32, &str); 9] = [
        (limits.max_users, 1, 10_000, "limits.maxUsers"),
        (limits.max_pages, 1, 100_000, "limits.maxPages"),
        (limits.max_posts, 1, 1_000_000, "limits.maxPosts"),
        (limits.max_storage_mb, 100, 100_000, "limits.maxStorageMB"),
        (limits.max_api_calls, 1_000, 10_000_000, "limits.maxApiCalls"),
        (limits.max_file_size_mb, 1, 1_000, "limits.maxFileSizeMB"),
        (limits.max_menus, 1, 100, "limits.maxMenus"),
        (limits.max_galleries, 1, 1_000, "limits.maxGalleries"),
        (limits.max_sliders, 1, 100, "limits.maxSliders"),
    ];
    let mut all_ok = true;
    for (value, min, max, field) in bounds {
        if !(min..=max).contains(&value) {
            all_ok = false;
            c.push(field, format!("{field} must be between {min} and {max}"));
        }
    }
    check_limits(all_ok, c);
}

fn check_branding(branding: &crate::tenants::model::Branding, c: &mut Collector) {
    if let Some(color) = &branding.primary_color {
        c.check_value_object("branding.primaryColor", &HexColor(color.clone()));
    }
    if let Some(color) = &branding.secondary_color {
        c.check_value_object("branding.secondaryColor", &HexColor(color.clone()));
    }
    if let Some(tagline) = &branding.tagline {
        if tagline.chars().count() > 200 {
            c.push("branding.tagline", "tagline must be at most 200 characters");
        }
    }
}

fn check_security(security: &SecurityTriple, c: &mut Collector) {
    for (field, secret) in [
        ("security.jwtSecret", &security.jwt_secret),
        ("security.encryptionKey", &security.encryption_key),
        ("security.sessionSecret", &security.session_secret),
    ] {
        if secret.len() < 32 {
            c.push(field, format!("{field} must be at least 32 characters"));
        }
    }
    if !(1..=10_000).contains(&security.rate_limit_requests) {
        c.push(
            "security.rateLimitRequests",
            "rateLimitRequests must be between 1 and 10000",
        );
    }
}

fn check_storage(storage: &StorageDescriptor, c: &mut Collector) {
    match storage.kind {
        StorageKind::Local => {
            if storage.base_path.as_deref().unwrap_or("").trim().is_empty() {
                c.push("storage.basePath", "basePath is required for local storage");
            }
        }
        StorageKind::S3 | StorageKind::Gcs => {
            for (field, value) in [
                ("storage.bucket", &storage.bucket),
                ("storage.accessKey", &storage.access_key),
                ("storage.secretKey", &storage.secret_key),
            ] {
                if value.as_deref().unwrap_or("").trim().is_empty() {
                    c.push(field, format!("{field} is required for this storage type"));
                }
            }
        }
        StorageKind::Cloudinary => {}
    }
}

fn check_smtp(smtp: &crate::tenants::model::SmtpSettings, c: &mut Collector) {
    if !smtp.enabled {
        return;
    }
    for (field, value) in [
        ("smtp.host", smtp.host.as_str()),
        ("smtp.username", smtp.username.as_str()),
        ("smtp.password", smtp.password.as_str()),
    ] {
        if value.trim().is_empty() {
            c.push(field, format!("{field} must not be blank when smtp is enabled"));
        }
    }
    if let Some(from) = &smtp.from_email
        && from.parse::<crate::common::types::email::Email>().is_err()
    {
        c.push("smtp.fromEmail", "fromEmail is not a well-formed email address");
    }
}

fn domain_label_regex() -> Regex {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$").unwrap()
}

fn check_domain(domain: &Option<String>, c: &mut Collector) {
    if let Some(domain) = domain
        && !domain_label_regex().is_match(domain)
    {
        c.push("domain", "domain is not a valid DNS name");
    }
}

fn check_admin_email(contact: &Option<crate::tenants::model::AdminContact>, c: &mut Collector) {
    if let Some(contact) = contact
        && contact.email.parse::<crate::common::types::email::Email>().is_err()
    {
        c.push("adminContact.email", "email is not a well-formed email address");
    }
}

/// Validates a full descriptor, e.g. before accepting an admin `update`.
pub fn validate_descriptor(descriptor: &TenantDescriptor) -> ValidationReport {
    let mut c = Collector::new();
    bounded_len("name", &descriptor.name, 2, 100, &mut c);
    c.check_value_object("subdomain", &Subdomain(descriptor.subdomain.clone()));
    check_domain(&descriptor.domain, &mut c);
    check_database(&descriptor.database, &mut c);
    check_usage_limits(&descriptor.limits, &mut c);
    check_branding(&descriptor.branding, &mut c);
    check_security(&descriptor.security, &mut c);
    check_storage(&descriptor.storage, &mut c);
    if let Some(smtp) = &descriptor.smtp {
        check_smtp(smtp, &mut c);
    }
    check_admin_email(&descriptor.admin_contact, &mut c);
    c.into_report()
}

/// Validates a create-request before C8 assembles a full descriptor from it.
pub fn validate_create_request(request: &TenantCreateRequest) -> ValidationReport {
    let mut c = Collector::new();
    bounded_len("name", &request.name, 2, 100, &mut c);
    c.check_value_object("subdomain", &Subdomain(request.subdomain.clone()));
    check_domain(&request.domain, &mut c);
    check_database(&request.database, &mut c);
    if let Some(branding) = &request.branding {
        check_branding(branding, &mut c);
    }
    if let Some(storage) = &request.storage {
        check_storage(storage, &mut c);
    }
    if let Some(smtp) = &request.smtp {
        check_smtp(smtp, &mut c);
    }
    check_admin_email(&request.admin_contact, &mut c);
    c.into_report()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenants::model::{
        Branding, DatabaseDescriptor, DatabaseKind, SeoSettings, StorageDescriptor, StorageKind,
    };

    fn valid_request() -> TenantCreateRequest {
        TenantCreateRequest {
            name: "Acme Inc".to_string(),
            subdomain: "acme".to_string(),
            domain: None,
            database: DatabaseDescriptor {
                kind: DatabaseKind::Postgresql,
                host: "db.internal".to_string(),
                port: 5432,
                database: "acme_cms".to_string(),
                username: "acme".to_string(),
                password: "secret".to_string(),
                ssl: true,
                connection_limit: 10,
            },
            tier: None,
            features: None,
            branding: Some(Branding {
                primary_color: Some("#112233".to_string()),
                ..Default::default()
            }),
            seo: Some(SeoSettings::default()),
            storage: Some(StorageDescriptor {
                kind: StorageKind::Local,
                base_path: Some("/data/acme".to_string()),
                bucket: None,
                access_key: None,
                secret_key: None,
                region: None,
            }),
            smtp: None,
            environment: None,
            admin_contact: None,
        }
    }

    #[test]
    fn accepts_a_valid_request() {
        let report = validate_create_request(&valid_request());
        assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn rejects_reserved_subdomain() {
        let mut req = valid_request();
        req.subdomain = "admin".to_string();
        let report = validate_create_request(&req);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.field == "subdomain"));
    }

    #[test]
    fn rejects_bad_port() {
        let mut req = valid_request();
        req.database.port = 0;
        let report = validate_create_request(&req);
        assert!(report.errors.iter().any(|e| e.field == "database.port"));
    }

    #[test]
    fn rejects_s3_storage_without_bucket() {
        let mut req = valid_request();
        req.storage = Some(StorageDescriptor {
            kind: StorageKind::S3,
            base_path: None,
            bucket: None,
            access_key: None,
            secret_key: None,
            region: None,
        });
        let report = validate_create_request(&req);
        assert!(report.errors.iter().any(|e| e.field == "storage.bucket"));
    }

    #[test]
    fn rejects_short_security_secrets() {
        let descriptor_errors = check_security_standalone("short", "short", "short");
        assert_eq!(descriptor_errors.len(), 3);
    }

    fn check_security_standalone(jwt: &str, enc: &str, session: &str) -> Vec<ValidationError> {
        let mut c = Collector::new();
        check_security(
            &SecurityTriple {
                jwt_secret: jwt.to_string(),
                encryption_key: enc.to_string(),
                session_secret: session.to_string(),
                api_key: None,
                cors_allow_list: vec![],
                rate_limit_requests: 100,
            },
            &mut c,
        );
        c.errors
    }
}
