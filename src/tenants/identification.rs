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
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::tenants::model::TenantDescriptor;

/// Labels that never resolve as a tenant subdomain, regardless of how many
/// dot-separated hosts precede them.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "app", "mail", "ftp"];

/// Paths that skip identification entirely, independent of any configured
/// additional skip list.
pub const DEFAULT_BYPASS_PATHS: &[&str] = &[
    "/api/health",
    "/api/system",
    "/api/admin/tenants",
    "/_next",
    "/favicon.ico",
    "/robots.txt",
    "/sitemap.xml",
];

static TENANT_ID_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,50}$").expect("static regex"));

static PATH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/tenant/([^/]+)").expect("static regex"));

/// Which of the six ordered strategies produced a resolution, surfaced as the
/// `X-Tenant-Method` response annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationMethod {
    CustomDomain,
    Subdomain,
    Header,
    BearerToken,
    PathPrefix,
    QueryParameter,
}

impl IdentificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentificationMethod::CustomDomain => "custom-domain",
            IdentificationMethod::Subdomain => "subdomain",
            IdentificationMethod::Header => "header",
            IdentificationMethod::BearerToken => "bearer-token",
            IdentificationMethod::PathPrefix => "path-prefix",
            IdentificationMethod::QueryParameter => "query-parameter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub tenant_id: String,
    pub method: IdentificationMethod,
}

/// Everything the pipeline needs to read off an inbound request; host/path/query
/// come from axum extractors, `known_domains` is the live snapshot of active
/// custom domains (C2), and `jwt_secret` backs the bearer-token strategy.
pub struct IdentificationRequest<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub tenant_id_header: Option<&'a str>,
    pub authorization_header: Option<&'a str>,
    pub known_domains: &'a [(&'a str, &'a str)],
    pub jwt_secret: &'a [u8],
    pub extra_bypass_paths: &'a [String],
}

#[derive(Debug, Deserialize)]
struct TenantBearerClaims {
    #[serde(rename = "tenantId")]
    tenant_id: Option<String>,
    tenant: Option<String>,
}

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// True when `path` matches a bypass prefix, built-in or configured.
pub fn is_bypassed(path: &str, extra: &[String]) -> bool {
    if path.starts_with("/.well-known/") {
        return true;
    }
    DEFAULT_BYPASS_PATHS
        .iter()
        .any(|bypass| path == *bypass || path.starts_with(&format!("{bypass}/")))
        || extra
            .iter()
            .any(|bypass| path == bypass || path.starts_with(&format!("{bypass}/")))
}

fn custom_domain(req: &IdentificationRequest) -> Option<Identification> {
    let host = strip_port(req.host);
    req.known_domains
        .iter()
        .find(|(domain, _)| *domain == host)
        .map(|(_, tenant_id)| Identification {
            tenant_id: tenant_id.to_string(),
            method: IdentificationMethod::CustomDomain,
        })
}

fn subdomain(req: &IdentificationRequest) -> Option<Identification> {
    let host = strip_port(req.host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 {
        return None;
    }
    let label = labels[0];
    if RESERVED_SUBDOMAINS.contains(&label) {
        return None;
    }
    Some(Identification {
        tenant_id: label.to_string(),
        method: IdentificationMethod::Subdomain,
    })
}

fn custom_header(req: &IdentificationRequest) -> Option<Identification> {
    let value = req.tenant_id_header?;
    if TENANT_ID_FORMAT.is_match(value) {
        Some(Identification {
            tenant_id: value.to_string(),
            method: IdentificationMethod::Header,
        })
    } else {
        None
    }
}

fn bearer_token(req: &IdentificationRequest) -> Option<Identification> {
    let header = req.authorization_header?;
    let token = header.strip_prefix("Bearer ")?;
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    let decoding_key = DecodingKey::from_secret(req.jwt_secret);
    let decoded = decode::<TenantBearerClaims>(token, &decoding_key, &validation).ok()?;
    let candidate = decoded
        .claims
        .tenant_id
        .or(decoded.claims.tenant)?;
    if TENANT_ID_FORMAT.is_match(&candidate) {
        Some(Identification {
            tenant_id: candidate,
            method: IdentificationMethod::BearerToken,
        })
    } else {
        None
    }
}

fn path_prefix(req: &IdentificationRequest) -> Option<Identification> {
    let captures = PATH_PREFIX.captures(req.path)?;
    let candidate = captures.get(1)?.as_str().to_string();
    Some(Identification {
        tenant_id: candidate,
        method: IdentificationMethod::PathPrefix,
    })
}

fn query_parameter(req: &IdentificationRequest) -> Option<Identification> {
    for pair in req.query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        let value = parts.next()?;
        if key == "tenant" || key == "t" {
            return Some(Identification {
                tenant_id: value.to_string(),
                method: IdentificationMethod::QueryParameter,
            });
        }
    }
    None
}

/// Runs the six strategies in order, stateless and side-effect-free, returning
/// the first non-nil resolution.
pub fn identify(req: &IdentificationRequest) -> Option<Identification> {
    custom_domain(req)
        .or_else(|| subdomain(req))
        .or_else(|| custom_header(req))
        .or_else(|| bearer_token(req))
        .or_else(|| path_prefix(req))
        .or_else(|| query_parameter(req))
}

pub fn domain_pairs(descriptors: &[TenantDescriptor]) -> Vec<(&str, &str)> {
    descriptors
        .iter()
        .filter_map(|d| d.domain.as_deref().map(|domain| (domain, d.tenant_id.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_req<'a>(
        host: &'a str,
        path: &'a str,
        known_domains: &'a [(&'a str, &'a str)],
    ) -> IdentificationRequest<'a> {
        IdentificationRequest {
            host,
            path,
            query: "",
            tenant_id_header: None,
            authorization_header: None,
            known_domains,
            jwt_secret: b"secret",
            extra_bypass_paths: &[],
        }
    }

    #[test]
    fn custom_domain_wins_first() {
        let domains = [("shop.acme.com", "acme")];
        let req = base_req("shop.acme.com", "/", &domains);
        let result = identify(&req).unwrap();
        assert_eq!(result.tenant_id, "acme");
        assert_eq!(result.method, IdentificationMethod::CustomDomain);
    }

    #[test]
    fn subdomain_is_used_when_not_reserved() {
        let req = base_req("acme.example.com", "/", &[]);
        let result = identify(&req).unwrap();
        assert_eq!(result.tenant_id, "acme");
        assert_eq!(result.method, IdentificationMethod::Subdomain);
    }

    #[test]
    fn reserved_subdomain_label_is_skipped() {
        let req = base_req("www.example.com", "/", &[]);
        assert!(identify(&req).is_none());
    }

    #[test]
    fn header_strategy_validates_format() {
        let mut req = base_req("example.com", "/", &[]);
        req.tenant_id_header = Some("not valid!!");
        assert!(identify(&req).is_none());
        req.tenant_id_header = Some("acme-123");
        let result = identify(&req).unwrap();
        assert_eq!(result.method, IdentificationMethod::Header);
    }

    #[test]
    fn path_prefix_captures_segment() {
        let req = base_req("example.com", "/tenant/acme/widgets", &[]);
        let result = identify(&req).unwrap();
        assert_eq!(result.tenant_id, "acme");
        assert_eq!(result.method, IdentificationMethod::PathPrefix);
    }

    #[test]
    fn query_parameter_is_last_resort() {
        let mut req = base_req("example.com", "/", &[]);
        req.query = "t=acme";
        let result = identify(&req).unwrap();
        assert_eq!(result.tenant_id, "acme");
        assert_eq!(result.method, IdentificationMethod::QueryParameter);
    }

    #[test]
    fn no_strategy_matches_returns_none() {
        let req = base_req("example.com", "/", &[]);
        assert!(identify(&req).is_none());
    }

    #[test]
    fn bypass_paths_include_well_known_wildcard() {
        assert!(is_bypassed("/.well-known/acme-challenge/x", &[]));
        assert!(is_bypassed("/api/health", &[]));
        assert!(!is_bypassed("/tenant/acme/widgets", &[]));
    }

    #[test]
    fn extra_bypass_paths_are_merged() {
        let extra = vec!["/custom/status".to_string()];
        assert!(is_bypassed("/custom/status", &extra));
    }
}
