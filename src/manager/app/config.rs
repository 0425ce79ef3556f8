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
use serde::Deserialize;
use sqlx::postgres::PgSslMode;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// The main application configuration model, deserialized from `config/default`
/// (plus environment overrides) at startup. Central hub for server, control-plane
/// database, tenant registry, pool, rate-limit and operator-auth settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    server: ServerConfig,
    main_database: BasicDatabaseConfig,
    tenant_registry: TenantRegistryConfig,
    pool: PoolConfig,
    rate_limit: RateLimitConfig,
    auth: AuthConfig,
    mail: Option<MailConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

pub type BasicDatabaseConfig = DatabaseConfig<String, u16, String, String, String, u32>;

pub trait DatabaseUrlProvider {
    fn url(&self) -> String;
}

pub trait DatabasePoolSizeProvider {
    type MaxPoolSizeType;
    fn max_pool_size(&self) -> Self::MaxPoolSizeType;
}

pub trait DatabasePgSslModeProvider {
    fn pg_ssl_mode(&self) -> Result<PgSslMode, String>;
}

/// A generic configuration structure for database connection settings, used both for
/// the control-plane database and, via [`crate::tenants::model::DatabaseDescriptor`],
/// the per-tenant database target recorded in a tenant's descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
{
    pub host: HostType,
    pub port: PortType,
    pub username: UserType,
    pub password: PasswordType,
    pub database: DatabaseType,
    pub max_pool_size: Option<MaxPoolSizeType>,
    pub ssl_mode: Option<String>,
}

impl<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
    DatabasePgSslModeProvider
    for DatabaseConfig<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
{
    fn pg_ssl_mode(&self) -> Result<PgSslMode, String> {
        if let Some(ssl_mode) = &self.ssl_mode {
            Ok(PgSslMode::from_str(ssl_mode).map_err(|_| "Invalid SSL mode".to_string())?)
        } else {
            Ok(PgSslMode::VerifyFull)
        }
    }
}

impl<HostType, PortType, UserType, PasswordType, DatabaseType> DatabasePoolSizeProvider
    for DatabaseConfig<HostType, PortType, UserType, PasswordType, DatabaseType, u32>
{
    type MaxPoolSizeType = u32;

    fn max_pool_size(&self) -> u32 {
        self.max_pool_size.unwrap_or(3)
    }
}

impl<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType> DatabaseUrlProvider
    for DatabaseConfig<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
where
    HostType: Display,
    PortType: Display,
    UserType: Display,
    PasswordType: Display,
    DatabaseType: Display,
    MaxPoolSizeType: Display,
{
    fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// Where the tenant registry keeps its on-disk state: the TOML config store and the
/// generated `.env` files, plus how long a resolved tenant may be cached in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRegistryConfig {
    config_root: String,
    env_file_root: String,
    cache_ttl_secs: u64,
}

impl TenantRegistryConfig {
    pub fn config_root(&self) -> &str {
        &self.config_root
    }
    pub fn env_file_root(&self) -> &str {
        &self.env_file_root
    }
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Defaults applied by the pool manager when a tenant's own `DatabaseDescriptor`
/// leaves a cap unset, and the idle-reap window for connections to inactive tenants.
/// `total_connection_cap` bounds live pool *entries* across all tenants;
/// `per_tenant_cap` bounds how many of those entries a single tenant id may hold
/// at once (a tenant only ever has one entry today, but the cap is enforced per
/// tenant id rather than globally so a future multi-pool-per-tenant scheme stays
/// within the same budget).
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    default_max_connections: u32,
    idle_timeout_secs: u64,
    total_connection_cap: u32,
    #[serde(default = "default_per_tenant_cap")]
    per_tenant_cap: u32,
}

fn default_per_tenant_cap() -> u32 {
    5
}

impl PoolConfig {
    pub fn default_max_connections(&self) -> u32 {
        self.default_max_connections
    }
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
    pub fn total_connection_cap(&self) -> u32 {
        self.total_connection_cap
    }
    pub fn per_tenant_cap(&self) -> u32 {
        self.per_tenant_cap
    }
}

/// Default per-tenant request budget used by the security gate when a tenant's own
/// usage limits don't override it.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    requests_per_minute: u32,
    burst: u32,
}

impl RateLimitConfig {
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
    pub fn burst(&self) -> u32 {
        self.burst
    }
}

/// The named resource tiers a tenant can be assigned, each carrying its own
/// connection cap and request-rate budget. Tenants may still override either value
/// individually in their own descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierPreset {
    Starter,
    Professional,
    Enterprise,
}

impl TierPreset {
    pub fn max_connections(&self) -> u32 {
        match self {
            TierPreset::Starter => 3,
            TierPreset::Professional => 10,
            TierPreset::Enterprise => 25,
        }
    }
    pub fn requests_per_minute(&self) -> u32 {
        match self {
            TierPreset::Starter => 60,
            TierPreset::Professional => 300,
            TierPreset::Enterprise => 1200,
        }
    }
}

/// Authentication settings for the operator (administrative) identity: the JWT
/// signing secret, issuer/audience pair and access-token lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    jwt_secret: String,
    jwt_issuer: String,
    jwt_audience: String,
    jwt_expiration_mins: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    smtp_host: String,
    smtp_user: String,
    smtp_passwd: String,
    default_from: String,
    default_from_name: String,
    default_notification_email: String,
}

impl MailConfig {
    pub fn smtp_host(&self) -> &str {
        &self.smtp_host
    }
    pub fn smtp_user(&self) -> &str {
        &self.smtp_user
    }
    pub fn smtp_passwd(&self) -> &str {
        &self.smtp_passwd
    }
    pub fn default_from(&self) -> &str {
        &self.default_from
    }
    pub fn default_from_name(&self) -> &str {
        &self.default_from_name
    }
    pub fn default_notification_email(&self) -> &str {
        &self.default_notification_email
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(true))
            .add_source(config::Environment::with_prefix("TENANCY_GATEWAY").separator("__"));
        builder.build()?.try_deserialize()
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }
    pub fn main_database(&self) -> &BasicDatabaseConfig {
        &self.main_database
    }
    pub fn tenant_registry(&self) -> &TenantRegistryConfig {
        &self.tenant_registry
    }
    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }
    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
    pub fn mail(&self) -> Option<&MailConfig> {
        self.mail.as_ref()
    }
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl AuthConfig {
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
    pub fn jwt_issuer(&self) -> &str {
        &self.jwt_issuer
    }
    pub fn jwt_audience(&self) -> &str {
        &self.jwt_audience
    }
    pub fn jwt_expiration_mins(&self) -> u64 {
        self.jwt_expiration_mins
    }
}

pub struct MailConfigBuilder {
    smtp_host: Option<String>,
    smtp_user: Option<String>,
    smtp_passwd: Option<String>,
    default_from: Option<String>,
    default_from_name: Option<String>,
    default_notification_email: Option<String>,
}

impl MailConfigBuilder {
    pub fn new() -> Self {
        MailConfigBuilder {
            smtp_host: None,
            smtp_user: None,
            smtp_passwd: None,
            default_from: None,
            default_from_name: None,
            default_notification_email: None,
        }
    }
    pub fn smtp_host(mut self, smtp_host: String) -> Self {
        self.smtp_host = Some(smtp_host);
        self
    }
    pub fn smtp_user(mut self, smtp_user: String) -> Self {
        self.smtp_user = Some(smtp_user);
        self
    }
    pub fn smtp_passwd(mut self, smtp_passwd: String) -> Self {
        self.smtp_passwd = Some(smtp_passwd);
        self
    }
    pub fn default_from(mut self, default_from: String) -> Self {
        self.default_from = Some(default_from);
        self
    }
    pub fn default_from_name(mut self, default_from_name: String) -> Self {
        self.default_from_name = Some(default_from_name);
        self
    }
    pub fn default_notification_email(mut self, default_notification_email: String) -> Self {
        self.default_notification_email = Some(default_notification_email);
        self
    }
    pub fn build(self) -> Result<MailConfig, String> {
        Ok(MailConfig {
            smtp_host: self.smtp_host.ok_or("smtp_host is required")?,
            smtp_user: self.smtp_user.ok_or("smtp_user is required")?,
            smtp_passwd: self.smtp_passwd.ok_or("smtp_passwd is required")?,
            default_from: self.default_from.ok_or("default_from is required")?,
            default_from_name: self
                .default_from_name
                .ok_or("default_from_name is required")?,
            default_notification_email: self
                .default_notification_email
                .ok_or("default_notification_email is required")?,
        })
    }
}

#[cfg(not(test))]
impl Default for MailConfigBuilder {
    fn default() -> Self {
        MailConfigBuilder::new()
    }
}

/// Builder for [`AppConfig`], following the same chained-setter shape as the other
/// builders in this module.
pub struct AppConfigBuilder {
    server: Option<ServerConfig>,
    main_database: Option<BasicDatabaseConfig>,
    tenant_registry: Option<TenantRegistryConfig>,
    pool: Option<PoolConfig>,
    rate_limit: Option<RateLimitConfig>,
    auth: Option<AuthConfig>,
    mail: Option<MailConfig>,
}

impl AppConfigBuilder {
    pub fn new() -> Self {
        Self {
            server: None,
            main_database: None,
            tenant_registry: None,
            pool: None,
            rate_limit: None,
            auth: None,
            mail: None,
        }
    }
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }
    pub fn main_database(mut self, main_database: BasicDatabaseConfig) -> Self {
        self.main_database = Some(main_database);
        self
    }
    pub fn tenant_registry(mut self, tenant_registry: TenantRegistryConfig) -> Self {
        self.tenant_registry = Some(tenant_registry);
        self
    }
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }
    pub fn mail(mut self, mail: MailConfig) -> Self {
        self.mail = Some(mail);
        self
    }
    pub fn build(self) -> Result<AppConfig, String> {
        Ok(AppConfig {
            server: self.server.ok_or("server is required")?,
            main_database: self.main_database.ok_or("main_database is required")?,
            tenant_registry: self
                .tenant_registry
                .ok_or("tenant_registry is required")?,
            pool: self.pool.ok_or("pool is required")?,
            rate_limit: self.rate_limit.ok_or("rate_limit is required")?,
            auth: self.auth.ok_or("auth is required")?,
            mail: self.mail,
        })
    }
}

#[cfg(not(test))]
impl Default for AppConfigBuilder {
    fn default() -> Self {
        AppConfigBuilder::new()
    }
}

pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            port: None,
        }
    }
    pub fn host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
    pub fn build(self) -> Result<ServerConfig, String> {
        Ok(ServerConfig {
            host: self.host.ok_or("host is required".to_string())?,
            port: self.port.ok_or("port is required".to_string())?,
        })
    }
}

#[cfg(not(test))]
impl Default for ServerConfigBuilder {
    fn default() -> Self {
        ServerConfigBuilder::new()
    }
}

pub struct DatabaseConfigBuilder<
    HostType,
    PortType,
    UserType,
    PasswordType,
    DatabaseType,
    MaxPoolSizeType,
> {
    pub host: Option<HostType>,
    pub port: Option<PortType>,
    pub username: Option<UserType>,
    pub password: Option<PasswordType>,
    pub database: Option<DatabaseType>,
    pub max_pool_size: Option<MaxPoolSizeType>,
    pub ssl_mode: Option<String>,
}

impl<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
    DatabaseConfigBuilder<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>
{
    pub fn new() -> Self {
        DatabaseConfigBuilder {
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            max_pool_size: None,
            ssl_mode: None,
        }
    }
    pub fn host(mut self, host: HostType) -> Self {
        self.host = Some(host);
        self
    }
    pub fn port(mut self, port: PortType) -> Self {
        self.port = Some(port);
        self
    }
    pub fn username(mut self, username: UserType) -> Self {
        self.username = Some(username);
        self
    }
    pub fn password(mut self, password: PasswordType) -> Self {
        self.password = Some(password);
        self
    }
    pub fn database(mut self, database: DatabaseType) -> Self {
        self.database = Some(database);
        self
    }
    pub fn max_pool_size(mut self, max_pool_size: MaxPoolSizeType) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }
    pub fn ssl_mode(mut self, ssl_mode: String) -> Self {
        self.ssl_mode = Some(ssl_mode);
        self
    }
    pub fn build(
        self,
    ) -> Result<
        DatabaseConfig<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType>,
        String,
    > {
        Ok(DatabaseConfig {
            host: self.host.ok_or("host is required")?,
            port: self.port.ok_or("port is required")?,
            username: self.username.ok_or("username is required")?,
            password: self.password.ok_or("password is required")?,
            database: self.database.ok_or("database is required")?,
            max_pool_size: self.max_pool_size,
            ssl_mode: self.ssl_mode,
        })
    }
}

#[cfg(not(test))]
impl<HostType, PortType, UserType, PasswordType, DatabaseType, MaxPoolSizeType> Default
    for DatabaseConfigBuilder<
        HostType,
        PortType,
        UserType,
        PasswordType,
        DatabaseType,
        MaxPoolSizeType,
    >
{
    fn default() -> Self {
        DatabaseConfigBuilder::new()
    }
}

pub struct AuthConfigBuilder {
    jwt_secret: Option<String>,
    jwt_issuer: Option<String>,
    jwt_audience: Option<String>,
    jwt_expiration_mins: Option<u64>,
}

impl AuthConfigBuilder {
    pub fn new() -> Self {
        AuthConfigBuilder {
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_expiration_mins: None,
        }
    }
    pub fn jwt_secret(mut self, jwt_secret: String) -> Self {
        self.jwt_secret = Some(jwt_secret);
        self
    }
    pub fn jwt_issuer(mut self, jwt_issuer: String) -> Self {
        self.jwt_issuer = Some(jwt_issuer);
        self
    }
    pub fn jwt_audience(mut self, jwt_audience: String) -> Self {
        self.jwt_audience = Some(jwt_audience);
        self
    }
    pub fn jwt_expiration_mins(mut self, jwt_expiration_mins: u64) -> Self {
        self.jwt_expiration_mins = Some(jwt_expiration_mins);
        self
    }
    pub fn build(self) -> Result<AuthConfig, String> {
        Ok(AuthConfig {
            jwt_secret: self.jwt_secret.ok_or("jwt_secret is required")?,
            jwt_issuer: self.jwt_issuer.ok_or("jwt_issuer is required")?,
            jwt_audience: self.jwt_audience.ok_or("jwt_audience is required")?,
            jwt_expiration_mins: self
                .jwt_expiration_mins
                .ok_or("jwt_expiration_mins is required")?,
        })
    }
}

#[cfg(not(test))]
impl Default for AuthConfigBuilder {
    fn default() -> Self {
        AuthConfigBuilder::new()
    }
}

pub struct TenantRegistryConfigBuilder {
    config_root: Option<String>,
    env_file_root: Option<String>,
    cache_ttl_secs: Option<u64>,
}

impl TenantRegistryConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_root: None,
            env_file_root: None,
            cache_ttl_secs: None,
        }
    }
    pub fn config_root(mut self, config_root: String) -> Self {
        self.config_root = Some(config_root);
        self
    }
    pub fn env_file_root(mut self, env_file_root: String) -> Self {
        self.env_file_root = Some(env_file_root);
        self
    }
    pub fn cache_ttl_secs(mut self, cache_ttl_secs: u64) -> Self {
        self.cache_ttl_secs = Some(cache_ttl_secs);
        self
    }
    pub fn build(self) -> Result<TenantRegistryConfig, String> {
        Ok(TenantRegistryConfig {
            config_root: self.config_root.ok_or("config_root is required")?,
            env_file_root: self.env_file_root.ok_or("env_file_root is required")?,
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(60),
        })
    }
}

#[cfg(not(test))]
impl Default for TenantRegistryConfigBuilder {
    fn default() -> Self {
        TenantRegistryConfigBuilder::new()
    }
}

pub struct PoolConfigBuilder {
    default_max_connections: Option<u32>,
    idle_timeout_secs: Option<u64>,
    total_connection_cap: Option<u32>,
    per_tenant_cap: Option<u32>,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            default_max_connections: None,
            idle_timeout_secs: None,
            total_connection_cap: None,
            per_tenant_cap: None,
        }
    }
    pub fn default_max_connections(mut self, value: u32) -> Self {
        self.default_max_connections = Some(value);
        self
    }
    pub fn idle_timeout_secs(mut self, value: u64) -> Self {
        self.idle_timeout_secs = Some(value);
        self
    }
    pub fn total_connection_cap(mut self, value: u32) -> Self {
        self.total_connection_cap = Some(value);
        self
    }
    pub fn per_tenant_cap(mut self, value: u32) -> Self {
        self.per_tenant_cap = Some(value);
        self
    }
    pub fn build(self) -> Result<PoolConfig, String> {
        Ok(PoolConfig {
            default_max_connections: self.default_max_connections.unwrap_or(3),
            idle_timeout_secs: self.idle_timeout_secs.unwrap_or(300),
            total_connection_cap: self
                .total_connection_cap
                .ok_or("total_connection_cap is required")?,
            per_tenant_cap: self.per_tenant_cap.unwrap_or(5),
        })
    }
}

#[cfg(not(test))]
impl Default for PoolConfigBuilder {
    fn default() -> Self {
        PoolConfigBuilder::new()
    }
}

pub struct RateLimitConfigBuilder {
    requests_per_minute: Option<u32>,
    burst: Option<u32>,
}

impl RateLimitConfigBuilder {
    pub fn new() -> Self {
        Self {
            requests_per_minute: None,
            burst: None,
        }
    }
    pub fn requests_per_minute(mut self, value: u32) -> Self {
        self.requests_per_minute = Some(value);
        self
    }
    pub fn burst(mut self, value: u32) -> Self {
        self.burst = Some(value);
        self
    }
    pub fn build(self) -> Result<RateLimitConfig, String> {
        Ok(RateLimitConfig {
            requests_per_minute: self.requests_per_minute.unwrap_or(60),
            burst: self.burst.unwrap_or(10),
        })
    }
}

#[cfg(not(test))]
impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        RateLimitConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Default for AuthConfigBuilder {
        fn default() -> Self {
            AuthConfigBuilder {
                jwt_secret: Some("test_jwt_secret".to_string()),
                jwt_issuer: Some("http://localhost".to_string()),
                jwt_audience: Some("http://localhost".to_string()),
                jwt_expiration_mins: Some(60),
            }
        }
    }

    impl Default for DatabaseConfigBuilder<String, u16, String, String, String, u32> {
        fn default() -> Self {
            Self {
                host: Some(String::from("localhost")),
                port: Some(5432),
                username: Some(String::from("user")),
                password: Some(String::from("password")),
                database: Some(String::from("database")),
                max_pool_size: Some(5),
                ssl_mode: Some("prefer".to_string()),
            }
        }
    }

    impl Default for ServerConfigBuilder {
        fn default() -> Self {
            ServerConfigBuilder {
                host: Some("127.0.0.1".to_string()),
                port: Some(3000),
            }
        }
    }

    impl Default for MailConfigBuilder {
        fn default() -> Self {
            MailConfigBuilder {
                smtp_host: Some(String::from("localhost")),
                smtp_user: Some(String::from("noreply@example.com")),
                smtp_passwd: Some(String::from("secret")),
                default_from: Some(String::from("noreply@example.com")),
                default_from_name: Some(String::from("Example")),
                default_notification_email: Some(String::from("admin@example.com")),
            }
        }
    }

    impl Default for TenantRegistryConfigBuilder {
        fn default() -> Self {
            TenantRegistryConfigBuilder {
                config_root: Some("./tenants".to_string()),
                env_file_root: Some("./tenants/env".to_string()),
                cache_ttl_secs: Some(60),
            }
        }
    }

    impl Default for PoolConfigBuilder {
        fn default() -> Self {
            PoolConfigBuilder {
                default_max_connections: Some(3),
                idle_timeout_secs: Some(300),
                total_connection_cap: Some(200),
            }
        }
    }

    impl Default for RateLimitConfigBuilder {
        fn default() -> Self {
            RateLimitConfigBuilder {
                requests_per_minute: Some(60),
                burst: Some(10),
            }
        }
    }

    impl Default for AppConfigBuilder {
        fn default() -> Self {
            AppConfigBuilder {
                server: Some(ServerConfigBuilder::default().build().unwrap()),
                main_database: Some(DatabaseConfigBuilder::default().build().unwrap()),
                tenant_registry: Some(TenantRegistryConfigBuilder::default().build().unwrap()),
                pool: Some(PoolConfigBuilder::default().build().unwrap()),
                rate_limit: Some(RateLimitConfigBuilder::default().build().unwrap()),
                auth: Some(AuthConfigBuilder::default().build().unwrap()),
                mail: Some(MailConfigBuilder::default().build().unwrap()),
            }
        }
    }

    #[test]
    fn tier_preset_scales_with_tier() {
        assert!(TierPreset::Enterprise.max_connections() > TierPreset::Starter.max_connections());
        assert!(
            TierPreset::Professional.requests_per_minute()
                > TierPreset::Starter.requests_per_minute()
        );
    }

    #[test]
    fn app_config_builder_defaults_build() {
        assert!(AppConfigBuilder::default().build().is_ok());
    }

    #[test]
    fn app_config_builder_requires_total_connection_cap() {
        assert!(PoolConfigBuilder::new().build().is_err());
    }
}
