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

use crate::manager::app::{
    config::AppConfig,
    database::{ConnectionTester, ControlPlanePool, DatabaseMigrator, PgConnectionTester, PgControlPlanePool, PgDatabaseMigrator},
};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::{Error, authentication::Credentials, response::Response},
};
use sqlx::PgPool;

pub(crate) mod dto;
pub(crate) mod error;
pub(crate) mod extractors;
pub(crate) mod macros;
pub(crate) mod services;
pub(crate) mod types;

pub trait ConfigProvider: Send + Sync {
    fn config(&self) -> Arc<AppConfig>;
}

/// Thin wrapper over an (optional) SMTP transport used for operator-notification
/// mail. Tenants configure their own SMTP settings separately (`tenants::model::SmtpSettings`);
/// this transport only ever carries control-plane notices (admin alerts, operator
/// email verification).
#[async_trait]
pub trait MailTransporter: ConfigProvider + Send + Sync {
    async fn send(&self, message: Message) -> Result<Response, Error>;
}

/// Holds everything the control-plane (operator auth, bookkeeping) handlers need.
/// Distinct from the per-tenant registry (`tenants::registry::TenantRegistry`),
/// which owns the config store, domain map and per-tenant pool manager.
pub struct AppState<T>
where
    T: Send + Sync,
{
    pub config: Arc<AppConfig>,
    pub default_smtp_transport: Option<Arc<T>>,
    pub control_plane: Arc<PgControlPlanePool>,
    pub migrator: Arc<dyn DatabaseMigrator>,
    pub connection_tester: Arc<dyn ConnectionTester>,
}

pub type DefaultSmtpTransport = AsyncSmtpTransport<Tokio1Executor>;
pub type DefaultAppState = AppState<DefaultSmtpTransport>;

impl DefaultAppState {
    fn init_config() -> anyhow::Result<AppConfig> {
        Ok(AppConfig::from_env()?)
    }

    fn init_smtp_transport(config: &AppConfig) -> anyhow::Result<Option<DefaultSmtpTransport>> {
        let Some(mail) = config.mail() else {
            return Ok(None);
        };
        Ok(Some(
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(mail.smtp_host())?
                .credentials(Credentials::new(
                    mail.smtp_user().to_owned(),
                    mail.smtp_passwd().to_owned(),
                ))
                .build(),
        ))
    }

    pub async fn new() -> anyhow::Result<DefaultAppState> {
        let config = Arc::new(Self::init_config()?);
        let control_plane = Arc::new(PgControlPlanePool::new(config.main_database()).await?);
        let migrator = Arc::new(PgDatabaseMigrator::new(control_plane.get_main_pool()));
        Ok(Self {
            default_smtp_transport: Self::init_smtp_transport(&config)?.map(Arc::new),
            config,
            control_plane,
            migrator,
            connection_tester: Arc::new(PgConnectionTester),
        })
    }
}

impl<T> ConfigProvider for AppState<T>
where
    T: Send + Sync,
{
    fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }
}

#[async_trait]
impl MailTransporter for AppState<DefaultSmtpTransport> {
    async fn send(&self, message: Message) -> Result<Response, Error> {
        match &self.default_smtp_transport {
            Some(transport) => transport.send(message).await,
            None => Err(Error::Client("mail transport is not configured")),
        }
    }
}

#[async_trait]
impl<T> DatabaseMigrator for AppState<T>
where
    T: Send + Sync,
{
    async fn migrate_main_db(&self) -> crate::common::error::RepositoryResult<()> {
        self.migrator.migrate_main_db().await
    }
}

impl<T> ControlPlanePool for AppState<T>
where
    T: Send + Sync,
{
    fn get_main_pool(&self) -> PgPool {
        self.control_plane.get_main_pool()
    }
}
