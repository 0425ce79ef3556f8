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
use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ipnetwork::IpNetwork;

use crate::common::error::{TenantError, TenantErrorKind};
use crate::common::extractors::client_ip::ClientIp;

/// Optional CIDR allow-list (§4.8). An empty list means no restriction — the
/// layer is transparent unless the operator configures at least one network.
#[derive(Debug, Clone, Default)]
pub struct IpAllowList {
    networks: Vec<IpNetwork>,
}

impl IpAllowList {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self { networks }
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn allows(&self, ip: IpAddr) -> bool {
        self.networks.is_empty() || self.networks.iter().any(|net| net.contains(ip))
    }
}

pub async fn ip_allow_middleware(
    State(allow_list): State<Arc<IpAllowList>>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    if allow_list.allows(ip) {
        return next.run(req).await;
    }
    crate::security::audit::unauthorized(ip, "ip not on allow-list");
    TenantError::new(
        TenantErrorKind::UnauthorizedTenantAccess,
        "client ip is not on the allow-list",
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_allows_everything() {
        let list = IpAllowList::default();
        assert!(list.allows("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn matches_a_containing_network() {
        let list = IpAllowList::new(vec!["10.0.0.0/8".parse().unwrap()]);
        assert!(list.allows("10.1.2.3".parse().unwrap()));
        assert!(!list.allows("192.168.1.1".parse().unwrap()));
    }
}
