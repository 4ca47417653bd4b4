//! HttpTransport - shared pool of HTTP clients for the direct channel

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{ContractError, TenantSettings};
use tracing::debug;

/// Client-level settings; everything else is applied per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientProfile {
    pub connect_timeout: Duration,
    pub verify_tls: bool,
}

impl ClientProfile {
    pub fn for_tenant(settings: &TenantSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            verify_tls: settings.verify_tls,
        }
    }
}

/// Connection-pooling HTTP transport.
///
/// Owned by the composition root and shared by every direct channel. One
/// `reqwest::Client` is kept per [`ClientProfile`], created on first use.
#[derive(Debug, Default)]
pub struct HttpTransport {
    clients: Mutex<HashMap<ClientProfile, reqwest::Client>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client for the given profile; clones share the same connection pool
    ///
    /// # Errors
    /// `Transport` if the TLS backend cannot be initialized
    pub fn client(&self, profile: ClientProfile) -> Result<reqwest::Client, ContractError> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&profile) {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(profile.connect_timeout)
            .danger_accept_invalid_certs(!profile.verify_tls)
            .build()
            .map_err(|e| {
                ContractError::transport_with_source("http-client", "client build failed", e)
            })?;

        debug!(
            connect_timeout_ms = profile.connect_timeout.as_millis() as u64,
            verify_tls = profile.verify_tls,
            "HTTP client created"
        );
        clients.insert(profile, client.clone());
        Ok(client)
    }

    /// Number of distinct clients created so far
    pub fn pooled_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
