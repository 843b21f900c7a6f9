//! Server lookup for a node
//!
//! A node is bound to a server in one of two ways:
//!
//! - it has no provider id yet: list servers by exact name, and insist on
//!   exactly one match
//! - it has a provider id: decode it and fetch the server by id
//!
//! The second path is the steady state. The first only runs until the node
//! has been given a provider id.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::compute::{observe, ServerLookup};
use crate::error::{InstanceError, Result};
use crate::provider_id::ProviderId;
use crate::types::{Node, Server};

/// Finds the server backing a node
pub struct ServerLocator {
    servers: Arc<dyn ServerLookup>,
    region: String,
    request_timeout: Option<Duration>,
}

impl ServerLocator {
    /// Create a locator for servers in `region`
    pub fn new(servers: Arc<dyn ServerLookup>, region: impl Into<String>) -> Self {
        Self {
            servers,
            region: region.into(),
            request_timeout: None,
        }
    }

    /// Bound each remote call
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Find the server for `node`
    pub async fn locate(&self, node: &Node) -> Result<Server> {
        match node.provider_id() {
            None => self.locate_by_name(&node.name).await,
            Some(provider_id) => self.locate_by_provider_id(provider_id).await,
        }
    }

    async fn locate_by_name(&self, name: &str) -> Result<Server> {
        let pattern = format!("^{}$", regex::escape(name));

        let mut servers = observe(
            "server",
            "list",
            self.request_timeout,
            self.servers.list_servers_by_name(&pattern),
        )
        .await?;

        match servers.len() {
            0 => {
                debug!(node = %name, "no server with node name");
                Err(InstanceError::InstanceNotFound)
            }
            1 => {
                let server = servers.remove(0);
                debug!(node = %name, instance_id = %server.id, "found server by name");
                Ok(server)
            }
            count => Err(InstanceError::Ambiguous {
                name: name.to_string(),
                count,
            }),
        }
    }

    async fn locate_by_provider_id(&self, provider_id: &str) -> Result<Server> {
        let parsed: ProviderId = provider_id.parse()?;

        if !parsed.matches_region(&self.region) {
            return Err(InstanceError::RegionMismatch {
                provider_id: provider_id.to_string(),
                region: self.region.clone(),
            });
        }

        let result = observe(
            "server",
            "get",
            self.request_timeout,
            self.servers.get_server(parsed.instance_id()),
        )
        .await;

        match result {
            Ok(server) => Ok(server),
            Err(e) if e.is_not_found() => {
                debug!(provider_id, "server for provider id not found");
                Err(InstanceError::InstanceNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }
}
