//! Node-facing instance queries
//!
//! [`InstancesV2`] is the surface the node lifecycle controller consumes:
//! does the node still exist, is it shut down, and what metadata should be
//! recorded on it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::addresses::PortAddresses;
use crate::compute::{
    observe, AddressResolver, FlavorLookup, InstanceTypeResolver, PortLister, ServerLookup,
};
use crate::config::InstancesConfig;
use crate::error::{InstanceError, Result};
use crate::flavor::FlavorInstanceType;
use crate::label::sanitize_label;
use crate::locator::ServerLocator;
use crate::provider_id;
use crate::types::{InstanceMetadata, Node, Server};

/// Instance queries for cluster nodes
#[async_trait]
pub trait InstancesV2: Send + Sync {
    /// Whether a cloud instance backs the node.
    ///
    /// A missing instance is `Ok(false)`; every other failure is an error.
    async fn instance_exists(&self, node: &Node) -> Result<bool>;

    /// Whether the node's instance is fully powered off
    async fn instance_shutdown(&self, node: &Node) -> Result<bool>;

    /// Metadata for the node's instance
    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata>;
}

/// [`InstancesV2`] backed by the OpenStack compute and network APIs
pub struct Instances {
    config: InstancesConfig,
    locator: ServerLocator,
    instance_types: Arc<dyn InstanceTypeResolver>,
    ports: Arc<dyn PortLister>,
    addresses: Arc<dyn AddressResolver>,
}

impl Instances {
    /// Create from individual collaborators. Addresses are derived with
    /// [`PortAddresses`] unless replaced.
    pub fn new(
        config: InstancesConfig,
        servers: Arc<dyn ServerLookup>,
        instance_types: Arc<dyn InstanceTypeResolver>,
        ports: Arc<dyn PortLister>,
    ) -> Self {
        let locator = ServerLocator::new(servers, config.region.clone())
            .with_request_timeout(config.request_timeout);

        Self {
            config,
            locator,
            instance_types,
            ports,
            addresses: Arc::new(PortAddresses),
        }
    }

    /// Create from a single client serving servers, flavors and ports
    pub fn from_cloud<C>(config: InstancesConfig, cloud: Arc<C>) -> Self
    where
        C: ServerLookup + FlavorLookup + PortLister + 'static,
    {
        let instance_types =
            FlavorInstanceType::new(cloud.clone()).with_request_timeout(config.request_timeout);
        Self::new(config, cloud.clone(), Arc::new(instance_types), cloud)
    }

    /// Replace the address resolver
    pub fn with_address_resolver(mut self, addresses: Arc<dyn AddressResolver>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn config(&self) -> &InstancesConfig {
        &self.config
    }

    /// Provider id for a server under this deployment's id mode
    pub fn provider_id(&self, server: &Server) -> Result<String> {
        provider_id::encode(
            &server.id,
            &self.config.region,
            self.config.regional_provider_id,
        )
    }

    async fn build_metadata(&self, server: &Server) -> Result<InstanceMetadata> {
        // a server id that cannot be encoded would become an unresolvable node key
        let provider_id = self.provider_id(server)?;
        let instance_type = self.instance_types.instance_type(server).await?;

        let ports = observe(
            "port",
            "list",
            self.config.request_timeout,
            self.ports.list_ports(&server.id),
        )
        .await?;

        let node_addresses =
            self.addresses
                .node_addresses(server, &ports, &self.config.networking)?;

        Ok(InstanceMetadata {
            provider_id,
            instance_type,
            node_addresses,
            zone: sanitize_label(&server.availability_zone),
            region: self.config.region.clone(),
        })
    }
}

#[async_trait]
impl InstancesV2 for Instances {
    async fn instance_exists(&self, node: &Node) -> Result<bool> {
        match self.locator.locate(node).await {
            Ok(_) => Ok(true),
            Err(InstanceError::InstanceNotFound) => {
                debug!(node = %node.name, "instance not found for node");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn instance_shutdown(&self, node: &Node) -> Result<bool> {
        let server = self.locator.locate(node).await?;
        Ok(server.status.is_shutoff())
    }

    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata> {
        let server = self.locator.locate(node).await?;
        self.build_metadata(&server).await
    }
}
