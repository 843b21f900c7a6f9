//! Resolution configuration
//!
//! Everything the resolver needs to know about its deployment is passed in
//! here once, at construction time.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable enabling region-qualified provider ids
pub const REGIONAL_PROVIDER_ID_ENV: &str = "OS_CCM_REGIONAL";

/// Networking options used when deriving node addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NetworkingOpts {
    /// Drop IPv6 addresses entirely
    pub ipv6_support_disabled: bool,

    /// Networks whose addresses are reported as external
    #[serde(rename = "public-network-name")]
    pub public_network_names: Vec<String>,

    /// Networks whose addresses are reported as internal.
    /// When empty, every non-public network is internal.
    #[serde(rename = "internal-network-name")]
    pub internal_network_names: Vec<String>,

    /// Comma-separated CIDRs giving address preference order
    pub address_sort_order: Option<String>,
}

impl NetworkingOpts {
    /// Disable IPv6 addresses
    pub fn with_ipv6_disabled(mut self, disabled: bool) -> Self {
        self.ipv6_support_disabled = disabled;
        self
    }

    /// Add a public network name
    pub fn with_public_network(mut self, name: impl Into<String>) -> Self {
        self.public_network_names.push(name.into());
        self
    }

    /// Add an internal network name
    pub fn with_internal_network(mut self, name: impl Into<String>) -> Self {
        self.internal_network_names.push(name.into());
        self
    }

    /// Set the address sort order
    pub fn with_address_sort_order(mut self, order: impl Into<String>) -> Self {
        self.address_sort_order = Some(order.into());
        self
    }
}

/// Instance resolution configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancesConfig {
    /// Region this deployment serves
    pub region: String,

    /// Embed the region in provider ids
    pub regional_provider_id: bool,

    /// Deadline for each remote call; None waits indefinitely
    pub request_timeout: Option<Duration>,

    pub networking: NetworkingOpts,
}

impl InstancesConfig {
    /// Create a config for a region with unqualified provider ids
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            regional_provider_id: false,
            request_timeout: None,
            networking: NetworkingOpts::default(),
        }
    }

    /// Create a config for a region, reading the provider id mode from
    /// `OS_CCM_REGIONAL`. Only the exact value "true" enables regional ids.
    pub fn from_env(region: impl Into<String>) -> Self {
        let regional = std::env::var(REGIONAL_PROVIDER_ID_ENV)
            .map(|v| parse_regional_flag(&v))
            .unwrap_or(false);
        Self::new(region).with_regional_provider_id(regional)
    }

    /// Set the provider id mode
    pub fn with_regional_provider_id(mut self, regional: bool) -> Self {
        self.regional_provider_id = regional;
        self
    }

    /// Set the per-request deadline
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set networking options
    pub fn with_networking(mut self, networking: NetworkingOpts) -> Self {
        self.networking = networking;
        self
    }
}

/// Only the exact value `true` enables region-qualified provider ids
pub fn parse_regional_flag(value: &str) -> bool {
    value == "true"
}
