//! Data types for instance resolution
//!
//! Server, flavor and port records mirror the shape of the OpenStack
//! compute/network JSON so inventories can be written by hand or dumped
//! from a real cloud.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Cluster node being resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name, used for lookup until a provider id is assigned
    pub name: String,

    /// Provider id previously assigned to this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl Node {
    /// Create a node that has no provider id yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_id: None,
        }
    }

    /// Set the provider id
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// The provider id, treating an empty string as absent
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Lifecycle status of a compute server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Active,
    Build,
    Shutoff,
    Paused,
    Suspended,
    Shelved,
    ShelvedOffloaded,
    Reboot,
    HardReboot,
    Resize,
    VerifyResize,
    Migrating,
    Rescue,
    Error,
    Deleted,
    /// Any status this crate does not know about
    Other(String),
}

impl ServerStatus {
    /// The API string for this status
    pub fn as_str(&self) -> &str {
        match self {
            ServerStatus::Active => "ACTIVE",
            ServerStatus::Build => "BUILD",
            ServerStatus::Shutoff => "SHUTOFF",
            ServerStatus::Paused => "PAUSED",
            ServerStatus::Suspended => "SUSPENDED",
            ServerStatus::Shelved => "SHELVED",
            ServerStatus::ShelvedOffloaded => "SHELVED_OFFLOADED",
            ServerStatus::Reboot => "REBOOT",
            ServerStatus::HardReboot => "HARD_REBOOT",
            ServerStatus::Resize => "RESIZE",
            ServerStatus::VerifyResize => "VERIFY_RESIZE",
            ServerStatus::Migrating => "MIGRATING",
            ServerStatus::Rescue => "RESCUE",
            ServerStatus::Error => "ERROR",
            ServerStatus::Deleted => "DELETED",
            ServerStatus::Other(s) => s,
        }
    }

    /// Whether the server is fully powered off.
    ///
    /// Only SHUTOFF counts. Transitional and error states are reported as
    /// running since attached volumes are only detached from a stopped server.
    pub fn is_shutoff(&self) -> bool {
        matches!(self, ServerStatus::Shutoff)
    }
}

impl From<String> for ServerStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => ServerStatus::Active,
            "BUILD" => ServerStatus::Build,
            "SHUTOFF" => ServerStatus::Shutoff,
            "PAUSED" => ServerStatus::Paused,
            "SUSPENDED" => ServerStatus::Suspended,
            "SHELVED" => ServerStatus::Shelved,
            "SHELVED_OFFLOADED" => ServerStatus::ShelvedOffloaded,
            "REBOOT" => ServerStatus::Reboot,
            "HARD_REBOOT" => ServerStatus::HardReboot,
            "RESIZE" => ServerStatus::Resize,
            "VERIFY_RESIZE" => ServerStatus::VerifyResize,
            "MIGRATING" => ServerStatus::Migrating,
            "RESCUE" => ServerStatus::Rescue,
            "ERROR" => ServerStatus::Error,
            "DELETED" => ServerStatus::Deleted,
            _ => ServerStatus::Other(s),
        }
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flavor reference embedded in a server record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRef {
    /// Flavor id (older microversions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Flavor name (microversion 2.47+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

/// Flavor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
}

impl Flavor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One entry of a server's per-network address list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub addr: String,

    /// "fixed" or "floating"
    #[serde(
        rename = "OS-EXT-IPS:type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_type: Option<String>,
}

impl ServerAddress {
    /// Create a fixed address
    pub fn fixed(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ip_type: Some("fixed".to_string()),
        }
    }

    /// Create a floating address
    pub fn floating(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ip_type: Some("floating".to_string()),
        }
    }

    pub fn is_floating(&self) -> bool {
        self.ip_type.as_deref() == Some("floating")
    }
}

/// Compute server record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Instance id, unique within a region
    pub id: String,

    pub name: String,

    pub status: ServerStatus,

    #[serde(rename = "OS-EXT-AZ:availability_zone", default)]
    pub availability_zone: String,

    #[serde(default)]
    pub flavor: FlavorRef,

    #[serde(rename = "accessIPv4", default)]
    pub access_ipv4: String,

    #[serde(rename = "accessIPv6", default)]
    pub access_ipv6: String,

    /// Network name -> addresses on that network
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Server {
    /// Create a server with the given id, name and status
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            availability_zone: String::new(),
            flavor: FlavorRef::default(),
            access_ipv4: String::new(),
            access_ipv6: String::new(),
            addresses: BTreeMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the availability zone
    pub fn with_availability_zone(mut self, az: impl Into<String>) -> Self {
        self.availability_zone = az.into();
        self
    }

    /// Set the flavor reference by original name
    pub fn with_flavor_name(mut self, name: impl Into<String>) -> Self {
        self.flavor.original_name = Some(name.into());
        self
    }

    /// Set the flavor reference by id
    pub fn with_flavor_id(mut self, id: impl Into<String>) -> Self {
        self.flavor.id = Some(id.into());
        self
    }

    /// Set the public IPv4 access address
    pub fn with_access_ipv4(mut self, addr: impl Into<String>) -> Self {
        self.access_ipv4 = addr.into();
        self
    }

    /// Set the public IPv6 access address
    pub fn with_access_ipv6(mut self, addr: impl Into<String>) -> Self {
        self.access_ipv6 = addr.into();
        self
    }

    /// Add an address on a network
    pub fn with_address(mut self, network: impl Into<String>, address: ServerAddress) -> Self {
        self.addresses
            .entry(network.into())
            .or_default()
            .push(address);
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Fixed IP allocation on a port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub ip_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// Network port attached to a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,

    /// Server the port is attached to
    pub device_id: String,

    pub status: String,

    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
}

impl Port {
    /// Create an ACTIVE port attached to a server
    pub fn new(id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device_id: device_id.into(),
            status: "ACTIVE".to_string(),
            fixed_ips: Vec::new(),
        }
    }

    /// Set the port status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Add a fixed IP
    pub fn with_fixed_ip(mut self, ip: impl Into<String>) -> Self {
        self.fixed_ips.push(FixedIp {
            ip_address: ip.into(),
            subnet_id: None,
        });
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }
}

/// Kind of node address, named as Kubernetes names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeAddressType {
    Hostname,
    #[serde(rename = "ExternalIP")]
    ExternalIp,
    #[serde(rename = "InternalIP")]
    InternalIp,
}

impl std::fmt::Display for NodeAddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeAddressType::Hostname => write!(f, "Hostname"),
            NodeAddressType::ExternalIp => write!(f, "ExternalIP"),
            NodeAddressType::InternalIp => write!(f, "InternalIP"),
        }
    }
}

/// Address reported for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub kind: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    pub fn new(kind: NodeAddressType, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }

    pub fn internal(address: impl Into<String>) -> Self {
        Self::new(NodeAddressType::InternalIp, address)
    }

    pub fn external(address: impl Into<String>) -> Self {
        Self::new(NodeAddressType::ExternalIp, address)
    }
}

/// Metadata reported for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    /// Canonical provider id, e.g. `openstack:///<id>`
    pub provider_id: String,

    /// Instance type (flavor name or id)
    pub instance_type: String,

    /// Ordered node addresses
    pub node_addresses: Vec<NodeAddress>,

    /// Sanitized availability zone
    pub zone: String,

    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_provider_id() {
        let node = Node::new("node-1");
        assert_eq!(node.provider_id(), None);

        let node = Node::new("node-1").with_provider_id("");
        assert_eq!(node.provider_id(), None);

        let node = Node::new("node-1").with_provider_id("openstack:///abc");
        assert_eq!(node.provider_id(), Some("openstack:///abc"));
    }

    #[test]
    fn test_server_status_parse() {
        assert_eq!(ServerStatus::from("SHUTOFF".to_string()), ServerStatus::Shutoff);
        assert_eq!(ServerStatus::from("active".to_string()), ServerStatus::Active);
        assert_eq!(
            ServerStatus::from("SHELVED_OFFLOADED".to_string()),
            ServerStatus::ShelvedOffloaded
        );
        assert_eq!(
            ServerStatus::from("SOFT_DELETED".to_string()),
            ServerStatus::Other("SOFT_DELETED".to_string())
        );
        assert_eq!(ServerStatus::HardReboot.to_string(), "HARD_REBOOT");
    }

    #[test]
    fn test_only_shutoff_is_shutoff() {
        assert!(ServerStatus::Shutoff.is_shutoff());
        for status in [
            ServerStatus::Active,
            ServerStatus::Paused,
            ServerStatus::Suspended,
            ServerStatus::Shelved,
            ServerStatus::Error,
            ServerStatus::Reboot,
            ServerStatus::Other("STOPPING".to_string()),
        ] {
            assert!(!status.is_shutoff(), "{} should not count as shut off", status);
        }
    }

    #[test]
    fn test_server_deserialize_nova_shape() {
        let json = r#"{
            "id": "abc",
            "name": "node-1",
            "status": "ACTIVE",
            "OS-EXT-AZ:availability_zone": "nova",
            "flavor": {"original_name": "m1.small"},
            "accessIPv4": "203.0.113.10",
            "addresses": {
                "private": [
                    {"addr": "10.0.0.5", "OS-EXT-IPS:type": "fixed"},
                    {"addr": "203.0.113.10", "OS-EXT-IPS:type": "floating"}
                ]
            }
        }"#;

        let server: Server = serde_json::from_str(json).unwrap();
        assert_eq!(server.id, "abc");
        assert_eq!(server.status, ServerStatus::Active);
        assert_eq!(server.availability_zone, "nova");
        assert_eq!(server.flavor.original_name.as_deref(), Some("m1.small"));
        assert_eq!(server.access_ipv6, "");
        assert!(server.addresses["private"][1].is_floating());
        assert!(server.metadata.is_empty());
    }

    #[test]
    fn test_metadata_serialization() {
        let meta = InstanceMetadata {
            provider_id: "openstack:///abc".to_string(),
            instance_type: "m1.small".to_string(),
            node_addresses: vec![NodeAddress::internal("10.0.0.5")],
            zone: "nova".to_string(),
            region: "RegionOne".to_string(),
        };

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["providerId"], "openstack:///abc");
        assert_eq!(value["nodeAddresses"][0]["type"], "InternalIP");
        assert_eq!(value["nodeAddresses"][0]["address"], "10.0.0.5");
    }
}
