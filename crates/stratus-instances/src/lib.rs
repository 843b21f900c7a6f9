//! Stratus Instances
//!
//! Resolves cluster nodes to OpenStack compute instances and produces the
//! metadata the node lifecycle controller records on them.
//!
//! # Overview
//!
//! A node is identified towards the cloud by its provider id
//! (`openstack:///<instance-id>` or, in region-qualified deployments,
//! `openstack://<region>/<instance-id>`). Until a node has one, it is
//! matched to a server by exact name, and more than one match is an error
//! rather than a guess.
//!
//! Every query is a fresh lookup: nothing is cached and nothing is retried.
//! Remote failures other than "not found" surface as
//! [`InstanceError::Transient`] and retrying is up to the caller.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratus_instances::{
//!     Instances, InstancesConfig, InstancesV2, MemoryCloud, Node, Server, ServerStatus,
//! };
//!
//! # async fn example() -> stratus_instances::Result<()> {
//! let cloud = Arc::new(MemoryCloud::new());
//! cloud.add_server(
//!     Server::new("abc", "node-1", ServerStatus::Active)
//!         .with_flavor_name("m1.small")
//!         .with_availability_zone("AZ_1!!"),
//! )?;
//!
//! let instances = Instances::from_cloud(InstancesConfig::new("RegionOne"), cloud);
//!
//! let node = Node::new("node-1");
//! assert!(instances.instance_exists(&node).await?);
//!
//! let meta = instances.instance_metadata(&node).await?;
//! assert_eq!(meta.provider_id, "openstack:///abc");
//! assert_eq!(meta.zone, "az_1");
//! # Ok(())
//! # }
//! ```

pub mod addresses;
pub mod compute;
pub mod config;
pub mod error;
pub mod flavor;
pub mod instances;
pub mod label;
pub mod locator;
pub mod memory;
pub mod provider_id;
pub mod types;

pub use addresses::PortAddresses;
pub use compute::{
    AddressResolver, ComputeResult, FlavorLookup, InstanceTypeResolver, PortLister, ServerLookup,
};
pub use config::{parse_regional_flag, InstancesConfig, NetworkingOpts, REGIONAL_PROVIDER_ID_ENV};
pub use error::{ComputeError, ErrorKind, InstanceError, Result};
pub use flavor::FlavorInstanceType;
pub use instances::{Instances, InstancesV2};
pub use label::{is_valid_label_value, sanitize_label};
pub use locator::ServerLocator;
pub use memory::{Inventory, MemoryCloud};
pub use provider_id::{ProviderId, PROVIDER_NAME};
pub use types::{
    Flavor, FlavorRef, InstanceMetadata, Node, NodeAddress, NodeAddressType, Port, Server,
    ServerAddress, ServerStatus,
};
