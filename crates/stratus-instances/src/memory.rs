//! In-memory cloud
//!
//! Implements every lookup collaborator over plain maps. Used by tests and
//! by the CLI, which loads it from a JSON inventory.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::compute::{ComputeResult, FlavorLookup, PortLister, ServerLookup};
use crate::error::ComputeError;
use crate::types::{Flavor, Port, Server};

/// Serialized contents of a [`MemoryCloud`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub flavors: Vec<Flavor>,

    #[serde(default)]
    pub ports: Vec<Port>,
}

impl Inventory {
    /// Parse an inventory from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// In-memory compute and network API.
///
/// Servers are kept in insertion order so name listings are deterministic.
/// Names are not unique, as in a real cloud.
pub struct MemoryCloud {
    servers: RwLock<Vec<Server>>,
    flavors: RwLock<BTreeMap<String, Flavor>>,
    ports: RwLock<Vec<Port>>,

    /// Error returned by every request while set
    failure: RwLock<Option<ComputeError>>,

    requests: AtomicUsize,
}

impl Default for MemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCloud {
    /// Create an empty cloud
    pub fn new() -> Self {
        Self {
            servers: RwLock::new(Vec::new()),
            flavors: RwLock::new(BTreeMap::new()),
            ports: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            requests: AtomicUsize::new(0),
        }
    }

    /// Create a cloud populated from an inventory
    pub fn from_inventory(inventory: Inventory) -> Self {
        let flavors = inventory
            .flavors
            .into_iter()
            .map(|f| (f.id.clone(), f))
            .collect();

        Self {
            servers: RwLock::new(inventory.servers),
            flavors: RwLock::new(flavors),
            ports: RwLock::new(inventory.ports),
            failure: RwLock::new(None),
            requests: AtomicUsize::new(0),
        }
    }

    fn write_lock<T>(lock: &RwLock<T>) -> ComputeResult<std::sync::RwLockWriteGuard<'_, T>> {
        lock.write()
            .map_err(|e| ComputeError::Request(format!("write lock poisoned: {}", e)))
    }

    fn read_lock<T>(lock: &RwLock<T>) -> ComputeResult<std::sync::RwLockReadGuard<'_, T>> {
        lock.read()
            .map_err(|e| ComputeError::Request(format!("read lock poisoned: {}", e)))
    }

    /// Count the request and return the injected failure, if any
    fn begin_request(&self) -> ComputeResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match Self::read_lock(&self.failure)?.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn add_server(&self, server: Server) -> ComputeResult<()> {
        Self::write_lock(&self.servers)?.push(server);
        Ok(())
    }

    pub fn add_flavor(&self, flavor: Flavor) -> ComputeResult<()> {
        Self::write_lock(&self.flavors)?.insert(flavor.id.clone(), flavor);
        Ok(())
    }

    pub fn add_port(&self, port: Port) -> ComputeResult<()> {
        Self::write_lock(&self.ports)?.push(port);
        Ok(())
    }

    /// Make every subsequent request fail with `err` (None clears it)
    pub fn set_failure(&self, err: Option<ComputeError>) -> ComputeResult<()> {
        *Self::write_lock(&self.failure)? = err;
        Ok(())
    }

    /// Number of requests served so far, failed ones included
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerLookup for MemoryCloud {
    async fn list_servers_by_name(&self, name_pattern: &str) -> ComputeResult<Vec<Server>> {
        self.begin_request()?;

        let filter = Regex::new(name_pattern).map_err(|e| {
            ComputeError::Request(format!("invalid name filter {:?}: {}", name_pattern, e))
        })?;

        let servers = Self::read_lock(&self.servers)?;
        Ok(servers
            .iter()
            .filter(|s| filter.is_match(&s.name))
            .cloned()
            .collect())
    }

    async fn get_server(&self, id: &str) -> ComputeResult<Server> {
        self.begin_request()?;

        Self::read_lock(&self.servers)?
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ComputeError::not_found("server", id))
    }
}

#[async_trait]
impl FlavorLookup for MemoryCloud {
    async fn get_flavor(&self, id: &str) -> ComputeResult<Flavor> {
        self.begin_request()?;

        Self::read_lock(&self.flavors)?
            .get(id)
            .cloned()
            .ok_or_else(|| ComputeError::not_found("flavor", id))
    }
}

#[async_trait]
impl PortLister for MemoryCloud {
    async fn list_ports(&self, device_id: &str) -> ComputeResult<Vec<Port>> {
        self.begin_request()?;

        Ok(Self::read_lock(&self.ports)?
            .iter()
            .filter(|p| p.device_id == device_id)
            .cloned()
            .collect())
    }
}
