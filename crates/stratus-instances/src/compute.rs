//! Remote API collaborators
//!
//! The resolver never talks HTTP itself. It consumes these traits; a real
//! deployment backs them with the OpenStack compute and network APIs, tests
//! and the CLI back them with [`crate::memory::MemoryCloud`].

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::NetworkingOpts;
use crate::error::ComputeError;
use crate::types::{Flavor, NodeAddress, Port, Server};

/// Result type for collaborator calls
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;

/// Server listing and retrieval
#[async_trait]
pub trait ServerLookup: Send + Sync {
    /// List servers whose name matches `name_pattern`, a regular expression
    /// as accepted by the compute API's `name` filter.
    async fn list_servers_by_name(&self, name_pattern: &str) -> ComputeResult<Vec<Server>>;

    /// Fetch a server by id. Must fail with [`ComputeError::NotFound`] when
    /// the server does not exist.
    async fn get_server(&self, id: &str) -> ComputeResult<Server>;
}

/// Flavor retrieval
#[async_trait]
pub trait FlavorLookup: Send + Sync {
    async fn get_flavor(&self, id: &str) -> ComputeResult<Flavor>;
}

/// Port enumeration
#[async_trait]
pub trait PortLister: Send + Sync {
    /// List ports attached to a server
    async fn list_ports(&self, device_id: &str) -> ComputeResult<Vec<Port>>;
}

/// Instance type resolution
#[async_trait]
pub trait InstanceTypeResolver: Send + Sync {
    async fn instance_type(&self, server: &Server) -> ComputeResult<String>;
}

/// Node address derivation
pub trait AddressResolver: Send + Sync {
    fn node_addresses(
        &self,
        server: &Server,
        ports: &[Port],
        opts: &NetworkingOpts,
    ) -> ComputeResult<Vec<NodeAddress>>;
}

/// Run one remote request, bounding it by `timeout` and logging its outcome.
///
/// Dropping the returned future drops the request with it.
pub(crate) async fn observe<T, F>(
    resource: &str,
    request: &str,
    timeout: Option<Duration>,
    fut: F,
) -> ComputeResult<T>
where
    F: Future<Output = ComputeResult<T>>,
{
    let start = Instant::now();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(ComputeError::Timeout {
                resource: resource.to_string(),
                request: request.to_string(),
            }),
        },
        None => fut.await,
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => debug!(resource, request, elapsed_ms, "request completed"),
        Err(e) => debug!(resource, request, elapsed_ms, error = %e, "request failed"),
    }
    result
}
