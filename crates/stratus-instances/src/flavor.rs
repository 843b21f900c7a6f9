//! Instance type from the server's flavor

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::compute::{observe, ComputeResult, FlavorLookup, InstanceTypeResolver};
use crate::error::ComputeError;
use crate::label::is_valid_label_value;
use crate::types::Server;

/// Resolves the instance type from the flavor a server was booted with.
///
/// Newer compute API microversions embed the flavor name (`original_name`)
/// in the server record; older ones only carry the flavor id, which then
/// needs a flavor lookup.
pub struct FlavorInstanceType {
    flavors: Arc<dyn FlavorLookup>,
    request_timeout: Option<Duration>,
}

impl FlavorInstanceType {
    pub fn new(flavors: Arc<dyn FlavorLookup>) -> Self {
        Self {
            flavors,
            request_timeout: None,
        }
    }

    /// Bound each flavor lookup
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn lookup(&self, flavor: &str) -> ComputeResult<String> {
        let found = observe(
            "flavor",
            "get",
            self.request_timeout,
            self.flavors.get_flavor(flavor),
        )
        .await?;

        if is_valid_label_value(&found.name) {
            Ok(found.name)
        } else {
            Ok(found.id)
        }
    }

    /// A failed lookup only moves on to the next candidate
    async fn try_lookup(&self, server: &Server, flavor: &str) -> Option<String> {
        match self.lookup(flavor).await {
            Ok(instance_type) => Some(instance_type),
            Err(e) => {
                debug!(instance_id = %server.id, flavor, error = %e, "flavor lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl InstanceTypeResolver for FlavorInstanceType {
    async fn instance_type(&self, server: &Server) -> ComputeResult<String> {
        if let Some(name) = server.flavor.original_name.as_deref() {
            if is_valid_label_value(name) {
                return Ok(name.to_string());
            }
            if let Some(instance_type) = self.try_lookup(server, name).await {
                return Ok(instance_type);
            }
        }

        if let Some(id) = server.flavor.id.as_deref() {
            if let Some(instance_type) = self.try_lookup(server, id).await {
                return Ok(instance_type);
            }
        }

        Err(ComputeError::not_found("flavor", &server.id))
    }
}
