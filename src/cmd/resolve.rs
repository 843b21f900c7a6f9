//! Node queries against an inventory-backed cloud

use clap::{ArgAction, Args};
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use stratus_instances::{
    parse_regional_flag, InstanceError, Instances, InstancesConfig, InstancesV2, Inventory,
    MemoryCloud, NetworkingOpts, Node, REGIONAL_PROVIDER_ID_ENV,
};

/// Where the instances live and how provider ids are issued.
///
/// Global so they can be given before or after the subcommand. clap does not
/// allow required global args, so presence is checked when a query runs.
#[derive(Args, Debug)]
pub struct CloudArgs {
    /// JSON inventory of servers, flavors and ports
    #[arg(long, global = true, env = "STRATUS_INVENTORY")]
    pub inventory: Option<PathBuf>,

    /// Region served by this deployment
    #[arg(long, global = true, env = "OS_REGION_NAME")]
    pub region: Option<String>,

    /// Issue region-qualified provider ids
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        env = REGIONAL_PROVIDER_ID_ENV,
        value_parser = regional_flag,
        default_value_t = false
    )]
    pub regional_provider_id: bool,

    /// JSON file with networking options
    #[arg(long, global = true)]
    pub networking: Option<PathBuf>,

    /// Per-request deadline in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

/// The node being resolved
#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Node name
    #[arg(long)]
    pub node: String,

    /// Provider id already assigned to the node
    #[arg(long)]
    pub provider_id: Option<String>,
}

fn regional_flag(value: &str) -> std::result::Result<bool, Infallible> {
    Ok(parse_regional_flag(value))
}

impl CloudArgs {
    fn config(&self) -> Result<InstancesConfig> {
        let region = self
            .region
            .clone()
            .ok_or_else(|| eyre!("--region (or OS_REGION_NAME) is required"))?;

        let mut config = InstancesConfig::from_env(region);
        if self.regional_provider_id {
            config = config.with_regional_provider_id(true);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = &self.networking {
            let raw = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read networking options {}", path.display()))?;
            let networking: NetworkingOpts = serde_json::from_str(&raw)
                .wrap_err_with(|| format!("Invalid networking options {}", path.display()))?;
            config = config.with_networking(networking);
        }
        Ok(config)
    }

    fn instances(&self) -> Result<Instances> {
        let path = self
            .inventory
            .as_ref()
            .ok_or_else(|| eyre!("--inventory (or STRATUS_INVENTORY) is required"))?;
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read inventory {}", path.display()))?;
        let inventory = Inventory::from_json(&raw)
            .wrap_err_with(|| format!("Invalid inventory {}", path.display()))?;
        debug!(
            servers = inventory.servers.len(),
            ports = inventory.ports.len(),
            "loaded inventory"
        );

        let cloud = Arc::new(MemoryCloud::from_inventory(inventory));
        Ok(Instances::from_cloud(self.config()?, cloud))
    }
}

impl NodeArgs {
    fn node(&self) -> Node {
        let node = Node::new(&self.node);
        match &self.provider_id {
            Some(id) => node.with_provider_id(id),
            None => node,
        }
    }
}

fn report(err: InstanceError) -> color_eyre::eyre::Report {
    eyre!("{} ({})", err, err.kind())
}

pub async fn run_exists(cloud: &CloudArgs, node: NodeArgs) -> Result<()> {
    let instances = cloud.instances()?;
    let exists = instances
        .instance_exists(&node.node())
        .await
        .map_err(report)?;
    println!("{}", exists);
    Ok(())
}

pub async fn run_shutdown(cloud: &CloudArgs, node: NodeArgs) -> Result<()> {
    let instances = cloud.instances()?;
    let shutdown = instances
        .instance_shutdown(&node.node())
        .await
        .map_err(report)?;
    println!("{}", shutdown);
    Ok(())
}

pub async fn run_metadata(cloud: &CloudArgs, node: NodeArgs) -> Result<()> {
    let instances = cloud.instances()?;
    let metadata = instances
        .instance_metadata(&node.node())
        .await
        .map_err(report)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
