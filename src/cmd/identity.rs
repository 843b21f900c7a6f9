//! Provider id and label helpers that need no cloud access

use clap::{Args, Subcommand};
use color_eyre::eyre::{eyre, Result};
use serde_json::json;
use stratus_instances::{provider_id, sanitize_label};

use super::resolve::CloudArgs;

#[derive(Args, Debug)]
pub struct ProviderIdArgs {
    #[command(subcommand)]
    pub action: ProviderIdAction,
}

#[derive(Subcommand, Debug)]
pub enum ProviderIdAction {
    /// Build the provider id for an instance.
    ///
    /// The region is embedded with --regional-provider-id (or OS_CCM_REGIONAL=true).
    Encode {
        /// Compute instance id
        instance_id: String,
    },
    /// Split a provider id into instance id and region
    Decode {
        /// Provider id, e.g. openstack://RegionOne/<id>
        provider_id: String,
    },
}

#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// Raw value, e.g. an availability zone name
    pub value: String,
}

pub fn run_provider_id(cloud: &CloudArgs, args: ProviderIdArgs) -> Result<()> {
    match args.action {
        ProviderIdAction::Encode { instance_id } => {
            let region = cloud.region.as_deref().unwrap_or_default();
            if cloud.regional_provider_id && region.is_empty() {
                return Err(eyre!("--region is required for a region-qualified provider id"));
            }
            let encoded = provider_id::encode(&instance_id, region, cloud.regional_provider_id)
                .map_err(|e| eyre!("{} ({})", e, e.kind()))?;
            println!("{}", encoded);
        }
        ProviderIdAction::Decode { provider_id } => {
            let (instance_id, region) = provider_id::decode(&provider_id)
                .map_err(|e| eyre!("{} ({})", e, e.kind()))?;
            println!(
                "{}",
                json!({ "instanceId": instance_id, "region": region })
            );
        }
    }
    Ok(())
}

pub fn run_sanitize(args: SanitizeArgs) -> Result<()> {
    println!("{}", sanitize_label(&args.value));
    Ok(())
}
