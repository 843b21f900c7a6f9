use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::stderr;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

mod cmd;

use cmd::identity::{ProviderIdArgs, SanitizeArgs};
use cmd::resolve::{CloudArgs, NodeArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve cluster nodes to OpenStack instances", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    cloud: CloudArgs,

    /// Verbose output - shows lookup decisions and request timings
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print whether an instance backs the node
    Exists(NodeArgs),
    /// Print whether the node's instance is shut off
    Shutdown(NodeArgs),
    /// Print the node's instance metadata as JSON
    Metadata(NodeArgs),
    /// Encode or decode provider ids
    ProviderId(ProviderIdArgs),
    /// Sanitize a value into a zone label
    Sanitize(SanitizeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise only our own crates, at warn unless verbose
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("stratus={level},stratus_instances={level}", level = level))
    });
    registry().with(filter).with(fmt::layer().with_writer(stderr)).init();

    match cli.command {
        Commands::Exists(node) => cmd::resolve::run_exists(&cli.cloud, node).await,
        Commands::Shutdown(node) => cmd::resolve::run_shutdown(&cli.cloud, node).await,
        Commands::Metadata(node) => cmd::resolve::run_metadata(&cli.cloud, node).await,
        Commands::ProviderId(args) => cmd::identity::run_provider_id(&cli.cloud, args),
        Commands::Sanitize(args) => cmd::identity::run_sanitize(args),
    }
}
