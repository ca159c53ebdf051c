//! Definitions of CLI arguments and commands for the deploy scripts

use alloy::providers::Provider;
use clap::{Parser, Subcommand};

use crate::{
    commands::{deploy_release, publish_release, status},
    errors::ScriptError,
    types::ReleaseConfig,
};

/// The CLI for the release deploy scripts
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    // TODO: Better key management
    #[arg(short, long, env = "DEPLOYER_PRIV_KEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long)]
    pub rpc_url: String,

    /// Path to the per-network release config file
    #[arg(short, long)]
    pub config_path: String,

    /// Path to the file recording deployed contract addresses
    #[arg(short, long, default_value = "deployments.json")]
    pub deployments_path: String,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The subcommands of the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the release contract suite, reusing any contracts already
    /// recorded in the deployments file
    DeployRelease,
    /// Perform the post-deployment wiring, making the release live.
    ///
    /// On live networks this is the manual council action; on other
    /// networks it runs as the last step of `deploy-release`.
    PublishRelease,
    /// Report the release's wiring status (liveness and registered
    /// position type count)
    Status,
}

impl Command {
    /// Run the command
    pub async fn run<P>(
        self,
        client: P,
        config: &ReleaseConfig,
        deployments_path: &str,
    ) -> Result<(), ScriptError>
    where
        P: Provider + Clone + 'static,
    {
        match self {
            Command::DeployRelease => deploy_release(client, config, deployments_path).await,
            Command::PublishRelease => publish_release(client, deployments_path).await,
            Command::Status => status(client, deployments_path).await,
        }
    }
}
