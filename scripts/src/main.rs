use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError, types::ReleaseConfig, utils::setup_provider};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        config_path,
        deployments_path,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let config = ReleaseConfig::from_file(&config_path)?;
    let client = setup_provider(&priv_key, &rpc_url)?;

    command.run(client, &config, &deployments_path).await
}
