//! Implementations of the various deploy scripts

use std::path::Path;

use alloy::providers::Provider;
use tracing::info;

use crate::{
    constants::{DECLARED_POSITION_TYPES, EXTERNAL_POSITION_MANAGER_KEY, FUND_DEPLOYER_KEY},
    errors::ScriptError,
    registry::DeploymentRegistry,
    release::release_steps,
    sequencer::Sequencer,
    types::ReleaseConfig,
    utils::OnChainRelease,
    wiring::{self, WiringPlan},
};

/// Deploy the release contract suite, recording each deployment in the
/// deployments file as it completes
pub async fn deploy_release<P>(
    client: P,
    config: &ReleaseConfig,
    deployments_path: &str,
) -> Result<(), ScriptError>
where
    P: Provider + Clone + 'static,
{
    let path = Path::new(deployments_path);
    let mut registry = DeploymentRegistry::load(path)?;

    let mut sequencer = Sequencer::new();
    for step in release_steps(client) {
        sequencer.add_step(step)?;
    }

    let report = sequencer.run(config, &mut registry, Some(path)).await?;
    info!(
        "release deployed: {} steps executed, {} reused, {} skipped",
        report.executed.len(),
        report.reused.len(),
        report.skipped.len(),
    );

    Ok(())
}

/// Perform the post-deployment wiring against the recorded deployments
pub async fn publish_release<P: Provider>(
    client: P,
    deployments_path: &str,
) -> Result<(), ScriptError> {
    let registry = DeploymentRegistry::load(Path::new(deployments_path))?;

    let fund_deployer = registry.address(FUND_DEPLOYER_KEY)?;
    let manager = registry.address(EXTERNAL_POSITION_MANAGER_KEY)?;
    let plan =
        WiringPlan::from_registry(&registry, &DECLARED_POSITION_TYPES, fund_deployer, manager);

    let release = OnChainRelease::from_registry(client, &registry)?;
    wiring::publish_release(&release, &plan).await?;

    info!("release published, fund deployer {:#x} is live", fund_deployer);
    Ok(())
}

/// Report the release's wiring status, for detecting partial completion
/// before re-running `publish-release`
pub async fn status<P: Provider>(client: P, deployments_path: &str) -> Result<(), ScriptError> {
    let registry = DeploymentRegistry::load(Path::new(deployments_path))?;
    let release = OnChainRelease::from_registry(client, &registry)?;

    let status = wiring::release_status(&release).await?;
    info!(
        "release live: {}, registered position types: {}",
        status.live, status.position_type_count,
    );

    Ok(())
}
