//! Harness utilities for building deployment steps over the simulated chain

use std::{path::PathBuf, sync::Arc};

use alloy_primitives::Address;
use scripts::{
    constants::{
        DECLARED_POSITION_TYPES, EXTERNAL_POSITION_MANAGER_KEY, FUND_DEPLOYER_KEY,
        PUBLISH_RELEASE_STEP,
    },
    errors::ScriptError,
    sequencer::DeploymentStep,
    types::{NetworkContext, ReleaseConfig, StepOutput},
    wiring::{publish_release, WiringPlan},
};

use crate::chain::SimulatedChain;

/// A release config for a local devnet
pub fn devnet_config() -> ReleaseConfig {
    ReleaseConfig {
        network: NetworkContext {
            chain_id: 31337,
            live: false,
        },
        artifacts_dir: PathBuf::new(),
        weth: Address::ZERO,
        compound_comptroller: Address::ZERO,
        uniswap_v3_nonfungible_position_manager: Address::ZERO,
    }
}

/// A step that deploys the named contract on the simulated chain
pub fn deploy_step(chain: &Arc<SimulatedChain>, name: &'static str) -> DeploymentStep {
    let chain = Arc::clone(chain);
    DeploymentStep::new(name, move |_config, _registry| {
        let chain = Arc::clone(&chain);
        Box::pin(async move { Ok(StepOutput::Contract(chain.deploy(name))) })
    })
}

/// A step whose action always fails
pub fn failing_step(name: &'static str) -> DeploymentStep {
    DeploymentStep::new(name, |_config, _registry| {
        Box::pin(async move {
            Err(ScriptError::ContractDeployment(
                "transaction rejected".to_string(),
            ))
        })
    })
}

/// The run-last step that publishes the release on the simulated chain,
/// wiring the position types recorded as present in the registry
pub fn publish_step(chain: &Arc<SimulatedChain>) -> DeploymentStep {
    let chain = Arc::clone(chain);
    DeploymentStep::new(PUBLISH_RELEASE_STEP, move |_config, registry| {
        let chain = Arc::clone(&chain);
        Box::pin(async move {
            let fund_deployer = registry.address(FUND_DEPLOYER_KEY)?;
            let manager = registry.address(EXTERNAL_POSITION_MANAGER_KEY)?;
            let plan = WiringPlan::from_registry(
                &registry,
                &DECLARED_POSITION_TYPES,
                fund_deployer,
                manager,
            );
            publish_release(chain.as_ref(), &plan).await?;

            Ok(StepOutput::SideEffect)
        })
    })
    .depends_on(&[FUND_DEPLOYER_KEY, EXTERNAL_POSITION_MANAGER_KEY])
    .run_last()
}
