//! The declared deployment step set for one release of the protocol.
//!
//! Step declaration order fixes the tie-break order used by the
//! sequencer and the registration order of the external position types.

use alloy::providers::Provider;
use alloy_sol_types::SolValue;

use crate::{
    constants::{
        COMPOUND_DEBT_POSITION_LIB_KEY, COMPOUND_DEBT_POSITION_PARSER_KEY,
        DECLARED_POSITION_TYPES, DISPATCHER_KEY, EXTERNAL_POSITION_FACTORY_KEY,
        EXTERNAL_POSITION_MANAGER_KEY, FUND_DEPLOYER_KEY, PUBLISH_RELEASE_STEP,
        UNISWAP_V3_LIQUIDITY_POSITION_LIB_KEY, UNISWAP_V3_LIQUIDITY_POSITION_PARSER_KEY,
    },
    errors::ScriptError,
    registry::DeploymentRegistry,
    sequencer::DeploymentStep,
    types::{ReleaseConfig, StepOutput},
    utils::{deploy_contract, read_artifact, OnChainRelease},
    wiring::{self, WiringPlan},
};

/// Computes a contract's ABI-encoded constructor arguments from the
/// config and the registry
type ConstructorArgs = fn(&ReleaseConfig, &DeploymentRegistry) -> Result<Vec<u8>, ScriptError>;

/// A step that deploys the named contract from its compilation artifact
fn artifact_step<P>(
    client: &P,
    name: &'static str,
    constructor_args: ConstructorArgs,
) -> DeploymentStep
where
    P: Provider + Clone + 'static,
{
    let provider = client.clone();
    DeploymentStep::new(name, move |config, registry| {
        let provider = provider.clone();
        Box::pin(async move {
            let bytecode = read_artifact(&config.artifacts_dir, name)?;
            let args = constructor_args(&config, &registry)?;
            let handle = deploy_contract(&provider, bytecode, args).await?;

            Ok(StepOutput::Contract(handle))
        })
    })
}

/// The deployment steps for a full release.
///
/// The Uniswap V3 position contracts are deployed only where the
/// position manager integratee exists (mainnet, or any non-live
/// network). Publishing is part of the run only off live networks; on
/// live networks it is a manual council action via the CLI.
pub fn release_steps<P>(client: P) -> Vec<DeploymentStep>
where
    P: Provider + Clone + 'static,
{
    let publish_provider = client.clone();

    vec![
        artifact_step(&client, DISPATCHER_KEY, |_config, _registry| Ok(Vec::new())),
        artifact_step(&client, EXTERNAL_POSITION_FACTORY_KEY, |_config, registry| {
            Ok((registry.address(DISPATCHER_KEY)?,).abi_encode_params())
        })
        .depends_on(&[DISPATCHER_KEY]),
        artifact_step(&client, FUND_DEPLOYER_KEY, |_config, registry| {
            Ok((registry.address(DISPATCHER_KEY)?,).abi_encode_params())
        })
        .depends_on(&[DISPATCHER_KEY]),
        artifact_step(&client, EXTERNAL_POSITION_MANAGER_KEY, |_config, registry| {
            Ok((
                registry.address(FUND_DEPLOYER_KEY)?,
                registry.address(EXTERNAL_POSITION_FACTORY_KEY)?,
            )
                .abi_encode_params())
        })
        .depends_on(&[FUND_DEPLOYER_KEY, EXTERNAL_POSITION_FACTORY_KEY]),
        artifact_step(&client, COMPOUND_DEBT_POSITION_LIB_KEY, |config, _registry| {
            Ok((config.compound_comptroller, config.weth).abi_encode_params())
        }),
        artifact_step(
            &client,
            COMPOUND_DEBT_POSITION_PARSER_KEY,
            |config, _registry| Ok((config.compound_comptroller,).abi_encode_params()),
        ),
        artifact_step(
            &client,
            UNISWAP_V3_LIQUIDITY_POSITION_LIB_KEY,
            |config, _registry| {
                Ok((config.uniswap_v3_nonfungible_position_manager,).abi_encode_params())
            },
        )
        .skip_if(|net| net.live && !net.is_mainnet()),
        artifact_step(
            &client,
            UNISWAP_V3_LIQUIDITY_POSITION_PARSER_KEY,
            |config, _registry| {
                Ok((config.uniswap_v3_nonfungible_position_manager,).abi_encode_params())
            },
        )
        .skip_if(|net| net.live && !net.is_mainnet()),
        // The optional position contracts are deliberately not
        // dependencies here: publishing tolerates their absence, and
        // the run-last flag already orders it after them
        DeploymentStep::new(PUBLISH_RELEASE_STEP, move |_config, registry| {
            let provider = publish_provider.clone();
            Box::pin(async move {
                let fund_deployer = registry.address(FUND_DEPLOYER_KEY)?;
                let manager = registry.address(EXTERNAL_POSITION_MANAGER_KEY)?;
                let plan = WiringPlan::from_registry(
                    &registry,
                    &DECLARED_POSITION_TYPES,
                    fund_deployer,
                    manager,
                );
                let release = OnChainRelease::from_registry(provider, &registry)?;
                wiring::publish_release(&release, &plan).await?;

                Ok(StepOutput::SideEffect)
            })
        })
        .depends_on(&[
            DISPATCHER_KEY,
            EXTERNAL_POSITION_FACTORY_KEY,
            FUND_DEPLOYER_KEY,
            EXTERNAL_POSITION_MANAGER_KEY,
        ])
        .run_last()
        .skip_if(|net| net.live),
    ]
}
