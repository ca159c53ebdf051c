//! End-to-end tests for the deployment sequencer against the simulated chain

use std::sync::Arc;

use eyre::Result;
use integration::{
    chain::SimulatedChain,
    steps::{deploy_step, devnet_config, failing_step, publish_step},
};
use scripts::{
    constants::{
        COMPOUND_DEBT_POSITION_LIB_KEY, COMPOUND_DEBT_POSITION_PARSER_KEY, DISPATCHER_KEY,
        EXTERNAL_POSITION_FACTORY_KEY, EXTERNAL_POSITION_MANAGER_KEY, FUND_DEPLOYER_KEY,
    },
    errors::ScriptError,
    registry::DeploymentRegistry,
    sequencer::Sequencer,
};
use tempdir::TempDir;

/// Build a sequencer over the given steps
fn sequencer_of(
    steps: Vec<scripts::sequencer::DeploymentStep>,
) -> Result<Sequencer, ScriptError> {
    let mut sequencer = Sequencer::new();
    for step in steps {
        sequencer.add_step(step)?;
    }
    Ok(sequencer)
}

#[tokio::test]
async fn test_full_release_deploy_and_publish() -> Result<()> {
    let chain = Arc::new(SimulatedChain::new());

    let sequencer = sequencer_of(vec![
        deploy_step(&chain, DISPATCHER_KEY),
        deploy_step(&chain, EXTERNAL_POSITION_FACTORY_KEY).depends_on(&[DISPATCHER_KEY]),
        deploy_step(&chain, FUND_DEPLOYER_KEY).depends_on(&[DISPATCHER_KEY]),
        deploy_step(&chain, EXTERNAL_POSITION_MANAGER_KEY)
            .depends_on(&[FUND_DEPLOYER_KEY, EXTERNAL_POSITION_FACTORY_KEY]),
        deploy_step(&chain, COMPOUND_DEBT_POSITION_LIB_KEY),
        deploy_step(&chain, COMPOUND_DEBT_POSITION_PARSER_KEY),
        publish_step(&chain),
    ])?;

    let mut registry = DeploymentRegistry::new();
    let report = sequencer
        .run(&devnet_config(), &mut registry, None)
        .await?;

    // Publishing ran last
    assert_eq!(report.executed.last().map(String::as_str), Some("PublishRelease"));

    // The release is live and wired to the deployed contracts
    assert!(chain.is_live());
    assert_eq!(
        chain.position_deployers(),
        vec![registry.address(EXTERNAL_POSITION_MANAGER_KEY)?],
    );
    assert_eq!(chain.registered_labels(), vec!["COMPOUND_DEBT"]);
    assert_eq!(
        chain.type_implementation(0),
        Some((
            registry.address(COMPOUND_DEBT_POSITION_LIB_KEY)?,
            registry.address(COMPOUND_DEBT_POSITION_PARSER_KEY)?,
        )),
    );
    assert_eq!(
        chain.current_fund_deployer(),
        Some(registry.address(FUND_DEPLOYER_KEY)?),
    );
    Ok(())
}

#[tokio::test]
async fn test_cyclic_graph_deploys_nothing() -> Result<()> {
    let chain = Arc::new(SimulatedChain::new());

    let sequencer = sequencer_of(vec![
        deploy_step(&chain, "a").depends_on(&["b"]),
        deploy_step(&chain, "b").depends_on(&["a"]),
    ])?;

    let mut registry = DeploymentRegistry::new();
    let err = sequencer
        .run(&devnet_config(), &mut registry, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ScriptError::CyclicDependency(_)));
    assert_eq!(chain.deployment_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_retry_after_failure_reuses_deployments() -> Result<()> {
    let chain = Arc::new(SimulatedChain::new());
    let dir = TempDir::new("deployments")?;
    let path = dir.path().join("deployments.json");

    // First run: the fund deployer step fails after the dispatcher and
    // factory are deployed
    let sequencer = sequencer_of(vec![
        deploy_step(&chain, DISPATCHER_KEY),
        deploy_step(&chain, EXTERNAL_POSITION_FACTORY_KEY).depends_on(&[DISPATCHER_KEY]),
        failing_step(FUND_DEPLOYER_KEY),
    ])?;

    let mut registry = DeploymentRegistry::load(&path)?;
    let err = sequencer
        .run(&devnet_config(), &mut registry, Some(&path))
        .await
        .unwrap_err();
    assert!(matches!(err, ScriptError::ContractDeployment(_)));

    let deployed_before_retry = chain.deployment_count();
    assert_eq!(deployed_before_retry, 2);

    // Retry with the step fixed: the completed deployments are reused
    // from the persisted registry, not re-deployed
    let sequencer = sequencer_of(vec![
        deploy_step(&chain, DISPATCHER_KEY),
        deploy_step(&chain, EXTERNAL_POSITION_FACTORY_KEY).depends_on(&[DISPATCHER_KEY]),
        deploy_step(&chain, FUND_DEPLOYER_KEY).depends_on(&[DISPATCHER_KEY]),
    ])?;

    let mut registry = DeploymentRegistry::load(&path)?;
    let dispatcher_before = registry.address(DISPATCHER_KEY)?;

    let report = sequencer
        .run(&devnet_config(), &mut registry, Some(&path))
        .await?;

    assert_eq!(
        report.reused,
        vec![DISPATCHER_KEY, EXTERNAL_POSITION_FACTORY_KEY],
    );
    assert_eq!(report.executed, vec![FUND_DEPLOYER_KEY]);
    assert_eq!(registry.address(DISPATCHER_KEY)?, dispatcher_before);
    // Exactly one new contract was deployed on retry
    assert_eq!(chain.deployment_count(), deployed_before_retry + 1);
    Ok(())
}

#[tokio::test]
async fn test_publish_tolerates_absent_optional_steps() -> Result<()> {
    // The compound parser step is skipped on this network; publishing
    // still succeeds and simply registers no position types
    let chain = Arc::new(SimulatedChain::new());

    let sequencer = sequencer_of(vec![
        deploy_step(&chain, DISPATCHER_KEY),
        deploy_step(&chain, EXTERNAL_POSITION_FACTORY_KEY).depends_on(&[DISPATCHER_KEY]),
        deploy_step(&chain, FUND_DEPLOYER_KEY).depends_on(&[DISPATCHER_KEY]),
        deploy_step(&chain, EXTERNAL_POSITION_MANAGER_KEY)
            .depends_on(&[FUND_DEPLOYER_KEY, EXTERNAL_POSITION_FACTORY_KEY]),
        deploy_step(&chain, COMPOUND_DEBT_POSITION_LIB_KEY),
        deploy_step(&chain, COMPOUND_DEBT_POSITION_PARSER_KEY).skip_if(|_net| true),
        publish_step(&chain),
    ])?;

    let mut registry = DeploymentRegistry::new();
    sequencer.run(&devnet_config(), &mut registry, None).await?;

    assert!(chain.is_live());
    assert!(chain.registered_labels().is_empty());
    Ok(())
}
