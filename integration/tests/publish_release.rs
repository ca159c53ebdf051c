//! Tests for the post-deployment wiring sequence against the simulated chain

use alloy_primitives::Address;
use eyre::Result;
use integration::chain::SimulatedChain;
use scripts::{
    errors::ScriptError,
    wiring::{
        publish_release, release_status, PositionTypeRegistration, ReleaseContracts, WiringPlan,
    },
};

/// A test address with the given low byte
fn addr(low_byte: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = low_byte;
    Address::from(bytes)
}

/// A declared position type with the given implementation contracts
fn declared(label: &str, lib: Option<Address>, parser: Option<Address>) -> PositionTypeRegistration {
    PositionTypeRegistration {
        label: label.to_string(),
        lib,
        parser,
    }
}

/// A wiring plan over the given position types
fn plan_with_types(position_types: Vec<PositionTypeRegistration>) -> WiringPlan {
    WiringPlan {
        fund_deployer: addr(0xfd),
        external_position_manager: addr(0xe9),
        position_types,
    }
}

#[tokio::test]
async fn test_publish_wires_release() -> Result<()> {
    let chain = SimulatedChain::new();
    let plan = plan_with_types(vec![
        declared("COMPOUND_DEBT", Some(addr(1)), Some(addr(2))),
        declared("UNISWAP_V3_LIQUIDITY", Some(addr(3)), Some(addr(4))),
    ]);

    publish_release(&chain, &plan).await?;

    assert!(chain.is_live());
    assert_eq!(chain.position_deployers(), vec![addr(0xe9)]);
    assert_eq!(
        chain.registered_labels(),
        vec!["COMPOUND_DEBT", "UNISWAP_V3_LIQUIDITY"],
    );
    assert_eq!(chain.type_implementation(0), Some((addr(1), addr(2))));
    assert_eq!(chain.type_implementation(1), Some((addr(3), addr(4))));
    assert_eq!(chain.current_fund_deployer(), Some(addr(0xfd)));
    Ok(())
}

#[tokio::test]
async fn test_partial_position_types_registered_by_label() -> Result<()> {
    // Two optional position types declared; the first is missing its
    // parser, so only the second is registered. Its pair must land at
    // the ID the factory actually assigned it, not at its declaration
    // position.
    let chain = SimulatedChain::new();
    let plan = plan_with_types(vec![
        declared("COMPOUND_DEBT", Some(addr(1)), None),
        declared("UNISWAP_V3_LIQUIDITY", Some(addr(3)), Some(addr(4))),
    ]);

    publish_release(&chain, &plan).await?;

    assert_eq!(chain.registered_labels(), vec!["UNISWAP_V3_LIQUIDITY"]);
    assert_eq!(chain.type_implementation(0), Some((addr(3), addr(4))));
    assert_eq!(chain.type_implementation(1), None);
    Ok(())
}

#[tokio::test]
async fn test_assigned_ids_offset_by_preexisting_types() -> Result<()> {
    // The factory persists across releases; earlier releases already
    // registered two types, so this release's IDs start at 2
    let chain = SimulatedChain::new();
    chain.seed_position_type("AAVE_DEBT");
    chain.seed_position_type("CONVEX_VOTING");

    let plan = plan_with_types(vec![
        declared("COMPOUND_DEBT", Some(addr(1)), Some(addr(2))),
        declared("UNISWAP_V3_LIQUIDITY", Some(addr(3)), Some(addr(4))),
    ]);

    publish_release(&chain, &plan).await?;

    assert_eq!(chain.type_implementation(2), Some((addr(1), addr(2))));
    assert_eq!(chain.type_implementation(3), Some((addr(3), addr(4))));
    // The pre-existing types are untouched
    assert_eq!(chain.type_implementation(0), None);
    assert_eq!(chain.type_implementation(1), None);
    Ok(())
}

#[tokio::test]
async fn test_no_position_types_present() -> Result<()> {
    let chain = SimulatedChain::new();
    let plan = plan_with_types(vec![
        declared("COMPOUND_DEBT", None, None),
        declared("UNISWAP_V3_LIQUIDITY", Some(addr(3)), None),
    ]);

    publish_release(&chain, &plan).await?;

    assert!(chain.is_live());
    assert!(chain.registered_labels().is_empty());
    assert_eq!(chain.current_fund_deployer(), Some(addr(0xfd)));
    Ok(())
}

#[tokio::test]
async fn test_republish_reverts_without_state_change() -> Result<()> {
    let chain = SimulatedChain::new();
    let plan = plan_with_types(vec![declared(
        "COMPOUND_DEBT",
        Some(addr(1)),
        Some(addr(2)),
    )]);

    publish_release(&chain, &plan).await?;

    // The second invocation's activation call reverts; prior state is
    // left in place
    let err = publish_release(&chain, &plan).await.unwrap_err();
    match err {
        ScriptError::Revert(call, _reason) => assert_eq!(call, "setReleaseLive"),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(chain.registered_labels(), vec!["COMPOUND_DEBT"]);
    assert_eq!(chain.position_deployers(), vec![addr(0xe9)]);
    assert_eq!(chain.current_fund_deployer(), Some(addr(0xfd)));
    Ok(())
}

#[tokio::test]
async fn test_unprivileged_caller_reverts() -> Result<()> {
    let chain = SimulatedChain::unprivileged();
    let plan = plan_with_types(vec![declared(
        "COMPOUND_DEBT",
        Some(addr(1)),
        Some(addr(2)),
    )]);

    let err = publish_release(&chain, &plan).await.unwrap_err();
    assert!(matches!(err, ScriptError::Revert(..)));

    assert!(!chain.is_live());
    assert!(chain.position_deployers().is_empty());
    assert!(chain.registered_labels().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_label_aborts_remaining_sequence() -> Result<()> {
    // An earlier (partial) wiring pass already registered the label
    let chain = SimulatedChain::new();
    chain.seed_position_type("COMPOUND_DEBT");

    let plan = plan_with_types(vec![declared(
        "COMPOUND_DEBT",
        Some(addr(1)),
        Some(addr(2)),
    )]);

    let err = publish_release(&chain, &plan).await.unwrap_err();
    match err {
        ScriptError::Revert(call, _reason) => assert_eq!(call, "addNewPositionTypes"),
        other => panic!("unexpected error: {other}"),
    }

    // The wiring aborted before attaching the pair or activating the
    // dispatcher; the status probe shows the partial completion
    assert_eq!(chain.type_implementation(0), None);
    assert_eq!(chain.current_fund_deployer(), None);

    let status = release_status(&chain).await?;
    assert!(status.live);
    assert_eq!(status.position_type_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_rejected_label_batch_registers_nothing() -> Result<()> {
    // One label of the batch duplicates a pre-existing type; the revert
    // leaves the earlier labels of the same batch unregistered too
    let chain = SimulatedChain::new();
    chain.seed_position_type("COMPOUND_DEBT");

    let labels = vec![
        "UNISWAP_V3_LIQUIDITY".to_string(),
        "COMPOUND_DEBT".to_string(),
    ];
    let err = chain.add_new_position_types(&labels).await.unwrap_err();
    assert!(matches!(err, ScriptError::Revert(..)));

    assert_eq!(chain.registered_labels(), vec!["COMPOUND_DEBT"]);
    Ok(())
}
