//! Post-deployment wiring: the fixed sequence of cross-contract calls
//! that makes a deployed release live.
//!
//! Every call here is a privileged, state-mutating transaction that may
//! revert; a revert aborts the remaining sequence and nothing is rolled
//! back. Re-running against partially wired state is detected on chain
//! (release liveness, registered-type count) rather than in process.

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::info;

use crate::{
    constants::PositionTypeDescriptor,
    errors::ScriptError,
    registry::DeploymentRegistry,
};

/// The privileged administrative surface of the release contracts.
///
/// Implementations translate each method into a transaction against the
/// fund deployer, external position factory, external position manager,
/// or dispatcher, whichever the method addresses.
#[async_trait]
pub trait ReleaseContracts {
    /// Set the release live on the fund deployer, renouncing further
    /// administrative changes. Irreversible; reverts if already live.
    async fn set_release_live(&self) -> Result<(), ScriptError>;

    /// Whether the fund deployer's release is live
    async fn is_release_live(&self) -> Result<bool, ScriptError>;

    /// Authorize an account to deploy positions through the factory
    async fn add_position_deployer(&self, deployer: Address) -> Result<(), ScriptError>;

    /// Register new position type labels on the factory, in order.
    /// Reverts on a duplicate label.
    async fn add_new_position_types(&self, labels: &[String]) -> Result<(), ScriptError>;

    /// The number of position types registered on the factory
    async fn position_type_count(&self) -> Result<u64, ScriptError>;

    /// The factory-assigned type ID for the given label, if registered
    async fn position_type_id(&self, label: &str) -> Result<Option<u64>, ScriptError>;

    /// Attach a (library, parser) implementation pair to the position
    /// type with the given assigned ID
    async fn update_position_type_info(
        &self,
        type_id: u64,
        lib: Address,
        parser: Address,
    ) -> Result<(), ScriptError>;

    /// Point the dispatcher at the given fund deployer, making the
    /// release live for end users
    async fn set_current_fund_deployer(&self, fund_deployer: Address) -> Result<(), ScriptError>;
}

/// The recorded presence outcome for one declared external position type.
///
/// Presence is recorded once, when the wiring plan is built; later
/// lookups use the recorded outcome rather than re-deriving it.
#[derive(Clone, Debug)]
pub struct PositionTypeRegistration {
    /// The stable position type label
    pub label: String,
    /// The address of the position's library contract, if deployed
    pub lib: Option<Address>,
    /// The address of the position's parser contract, if deployed
    pub parser: Option<Address>,
}

impl PositionTypeRegistration {
    /// The (library, parser) implementation pair, present only when
    /// both contracts were deployed
    pub fn implementation(&self) -> Option<(Address, Address)> {
        self.lib.zip(self.parser)
    }
}

/// The inputs to one publish-release wiring pass
#[derive(Clone, Debug)]
pub struct WiringPlan {
    /// The address of the new fund deployer
    pub fund_deployer: Address,
    /// The address of the external position manager, to be authorized
    /// as a position deployer on the factory
    pub external_position_manager: Address,
    /// The declared position types, in registration order
    pub position_types: Vec<PositionTypeRegistration>,
}

impl WiringPlan {
    /// Build a wiring plan from the deployment registry, recording the
    /// presence of each declared position type's contracts
    pub fn from_registry(
        registry: &DeploymentRegistry,
        declared: &[PositionTypeDescriptor],
        fund_deployer: Address,
        external_position_manager: Address,
    ) -> Self {
        let position_types = declared
            .iter()
            .map(|descriptor| PositionTypeRegistration {
                label: descriptor.label.to_string(),
                lib: registry.address(descriptor.lib_step).ok(),
                parser: registry.address(descriptor.parser_step).ok(),
            })
            .collect();

        Self {
            fund_deployer,
            external_position_manager,
            position_types,
        }
    }
}

/// A probe of the on-chain wiring state, used to detect partial
/// completion before re-issuing calls
#[derive(Clone, Copy, Debug)]
pub struct ReleaseStatus {
    /// Whether the fund deployer's release is live
    pub live: bool,
    /// The number of position types registered on the factory
    pub position_type_count: u64,
}

/// Read the current wiring state of the release contracts
pub async fn release_status<C: ReleaseContracts>(chain: &C) -> Result<ReleaseStatus, ScriptError> {
    Ok(ReleaseStatus {
        live: chain.is_release_live().await?,
        position_type_count: chain.position_type_count().await?,
    })
}

/// Execute the post-deployment wiring sequence.
///
/// Registers exactly the declared position types whose implementation
/// pair is present, then attaches each pair at the type ID the factory
/// actually assigned, looked up by label. Positional IDs are never
/// assumed: conditional skipping of absent types must not shift which
/// pair lands at which ID.
pub async fn publish_release<C: ReleaseContracts>(
    chain: &C,
    plan: &WiringPlan,
) -> Result<(), ScriptError> {
    let count_before = chain.position_type_count().await?;

    // Set the release live, renouncing ownership
    info!("setting release live on the fund deployer");
    chain.set_release_live().await?;

    // Authorize the external position manager as a deployer on the factory
    info!(
        "authorizing external position manager {:#x} as a position deployer",
        plan.external_position_manager
    );
    chain
        .add_position_deployer(plan.external_position_manager)
        .await?;

    // Register the position types whose implementation pair is present
    let present: Vec<(&str, Address, Address)> = plan
        .position_types
        .iter()
        .filter_map(|registration| {
            registration
                .implementation()
                .map(|(lib, parser)| (registration.label.as_str(), lib, parser))
        })
        .collect();

    if !present.is_empty() {
        let labels: Vec<String> = present
            .iter()
            .map(|(label, _, _)| label.to_string())
            .collect();
        info!("registering position types: {}", labels.join(", "));
        chain.add_new_position_types(&labels).await?;
    }

    let count_after = chain.position_type_count().await?;
    if count_after.saturating_sub(count_before) != present.len() as u64 {
        return Err(ScriptError::IndexMismatch(format!(
            "registered {} position types but the factory's type count moved from {} to {}",
            present.len(),
            count_before,
            count_after
        )));
    }

    // Attach each (library, parser) pair at the assigned type ID
    for (label, lib, parser) in present {
        let type_id = chain.position_type_id(label).await?.ok_or_else(|| {
            ScriptError::IndexMismatch(format!(
                "label `{label}` not found on the factory after registration"
            ))
        })?;

        info!("attaching implementation pair for `{label}` at type id {type_id}");
        chain
            .update_position_type_info(type_id, lib, parser)
            .await?;
    }

    // Point the dispatcher at the new fund deployer
    info!(
        "setting current fund deployer to {:#x}",
        plan.fund_deployer
    );
    chain.set_current_fund_deployer(plan.fund_deployer).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy_primitives::Address;
    use async_trait::async_trait;

    use crate::errors::ScriptError;

    use super::{publish_release, PositionTypeRegistration, ReleaseContracts, WiringPlan};

    /// A chain whose factory misreports its registered position types,
    /// either by under-counting them or by failing label lookups
    struct MisreportingChain {
        /// The labels actually registered on the factory
        labels: Mutex<Vec<String>>,
        /// Whether the factory under-reports its type count by one
        under_report_count: bool,
        /// Whether label lookups come back empty
        lose_labels: bool,
    }

    impl MisreportingChain {
        /// A fresh chain with the given misbehaviors
        fn new(under_report_count: bool, lose_labels: bool) -> Self {
            Self {
                labels: Mutex::new(Vec::new()),
                under_report_count,
                lose_labels,
            }
        }
    }

    #[async_trait]
    impl ReleaseContracts for MisreportingChain {
        async fn set_release_live(&self) -> Result<(), ScriptError> {
            Ok(())
        }

        async fn is_release_live(&self) -> Result<bool, ScriptError> {
            Ok(true)
        }

        async fn add_position_deployer(&self, _deployer: Address) -> Result<(), ScriptError> {
            Ok(())
        }

        async fn add_new_position_types(&self, labels: &[String]) -> Result<(), ScriptError> {
            self.labels.lock().unwrap().extend(labels.iter().cloned());
            Ok(())
        }

        async fn position_type_count(&self) -> Result<u64, ScriptError> {
            let count = self.labels.lock().unwrap().len() as u64;
            if self.under_report_count {
                Ok(count.saturating_sub(1))
            } else {
                Ok(count)
            }
        }

        async fn position_type_id(&self, label: &str) -> Result<Option<u64>, ScriptError> {
            if self.lose_labels {
                return Ok(None);
            }

            Ok(self
                .labels
                .lock()
                .unwrap()
                .iter()
                .position(|l| l == label)
                .map(|i| i as u64))
        }

        async fn update_position_type_info(
            &self,
            _type_id: u64,
            _lib: Address,
            _parser: Address,
        ) -> Result<(), ScriptError> {
            Ok(())
        }

        async fn set_current_fund_deployer(
            &self,
            _fund_deployer: Address,
        ) -> Result<(), ScriptError> {
            Ok(())
        }
    }

    /// A test address with the given low byte
    fn addr(low_byte: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = low_byte;
        Address::from(bytes)
    }

    /// A plan declaring a single fully-deployed position type
    fn single_type_plan() -> WiringPlan {
        WiringPlan {
            fund_deployer: addr(1),
            external_position_manager: addr(2),
            position_types: vec![PositionTypeRegistration {
                label: "COMPOUND_DEBT".to_string(),
                lib: Some(addr(3)),
                parser: Some(addr(4)),
            }],
        }
    }

    #[tokio::test]
    async fn test_under_reported_type_count_rejected() {
        // The factory's type count does not move by the number of
        // labels submitted
        let chain = MisreportingChain::new(true, false);
        let err = publish_release(&chain, &single_type_plan())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::IndexMismatch(_)));
    }

    #[tokio::test]
    async fn test_label_missing_after_registration_rejected() {
        // The count moves correctly but the registered label cannot be
        // found, so no type ID can be attached to
        let chain = MisreportingChain::new(false, true);
        let err = publish_release(&chain, &single_type_plan())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::IndexMismatch(_)));
    }
}
