//! An in-memory simulated chain standing in for a devnet node.
//!
//! Implements the release contracts' administrative surface with the
//! same revert behavior the on-chain contracts exhibit: an already-live
//! release, a duplicate position type label, or an unprivileged caller
//! all reject the call and leave state untouched.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use alloy_primitives::Address;
use async_trait::async_trait;
use scripts::{errors::ScriptError, types::ContractHandle, wiring::ReleaseContracts};

/// The chain state mutated by privileged calls
#[derive(Default)]
struct ChainState {
    /// Whether the fund deployer's release is live
    release_live: bool,
    /// The accounts authorized as position deployers on the factory
    position_deployers: Vec<Address>,
    /// The registered position type labels; a label's index is its
    /// factory-assigned type ID
    position_types: Vec<String>,
    /// The (library, parser) pair attached to each type ID
    type_info: HashMap<u64, (Address, Address)>,
    /// The fund deployer the dispatcher currently points at
    current_fund_deployer: Option<Address>,
    /// The number of contracts deployed so far
    deployed: u64,
}

/// An in-memory chain hosting the release contracts
pub struct SimulatedChain {
    /// The chain state
    state: Mutex<ChainState>,
    /// Whether the calling account holds the required privileged roles
    privileged: bool,
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChain {
    /// A fresh chain whose caller holds all privileged roles
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            privileged: true,
        }
    }

    /// A fresh chain whose caller holds no privileged roles
    pub fn unprivileged() -> Self {
        Self {
            privileged: false,
            ..Self::new()
        }
    }

    /// Register a position type that predates this release, so that
    /// newly assigned type IDs do not start at zero
    pub fn seed_position_type(&self, label: &str) {
        self.state
            .lock()
            .unwrap()
            .position_types
            .push(label.to_string());
    }

    /// Deploy a contract, minting a deterministic address
    pub fn deploy(&self, _name: &str) -> ContractHandle {
        let mut state = self.state.lock().unwrap();
        state.deployed += 1;

        let mut bytes = [0u8; 20];
        bytes[0] = 0xcc;
        bytes[12..20].copy_from_slice(&state.deployed.to_be_bytes());

        ContractHandle::from_address(Address::from(bytes))
    }

    /// The number of contracts deployed so far
    pub fn deployment_count(&self) -> u64 {
        self.state.lock().unwrap().deployed
    }

    /// Whether the release is live
    pub fn is_live(&self) -> bool {
        self.state.lock().unwrap().release_live
    }

    /// The accounts authorized as position deployers
    pub fn position_deployers(&self) -> Vec<Address> {
        self.state.lock().unwrap().position_deployers.clone()
    }

    /// The registered position type labels, in assignment order
    pub fn registered_labels(&self) -> Vec<String> {
        self.state.lock().unwrap().position_types.clone()
    }

    /// The implementation pair attached to the given type ID
    pub fn type_implementation(&self, type_id: u64) -> Option<(Address, Address)> {
        self.state.lock().unwrap().type_info.get(&type_id).copied()
    }

    /// The fund deployer the dispatcher currently points at
    pub fn current_fund_deployer(&self) -> Option<Address> {
        self.state.lock().unwrap().current_fund_deployer
    }

    /// Reject the call if the caller lacks the privileged role
    fn require_privileged(&self, call: &str) -> Result<(), ScriptError> {
        if !self.privileged {
            return Err(ScriptError::Revert(
                call.to_string(),
                "caller does not have the required role".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl ReleaseContracts for SimulatedChain {
    async fn set_release_live(&self) -> Result<(), ScriptError> {
        self.require_privileged("setReleaseLive")?;

        let mut state = self.state.lock().unwrap();
        if state.release_live {
            return Err(ScriptError::Revert(
                "setReleaseLive".to_string(),
                "release is already live".to_string(),
            ));
        }

        state.release_live = true;
        Ok(())
    }

    async fn is_release_live(&self) -> Result<bool, ScriptError> {
        Ok(self.state.lock().unwrap().release_live)
    }

    async fn add_position_deployer(&self, deployer: Address) -> Result<(), ScriptError> {
        self.require_privileged("addPositionDeployers")?;

        let mut state = self.state.lock().unwrap();
        if state.position_deployers.contains(&deployer) {
            return Err(ScriptError::Revert(
                "addPositionDeployers".to_string(),
                "account is already a position deployer".to_string(),
            ));
        }

        state.position_deployers.push(deployer);
        Ok(())
    }

    async fn add_new_position_types(&self, labels: &[String]) -> Result<(), ScriptError> {
        self.require_privileged("addNewPositionTypes")?;

        let mut state = self.state.lock().unwrap();

        // Validate the whole batch before committing any of it, since a
        // revert leaves no labels registered
        for (i, label) in labels.iter().enumerate() {
            if state.position_types.contains(label) || labels[..i].contains(label) {
                return Err(ScriptError::Revert(
                    "addNewPositionTypes".to_string(),
                    format!("position type `{label}` already exists"),
                ));
            }
        }

        state.position_types.extend(labels.iter().cloned());
        Ok(())
    }

    async fn position_type_count(&self) -> Result<u64, ScriptError> {
        Ok(self.state.lock().unwrap().position_types.len() as u64)
    }

    async fn position_type_id(&self, label: &str) -> Result<Option<u64>, ScriptError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .position_types
            .iter()
            .position(|l| l == label)
            .map(|i| i as u64))
    }

    async fn update_position_type_info(
        &self,
        type_id: u64,
        lib: Address,
        parser: Address,
    ) -> Result<(), ScriptError> {
        self.require_privileged("updateExternalPositionTypesInfo")?;

        let mut state = self.state.lock().unwrap();
        if type_id >= state.position_types.len() as u64 {
            return Err(ScriptError::Revert(
                "updateExternalPositionTypesInfo".to_string(),
                format!("position type {type_id} does not exist"),
            ));
        }

        state.type_info.insert(type_id, (lib, parser));
        Ok(())
    }

    async fn set_current_fund_deployer(&self, fund_deployer: Address) -> Result<(), ScriptError> {
        self.require_privileged("setCurrentFundDeployer")?;

        self.state.lock().unwrap().current_fund_deployer = Some(fund_deployer);
        Ok(())
    }
}
