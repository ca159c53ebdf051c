//! Type definitions used throughout the scripts

use std::{fs::File, io::Read, path::PathBuf};

use alloy_primitives::{Address, B256};
use serde::Deserialize;

use crate::{constants::MAINNET_CHAIN_ID, errors::ScriptError};

/// The identity of the network a release is deployed to.
///
/// Skip predicates and the gates on irreversible actions are evaluated
/// against this context.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkContext {
    /// The chain ID of the network
    pub chain_id: u64,
    /// Whether this is a live (production) network.
    ///
    /// On live networks, publishing the release is a manual council
    /// action rather than part of the deploy run.
    pub live: bool,
}

impl NetworkContext {
    /// Whether the network is Ethereum mainnet
    pub fn is_mainnet(&self) -> bool {
        self.chain_id == MAINNET_CHAIN_ID
    }
}

/// Immutable per-network release configuration.
///
/// Resolved once at run start and never mutated; read-only input to
/// every deployment step.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// The network the release targets
    pub network: NetworkContext,
    /// The directory containing compilation artifacts for the release contracts
    pub artifacts_dir: PathBuf,
    /// The address of the wrapped native asset
    pub weth: Address,
    /// The address of the Compound comptroller, used by the
    /// Compound debt position contracts
    pub compound_comptroller: Address,
    /// The address of the Uniswap V3 nonfungible position manager,
    /// used by the Uniswap V3 liquidity position contracts
    pub uniswap_v3_nonfungible_position_manager: Address,
}

impl ReleaseConfig {
    /// Load the release config from a JSON file
    pub fn from_file(path: &str) -> Result<Self, ScriptError> {
        let mut file_contents = String::new();
        File::open(path)
            .map_err(|e| ScriptError::ReadConfig(e.to_string()))?
            .read_to_string(&mut file_contents)
            .map_err(|e| ScriptError::ReadConfig(e.to_string()))?;

        serde_json::from_str(&file_contents).map_err(|e| ScriptError::ReadConfig(e.to_string()))
    }
}

/// A handle to a deployed contract, as recorded in the deployment registry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractHandle {
    /// The address of the deployed contract
    pub address: Address,
    /// The hash of the deployment transaction.
    ///
    /// Only known for contracts deployed in the current run; handles
    /// loaded from a deployments file carry the address alone.
    pub transaction_hash: Option<B256>,
}

impl ContractHandle {
    /// A handle known only by its address
    pub fn from_address(address: Address) -> Self {
        Self {
            address,
            transaction_hash: None,
        }
    }
}

/// The result of running a deployment step's action
#[derive(Clone, Copy, Debug)]
pub enum StepOutput {
    /// The step deployed (or located) a contract
    Contract(ContractHandle),
    /// The step performed side-effecting contract calls only
    SideEffect,
}
