//! Utilities for the deploy scripts: RPC client setup, artifact
//! deployment, and the on-chain implementation of the release
//! contracts' administrative surface.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    constants::{
        ARTIFACT_EXTENSION, DISPATCHER_KEY, EXTERNAL_POSITION_FACTORY_KEY,
        EXTERNAL_POSITION_MANAGER_KEY, FUND_DEPLOYER_KEY,
    },
    errors::ScriptError,
    registry::DeploymentRegistry,
    solidity::{
        addNewPositionTypesCall, addPositionDeployersCall, getLabelForPositionTypeCall,
        getPositionTypeCounterCall, getReleaseIsLiveCall, setCurrentFundDeployerCall,
        setReleaseLiveCall, updateExternalPositionTypesInfoCall,
    },
    types::ContractHandle,
    wiring::ReleaseContracts,
};

/// Set up an HTTP provider with a local signing wallet attached
pub fn setup_provider(
    priv_key: &str,
    rpc_url: &str,
) -> Result<impl Provider + Clone, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let wallet = EthereumWallet::from(signer);
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    Ok(ProviderBuilder::new().wallet(wallet).on_http(url))
}

/// A compilation artifact for a release contract
#[derive(Deserialize)]
struct Artifact {
    /// The hex-encoded creation bytecode of the contract
    bytecode: String,
}

/// Read a contract's creation bytecode from its compilation artifact
pub fn read_artifact(artifacts_dir: &Path, contract_name: &str) -> Result<Vec<u8>, ScriptError> {
    let path = artifacts_dir
        .join(contract_name)
        .with_extension(ARTIFACT_EXTENSION);
    let contents = fs::read_to_string(&path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
    let artifact: Artifact = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    let bytecode = artifact
        .bytecode
        .strip_prefix("0x")
        .unwrap_or(&artifact.bytecode);

    hex::decode(bytecode).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
}

/// Deploy a contract from its creation bytecode, awaiting inclusion of
/// the deployment transaction
pub async fn deploy_contract<P: Provider>(
    provider: &P,
    mut bytecode: Vec<u8>,
    constructor_args: Vec<u8>,
) -> Result<ContractHandle, ScriptError> {
    bytecode.extend_from_slice(&constructor_args);

    let tx = TransactionRequest::default().with_deploy_code(bytecode);
    let pending = provider
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(
            "deployment transaction reverted".to_string(),
        ));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment("no contract address in receipt".to_string())
    })?;

    Ok(ContractHandle {
        address,
        transaction_hash: Some(receipt.transaction_hash),
    })
}

/// The on-chain release contracts, addressed through an RPC provider.
///
/// Each administrative call is submitted as a transaction and awaited
/// to completion; a failed receipt surfaces as a revert naming the call.
pub struct OnChainRelease<P> {
    /// The RPC provider
    provider: P,
    /// The address of the dispatcher contract
    dispatcher: Address,
    /// The address of the fund deployer contract
    fund_deployer: Address,
    /// The address of the external position factory contract
    external_position_factory: Address,
    /// The address of the external position manager contract
    external_position_manager: Address,
}

impl<P: Provider> OnChainRelease<P> {
    /// Address the release contracts recorded in the deployment registry
    pub fn from_registry(provider: P, registry: &DeploymentRegistry) -> Result<Self, ScriptError> {
        Ok(Self {
            dispatcher: registry.address(DISPATCHER_KEY)?,
            fund_deployer: registry.address(FUND_DEPLOYER_KEY)?,
            external_position_factory: registry.address(EXTERNAL_POSITION_FACTORY_KEY)?,
            external_position_manager: registry.address(EXTERNAL_POSITION_MANAGER_KEY)?,
            provider,
        })
    }

    /// Submit a state-mutating call and await its receipt
    async fn send(&self, to: Address, calldata: Vec<u8>, call: &str) -> Result<(), ScriptError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::Revert(call.to_string(), e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::Revert(
                call.to_string(),
                "transaction reverted".to_string(),
            ));
        }

        Ok(())
    }

    /// Issue a read-only call
    async fn read(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata);
        self.provider
            .call(&tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

#[async_trait]
impl<P: Provider> ReleaseContracts for OnChainRelease<P> {
    async fn set_release_live(&self) -> Result<(), ScriptError> {
        let calldata = setReleaseLiveCall {}.abi_encode();
        self.send(self.fund_deployer, calldata, "setReleaseLive")
            .await
    }

    async fn is_release_live(&self) -> Result<bool, ScriptError> {
        let calldata = getReleaseIsLiveCall {}.abi_encode();
        let data = self.read(self.fund_deployer, calldata).await?;
        let ret = getReleaseIsLiveCall::abi_decode_returns(&data, true)
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(ret.isLive)
    }

    async fn add_position_deployer(&self, deployer: Address) -> Result<(), ScriptError> {
        let calldata = addPositionDeployersCall {
            accounts: vec![deployer],
        }
        .abi_encode();
        self.send(
            self.external_position_factory,
            calldata,
            "addPositionDeployers",
        )
        .await
    }

    async fn add_new_position_types(&self, labels: &[String]) -> Result<(), ScriptError> {
        let calldata = addNewPositionTypesCall {
            labels: labels.to_vec(),
        }
        .abi_encode();
        self.send(
            self.external_position_factory,
            calldata,
            "addNewPositionTypes",
        )
        .await
    }

    async fn position_type_count(&self) -> Result<u64, ScriptError> {
        let calldata = getPositionTypeCounterCall {}.abi_encode();
        let data = self.read(self.external_position_factory, calldata).await?;
        let ret = getPositionTypeCounterCall::abi_decode_returns(&data, true)
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(ret.counter.to::<u64>())
    }

    async fn position_type_id(&self, label: &str) -> Result<Option<u64>, ScriptError> {
        // Scan the factory's registered labels; assigned IDs are dense
        // from zero in registration order
        let counter = self.position_type_count().await?;
        for type_id in 0..counter {
            let calldata = getLabelForPositionTypeCall {
                typeId: U256::from(type_id),
            }
            .abi_encode();
            let data = self.read(self.external_position_factory, calldata).await?;
            let ret = getLabelForPositionTypeCall::abi_decode_returns(&data, true)
                .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

            if ret.label == label {
                return Ok(Some(type_id));
            }
        }

        Ok(None)
    }

    async fn update_position_type_info(
        &self,
        type_id: u64,
        lib: Address,
        parser: Address,
    ) -> Result<(), ScriptError> {
        let calldata = updateExternalPositionTypesInfoCall {
            typeIds: vec![U256::from(type_id)],
            libs: vec![lib],
            parsers: vec![parser],
        }
        .abi_encode();
        self.send(
            self.external_position_manager,
            calldata,
            "updateExternalPositionTypesInfo",
        )
        .await
    }

    async fn set_current_fund_deployer(&self, fund_deployer: Address) -> Result<(), ScriptError> {
        let calldata = setCurrentFundDeployerCall {
            nextFundDeployer: fund_deployer,
        }
        .abi_encode();
        self.send(self.dispatcher, calldata, "setCurrentFundDeployer")
            .await
    }
}
