//! The deployment registry: a mapping from step name to the handle of
//! the contract it deployed.
//!
//! The registry is append-only during a single run and is persisted to
//! a `deployments.json` file after each recorded deployment, so that a
//! failed run leaves completed deployments on disk for an idempotent
//! retry.

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy_primitives::Address;
use serde_json::{json, Value};

use crate::{
    constants::DEPLOYMENTS_KEY,
    errors::ScriptError,
    types::ContractHandle,
};

/// The registry of contract handles produced by a deployment run.
///
/// Each entry is written once by the step that owns its name and is
/// read-only to every other step.
#[derive(Clone, Debug, Default)]
pub struct DeploymentRegistry {
    /// The recorded handles, keyed by step name
    entries: BTreeMap<String, ContractHandle>,
}

impl DeploymentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a deployments file, returning an empty
    /// registry if the file does not exist yet
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let file_contents =
            fs::read_to_string(path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
        let parsed_json: Value = serde_json::from_str(&file_contents)
            .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

        let deployments = parsed_json
            .get(DEPLOYMENTS_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ScriptError::ReadDeployments(
                    "could not parse deployments object from deployments file".to_string(),
                )
            })?;

        let mut entries = BTreeMap::new();
        for (name, addr) in deployments {
            let addr_str = addr.as_str().ok_or_else(|| {
                ScriptError::ReadDeployments(format!(
                    "could not parse contract address for `{name}` from deployments file"
                ))
            })?;
            let address = Address::from_str(addr_str)
                .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

            entries.insert(name.clone(), ContractHandle::from_address(address));
        }

        Ok(Self { entries })
    }

    /// Write the registry to a deployments file
    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        let mut deployments = serde_json::Map::new();
        for (name, handle) in &self.entries {
            deployments.insert(name.clone(), json!(format!("{:#x}", handle.address)));
        }

        let contents = json!({ DEPLOYMENTS_KEY: deployments });
        let serialized = serde_json::to_string_pretty(&contents)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, serialized).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        Ok(())
    }

    /// Get the handle recorded for the given step name
    pub fn get(&self, name: &str) -> Result<&ContractHandle, ScriptError> {
        self.entries
            .get(name)
            .ok_or_else(|| ScriptError::MissingDependency(name.to_string()))
    }

    /// Get the address recorded for the given step name
    pub fn address(&self, name: &str) -> Result<Address, ScriptError> {
        self.get(name).map(|handle| handle.address)
    }

    /// Whether a handle is recorded for the given step name
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Record a handle under the given step name.
    ///
    /// The registry is append-only: recording over an existing entry
    /// is an error.
    pub fn record(&mut self, name: &str, handle: ContractHandle) -> Result<(), ScriptError> {
        if self.entries.contains_key(name) {
            return Err(ScriptError::DuplicateStep(name.to_string()));
        }

        self.entries.insert(name.to_string(), handle);
        Ok(())
    }
}
