//! Definitions of errors that can occur during the execution of the release deployment scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the release deployment scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading the per-network release config file
    ReadConfig(String),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// Two deployment steps were declared under the same name
    DuplicateStep(String),
    /// The deployment step graph contains a dependency cycle
    CyclicDependency(String),
    /// A step or call references a dependency that was never deployed
    /// (skipped or failed) in this run
    MissingDependency(String),
    /// A privileged contract call rejected the operation.
    ///
    /// Carries the name of the failing call and the revert reason.
    Revert(String, String),
    /// A positional assumption about registered-type ordering was violated
    IndexMismatch(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadConfig(s) => write!(f, "error reading release config: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => {
                write!(f, "error initializing client: {}", s)
            }
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::DuplicateStep(s) => write!(f, "duplicate deployment step: {}", s),
            ScriptError::CyclicDependency(s) => {
                write!(f, "cyclic dependency among deployment steps: {}", s)
            }
            ScriptError::MissingDependency(s) => write!(f, "missing dependency: {}", s),
            ScriptError::Revert(call, reason) => {
                write!(f, "call `{}` reverted: {}", call, reason)
            }
            ScriptError::IndexMismatch(s) => {
                write!(f, "position type index mismatch: {}", s)
            }
        }
    }
}

impl Error for ScriptError {}
