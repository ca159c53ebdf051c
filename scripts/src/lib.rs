//! Scripts for deploying and publishing releases of the fund protocol contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod registry;
pub mod release;
pub mod sequencer;
mod solidity;
pub mod types;
pub mod utils;
pub mod wiring;
