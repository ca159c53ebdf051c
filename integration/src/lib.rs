//! Integration tests for the release deploy scripts.
//!
//! These run against an in-memory simulated chain rather than a devnet
//! node, so the full deployment and wiring sequence is exercised under
//! `cargo test` with no external processes.

pub mod chain;
pub mod steps;
