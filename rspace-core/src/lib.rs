#![doc = "rspace-core: core logic library for the RSpace ELN command-line client."]

//! This crate contains the data model, the client trait, and every pipeline
//! the CLI runs: local file scanning, sequential bulk submission with
//! interrupt-safe reporting, the user-creation worker pool, and output
//! formatting. HTTP transport lives in the CLI crate.
//!
//! # Usage
//! Depend on this crate for anything that must be testable without a server;
//! drive it with `contract::MockElnClient` in tests.

pub mod bulk;
pub mod contract;
pub mod format;
pub mod interrupt;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod scanner;
pub mod summary;
pub mod users;
