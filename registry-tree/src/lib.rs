//! Registry tree for development groups.
//!
//! This crate contains:
//! - The snapshot identifier reducer mapping `(group id, timestamp)` into BN254::Fr.
//! - A fixed-height key/value Poseidon Merkle tree, used for both the per-group accounts
//!   trees and the registry tree over their roots.
//! - The reader computing the registry root for a set of groups, and the Solidity
//!   configuration tuple that carries it on-chain.

pub mod accounts;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod hash;
pub mod reader;
pub mod registry;
pub mod solidity;
pub mod tree;
pub mod types;

pub use error::{RegistryError, Result};
pub use reader::{compute_registry_root, RegistryTreeReader};
