//! On-chain configuration tuple handed to the verifier contract.

use crate::config::AppConfig;
use crate::error::{RegistryError, Result};
use crate::field::{fr_to_be_bytes, FrHex};
use crate::reader::RegistryTreeReader;
use alloy_primitives::{FixedBytes, U256};
use alloy_sol_types::{sol, SolValue};
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

sol! {
    struct DevGroup {
        bytes16 groupId;
    }

    /// Parameter of the verifier contract's constructor.
    struct SismoConnectConfig {
        bytes16 appId;
        bool devMode;
        uint256 registryTreeRoot;
        DevGroup[] devGroups;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolidityConfig {
    pub app_id: [u8; 16],
    pub dev_mode: bool,
    pub registry_tree_root: Fr,
    pub dev_groups: Vec<[u8; 16]>,
}

/// JSON view of a [`SolidityConfig`] and its encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityConfigJson {
    pub app_id: String,
    pub dev_mode: bool,
    pub registry_tree_root: FrHex,
    pub dev_groups: Vec<String>,
    pub encoded: String,
}

fn parse_bytes16(field: &str, s: &str) -> Result<[u8; 16]> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| RegistryError::malformed(format!("{field} must be 0x-prefixed: {s:?}")))?;
    let bytes = hex::decode(digits).map_err(|e| RegistryError::malformed(format!("{field} {s:?}: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| RegistryError::malformed(format!("{field} must be 16 bytes, got {}", b.len())))
}

impl SolidityConfig {
    /// Compute the registry root of the config's custom groups and assemble the tuple.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let root = RegistryTreeReader::new(config.groups().to_vec()).registry_root()?;
        Self::with_root(config, root.to_fr())
    }

    /// Assemble the tuple around an already computed registry root.
    pub fn with_root(config: &AppConfig, registry_tree_root: Fr) -> Result<Self> {
        let app_id = parse_bytes16("appId", &config.app_id)?;

        let dev_groups = config
            .groups()
            .iter()
            .map(|g| g.parsed_group_id().map(u128::to_be_bytes))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            app_id,
            dev_mode: config.dev_mode(),
            registry_tree_root,
            dev_groups,
        })
    }

    pub fn to_sol(&self) -> SismoConnectConfig {
        SismoConnectConfig {
            appId: FixedBytes::from(self.app_id),
            devMode: self.dev_mode,
            registryTreeRoot: U256::from_be_bytes(fr_to_be_bytes(&self.registry_tree_root)),
            devGroups: self
                .dev_groups
                .iter()
                .map(|g| DevGroup { groupId: FixedBytes::from(*g) })
                .collect(),
        }
    }

    /// ABI encoding of the config as a single tuple parameter, `0x`-prefixed.
    pub fn encode(&self) -> String {
        format!("0x{}", hex::encode(self.to_sol().abi_encode()))
    }

    pub fn to_json(&self) -> SolidityConfigJson {
        SolidityConfigJson {
            app_id: format!("0x{}", hex::encode(self.app_id)),
            dev_mode: self.dev_mode,
            registry_tree_root: FrHex(self.registry_tree_root),
            dev_groups: self.dev_groups.iter().map(|g| format!("0x{}", hex::encode(g))).collect(),
            encoded: self.encode(),
        }
    }
}
