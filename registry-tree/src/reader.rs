//! Registry root service: turns a set of group definitions into the registry root.

use crate::accounts::{build_accounts_tree, AccountsTree};
use crate::error::{RegistryError, Result};
use crate::field::{parse_u128, FrHex};
use crate::hash::PoseidonHasher;
use crate::registry::{build_registry_tree, RegistryTree};
use crate::types::{GroupDefinition, NormalizedGroup};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-group outcome of a registry computation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Canonical `0x` + 32 hex digit group id.
    pub group_id: String,
    pub snapshot_id: FrHex,
    pub accounts_tree_root: FrHex,
    /// Leaves in the accounts tree, reserved leaf included.
    pub leaves: usize,
}

/// A computed registry: the second-level tree plus what went into it.
#[derive(Clone, Debug)]
pub struct Registry {
    pub tree: RegistryTree,
    pub groups: Vec<GroupSummary>,
}

impl Registry {
    pub fn root(&self) -> FrHex {
        self.tree.root_hex()
    }
}

/// Builds registry and accounts trees for a fixed list of groups.
///
/// Every tree shares the one borrowed hasher.
#[derive(Clone, Debug)]
pub struct RegistryTreeReader<'h> {
    groups: Vec<GroupDefinition>,
    hasher: &'h PoseidonHasher,
}

impl RegistryTreeReader<'static> {
    pub fn new(groups: Vec<GroupDefinition>) -> Self {
        Self::with_hasher(groups, PoseidonHasher::global())
    }
}

impl<'h> RegistryTreeReader<'h> {
    pub fn with_hasher(groups: Vec<GroupDefinition>, hasher: &'h PoseidonHasher) -> Self {
        Self { groups, hasher }
    }

    pub fn groups(&self) -> &[GroupDefinition] {
        &self.groups
    }

    /// Build every accounts tree (in parallel), then the registry tree over their roots.
    ///
    /// Fails as a whole if any group is malformed or overflows its tree.
    pub fn registry(&self) -> Result<Registry> {
        let built = self
            .groups
            .par_iter()
            .map(|group| {
                let normalized = group.normalize()?;
                let (root, tree) = build_accounts_tree(&normalized, self.hasher)?;
                Ok((normalized, root, tree.len()))
            })
            .collect::<Result<Vec<_>>>()?;

        let tree = build_registry_tree(
            built.iter().map(|(group, root, _)| (*root, group.snapshot_id)),
            self.hasher,
        )?;

        let groups = built
            .into_iter()
            .map(|(group, root, leaves)| GroupSummary {
                group_id: format!("{:#034x}", group.group_id),
                snapshot_id: FrHex(group.snapshot_id.0),
                accounts_tree_root: FrHex(root.0),
                leaves,
            })
            .collect();

        info!(groups = self.groups.len(), root = %tree.root_hex(), "computed registry root");

        Ok(Registry { tree, groups })
    }

    pub fn registry_tree(&self) -> Result<RegistryTree> {
        self.registry().map(|r| r.tree)
    }

    pub fn registry_root(&self) -> Result<FrHex> {
        self.registry_tree().map(|t| t.root_hex())
    }

    /// The first group whose id equals `group_id` numerically, normalized.
    pub fn group(&self, group_id: &str) -> Result<NormalizedGroup> {
        let wanted = parse_u128(group_id)?;
        self.groups
            .iter()
            .find(|g| g.parsed_group_id().ok() == Some(wanted))
            .ok_or_else(|| RegistryError::NotFound(format!("group {group_id}")))?
            .normalize()
    }

    /// Accounts tree of a single group, without building the rest of the registry.
    pub fn accounts_tree(&self, group_id: &str) -> Result<AccountsTree> {
        let group = self.group(group_id)?;
        build_accounts_tree(&group, self.hasher).map(|(_, tree)| tree)
    }
}

/// Registry root of `groups` as a fixed-width `0x` hex string.
pub fn compute_registry_root(groups: &[GroupDefinition]) -> Result<String> {
    RegistryTreeReader::new(groups.to_vec())
        .registry_root()
        .map(|root| root.to_string())
}
