//! Per-group accounts tree.

use crate::constants::TREE_HEIGHT;
use crate::error::Result;
use crate::hash::PoseidonHasher;
use crate::tree::{KvMerkleTree, TreeKey};
use crate::types::{AccountId, AccountsRoot, NormalizedGroup, SnapshotId};
use ark_bn254::Fr;
use ark_ff::Zero;
use tracing::debug;

/// Key of an accounts-tree leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountKey {
    Account(AccountId),
    /// Reserved leaf binding the tree to its `(group, timestamp)` snapshot.
    Snapshot(SnapshotId),
}

impl TreeKey for AccountKey {
    fn to_field(&self) -> Fr {
        match self {
            AccountKey::Account(a) => a.to_field(),
            AccountKey::Snapshot(s) => s.to_field(),
        }
    }
}

impl From<AccountId> for AccountKey {
    fn from(account: AccountId) -> Self {
        AccountKey::Account(account)
    }
}

pub type AccountsTree = KvMerkleTree<AccountKey, Fr>;

/// Build the accounts tree of one normalized group.
///
/// Besides the members, the tree holds `snapshot_id -> 0`. Two groups with identical
/// members still get distinct roots, which the registry tree relies on since it is keyed
/// by accounts root. The reserved leaf goes in last and replaces a member whose
/// identifier happens to encode to the same field element.
pub fn build_accounts_tree(group: &NormalizedGroup, hasher: &PoseidonHasher) -> Result<(AccountsRoot, AccountsTree)> {
    let members = group
        .members
        .iter()
        .map(|(account, value)| (AccountKey::from(account.clone()), *value));
    let reserved = std::iter::once((AccountKey::Snapshot(group.snapshot_id), Fr::zero()));

    let tree = AccountsTree::new(members.chain(reserved), hasher, TREE_HEIGHT)?;

    debug!(
        group_id = %format!("{:#034x}", group.group_id),
        leaves = tree.len(),
        root = %tree.root_hex(),
        "built accounts tree"
    );

    Ok((AccountsRoot(tree.root()), tree))
}
