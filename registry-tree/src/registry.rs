//! Second-level tree: accounts root -> snapshot identifier, one leaf per group.

use crate::constants::TREE_HEIGHT;
use crate::error::Result;
use crate::hash::PoseidonHasher;
use crate::tree::KvMerkleTree;
use crate::types::{AccountsRoot, SnapshotId};
use tracing::debug;

pub type RegistryTree = KvMerkleTree<AccountsRoot, SnapshotId>;

/// Build the registry tree from per-group `(accounts root, snapshot id)` pairs.
///
/// No pairs yields the empty tree, whose root is the same for every caller.
pub fn build_registry_tree(
    pairs: impl IntoIterator<Item = (AccountsRoot, SnapshotId)>,
    hasher: &PoseidonHasher,
) -> Result<RegistryTree> {
    let tree = RegistryTree::new(pairs, hasher, TREE_HEIGHT)?;
    debug!(groups = tree.len(), root = %tree.root_hex(), "built registry tree");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    fn pair(root: u64, snapshot: u64) -> (AccountsRoot, SnapshotId) {
        (AccountsRoot(Fr::from(root)), SnapshotId(Fr::from(snapshot)))
    }

    #[test]
    fn empty_registry_is_canonical() {
        let h = PoseidonHasher::global();
        let a = build_registry_tree(Vec::new(), h).unwrap();
        let b = build_registry_tree(Vec::new(), &PoseidonHasher::new()).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn order_does_not_matter() {
        let h = PoseidonHasher::global();
        let a = build_registry_tree(vec![pair(10, 1), pair(20, 2), pair(30, 3)], h).unwrap();
        let b = build_registry_tree(vec![pair(30, 3), pair(10, 1), pair(20, 2)], h).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn each_group_changes_the_root() {
        let h = PoseidonHasher::global();
        let one = build_registry_tree(vec![pair(10, 1)], h).unwrap();
        let two = build_registry_tree(vec![pair(10, 1), pair(20, 2)], h).unwrap();
        let empty = build_registry_tree(Vec::new(), h).unwrap();
        assert_ne!(one.root(), two.root());
        assert_ne!(one.root(), empty.root());
        assert_eq!(two.get(&AccountsRoot(Fr::from(20u64))), Some(&SnapshotId(Fr::from(2u64))));
    }
}
