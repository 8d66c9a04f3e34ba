//! Fixed-height key/value Merkle tree over BN254::Fr.
//!
//! Leaves are `H(key, value)` laid out in ascending key order and the tree is padded with
//! empty subtrees up to its fixed height. The root therefore depends only on the set of
//! key/value pairs, never on the order they were supplied in.
//!
//! Both registry levels use this one type with different key and value encodings.

use crate::error::{RegistryError, Result};
use crate::field::FrHex;
use crate::hash::PoseidonHasher;
use crate::types::{AccountId, AccountsRoot, SnapshotId};
use ark_bn254::Fr;
use ark_ff::Zero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Encoding of a tree key as a field element.
pub trait TreeKey: Clone + fmt::Debug {
    fn to_field(&self) -> Fr;
}

/// Encoding of a tree value as a field element.
pub trait TreeValue: Clone + fmt::Debug {
    fn to_field(&self) -> Fr;
}

impl TreeKey for Fr {
    fn to_field(&self) -> Fr {
        *self
    }
}

impl TreeValue for Fr {
    fn to_field(&self) -> Fr {
        *self
    }
}

impl TreeKey for AccountId {
    fn to_field(&self) -> Fr {
        self.to_fr()
    }
}

impl TreeKey for SnapshotId {
    fn to_field(&self) -> Fr {
        self.0
    }
}

impl TreeValue for SnapshotId {
    fn to_field(&self) -> Fr {
        self.0
    }
}

impl TreeKey for AccountsRoot {
    fn to_field(&self) -> Fr {
        self.0
    }
}

/// Roots of the empty subtree at every level, `zeros[0]` being the empty leaf.
fn empty_subtree_roots(hasher: &PoseidonHasher, height: usize) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(height + 1);
    zeros.push(Fr::zero());
    for level in 0..height {
        let z = zeros[level];
        zeros.push(hasher.hash_two(&z, &z));
    }
    zeros
}

/// Immutable key/value Merkle tree.
#[derive(Clone, Debug)]
pub struct KvMerkleTree<K, V> {
    height: usize,
    /// Entries keyed by their field encoding; position in this map is the leaf index.
    entries: BTreeMap<Fr, (K, V)>,
    /// Occupied prefix of each level, `levels[0]` being the leaves.
    levels: Vec<Vec<Fr>>,
    zeros: Vec<Fr>,
    root: Fr,
}

impl<K: TreeKey, V: TreeValue> KvMerkleTree<K, V> {
    /// Build a tree of the given height.
    ///
    /// Keys are compared by their field encoding; when two entries share one, the later
    /// entry replaces the earlier.
    pub fn new(
        data: impl IntoIterator<Item = (K, V)>,
        hasher: &PoseidonHasher,
        height: usize,
    ) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in data {
            entries.insert(key.to_field(), (key, value));
        }

        if height >= usize::BITS as usize || entries.len() > 1usize << height {
            return Err(RegistryError::CapacityExceeded {
                leaves: entries.len(),
                height,
            });
        }

        let zeros = empty_subtree_roots(hasher, height);

        let leaves: Vec<Fr> = entries
            .iter()
            .map(|(k, (_, v))| hasher.hash_two(k, &v.to_field()))
            .collect();

        let mut levels = Vec::with_capacity(height + 1);
        levels.push(leaves);
        for level in 0..height {
            let current = &levels[level];
            let next: Vec<Fr> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hasher.hash_two(left, right),
                    [left] => hasher.hash_two(left, &zeros[level]),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }

        let root = levels[height].first().copied().unwrap_or(zeros[height]);

        Ok(Self {
            height,
            entries,
            levels,
            zeros,
            root,
        })
    }

    pub fn root(&self) -> Fr {
        self.root
    }

    pub fn root_hex(&self) -> FrHex {
        FrHex(self.root)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(&key.to_field()).map(|(_, v)| v)
    }

    /// Entries in leaf order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.values().map(|(k, v)| (k, v))
    }

    /// Authentication path of `key` from its leaf up to the root.
    pub fn path(&self, key: &K) -> Result<MerklePath> {
        let encoded = key.to_field();
        let index = self
            .entries
            .range(..encoded)
            .count();
        let Some((_, value)) = self.entries.get(&encoded) else {
            return Err(RegistryError::NotFound(format!("key {}", FrHex(encoded))));
        };

        let mut siblings = Vec::with_capacity(self.height);
        let mut position = index;
        for level in 0..self.height {
            let sibling = self.levels[level]
                .get(position ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(FrHex(sibling));
            position >>= 1;
        }

        Ok(MerklePath {
            leaf_index: index as u64,
            key: FrHex(encoded),
            value: FrHex(value.to_field()),
            leaf: FrHex(self.levels[0][index]),
            siblings,
            root: FrHex(self.root),
        })
    }
}

/// Inclusion proof material for one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub leaf_index: u64,
    pub key: FrHex,
    pub value: FrHex,
    pub leaf: FrHex,
    /// Sibling at each level, leaf level first.
    pub siblings: Vec<FrHex>,
    pub root: FrHex,
}

impl MerklePath {
    /// Recompute the root from the key/value pair and check it against `root`.
    pub fn verify(&self, hasher: &PoseidonHasher, root: &Fr) -> bool {
        let leaf = hasher.hash_two(&self.key.0, &self.value.0);
        if leaf != self.leaf.0 {
            return false;
        }

        let mut node = leaf;
        let mut position = self.leaf_index;
        for sibling in &self.siblings {
            node = if position & 1 == 1 {
                hasher.hash_two(&sibling.0, &node)
            } else {
                hasher.hash_two(&node, &sibling.0)
            };
            position >>= 1;
        }

        position == 0 && node == *root
    }
}
