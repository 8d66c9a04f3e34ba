//! End-to-end and property tests for the registry root.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use indexmap::IndexMap;
use proptest::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use registry_tree::accounts::AccountKey;
use registry_tree::constants::TREE_HEIGHT;
use registry_tree::field::{parse_fr_hex, reduce};
use registry_tree::hash::PoseidonHasher;
use registry_tree::registry::build_registry_tree;
use registry_tree::types::{AccountId, AccountsRoot, GroupData, GroupDefinition, GroupTimestamp, RawValue};
use registry_tree::{compute_registry_root, RegistryError, RegistryTreeReader};

// =============================================================================
// Fixtures
// =============================================================================

const A: &str = "0x2b9b9846d7298e0272c61669a54f0e602aba6290";
const B: &str = "0xb01ee322c4f028b8a6bfcd2a5d48107dc5bc99ec";

fn g1() -> GroupDefinition {
    GroupDefinition::new(
        "0x311ece950f9ec55757eb95f3182ae5e2",
        GroupData::Accounts(vec![A.to_string(), B.to_string()]),
    )
}

fn g2() -> GroupDefinition {
    let mut values = IndexMap::new();
    values.insert(A.to_string(), RawValue::from(15));
    GroupDefinition::new("0x1cde61966decb8600dfd0749bd371f12", GroupData::Values(values))
}

/// Deterministic pseudo-random 20-byte addresses.
fn addresses(seed: u64, n: usize) -> Vec<String> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut bytes = [0u8; 20];
            rng.fill_bytes(&mut bytes);
            format!("0x{}", hex::encode(bytes))
        })
        .collect()
}

fn below_modulus(hex_root: &str) -> bool {
    let parsed = parse_fr_hex(hex_root).unwrap();
    parsed.into_bigint() < Fr::MODULUS
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn two_group_registry_end_to_end() {
    let root = compute_registry_root(&[g1(), g2()]).unwrap();

    assert!(root.starts_with("0x"));
    assert_eq!(root.len(), 66);
    assert!(below_modulus(&root));

    assert_eq!(root, compute_registry_root(&[g2(), g1()]).unwrap());
    assert_ne!(root, compute_registry_root(&[g1()]).unwrap());
}

#[test]
fn empty_registry_root_is_fixed() {
    let empty = compute_registry_root(&[]).unwrap();
    let direct = build_registry_tree(Vec::new(), PoseidonHasher::global()).unwrap();
    assert_eq!(empty, direct.root_hex().to_string());
    assert_eq!(empty, compute_registry_root(&[]).unwrap());
}

#[test]
fn accounts_tree_lookup_matches_registry_key() {
    let reader = RegistryTreeReader::new(vec![g1(), g2()]);
    let registry = reader.registry().unwrap();

    let accounts = reader.accounts_tree("0x311ece950f9ec55757eb95f3182ae5e2").unwrap();
    let snapshot = registry.tree.get(&AccountsRoot(accounts.root())).copied();

    assert_eq!(snapshot.map(|s| s.0), Some(reduce(0x311ece950f9ec55757eb95f3182ae5e2, 0)));
    assert_eq!(accounts.height(), TREE_HEIGHT);
}

#[test]
fn registry_path_proves_group_inclusion() {
    let hasher = PoseidonHasher::global();
    let reader = RegistryTreeReader::new(vec![g1(), g2()]);
    let registry = reader.registry().unwrap();

    let accounts = reader.accounts_tree("0x1cde61966decb8600dfd0749bd371f12").unwrap();
    let account_path = accounts.path(&AccountKey::Account(AccountId::parse(A).unwrap())).unwrap();
    assert_eq!(account_path.value.0, Fr::from(15u64));
    assert!(account_path.verify(hasher, &accounts.root()));

    let registry_path = registry.tree.path(&AccountsRoot(accounts.root())).unwrap();
    assert!(registry_path.verify(hasher, &registry.tree.root()));
}

#[test]
fn same_members_different_ids_have_different_roots() {
    let members = GroupData::Accounts(vec![A.to_string(), B.to_string()]);
    let reader = RegistryTreeReader::new(vec![
        GroupDefinition::new("0x01", members.clone()),
        GroupDefinition::new("0x02", members),
    ]);
    let registry = reader.registry().unwrap();

    assert_ne!(registry.groups[0].accounts_tree_root, registry.groups[1].accounts_tree_root);
    assert_eq!(registry.tree.len(), 2);
}

#[test]
fn pinned_timestamp_changes_the_root() {
    let latest = compute_registry_root(&[g1()]).unwrap();
    let pinned = compute_registry_root(&[g1().with_timestamp(GroupTimestamp::At(1_700_000_000))]).unwrap();
    let zero = compute_registry_root(&[g1().with_timestamp(GroupTimestamp::At(0))]).unwrap();

    assert_ne!(latest, pinned);
    assert_eq!(latest, zero);
}

#[test]
fn list_and_unit_map_membership_agree() {
    let mut values = IndexMap::new();
    values.insert(A.to_string(), RawValue::from(1));
    values.insert(B.to_string(), RawValue::from(1));
    let as_map = GroupDefinition::new(g1().group_id, GroupData::Values(values));

    assert_eq!(
        compute_registry_root(&[g1()]).unwrap(),
        compute_registry_root(&[as_map]).unwrap()
    );
}

#[test]
fn missing_group_fails_fast() {
    let reader = RegistryTreeReader::new(vec![g1()]);
    assert!(matches!(reader.accounts_tree("0xdeadbeef"), Err(RegistryError::NotFound(_))));
}

#[test]
fn larger_groups_build() {
    let group = GroupDefinition::new("0x42", GroupData::Accounts(addresses(7, 200)));
    let tree = RegistryTreeReader::new(vec![group]).accounts_tree("0x42").unwrap();
    assert_eq!(tree.len(), 201);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn root_is_invariant_under_group_permutation(seed in any::<u64>(), rotate in 0usize..4) {
        let mut groups: Vec<GroupDefinition> = (0..4u64)
            .map(|i| GroupDefinition::new(format!("{:#x}", i + 1), GroupData::Accounts(addresses(seed ^ i, 3))))
            .collect();
        let before = compute_registry_root(&groups).unwrap();
        groups.rotate_left(rotate);
        groups.swap(0, 3);
        prop_assert_eq!(before, compute_registry_root(&groups).unwrap());
    }

    #[test]
    fn account_case_does_not_matter(seed in any::<u64>()) {
        let lower = addresses(seed, 3);
        let upper: Vec<String> = lower
            .iter()
            .map(|a| format!("0x{}", a[2..].to_uppercase()))
            .collect();
        prop_assert_eq!(
            compute_registry_root(&[GroupDefinition::new("0x09", GroupData::Accounts(lower))]).unwrap(),
            compute_registry_root(&[GroupDefinition::new("0x09", GroupData::Accounts(upper))]).unwrap()
        );
    }

    #[test]
    fn later_case_variant_wins(first in 0u64..1000, second in 0u64..1000) {
        let mut mixed = IndexMap::new();
        mixed.insert(A.to_uppercase().replacen("0X", "0x", 1), RawValue::from(first));
        mixed.insert(A.to_string(), RawValue::from(second));

        let mut only_second = IndexMap::new();
        only_second.insert(A.to_string(), RawValue::from(second));

        prop_assert_eq!(
            compute_registry_root(&[GroupDefinition::new("0x05", GroupData::Values(mixed))]).unwrap(),
            compute_registry_root(&[GroupDefinition::new("0x05", GroupData::Values(only_second))]).unwrap()
        );
    }

    #[test]
    fn distinct_timestamps_give_distinct_snapshot_ids(group in any::<u128>(), t1 in 1u128.., t2 in 1u128..) {
        prop_assume!(t1 != t2);
        prop_assert_ne!(reduce(group, t1), reduce(group, t2));
    }

    #[test]
    fn latest_snapshot_id_is_stable(group in any::<u128>()) {
        prop_assert_eq!(reduce(group, 0), reduce(group, 0));
        prop_assert_eq!(reduce(group, 0), reduce(group, registry_tree::constants::LATEST_TIMESTAMP));
    }
}
