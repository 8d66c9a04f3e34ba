//! Crate-wide constants shared by both tree levels and the field reducer.

/// Height of both the accounts tree and the registry tree.
///
/// A tree of this height holds at most 2^20 leaves.
pub const TREE_HEIGHT: usize = 20;

/// Literal whose bytes stand in for a group's timestamp when none is pinned.
pub const LATEST_LABEL: &str = "latest";

/// Virtual timestamp used for "latest" snapshots.
///
/// `"latest"` right-padded with zeros to 32 bytes, read big-endian, shifted right by 128
/// bits. Equal to `0x6c617465737400000000000000000000`.
pub const LATEST_TIMESTAMP: u128 = latest_timestamp();

const fn latest_timestamp() -> u128 {
    let label = LATEST_LABEL.as_bytes();
    let mut high = [0u8; 16];
    let mut i = 0;
    while i < label.len() {
        high[i] = label[i];
        i += 1;
    }
    u128::from_be_bytes(high)
}

/// Poseidon state width: two inputs plus one capacity element, as in circomlib's
/// `Poseidon(2)`. Every internal node hashes exactly two children.
pub const POSEIDON_WIDTH: u8 = 3;
