//! Canonical field encodings: the snapshot identifier reducer and hex rendering of scalars.

use crate::constants::LATEST_TIMESTAMP;
use crate::error::{RegistryError, Result};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Resolve a raw timestamp: zero means "latest".
pub fn resolve_timestamp(timestamp: u128) -> u128 {
    if timestamp == 0 { LATEST_TIMESTAMP } else { timestamp }
}

/// Snapshot identifier of `(group_id, timestamp)`.
///
/// `group_id || timestamp` as a 256-bit big-endian integer, reduced modulo the BN254 scalar
/// field. The proving side derives the same value independently, so this encoding must not
/// change.
pub fn reduce(group_id: u128, timestamp: u128) -> Fr {
    let mut packed = [0u8; 32];
    packed[..16].copy_from_slice(&group_id.to_be_bytes());
    packed[16..].copy_from_slice(&resolve_timestamp(timestamp).to_be_bytes());
    Fr::from_be_bytes_mod_order(&packed)
}

/// 32-byte big-endian encoding of a field element.
pub fn fr_to_be_bytes(x: &Fr) -> [u8; 32] {
    let bytes = x.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Parse a `0x`-prefixed hex scalar. Leading zeros may be omitted.
///
/// Values at or above the field modulus are rejected rather than reduced.
pub fn parse_fr_hex(s: &str) -> Result<Fr> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| RegistryError::malformed(format!("expected 0x-prefixed hex, got {s:?}")))?;
    if digits.is_empty() || digits.len() > 64 {
        return Err(RegistryError::malformed(format!("hex scalar must have 1 to 64 digits: {s:?}")));
    }

    let padded = format!("{digits:0>64}");
    let bytes = hex::decode(&padded).map_err(|e| RegistryError::malformed(format!("invalid hex {s:?}: {e}")))?;

    let x = Fr::from_be_bytes_mod_order(&bytes);
    if fr_to_be_bytes(&x)[..] != bytes[..] {
        return Err(RegistryError::malformed(format!("{s} is not below the field modulus")));
    }
    Ok(x)
}

/// Parse a 128-bit identifier given as `0x` hex or as decimal.
pub fn parse_u128(s: &str) -> Result<u128> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => (digits, 16),
        None => (s, 10),
    };
    // `from_str_radix` tolerates a leading sign.
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(RegistryError::malformed(format!("{s:?} is not a 128-bit integer")));
    }
    u128::from_str_radix(digits, radix)
        .map_err(|e| RegistryError::malformed(format!("{s:?} is not a 128-bit integer: {e}")))
}

/// A field element rendered as a fixed-width big-endian hex string (`0x` + 64 digits).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrHex(pub Fr);

impl FrHex {
    pub fn from_fr(x: &Fr) -> Self {
        Self(*x)
    }

    pub fn to_fr(&self) -> Fr {
        self.0
    }
}

impl fmt::Display for FrHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(fr_to_be_bytes(&self.0)))
    }
}

impl std::str::FromStr for FrHex {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        parse_fr_hex(s).map(Self)
    }
}

impl Serialize for FrHex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FrHex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
