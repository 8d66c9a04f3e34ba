//! Group definitions as they arrive from configuration, and their normalized form.

use crate::constants::LATEST_LABEL;
use crate::error::{RegistryError, Result};
use crate::field::{self, parse_fr_hex, parse_u128};
use ark_bn254::Fr;
use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot a group is taken at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupTimestamp {
    #[default]
    Latest,
    At(u128),
}

impl GroupTimestamp {
    /// Raw 128-bit timestamp; zero stands for "latest".
    pub fn resolve(self) -> u128 {
        match self {
            GroupTimestamp::Latest => field::resolve_timestamp(0),
            GroupTimestamp::At(t) => field::resolve_timestamp(t),
        }
    }
}

impl Serialize for GroupTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            GroupTimestamp::Latest => serializer.serialize_str(LATEST_LABEL),
            GroupTimestamp::At(t) => match u64::try_from(*t) {
                Ok(t) => serializer.serialize_u64(t),
                Err(_) => serializer.collect_str(t),
            },
        }
    }
}

impl<'de> Deserialize<'de> for GroupTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TimestampVisitor;

        impl Visitor<'_> for TimestampVisitor {
            type Value = GroupTimestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer timestamp or \"latest\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(if v == 0 { GroupTimestamp::Latest } else { GroupTimestamp::At(v as u128) })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("timestamp must be non-negative, got {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                if v == LATEST_LABEL {
                    return Ok(GroupTimestamp::Latest);
                }
                let t = parse_u128(v).map_err(E::custom)?;
                Ok(if t == 0 { GroupTimestamp::Latest } else { GroupTimestamp::At(t) })
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(GroupTimestamp::Latest)
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// A participation value exactly as written in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Field encoding of the value. Anything but a non-negative integer below the modulus is
    /// rejected.
    pub fn to_fr(&self) -> Result<Fr> {
        match self {
            RawValue::Unsigned(v) => Ok(Fr::from(*v)),
            RawValue::Signed(v) => u64::try_from(*v)
                .map(Fr::from)
                .map_err(|_| RegistryError::malformed(format!("negative value {v}"))),
            RawValue::Float(v) => Err(RegistryError::malformed(format!("non-integer value {v}"))),
            RawValue::Text(s) if s.starts_with("0x") || s.starts_with("0X") => parse_fr_hex(s),
            RawValue::Text(s) => parse_decimal(s),
        }
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        RawValue::Unsigned(v)
    }
}

fn parse_decimal(s: &str) -> Result<Fr> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistryError::malformed(format!("{s:?} is not a non-negative integer")));
    }
    // Fold digits in the field, then check the value did not wrap.
    let ten = Fr::from(10u64);
    let mut acc = Fr::from(0u64);
    for b in s.bytes() {
        acc = acc * ten + Fr::from((b - b'0') as u64);
    }
    let canonical = acc.to_string();
    if s.trim_start_matches('0') == canonical.trim_start_matches('0') {
        Ok(acc)
    } else {
        Err(RegistryError::malformed(format!("{s} is not below the field modulus")))
    }
}

/// Group membership: either a plain list of accounts or an account → value map.
///
/// Map order is kept so that two spellings of one account resolve to the later entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupData {
    Accounts(Vec<String>),
    Values(IndexMap<String, RawValue>),
}

impl Default for GroupData {
    fn default() -> Self {
        GroupData::Accounts(Vec::new())
    }
}

/// One group as supplied by configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    pub group_id: String,
    #[serde(default)]
    pub group_timestamp: GroupTimestamp,
    #[serde(default)]
    pub data: GroupData,
}

impl GroupDefinition {
    pub fn new(group_id: impl Into<String>, data: GroupData) -> Self {
        Self {
            group_id: group_id.into(),
            group_timestamp: GroupTimestamp::Latest,
            data,
        }
    }

    pub fn with_timestamp(mut self, timestamp: GroupTimestamp) -> Self {
        self.group_timestamp = timestamp;
        self
    }

    pub fn parsed_group_id(&self) -> Result<u128> {
        parse_u128(&self.group_id)
    }

    /// Resolve defaults and canonicalize membership.
    ///
    /// Accounts are lowercased and validated; when an account appears twice (in any case)
    /// the later entry wins.
    pub fn normalize(&self) -> Result<NormalizedGroup> {
        let group_id = self.parsed_group_id()?;
        let timestamp = self.group_timestamp.resolve();

        let mut members = BTreeMap::new();
        match &self.data {
            GroupData::Accounts(accounts) => {
                for account in accounts {
                    members.insert(AccountId::parse(account)?, Fr::from(1u64));
                }
            }
            GroupData::Values(values) => {
                for (account, value) in values {
                    let value = value
                        .to_fr()
                        .map_err(|e| RegistryError::malformed(format!("value of {account}: {e}")))?;
                    members.insert(AccountId::parse(account)?, value);
                }
            }
        }

        Ok(NormalizedGroup {
            group_id,
            timestamp,
            snapshot_id: SnapshotId(field::reduce(group_id, timestamp)),
            members,
        })
    }
}

/// A group with every default resolved and every account canonical.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedGroup {
    pub group_id: u128,
    /// Resolved timestamp; never zero.
    pub timestamp: u128,
    pub snapshot_id: SnapshotId,
    pub members: BTreeMap<AccountId, Fr>,
}

/// Lowercase `0x`-prefixed hex account identifier whose value fits the scalar field.
///
/// Identity is the numeric value, so `0x0a` and `0xA` are the same account.
#[derive(Clone, Debug)]
pub struct AccountId {
    text: String,
    value: Fr,
}

impl PartialEq for AccountId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for AccountId {}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl std::hash::Hash for AccountId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl AccountId {
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim().to_lowercase();
        let value = parse_fr_hex(&text)
            .map_err(|e| RegistryError::malformed(format!("account identifier {s:?}: {e}")))?;
        Ok(Self { text, value })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_fr(&self) -> Fr {
        self.value
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Canonical field identifier of one `(group, timestamp)` snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub Fr);

/// Root of one group's accounts tree, used as a key of the registry tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountsRoot(pub Fr);
