use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission bitset.
///
/// Serialized as a decimal string so consumers without 64-bit integers
/// don't lose precision. Plain JSON numbers are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "MaskRepr", into = "String")]
pub struct PermissionMask(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum MaskRepr {
    Text(String),
    Number(u64),
}

impl PermissionMask {
    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl TryFrom<MaskRepr> for PermissionMask {
    type Error = String;

    fn try_from(value: MaskRepr) -> Result<Self, Self::Error> {
        match value {
            MaskRepr::Number(n) => Ok(Self(n)),
            MaskRepr::Text(s) => s
                .trim()
                .parse::<u64>()
                .map(Self)
                .map_err(|e| format!("invalid permission mask `{s}`: {e}")),
        }
    }
}

impl From<PermissionMask> for String {
    fn from(mask: PermissionMask) -> Self {
        mask.0.to_string()
    }
}

impl fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whom a permission overwrite applies to.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GranteeKind {
    Role = 0,
    Member = 1,
}

impl TryFrom<u8> for GranteeKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| format!("unknown overwrite grantee kind: {value}"))
    }
}

impl From<GranteeKind> for u8 {
    fn from(kind: GranteeKind) -> Self {
        kind as u8
    }
}

/// Explicit allow/deny pair for one grantee on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(rename = "id")]
    pub grantee_id: String,
    #[serde(rename = "type")]
    pub grantee_kind: GranteeKind,
    #[serde(rename = "allow")]
    pub allow_mask: PermissionMask,
    #[serde(rename = "deny")]
    pub deny_mask: PermissionMask,
}
