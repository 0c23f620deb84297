// Account identifiers

use super::AccountError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an account id in bytes
pub const ACCOUNT_ID_LEN: usize = 16;

/// Unique identifier for an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// Generate a random account ID
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a storage key slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AccountError> {
        let arr: [u8; ACCOUNT_ID_LEN] = bytes
            .try_into()
            .map_err(|_| AccountError::InvalidId(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| AccountError::InvalidId(s.to_string()))?;
        Self::from_slice(&bytes).map_err(|_| AccountError::InvalidId(s.to_string()))
    }
}

// Rendered as hex so JSON output and stored records read the same
impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
