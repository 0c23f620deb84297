// Ledger entries

use crate::account::{AccountId, Currency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ENTRY_ID_LEN: usize = 16;

/// Errors that can occur on ledger entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: EntryStatus, to: EntryStatus },

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(u64),

    #[error("Unknown entry kind: {0}")]
    UnknownKind(String),

    #[error("Invalid entry id: {0}")]
    InvalidId(String),
}

// ============================================================================
// ENTRY ID
// ============================================================================

/// Unique identifier for a ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId([u8; ENTRY_ID_LEN]);

impl EntryId {
    /// Generate a random entry ID
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; ENTRY_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
        let arr: [u8; ENTRY_ID_LEN] = bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidId(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for EntryId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| LedgerError::InvalidId(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// KIND AND STATUS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Earning,
    Withdrawal,
    ReferralBonus,
    QuizReward,
    CoinTransferIn,
    CoinTransferOut,
    /// Admin credit of coins
    CoinGrant,
}

impl EntryKind {
    /// Currency whose balance this kind of entry moves
    pub fn currency(&self) -> Currency {
        match self {
            EntryKind::CoinTransferIn | EntryKind::CoinTransferOut | EntryKind::CoinGrant => Currency::Coin,
            EntryKind::Earning | EntryKind::Withdrawal | EntryKind::ReferralBonus | EntryKind::QuizReward => {
                Currency::Cash
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Earning => "earning",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::ReferralBonus => "referral_bonus",
            EntryKind::QuizReward => "quiz_reward",
            EntryKind::CoinTransferIn => "coin_transfer_in",
            EntryKind::CoinTransferOut => "coin_transfer_out",
            EntryKind::CoinGrant => "coin_grant",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "earning" => Ok(EntryKind::Earning),
            "withdrawal" => Ok(EntryKind::Withdrawal),
            "referral_bonus" => Ok(EntryKind::ReferralBonus),
            "quiz_reward" => Ok(EntryKind::QuizReward),
            "coin_transfer_in" => Ok(EntryKind::CoinTransferIn),
            "coin_transfer_out" => Ok(EntryKind::CoinTransferOut),
            "coin_grant" => Ok(EntryKind::CoinGrant),
            other => Err(LedgerError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl EntryStatus {
    /// Only pending entries move, and only once
    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Pending, EntryStatus::Completed)
                | (EntryStatus::Pending, EntryStatus::Failed)
                | (EntryStatus::Pending, EntryStatus::Cancelled)
        )
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Completed => "completed",
            EntryStatus::Failed => "failed",
            EntryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ============================================================================
// LEDGER ENTRY
// ============================================================================

/// One balance-affecting event on one account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: EntryId,
    account_id: AccountId,
    kind: EntryKind,
    /// Signed minor units: credits positive, debits negative
    amount: i64,
    status: EntryStatus,
    reference: Option<String>,
    description: String,
    metadata: HashMap<String, String>,
    created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// A completed entry adding `amount` to the account
    pub fn credit(account_id: AccountId, kind: EntryKind, amount: u64, description: &str) -> Result<Self, LedgerError> {
        let signed = i64::try_from(amount).map_err(|_| LedgerError::AmountOutOfRange(amount))?;
        Ok(Self::with_amount(account_id, kind, signed, description))
    }

    /// A completed entry removing `amount` from the account
    pub fn debit(account_id: AccountId, kind: EntryKind, amount: u64, description: &str) -> Result<Self, LedgerError> {
        let signed = i64::try_from(amount).map_err(|_| LedgerError::AmountOutOfRange(amount))?;
        Ok(Self::with_amount(account_id, kind, -signed, description))
    }

    fn with_amount(account_id: AccountId, kind: EntryKind, amount: i64, description: &str) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            kind,
            amount,
            status: EntryStatus::Completed,
            reference: None,
            description: description.to_string(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn currency(&self) -> Currency {
        self.kind.currency()
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Unsigned size of the movement
    pub fn magnitude(&self) -> u64 {
        self.amount.unsigned_abs()
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the balance already reflects this entry.
    /// Pending withdrawals are debited up front, so they count.
    pub fn is_applied(&self) -> bool {
        match self.status {
            EntryStatus::Completed => true,
            EntryStatus::Pending => self.kind == EntryKind::Withdrawal,
            EntryStatus::Failed | EntryStatus::Cancelled => false,
        }
    }

    /// Move to a new status
    pub(crate) fn transition(&mut self, next: EntryStatus) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
