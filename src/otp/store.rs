// OtpStore - expiring one-time codes keyed by email

use crate::account::normalize_email;
use crate::storage::{StoreError, WalletStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::IVec;
use std::time::Duration;
use thiserror::Error;

const OTP_TREE: &str = "otp";

/// Digits in a code
pub const OTP_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum OtpError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Corrupt OTP record: {0}")]
    Corrupt(String),
}

impl From<sled::Error> for OtpError {
    fn from(err: sled::Error) -> Self {
        OtpError::Storage(StoreError::from(err))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OtpRecord {
    code: String,
    expires_at_ms: i64,
}

impl OtpRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at_ms
    }
}

/// One-time codes with a fixed time-to-live
#[derive(Clone)]
pub struct OtpStore {
    tree: sled::Tree,
    ttl: Duration,
}

impl OtpStore {
    pub fn open(store: &WalletStore, ttl: Duration) -> Result<Self, OtpError> {
        Ok(Self {
            tree: store.open_tree(OTP_TREE)?,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(email: &str) -> Result<String, OtpError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(OtpError::InvalidEmail(email));
        }
        Ok(email)
    }

    /// Load a record together with the raw bytes it was decoded from
    fn load(&self, key: &str) -> Result<Option<(IVec, OtpRecord)>, OtpError> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => {
                let record = postcard::from_bytes(&bytes).map_err(|e| OtpError::Corrupt(e.to_string()))?;
                Ok(Some((bytes, record)))
            }
            None => Ok(None),
        }
    }

    /// Remove the record only if it still holds `bytes`.
    /// Returns false when another caller changed or removed it first.
    fn consume(&self, key: &str, bytes: &IVec) -> Result<bool, OtpError> {
        let swapped = self
            .tree
            .compare_and_swap(key.as_bytes(), Some(bytes), None::<&[u8]>)?;
        Ok(swapped.is_ok())
    }

    /// Issue a fresh code, replacing any earlier one for the email
    pub fn issue(&self, email: &str) -> Result<String, OtpError> {
        self.issue_at(email, Utc::now())
    }

    pub fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<String, OtpError> {
        use rand::Rng;
        let key = Self::key(email)?;
        let code = rand::thread_rng().gen_range(100_000..1_000_000u32).to_string();
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let record = OtpRecord {
            code: code.clone(),
            expires_at_ms: now.timestamp_millis().saturating_add(ttl_ms),
        };
        let bytes = postcard::to_allocvec(&record).map_err(|e| OtpError::Corrupt(e.to_string()))?;
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(code)
    }

    /// Check a code. A match consumes it, and only one concurrent caller
    /// can consume a given code. An expired code is removed; a wrong code
    /// leaves the stored one in place.
    pub fn verify(&self, email: &str, code: &str) -> Result<bool, OtpError> {
        self.verify_at(email, code, Utc::now())
    }

    pub fn verify_at(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool, OtpError> {
        let key = Self::key(email)?;
        let (bytes, record) = match self.load(&key)? {
            Some(loaded) => loaded,
            None => return Ok(false),
        };

        if record.is_expired(now) {
            self.consume(&key, &bytes)?;
            return Ok(false);
        }
        if record.code != code.trim() {
            return Ok(false);
        }

        self.consume(&key, &bytes)
    }

    /// Remove every expired code. Returns the number removed
    pub fn sweep_expired(&self) -> Result<usize, OtpError> {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<usize, OtpError> {
        let mut expired = Vec::new();
        for result in self.tree.iter() {
            let (key, bytes) = result?;
            let record: OtpRecord = postcard::from_bytes(&bytes).map_err(|e| OtpError::Corrupt(e.to_string()))?;
            if record.is_expired(now) {
                expired.push(key);
            }
        }

        let count = expired.len();
        for key in expired {
            self.tree.remove(key)?;
        }
        Ok(count)
    }

    /// Codes currently stored, expired or not
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
