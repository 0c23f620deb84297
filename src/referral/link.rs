// Referral links

use crate::account::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferralError {
    #[error("Referral bonus already paid")]
    AlreadyPaid,
}

/// Referrer/referred pair. At most one per pair; paid flips false -> true once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralLink {
    referrer: AccountId,
    referred: AccountId,
    bonus_amount: u64,
    paid: bool,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl ReferralLink {
    pub fn new(referrer: AccountId, referred: AccountId, bonus_amount: u64, now: DateTime<Utc>) -> Self {
        Self {
            referrer,
            referred,
            bonus_amount,
            paid: false,
            created_at: now,
            paid_at: None,
        }
    }

    /// Storage key: referrer bytes followed by referred bytes
    pub fn key(referrer: &AccountId, referred: &AccountId) -> Vec<u8> {
        [referrer.as_bytes(), referred.as_bytes()].concat()
    }

    pub fn storage_key(&self) -> Vec<u8> {
        Self::key(&self.referrer, &self.referred)
    }

    pub fn referrer(&self) -> &AccountId {
        &self.referrer
    }

    pub fn referred(&self) -> &AccountId {
        &self.referred
    }

    pub fn bonus_amount(&self) -> u64 {
        self.bonus_amount
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Record payment of `amount`
    pub(crate) fn mark_paid(&mut self, amount: u64, now: DateTime<Utc>) -> Result<(), ReferralError> {
        if self.paid {
            return Err(ReferralError::AlreadyPaid);
        }
        self.paid = true;
        self.bonus_amount = amount;
        self.paid_at = Some(now);
        Ok(())
    }
}

/// Summary of a referrer's links
#[derive(Clone, Debug, Serialize)]
pub struct ReferralStats {
    pub referral_code: String,
    pub total_referrals: usize,
    pub total_bonus: u64,
    pub paid_bonus: u64,
    /// Newest first
    pub referred: Vec<ReferralLink>,
}

impl ReferralStats {
    /// Build from every link of one referrer, keeping the newest `limit` in the list
    pub fn from_links(referral_code: &str, mut links: Vec<ReferralLink>, limit: usize) -> Self {
        let total_bonus = links.iter().map(|l| l.bonus_amount).sum();
        let paid_bonus = links.iter().filter(|l| l.paid).map(|l| l.bonus_amount).sum();
        let total_referrals = links.len();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        links.truncate(limit);

        Self {
            referral_code: referral_code.to_string(),
            total_referrals,
            total_bonus,
            paid_bonus,
            referred: links,
        }
    }
}
