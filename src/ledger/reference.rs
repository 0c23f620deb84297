// Reference strings
//
// TBG_<millis>_<rand>        coin transfer, shared by both sides
// WD_<millis>_<acct6>_<rand> withdrawal, also sent to the payout provider
// RB_<hash16>                referral bonus, derived from the pair

use crate::account::AccountId;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

fn random_suffix(bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn transfer_reference(now: DateTime<Utc>) -> String {
    format!("TBG_{}_{}", now.timestamp_millis(), random_suffix(4))
}

pub fn withdrawal_reference(account: &AccountId, now: DateTime<Utc>) -> String {
    let id = account.to_hex();
    let tail = &id[id.len() - 6..];
    format!("WD_{}_{}_{}", now.timestamp_millis(), tail, random_suffix(4))
}

/// Same pair, same reference, so a second bonus entry cannot be written
pub fn referral_reference(referrer: &AccountId, referred: &AccountId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"referral:");
    hasher.update(referrer.as_bytes());
    hasher.update(referred.as_bytes());
    let digest = hasher.finalize();
    format!("RB_{}", hex::encode(&digest[..8]))
}
