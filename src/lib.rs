// quizwallet - Wallet ledger for a quiz rewards app
//
// Cash earnings, reward points and coins per account, with an append-only
// ledger, atomic coin transfers, withdrawals settled through an external
// payout provider, and one-time referral bonuses.

pub mod account;
pub mod api;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod notify;
pub mod otp;
pub mod referral;
pub mod storage;
pub mod wallet;
