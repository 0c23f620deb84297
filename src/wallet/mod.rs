// Wallet module - The operations that move money
//
// Transfers, withdrawals, referral bonuses, quiz rewards, admin grants and
// reconciliation. Each balance change commits atomically in storage before
// any notification or payout call is made.

mod admin;
mod error;
mod quiz;
mod reconcile;
mod referral;
mod service;
mod transfer;
mod withdrawal;

pub use admin::{Resolution, WithdrawalResolution};
pub use error::{ErrorCategory, WalletError};
pub use quiz::{QuizReceipt, QuizSubmission};
pub use reconcile::ReconcileReport;
pub use referral::ReferralOutcome;
pub use service::Wallet;
pub use transfer::{TransferReceipt, TransferRequest};
pub use withdrawal::{WithdrawalReceipt, WithdrawalRequest};
