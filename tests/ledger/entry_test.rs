// Entry Tests
// Signed amounts, kinds and status transitions

use quizwallet::account::{AccountId, Currency};
use quizwallet::ledger::{EntryId, EntryKind, EntryStatus, LedgerEntry, LedgerError};

#[test]
fn test_credit_and_debit_signs() {
    let account = AccountId::generate();
    let credit = LedgerEntry::credit(account, EntryKind::CoinTransferIn, 3_000, "in").unwrap();
    let debit = LedgerEntry::debit(account, EntryKind::CoinTransferOut, 3_000, "out").unwrap();

    assert_eq!(credit.amount(), 3_000);
    assert_eq!(debit.amount(), -3_000);
    assert_eq!(debit.magnitude(), 3_000);
    assert_eq!(credit.status(), EntryStatus::Completed);
}

#[test]
fn test_amount_out_of_range() {
    let err = LedgerEntry::credit(AccountId::generate(), EntryKind::Earning, u64::MAX, "x").unwrap_err();
    assert!(matches!(err, LedgerError::AmountOutOfRange(_)));
}

#[test]
fn test_kind_currency() {
    assert_eq!(EntryKind::CoinGrant.currency(), Currency::Coin);
    assert_eq!(EntryKind::CoinTransferOut.currency(), Currency::Coin);
    assert_eq!(EntryKind::Withdrawal.currency(), Currency::Cash);
    assert_eq!(EntryKind::ReferralBonus.currency(), Currency::Cash);
}

#[test]
fn test_kind_parse() {
    assert_eq!("referral_bonus".parse::<EntryKind>().unwrap(), EntryKind::ReferralBonus);
    assert_eq!(EntryKind::CoinTransferIn.to_string(), "coin_transfer_in");
    assert!(matches!("bonus".parse::<EntryKind>(), Err(LedgerError::UnknownKind(_))));
}

#[test]
fn test_only_pending_moves() {
    assert!(EntryStatus::Pending.can_transition_to(EntryStatus::Completed));
    assert!(EntryStatus::Pending.can_transition_to(EntryStatus::Failed));
    assert!(!EntryStatus::Completed.can_transition_to(EntryStatus::Failed));
    assert!(!EntryStatus::Failed.can_transition_to(EntryStatus::Completed));
    assert!(!EntryStatus::Pending.can_transition_to(EntryStatus::Pending));
    assert!(EntryStatus::Cancelled.is_final());
}

#[test]
fn test_pending_withdrawal_counts_as_applied() {
    let account = AccountId::generate();
    let withdrawal = LedgerEntry::debit(account, EntryKind::Withdrawal, 1_000, "out")
        .unwrap()
        .with_status(EntryStatus::Pending);
    let failed = withdrawal.clone().with_status(EntryStatus::Failed);
    let pending_earning = LedgerEntry::credit(account, EntryKind::Earning, 1_000, "in")
        .unwrap()
        .with_status(EntryStatus::Pending);

    assert!(withdrawal.is_applied());
    assert!(!failed.is_applied());
    assert!(!pending_earning.is_applied());
}

#[test]
fn test_metadata_and_reference() {
    let entry = LedgerEntry::credit(AccountId::generate(), EntryKind::QuizReward, 10, "quiz")
        .unwrap()
        .with_reference("REF_1")
        .with_metadata("points", "4");

    assert_eq!(entry.reference(), Some("REF_1"));
    assert_eq!(entry.get_metadata("points"), Some("4"));
    assert_eq!(entry.get_metadata("missing"), None);
}

#[test]
fn test_entry_id_parse() {
    let entry = LedgerEntry::credit(AccountId::generate(), EntryKind::Earning, 1, "x").unwrap();
    let parsed: EntryId = entry.id().to_hex().parse().unwrap();
    assert_eq!(&parsed, entry.id());
}

#[test]
fn test_entry_json_uses_snake_case() {
    let entry = LedgerEntry::credit(AccountId::generate(), EntryKind::CoinGrant, 100, "grant").unwrap();
    let json = serde_json::to_value(&entry).unwrap();

    assert_eq!(json["kind"], "coin_grant");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["amount"], 100);
}
