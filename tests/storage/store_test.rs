// Store Tests
// Tests for the sled-backed account and ledger store

use quizwallet::account::{Account, AccountId, Currency, Role};
use quizwallet::ledger::{EntryKind, EntryStatus, HistoryQuery, LedgerEntry};
use quizwallet::referral::ReferralLink;
use quizwallet::storage::{StoreError, WalletStore};
use chrono::Utc;
use tempfile::TempDir;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn account(email: &str, phone: Option<&str>) -> Account {
    Account::open("Test".into(), email.into(), phone.map(String::from), Role::User, None)
}

fn funded(store: &WalletStore, email: &str, phone: &str, coins: u64) -> Account {
    let acct = account(email, Some(phone));
    store.create_account(&acct, None).unwrap();
    if coins > 0 {
        let grant = LedgerEntry::credit(*acct.id(), EntryKind::CoinGrant, coins, "grant").unwrap();
        store.credit(acct.id(), &grant).unwrap();
    }
    store.account(acct.id()).unwrap().unwrap()
}

fn funded_in(path: &std::path::Path) -> Account {
    let store = WalletStore::open(path).unwrap();
    let acct = funded(&store, "keep@example.com", "+15550000001", 1_000);
    store.flush().unwrap();
    acct
}

fn transfer_pair(from: &Account, to: &Account, amount: u64, reference: &str) -> (LedgerEntry, LedgerEntry) {
    let out = LedgerEntry::debit(*from.id(), EntryKind::CoinTransferOut, amount, "out")
        .unwrap()
        .with_reference(reference);
    let inbound = LedgerEntry::credit(*to.id(), EntryKind::CoinTransferIn, amount, "in")
        .unwrap()
        .with_reference(reference);
    (out, inbound)
}

// ============================================================================
// STORE CREATION AND ACCOUNTS
// ============================================================================

#[test]
fn test_store_open_new() {
    let temp_dir = TempDir::new().unwrap();
    let store = WalletStore::open(temp_dir.path()).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.account_count, 0);
    assert_eq!(stats.entry_count, 0);
}

#[test]
fn test_store_open_existing() {
    let temp_dir = TempDir::new().unwrap();

    // Create and write something
    let acct = funded_in(temp_dir.path());

    // Reopen and verify
    {
        let store = WalletStore::open(temp_dir.path()).unwrap();
        let loaded = store.account(acct.id()).unwrap().unwrap();
        assert_eq!(loaded.coin_balance(), 1_000);
        assert_eq!(store.entries_for(acct.id()).unwrap().len(), 1);
    }
}

#[test]
fn test_lookup_indexes() {
    let store = WalletStore::temporary().unwrap();
    let acct = account("find@example.com", Some("+15550000009"));
    store.create_account(&acct, None).unwrap();

    assert_eq!(store.account_id_by_email("find@example.com").unwrap(), Some(*acct.id()));
    assert_eq!(store.account_id_by_phone("+15550000009").unwrap(), Some(*acct.id()));
    assert_eq!(
        store.account_id_by_referral_code(acct.referral_code()).unwrap(),
        Some(*acct.id())
    );
    assert_eq!(store.account_id_by_phone("+15550000000").unwrap(), None);
}

#[test]
fn test_duplicate_email_rejected() {
    let store = WalletStore::temporary().unwrap();
    store.create_account(&account("dup@example.com", None), None).unwrap();

    let err = store
        .create_account(&account("dup@example.com", None), None)
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
}

#[test]
fn test_duplicate_phone_rejected() {
    let store = WalletStore::temporary().unwrap();
    store
        .create_account(&account("one@example.com", Some("+15550000001")), None)
        .unwrap();

    let second = account("two@example.com", Some("+15550000001"));
    let err = store.create_account(&second, None).unwrap_err();

    assert!(matches!(err, StoreError::Duplicate { field: "phone", .. }));
    assert_eq!(store.account(second.id()).unwrap(), None);
    assert_eq!(store.account_id_by_email("two@example.com").unwrap(), None);
}

#[test]
fn test_create_with_referral_link() {
    let store = WalletStore::temporary().unwrap();
    let referrer = account("ref@example.com", None);
    store.create_account(&referrer, None).unwrap();

    let referred = Account::open("New".into(), "new@example.com".into(), None, Role::User, Some(*referrer.id()));
    let link = ReferralLink::new(*referrer.id(), *referred.id(), 500, Utc::now());
    store.create_account(&referred, Some(&link)).unwrap();

    let links = store.referrals_for(referrer.id()).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].referred(), referred.id());
}

// ============================================================================
// TRANSFERS
// ============================================================================

#[test]
fn test_transfer_is_atomic_on_insufficient_funds() {
    let store = WalletStore::temporary().unwrap();
    let alice = funded(&store, "a@example.com", "+15550000001", 2_550);
    let bob = funded(&store, "b@example.com", "+15550000002", 0);

    let (out, inbound) = transfer_pair(&alice, &bob, 3_000, "TBG_1_aa");
    let err = store
        .transfer_coins(alice.id(), bob.id(), 3_000, &out, &inbound)
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::InsufficientFunds {
            currency: Currency::Coin,
            available: 2_550,
            required: 3_000
        }
    ));
    assert!(store.entries_by_reference("TBG_1_aa").unwrap().is_empty());
    assert_eq!(store.account(bob.id()).unwrap().unwrap().coin_balance(), 0);
}

#[test]
fn test_transfer_self_rejected() {
    let store = WalletStore::temporary().unwrap();
    let alice = funded(&store, "a@example.com", "+15550000001", 1_000);

    let (out, inbound) = transfer_pair(&alice, &alice, 100, "TBG_2_bb");
    let err = store
        .transfer_coins(alice.id(), alice.id(), 100, &out, &inbound)
        .unwrap_err();

    assert!(matches!(err, StoreError::SelfTransfer));
    assert_eq!(store.account(alice.id()).unwrap().unwrap().coin_balance(), 1_000);
}

#[test]
fn test_transfer_missing_recipient() {
    let store = WalletStore::temporary().unwrap();
    let alice = funded(&store, "a@example.com", "+15550000001", 1_000);
    let ghost = account("ghost@example.com", None);

    let (out, inbound) = transfer_pair(&alice, &ghost, 100, "TBG_3_cc");
    let err = store
        .transfer_coins(alice.id(), ghost.id(), 100, &out, &inbound)
        .unwrap_err();

    assert!(matches!(err, StoreError::AccountNotFound(_)));
}

#[test]
fn test_transfer_entries_share_reference() {
    let store = WalletStore::temporary().unwrap();
    let alice = funded(&store, "a@example.com", "+15550000001", 1_000);
    let bob = funded(&store, "b@example.com", "+15550000002", 0);

    let (out, inbound) = transfer_pair(&alice, &bob, 400, "TBG_4_dd");
    let (from, to) = store
        .transfer_coins(alice.id(), bob.id(), 400, &out, &inbound)
        .unwrap();

    assert_eq!(from.coin_balance(), 600);
    assert_eq!(to.coin_balance(), 400);
    assert_eq!(store.entries_by_reference("TBG_4_dd").unwrap().len(), 2);
}

// ============================================================================
// WITHDRAWALS AND STATUS
// ============================================================================

#[test]
fn test_fail_withdrawal_refunds() {
    let store = WalletStore::temporary().unwrap();
    let acct = account("w@example.com", None);
    store.create_account(&acct, None).unwrap();
    let earning = LedgerEntry::credit(*acct.id(), EntryKind::Earning, 5_000, "earned").unwrap();
    store.credit(acct.id(), &earning).unwrap();

    let withdrawal = LedgerEntry::debit(*acct.id(), EntryKind::Withdrawal, 2_000, "out")
        .unwrap()
        .with_status(EntryStatus::Pending)
        .with_reference("WD_1_abcdef_0000");
    let after_debit = store.debit_withdrawal(acct.id(), &withdrawal).unwrap();
    assert_eq!(after_debit.cash_balance(), 3_000);

    let (entry, account) = store.fail_withdrawal(withdrawal.id()).unwrap();
    assert_eq!(entry.status(), EntryStatus::Failed);
    assert_eq!(account.cash_balance(), 5_000);

    // Final entries cannot move again
    assert!(matches!(
        store.set_entry_status(withdrawal.id(), EntryStatus::Completed),
        Err(StoreError::Ledger(_))
    ));
}

#[test]
fn test_debit_withdrawal_rejects_other_kinds() {
    let store = WalletStore::temporary().unwrap();
    let acct = account("k@example.com", None);
    store.create_account(&acct, None).unwrap();

    let earning = LedgerEntry::debit(*acct.id(), EntryKind::CoinTransferOut, 100, "x").unwrap();
    assert!(matches!(
        store.debit_withdrawal(acct.id(), &earning),
        Err(StoreError::NotAWithdrawal(_))
    ));
}

// ============================================================================
// REFERRALS
// ============================================================================

#[test]
fn test_pay_referral_twice() {
    let store = WalletStore::temporary().unwrap();
    let referrer = account("r@example.com", None);
    store.create_account(&referrer, None).unwrap();
    let referred = AccountId::generate();

    let now = Utc::now();
    let link = ReferralLink::new(*referrer.id(), referred, 500, now);
    let entry = LedgerEntry::credit(*referrer.id(), EntryKind::ReferralBonus, 500, "bonus")
        .unwrap()
        .with_reference("RB_0011223344556677");

    let (paid, account) = store.pay_referral(&link, &entry, now).unwrap();
    assert!(paid.is_paid());
    assert_eq!(account.cash_balance(), 500);

    let again = LedgerEntry::credit(*referrer.id(), EntryKind::ReferralBonus, 500, "bonus")
        .unwrap()
        .with_reference("RB_0011223344556677");
    let err = store.pay_referral(&link, &again, now).unwrap_err();

    assert!(matches!(err, StoreError::AlreadyPaid));
    assert_eq!(store.account(referrer.id()).unwrap().unwrap().cash_balance(), 500);
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn test_history_filters_and_pages() {
    let store = WalletStore::temporary().unwrap();
    let acct = account("h@example.com", None);
    store.create_account(&acct, None).unwrap();

    let base = Utc::now();
    for i in 0..5 {
        let at = base + chrono::Duration::milliseconds(i);
        let entry = LedgerEntry::credit(*acct.id(), EntryKind::QuizReward, 10, "quiz")
            .unwrap()
            .with_created_at(at);
        store.credit(acct.id(), &entry).unwrap();
    }
    let grant = LedgerEntry::credit(*acct.id(), EntryKind::CoinGrant, 10, "grant")
        .unwrap()
        .with_created_at(base + chrono::Duration::milliseconds(10));
    store.credit(acct.id(), &grant).unwrap();

    let all = store.history(acct.id(), &HistoryQuery::new()).unwrap();
    assert_eq!(all.total, 6);
    assert_eq!(all.items[0].kind(), EntryKind::CoinGrant);

    let quizzes = store
        .history(
            acct.id(),
            &HistoryQuery::new().with_kind(EntryKind::QuizReward).with_page(2).with_limit(2),
        )
        .unwrap();
    assert_eq!(quizzes.total, 5);
    assert_eq!(quizzes.pages, 3);
    assert_eq!(quizzes.items.len(), 2);
}
