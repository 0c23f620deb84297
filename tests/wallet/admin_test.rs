// Admin Tests
// Grants and manual withdrawal resolution

use crate::common::harness;
use quizwallet::account::Currency;
use quizwallet::gateway::PayoutMethod;
use quizwallet::ledger::{EntryKind, EntryStatus};
use quizwallet::wallet::{Resolution, WalletError, WithdrawalRequest};

fn paypal() -> PayoutMethod {
    PayoutMethod::Paypal {
        email: "ada@example.com".to_string(),
    }
}

#[tokio::test]
async fn test_grant_coins_records_coin_grant() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");

    let entry = h
        .wallet
        .grant(h.admin.id(), user.id(), Currency::Coin, 1_000, "welcome")
        .await
        .unwrap();

    assert_eq!(entry.kind(), EntryKind::CoinGrant);
    assert_eq!(entry.description(), "welcome");
    assert_eq!(entry.get_metadata("granted_by"), Some(h.admin.id().to_hex().as_str()));
    assert_eq!(h.coins(user.id()), 1_000);
}

#[tokio::test]
async fn test_grant_cash_records_earning() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");

    let entry = h
        .wallet
        .grant(h.admin.id(), user.id(), Currency::Cash, 700, "")
        .await
        .unwrap();

    assert_eq!(entry.kind(), EntryKind::Earning);
    assert_eq!(h.cash(user.id()), 700);
}

#[tokio::test]
async fn test_non_admin_cannot_grant() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");

    let err = h
        .wallet
        .grant(user.id(), user.id(), Currency::Coin, 1_000, "")
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Forbidden(_)));
    assert_eq!(err.category().status_code(), 403);
    assert_eq!(h.coins(user.id()), 0);
}

#[tokio::test]
async fn test_resolve_completed() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");
    h.fund_cash(user.id(), 5_000).await;
    let receipt = h
        .wallet
        .withdraw(user.id(), WithdrawalRequest::new(2_000, paypal()))
        .await
        .unwrap();
    let reference = receipt.entry.reference().unwrap().to_string();

    let resolved = h
        .wallet
        .resolve_withdrawal(h.admin.id(), &reference, Resolution::Completed)
        .await
        .unwrap();

    assert!(!resolved.refunded);
    assert_eq!(resolved.entry.status(), EntryStatus::Completed);
    assert_eq!(resolved.cash_balance, 3_000);
}

#[tokio::test]
async fn test_resolve_failed_refunds() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");
    h.fund_cash(user.id(), 5_000).await;
    let receipt = h
        .wallet
        .withdraw(user.id(), WithdrawalRequest::new(2_000, paypal()))
        .await
        .unwrap();
    let reference = receipt.entry.reference().unwrap().to_string();

    let resolved = h
        .wallet
        .resolve_withdrawal(h.admin.id(), &reference, Resolution::Failed)
        .await
        .unwrap();

    assert!(resolved.refunded);
    assert_eq!(resolved.entry.status(), EntryStatus::Failed);
    assert_eq!(h.cash(user.id()), 5_000);
}

#[tokio::test]
async fn test_resolve_twice_rejected() {
    let h = harness();
    let user = h.user("Ada", "+15550000001");
    h.fund_cash(user.id(), 5_000).await;
    let receipt = h
        .wallet
        .withdraw(user.id(), WithdrawalRequest::new(2_000, paypal()))
        .await
        .unwrap();
    let reference = receipt.entry.reference().unwrap().to_string();

    h.wallet
        .resolve_withdrawal(h.admin.id(), &reference, Resolution::Failed)
        .await
        .unwrap();
    let err = h
        .wallet
        .resolve_withdrawal(h.admin.id(), &reference, Resolution::Failed)
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Ledger(_)));
    assert_eq!(h.cash(user.id()), 5_000);
}

#[tokio::test]
async fn test_resolve_unknown_reference() {
    let h = harness();

    let err = h
        .wallet
        .resolve_withdrawal(h.admin.id(), "WD_0_000000_0000", Resolution::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::EntryNotFound(_)));
}
