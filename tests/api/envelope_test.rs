// Envelope Tests
// JSON response shape and status mapping

use quizwallet::account::{AccountId, Currency};
use quizwallet::api::Envelope;
use quizwallet::wallet::WalletError;
use serde_json::json;

#[test]
fn test_ok_envelope() {
    let envelope = Envelope::ok(json!({"balance": 100})).with_message("done");
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(value, json!({"success": true, "message": "done", "data": {"balance": 100}}));
    assert_eq!(envelope.status(), 200);
}

#[test]
fn test_error_envelope() {
    let err = WalletError::InsufficientFunds {
        currency: Currency::Coin,
        available: 2_550,
        required: 3_000,
    };
    let envelope: Envelope<()> = Envelope::from_error(&err);
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(
        value,
        json!({
            "success": false,
            "message": "Insufficient coin balance: available 25.50, required 30.00",
            "error": "insufficient_funds"
        })
    );
    assert_eq!(envelope.status(), 400);
}

#[test]
fn test_status_by_category() {
    let not_found: Envelope<()> = Envelope::from_result(Err(WalletError::AccountNotFound(AccountId::generate())));
    let forbidden: Envelope<()> = Envelope::from_result(Err(WalletError::Forbidden("admin role required".into())));
    let internal: Envelope<()> = Envelope::from_result(Err(WalletError::Internal("boom".into())));

    assert_eq!(not_found.status(), 404);
    assert_eq!(forbidden.status(), 403);
    assert_eq!(internal.status(), 500);
}
