// Body Tests
// Decimal amounts and request body validation

use quizwallet::api::{parse_money, QuizBody, TransferBody, WithdrawBody};
use quizwallet::gateway::PayoutMethod;
use quizwallet::wallet::WalletError;

// ============================================================================
// MONEY
// ============================================================================

#[test]
fn test_parse_money() {
    assert_eq!(parse_money(30.0, false).unwrap(), 3_000);
    assert_eq!(parse_money(25.5, false).unwrap(), 2_550);
    assert_eq!(parse_money(0.1, false).unwrap(), 10);
    assert_eq!(parse_money(0.0, true).unwrap(), 0);
}

#[test]
fn test_parse_money_rejects_bad_values() {
    for value in [0.0, -1.0, 10.005, f64::NAN, f64::INFINITY, 1e17] {
        assert!(
            matches!(parse_money(value, false), Err(WalletError::InvalidInput(_))),
            "accepted {}",
            value
        );
    }
}

// ============================================================================
// TRANSFER
// ============================================================================

#[test]
fn test_transfer_body() {
    let body: TransferBody =
        serde_json::from_str(r#"{"phone_number":"+15550000002","amount":30,"note":"thanks"}"#).unwrap();
    let request = body.validate().unwrap();

    assert_eq!(request.recipient_phone, "+15550000002");
    assert_eq!(request.amount, 3_000);
    assert_eq!(request.note.as_deref(), Some("thanks"));
}

#[test]
fn test_transfer_body_requires_phone() {
    let body: TransferBody = serde_json::from_str(r#"{"amount":30}"#).unwrap();
    let err = body.validate().unwrap_err();
    assert_eq!(err.to_string(), "Recipient phone number is required");
}

// ============================================================================
// WITHDRAW
// ============================================================================

#[test]
fn test_withdraw_body_bank_transfer() {
    let body: WithdrawBody = serde_json::from_str(
        r#"{"amount":10,"method":"bank_transfer",
            "account_details":{"account_name":"Ada","account_number":"0123456789","bank_code":"058"}}"#,
    )
    .unwrap();
    let request = body.validate().unwrap();

    assert_eq!(request.amount, 1_000);
    assert!(matches!(request.method, PayoutMethod::BankTransfer { .. }));
}

#[test]
fn test_withdraw_body_missing_details() {
    let body: WithdrawBody = serde_json::from_str(r#"{"amount":10,"method":"bank_transfer"}"#).unwrap();
    let err = body.validate().unwrap_err();
    assert_eq!(err.to_string(), "Account name is required");
}

#[test]
fn test_withdraw_body_unknown_method() {
    let body: WithdrawBody = serde_json::from_str(r#"{"amount":10,"method":"cheque"}"#).unwrap();
    let err = body.validate().unwrap_err();
    assert_eq!(err.to_string(), "Unsupported withdrawal method: cheque");
}

// ============================================================================
// QUIZ
// ============================================================================

#[test]
fn test_quiz_body_defaults() {
    let body: QuizBody = serde_json::from_str(r#"{"correct_answers":3,"total_questions":5}"#).unwrap();
    let submission = body.validate().unwrap();

    assert_eq!(submission.earnings, 0);
    assert_eq!(submission.points, 0);
}

#[test]
fn test_quiz_body_rejects_too_many_correct() {
    let body: QuizBody = serde_json::from_str(r#"{"correct_answers":6,"total_questions":5}"#).unwrap();
    assert!(body.validate().is_err());
}
