// Request bodies

use crate::account::MINOR_UNITS;
use crate::gateway::PayoutMethod;
use crate::wallet::{QuizSubmission, TransferRequest, WalletError, WithdrawalRequest};
use serde::Deserialize;

/// Largest amount accepted at the boundary (exactly representable in f64)
const MAX_MINOR: f64 = 9_007_199_254_740_992.0;

/// Convert a decimal amount to minor units.
///
/// Rejects non-finite and negative values and anything finer than a cent.
/// Zero is rejected unless `allow_zero`.
pub fn parse_money(value: f64, allow_zero: bool) -> Result<u64, WalletError> {
    if !value.is_finite() {
        return Err(WalletError::InvalidInput("Amount must be a number".to_string()));
    }
    if value < 0.0 || (value == 0.0 && !allow_zero) {
        return Err(WalletError::InvalidInput("Amount must be positive".to_string()));
    }

    let scaled = value * MINOR_UNITS as f64;
    let minor = scaled.round();
    if (minor - scaled).abs() > 1e-6 {
        return Err(WalletError::InvalidInput(
            "Amount can have at most two decimal places".to_string(),
        ));
    }
    if minor > MAX_MINOR {
        return Err(WalletError::InvalidInput("Amount too large".to_string()));
    }
    Ok(minor as u64)
}

fn required(value: Option<String>, what: &str) -> Result<String, WalletError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(WalletError::InvalidInput(format!("{} is required", what))),
    }
}

// ============================================================================
// TRANSFER
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct TransferBody {
    #[serde(default, alias = "phone_number")]
    pub recipient_phone: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl TransferBody {
    pub fn validate(self) -> Result<TransferRequest, WalletError> {
        let amount = parse_money(self.amount, false)?;
        let phone = required(self.recipient_phone, "Recipient phone number")?;
        let mut request = TransferRequest::new(&phone, amount);
        if let Some(note) = self.note.as_deref() {
            request = request.with_note(note);
        }
        Ok(request)
    }
}

// ============================================================================
// WITHDRAW
// ============================================================================

/// Destination fields; which ones are needed depends on the method
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AccountDetails {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub bank_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WithdrawBody {
    pub amount: f64,
    pub method: String,
    #[serde(default)]
    pub account_details: AccountDetails,
}

impl WithdrawBody {
    pub fn validate(self) -> Result<WithdrawalRequest, WalletError> {
        let amount = parse_money(self.amount, false)?;
        let details = self.account_details;

        let method = match self.method.trim() {
            "bank_transfer" => PayoutMethod::BankTransfer {
                account_name: required(details.account_name, "Account name")?,
                account_number: required(details.account_number, "Account number")?,
                bank_code: required(details.bank_code, "Bank code")?,
            },
            "mobile_money" => PayoutMethod::MobileMoney {
                phone: required(details.phone, "Payout phone number")?,
            },
            "paypal" => PayoutMethod::Paypal {
                email: required(details.email, "PayPal email")?,
            },
            other => {
                return Err(WalletError::InvalidInput(format!(
                    "Unsupported withdrawal method: {}",
                    other
                )))
            }
        };

        Ok(WithdrawalRequest::new(amount, method))
    }
}

// ============================================================================
// QUIZ
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct QuizBody {
    pub correct_answers: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub total_points: u64,
}

impl QuizBody {
    pub fn validate(self) -> Result<QuizSubmission, WalletError> {
        let submission = QuizSubmission {
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            earnings: parse_money(self.total_earnings, true)?,
            points: self.total_points,
        };
        submission.validate()?;
        Ok(submission)
    }
}
