// Wallet errors and their client-facing categories

use crate::account::{format_minor, AccountError, AccountId, Currency};
use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::otp::OtpError;
use crate::storage::StoreError;
use serde::Serialize;
use thiserror::Error;

fn minor(amount: &u64) -> String {
    format_minor(*amount)
}

/// How an error is reported to a client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Authorization,
    Internal,
}

impl ErrorCategory {
    /// HTTP status for the category
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Authorization => 403,
            ErrorCategory::Internal => 500,
        }
    }
}

/// Errors from wallet operations
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("No account registered for phone {0}")]
    RecipientNotFound(String),

    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    #[error("Insufficient {currency} balance: available {}, required {}", minor(.available), minor(.required))]
    InsufficientFunds {
        currency: Currency,
        available: u64,
        required: u64,
    },

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    #[error("Minimum withdrawal amount is {}", minor(.minimum))]
    BelowMinimum { minimum: u64, requested: u64 },

    #[error("{field} already registered")]
    Duplicate { field: &'static str, value: String },

    #[error("Reference already used: {0}")]
    DuplicateReference(String),

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WalletError::InvalidInput(_)
            | WalletError::InsufficientFunds { .. }
            | WalletError::SelfTransfer
            | WalletError::BelowMinimum { .. }
            | WalletError::Duplicate { .. }
            | WalletError::BalanceOverflow
            | WalletError::Account(_)
            | WalletError::Ledger(_) => ErrorCategory::Validation,
            WalletError::AccountNotFound(_) | WalletError::RecipientNotFound(_) | WalletError::EntryNotFound(_) => {
                ErrorCategory::NotFound
            }
            WalletError::Forbidden(_) => ErrorCategory::Authorization,
            WalletError::DuplicateReference(_)
            | WalletError::Config(_)
            | WalletError::Storage(_)
            | WalletError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::InvalidInput(_) => "invalid_input",
            WalletError::AccountNotFound(_) => "account_not_found",
            WalletError::RecipientNotFound(_) => "recipient_not_found",
            WalletError::EntryNotFound(_) => "entry_not_found",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::SelfTransfer => "self_transfer",
            WalletError::BelowMinimum { .. } => "below_minimum",
            WalletError::Duplicate { .. } => "duplicate",
            WalletError::DuplicateReference(_) => "duplicate_reference",
            WalletError::BalanceOverflow => "balance_overflow",
            WalletError::Forbidden(_) => "forbidden",
            WalletError::Account(_) => "invalid_account",
            WalletError::Ledger(_) => "invalid_ledger_operation",
            WalletError::Config(_) => "invalid_config",
            WalletError::Storage(_) => "storage_error",
            WalletError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => WalletError::AccountNotFound(id),
            StoreError::EntryNotFound(id) => WalletError::EntryNotFound(id),
            StoreError::Duplicate { field, value } => WalletError::Duplicate { field, value },
            StoreError::DuplicateReference(reference) => WalletError::DuplicateReference(reference),
            StoreError::InsufficientFunds {
                currency,
                available,
                required,
            } => WalletError::InsufficientFunds {
                currency,
                available,
                required,
            },
            StoreError::BalanceOverflow => WalletError::BalanceOverflow,
            StoreError::SelfTransfer => WalletError::SelfTransfer,
            StoreError::NotAWithdrawal(id) => WalletError::InvalidInput(format!("entry {} is not a withdrawal", id)),
            StoreError::Ledger(e) => WalletError::Ledger(e),
            other => WalletError::Storage(other.to_string()),
        }
    }
}

impl From<OtpError> for WalletError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidEmail(email) => WalletError::Account(AccountError::InvalidEmail(email)),
            OtpError::Storage(e) => e.into(),
            OtpError::Corrupt(e) => WalletError::Storage(e),
        }
    }
}
