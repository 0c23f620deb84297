// Payout - Pushes withdrawals to an external payout provider
// Bank transfers settle through the provider; other methods are paid out by hand

use crate::account::AccountId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// PAYOUT METHOD
// ============================================================================

/// Where a withdrawal is paid to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PayoutMethod {
    BankTransfer {
        account_name: String,
        account_number: String,
        bank_code: String,
    },
    MobileMoney {
        phone: String,
    },
    Paypal {
        email: String,
    },
}

impl PayoutMethod {
    pub fn name(&self) -> &'static str {
        match self {
            PayoutMethod::BankTransfer { .. } => "bank_transfer",
            PayoutMethod::MobileMoney { .. } => "mobile_money",
            PayoutMethod::Paypal { .. } => "paypal",
        }
    }

    /// Whether the provider settles this method (the rest wait for an admin)
    pub fn requires_settlement(&self) -> bool {
        matches!(self, PayoutMethod::BankTransfer { .. })
    }

    /// Destination details for the ledger entry metadata
    pub fn details(&self) -> Vec<(&'static str, String)> {
        match self {
            PayoutMethod::BankTransfer {
                account_name,
                account_number,
                bank_code,
            } => vec![
                ("account_name", account_name.clone()),
                ("account_number", mask(account_number)),
                ("bank_code", bank_code.clone()),
            ],
            PayoutMethod::MobileMoney { phone } => vec![("payout_phone", phone.clone())],
            PayoutMethod::Paypal { email } => vec![("payout_email", email.clone())],
        }
    }
}

/// Keep the last four characters
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

// ============================================================================
// PAYOUT REQUEST / OUTCOME
// ============================================================================

/// One payout sent to the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayoutRequest {
    /// Withdrawal reference, reused as the provider's idempotency reference
    pub reference: String,
    pub account_id: AccountId,
    /// Minor units
    pub amount: u64,
    pub method: PayoutMethod,
}

/// What happened to a withdrawal after the debit
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Method is paid out manually; entry stays pending for an admin
    Manual,
    /// Provider accepted the transfer; entry completed
    Settled { transfer_code: String, attempts: u32 },
    /// Provider failed, timed out or is not configured; entry stays pending
    Pending { reason: String, attempts: u32 },
}

impl SettlementOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementOutcome::Settled { .. })
    }
}

// ============================================================================
// PAYOUT PROVIDER TRAIT
// ============================================================================

/// External payout provider (bank transfer gateway)
#[async_trait]
pub trait PayoutProvider: Send + Sync {
    /// Attempt one transfer.
    /// Returns the provider transfer code on success, error message on failure
    async fn transfer(&self, request: &PayoutRequest) -> Result<String, String>;
}

// ============================================================================
// MOCK PAYOUT PROVIDER
// ============================================================================

/// How the mock answers each call
#[derive(Clone, Debug)]
enum Script {
    Succeed,
    Fail(String),
    /// Fail the first `failures` calls, then succeed
    Recover { failures: usize },
}

const MOCK_FAILURE: &str = "Mock failure";

/// Scripted payout provider for tests. Records every request it receives.
pub struct MockPayoutProvider {
    script: Script,
    delay_ms: u64,
    calls: AtomicUsize,
    requests: Mutex<Vec<PayoutRequest>>,
}

impl MockPayoutProvider {
    /// A provider that rejects every payout
    pub fn new() -> Self {
        Self {
            script: Script::Fail(MOCK_FAILURE.to_string()),
            delay_ms: 0,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_success(mut self) -> Self {
        self.script = Script::Succeed;
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.script = Script::Fail(message.to_string());
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn with_failures_then_success(mut self, failures: usize) -> Self {
        self.script = Script::Recover { failures };
        self
    }

    /// Number of transfer calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<PayoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockPayoutProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayoutProvider for MockPayoutProvider {
    async fn transfer(&self, request: &PayoutRequest) -> Result<String, String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Fail(message) => Err(message.clone()),
            Script::Recover { failures } if call < *failures => Err(MOCK_FAILURE.to_string()),
            Script::Succeed | Script::Recover { .. } => Ok(format!("TRF_mock_{}", call)),
        }
    }
}
