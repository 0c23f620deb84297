// Cash withdrawals
//
// The cash is debited up front together with a pending entry. Bank transfers
// then go to the payout provider; success completes the entry, anything else
// leaves it pending for an admin to resolve. There is no automatic refund.

use super::{Wallet, WalletError};
use crate::account::{format_minor, AccountId};
use crate::gateway::{PayoutMethod, PayoutRequest, SettlementOutcome};
use crate::ledger::{reference, EntryKind, EntryStatus, LedgerEntry};
use crate::notify::{Notification, NotificationKind};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

/// A validated withdrawal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalRequest {
    /// Minor units
    pub amount: u64,
    pub method: PayoutMethod,
}

impl WithdrawalRequest {
    pub fn new(amount: u64, method: PayoutMethod) -> Self {
        Self { amount, method }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalReceipt {
    pub entry: LedgerEntry,
    pub settlement: SettlementOutcome,
    pub cash_balance: u64,
}

impl Wallet {
    pub async fn withdraw(
        &self,
        account_id: &AccountId,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, WalletError> {
        if request.amount < self.config.min_withdrawal {
            return Err(WalletError::BelowMinimum {
                minimum: self.config.min_withdrawal,
                requested: request.amount,
            });
        }
        if request.amount == 0 {
            return Err(WalletError::InvalidInput("Amount must be positive".to_string()));
        }

        let account = self.require_account(account_id)?;
        let now = Utc::now();
        let reference = reference::withdrawal_reference(account.id(), now);

        let mut entry = LedgerEntry::debit(
            *account.id(),
            EntryKind::Withdrawal,
            request.amount,
            &format!("Withdrawal via {}", request.method.name()),
        )?
        .with_status(EntryStatus::Pending)
        .with_reference(&reference)
        .with_metadata("withdrawal_method", request.method.name())
        .with_created_at(now);
        for (key, value) in request.method.details() {
            entry = entry.with_metadata(key, &value);
        }

        let account = self.store.debit_withdrawal(account.id(), &entry)?;
        info!(
            reference = %reference,
            account = %account.id(),
            amount = %format_minor(request.amount),
            method = request.method.name(),
            "withdrawal debited"
        );

        let (entry, settlement) = if request.method.requires_settlement() {
            self.settle(entry, &request).await
        } else {
            (entry, SettlementOutcome::Manual)
        };

        let notification = Notification::new(
            NotificationKind::Withdrawal,
            "Withdrawal Request",
            &format!(
                "Your withdrawal request of ${} has been submitted",
                format_minor(request.amount)
            ),
        )
        .with_data("reference", &reference)
        .with_data("status", &entry.status().to_string());
        self.notify(&account, notification).await;

        Ok(WithdrawalReceipt {
            entry,
            settlement,
            cash_balance: account.cash_balance(),
        })
    }

    /// Hand the withdrawal to the payout provider, retrying per config.
    /// Never fails: whatever goes wrong leaves the entry pending.
    async fn settle(&self, entry: LedgerEntry, request: &WithdrawalRequest) -> (LedgerEntry, SettlementOutcome) {
        let Some(provider) = self.payout.as_ref() else {
            warn!(reference = ?entry.reference(), "no payout provider configured, withdrawal left pending");
            return (
                entry,
                SettlementOutcome::Pending {
                    reason: "no payout provider configured".to_string(),
                    attempts: 0,
                },
            );
        };

        let payout = PayoutRequest {
            reference: entry.reference().unwrap_or_default().to_string(),
            account_id: *entry.account_id(),
            amount: request.amount,
            method: request.method.clone(),
        };

        let mut attempts = 0u32;

        let last_error = loop {
            attempts += 1;

            let error = match tokio::time::timeout(self.config.payout_timeout(), provider.transfer(&payout)).await {
                Ok(Ok(transfer_code)) => {
                    return match self.store.set_entry_status(entry.id(), EntryStatus::Completed) {
                        Ok(completed) => {
                            info!(reference = %payout.reference, transfer_code = %transfer_code, "withdrawal settled");
                            (
                                completed,
                                SettlementOutcome::Settled {
                                    transfer_code,
                                    attempts,
                                },
                            )
                        }
                        Err(e) => {
                            error!(
                                reference = %payout.reference,
                                transfer_code = %transfer_code,
                                error = %e,
                                "payout succeeded but entry could not be completed"
                            );
                            (
                                entry,
                                SettlementOutcome::Pending {
                                    reason: format!("settled as {} but status update failed: {}", transfer_code, e),
                                    attempts,
                                },
                            )
                        }
                    };
                }
                Ok(Err(e)) => e,
                Err(_) => "Timeout".to_string(),
            };

            if attempts >= self.config.payout_max_attempts {
                break error;
            }

            let delay = self.config.payout_retry_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        };

        warn!(
            reference = %payout.reference,
            attempts,
            error = %last_error,
            "payout failed, withdrawal left pending for review"
        );
        (
            entry,
            SettlementOutcome::Pending {
                reason: last_error,
                attempts,
            },
        )
    }
}
