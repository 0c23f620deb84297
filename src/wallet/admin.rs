// Admin operations: grants and manual withdrawal resolution

use super::{Wallet, WalletError};
use crate::account::{format_minor, AccountId, Currency};
use crate::ledger::{EntryKind, EntryStatus, LedgerEntry};
use crate::notify::{Notification, NotificationKind};
use serde::Serialize;
use tracing::info;

/// How an admin closes a pending withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Paid out by hand
    Completed,
    /// Not paid; the debited cash goes back to the account
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalResolution {
    pub entry: LedgerEntry,
    pub cash_balance: u64,
    pub refunded: bool,
}

impl Wallet {
    /// Credit cash (as an earning) or coins (as a coin grant) to an account
    pub async fn grant(
        &self,
        admin_id: &AccountId,
        account_id: &AccountId,
        currency: Currency,
        amount: u64,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        let admin = self.require_admin(admin_id)?;
        if amount == 0 {
            return Err(WalletError::InvalidInput("Amount must be positive".to_string()));
        }

        let kind = match currency {
            Currency::Cash => EntryKind::Earning,
            Currency::Coin => EntryKind::CoinGrant,
        };
        let description = if description.trim().is_empty() {
            format!("Admin {} grant", currency)
        } else {
            description.trim().to_string()
        };
        let entry = LedgerEntry::credit(*account_id, kind, amount, &description)?
            .with_metadata("granted_by", &admin.id().to_hex());

        let account = self.store.credit(account_id, &entry)?;
        info!(
            admin = %admin.id(),
            account = %account.id(),
            currency = %currency,
            amount = %format_minor(amount),
            "grant credited"
        );

        let notification = Notification::new(
            NotificationKind::Earning,
            "Balance Credited",
            &format!("{} {} was added to your balance", format_minor(amount), currency),
        );
        self.notify(&account, notification).await;

        Ok(entry)
    }

    /// Close a pending withdrawal by its reference
    pub async fn resolve_withdrawal(
        &self,
        admin_id: &AccountId,
        reference: &str,
        resolution: Resolution,
    ) -> Result<WithdrawalResolution, WalletError> {
        let admin = self.require_admin(admin_id)?;
        let entry = self
            .store
            .entries_by_reference(reference.trim())?
            .into_iter()
            .find(|e| e.kind() == EntryKind::Withdrawal)
            .ok_or_else(|| WalletError::EntryNotFound(reference.to_string()))?;

        let (entry, account, refunded) = match resolution {
            Resolution::Completed => {
                let entry = self.store.set_entry_status(entry.id(), EntryStatus::Completed)?;
                let account = self.require_account(entry.account_id())?;
                (entry, account, false)
            }
            Resolution::Failed => {
                let (entry, account) = self.store.fail_withdrawal(entry.id())?;
                (entry, account, true)
            }
        };

        info!(
            admin = %admin.id(),
            reference = %reference,
            status = %entry.status(),
            refunded,
            "withdrawal resolved"
        );

        let body = if refunded {
            format!(
                "Your withdrawal of ${} could not be completed and was returned to your balance",
                format_minor(entry.magnitude())
            )
        } else {
            format!("Your withdrawal of ${} has been paid", format_minor(entry.magnitude()))
        };
        let notification = Notification::new(NotificationKind::Withdrawal, "Withdrawal Update", &body)
            .with_data("reference", reference)
            .with_data("status", &entry.status().to_string());
        self.notify(&account, notification).await;

        Ok(WithdrawalResolution {
            cash_balance: account.cash_balance(),
            entry,
            refunded,
        })
    }
}
