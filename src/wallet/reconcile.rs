// Ledger-vs-balance check

use super::{Wallet, WalletError};
use crate::account::{AccountId, Currency};
use crate::ledger::{EntryKind, EntryStatus};
use serde::Serialize;

/// Balances next to the sums of the entries that produced them
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub account_id: AccountId,
    pub cash_balance: u64,
    pub cash_ledger: i128,
    pub coin_balance: u64,
    pub coin_ledger: i128,
    pub pending_withdrawals: usize,
    pub consistent: bool,
}

impl Wallet {
    /// Sum every applied entry per currency and compare with the balances
    pub fn reconcile(&self, account_id: &AccountId) -> Result<ReconcileReport, WalletError> {
        let account = self.require_account(account_id)?;
        let entries = self.store.entries_for(account_id)?;

        let mut cash_ledger: i128 = 0;
        let mut coin_ledger: i128 = 0;
        let mut pending_withdrawals = 0;

        for entry in entries.iter().filter(|e| e.is_applied()) {
            match entry.currency() {
                Currency::Cash => cash_ledger += i128::from(entry.amount()),
                Currency::Coin => coin_ledger += i128::from(entry.amount()),
            }
            if entry.kind() == EntryKind::Withdrawal && entry.status() == EntryStatus::Pending {
                pending_withdrawals += 1;
            }
        }

        let consistent =
            cash_ledger == i128::from(account.cash_balance()) && coin_ledger == i128::from(account.coin_balance());

        Ok(ReconcileReport {
            account_id: *account_id,
            cash_balance: account.cash_balance(),
            cash_ledger,
            coin_balance: account.coin_balance(),
            coin_ledger,
            pending_withdrawals,
            consistent,
        })
    }
}
