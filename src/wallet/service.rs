// Wallet service - shared state, accounts and read operations

use super::WalletError;
use crate::account::{Account, AccountId, Balances, NewAccount};
use crate::config::WalletConfig;
use crate::gateway::PayoutProvider;
use crate::ledger::{EntryKind, HistoryQuery, LedgerEntry, Page};
use crate::notify::{dispatch, LogNotifier, Notification, Notifier};
use crate::referral::{ReferralLink, ReferralStats};
use crate::storage::{StoreError, WalletStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Generated referral codes retried on collision
const REFERRAL_CODE_ATTEMPTS: usize = 5;
/// Newest withdrawals returned by `withdrawal_history`
const WITHDRAWAL_HISTORY_LIMIT: usize = 50;
/// Referred accounts listed in `referral_stats`
const REFERRAL_LIST_LIMIT: usize = 20;

/// The wallet service
///
/// Cloning is cheap; clones share the store and collaborators.
#[derive(Clone)]
pub struct Wallet {
    pub(super) store: WalletStore,
    pub(super) config: WalletConfig,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) payout: Option<Arc<dyn PayoutProvider>>,
}

impl Wallet {
    /// Create a wallet that logs notifications and has no payout provider
    pub fn new(store: WalletStore, config: WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            notifier: Arc::new(LogNotifier),
            payout: None,
        })
    }

    /// Open the store under `config.data_dir`
    pub fn open(config: WalletConfig) -> Result<Self, WalletError> {
        let store = WalletStore::open(&config.data_dir)?;
        Self::new(store, config)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_payout_provider(mut self, provider: Arc<dyn PayoutProvider>) -> Self {
        self.payout = Some(provider);
        self
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Check if a payout provider is configured
    pub fn has_payout_provider(&self) -> bool {
        self.payout.is_some()
    }

    pub(super) fn require_account(&self, id: &AccountId) -> Result<Account, WalletError> {
        self.store.account(id)?.ok_or(WalletError::AccountNotFound(*id))
    }

    pub(super) fn require_admin(&self, id: &AccountId) -> Result<Account, WalletError> {
        let account = self.require_account(id)?;
        if !account.is_admin() {
            return Err(WalletError::Forbidden("admin role required".to_string()));
        }
        Ok(account)
    }

    pub(super) async fn notify(&self, recipient: &Account, notification: Notification) {
        dispatch(self.notifier.as_ref(), recipient, notification, self.config.notify_timeout()).await;
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Open an account, linking it to its referrer when the referral code
    /// resolves. Unknown referral codes are ignored.
    pub fn open_account(&self, input: NewAccount) -> Result<Account, WalletError> {
        let (name, email, phone) = input.validate()?;

        let referrer = match input.referral_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let found = self.store.account_id_by_referral_code(&code.to_uppercase())?;
                if found.is_none() {
                    debug!(code, "referral code not found, ignoring");
                }
                found
            }
            _ => None,
        };

        let mut account = Account::open(name, email, phone, input.role, referrer);
        for attempt in 1..=REFERRAL_CODE_ATTEMPTS {
            let link = referrer.map(|r| ReferralLink::new(r, *account.id(), self.config.referral_bonus, Utc::now()));

            match self.store.create_account(&account, link.as_ref()) {
                Ok(()) => {
                    info!(account = %account.id(), referred = referrer.is_some(), "account opened");
                    return Ok(account);
                }
                Err(StoreError::Duplicate {
                    field: "referral_code", ..
                }) if attempt < REFERRAL_CODE_ATTEMPTS => {
                    account = account.with_referral_code(Account::generate_referral_code());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(WalletError::Internal("could not allocate a referral code".to_string()))
    }

    pub fn account(&self, id: &AccountId) -> Result<Account, WalletError> {
        self.require_account(id)
    }

    pub fn account_by_phone(&self, phone: &str) -> Result<Account, WalletError> {
        let phone = crate::account::normalize_phone(phone);
        let id = self
            .store
            .account_id_by_phone(&phone)?
            .ok_or_else(|| WalletError::RecipientNotFound(phone.clone()))?;
        self.require_account(&id)
    }

    pub fn balances(&self, id: &AccountId) -> Result<Balances, WalletError> {
        Ok(self.require_account(id)?.balances())
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    /// Transaction history, newest first
    pub fn history(&self, id: &AccountId, query: &HistoryQuery) -> Result<Page<LedgerEntry>, WalletError> {
        self.require_account(id)?;
        Ok(self.store.history(id, query)?)
    }

    /// Newest withdrawals for an account
    pub fn withdrawal_history(&self, id: &AccountId) -> Result<Vec<LedgerEntry>, WalletError> {
        let query = HistoryQuery::new()
            .with_kind(EntryKind::Withdrawal)
            .with_limit(WITHDRAWAL_HISTORY_LIMIT);
        Ok(self.history(id, &query)?.items)
    }

    /// Entries sharing a reference
    pub fn entries_by_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>, WalletError> {
        Ok(self.store.entries_by_reference(reference.trim())?)
    }

    /// Referral summary for a referrer
    pub fn referral_stats(&self, id: &AccountId) -> Result<ReferralStats, WalletError> {
        let account = self.require_account(id)?;
        let links = self.store.referrals_for(id)?;
        Ok(ReferralStats::from_links(account.referral_code(), links, REFERRAL_LIST_LIMIT))
    }
}
