// WalletStore - Persistent storage using sled
//
// Every balance change and the ledger entries that explain it are written in
// one multi-tree sled transaction. Checks such as "enough coins?" or "bonus
// already paid?" run inside the same transaction as the write, so they cannot
// race with a concurrent writer.

use crate::account::{Account, AccountId, BalanceError, Currency};
use crate::ledger::{EntryId, EntryKind, EntryStatus, HistoryQuery, LedgerEntry, LedgerError, Page};
use crate::referral::{ReferralError, ReferralLink};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError, TransactionResult,
    TransactionalTree,
};
use sled::Transactional;
use std::path::Path;
use thiserror::Error;

/// Tree names
mod trees {
    pub const ACCOUNTS: &str = "accounts";
    pub const EMAILS: &str = "accounts:email";
    pub const PHONES: &str = "accounts:phone";
    pub const REFERRAL_CODES: &str = "accounts:referral_code";
    pub const ENTRIES: &str = "ledger:entries";
    pub const ENTRY_INDEX: &str = "ledger:entry_index";
    pub const REFERENCES: &str = "ledger:references";
    pub const REFERRALS: &str = "referrals";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    #[error("{field} already registered: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Reference already used: {0}")]
    DuplicateReference(String),

    #[error("Insufficient {currency} balance: available {available}, required {required}")]
    InsufficientFunds {
        currency: Currency,
        available: u64,
        required: u64,
    },

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Cannot transfer to the same account")]
    SelfTransfer,

    #[error("Referral bonus already paid")]
    AlreadyPaid,

    #[error("Entry {0} is not a withdrawal")]
    NotAWithdrawal(EntryId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

impl From<BalanceError> for StoreError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InsufficientFunds {
                currency,
                available,
                required,
            } => StoreError::InsufficientFunds {
                currency,
                available,
                required,
            },
            BalanceError::Overflow => StoreError::BalanceOverflow,
        }
    }
}

impl From<ReferralError> for StoreError {
    fn from(err: ReferralError) -> Self {
        match err {
            ReferralError::AlreadyPaid => StoreError::AlreadyPaid,
        }
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    pub account_count: usize,
    pub entry_count: usize,
    pub referral_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

// ============================================================================
// ENCODING HELPERS
// ============================================================================

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}

fn abort<T>(err: impl Into<StoreError>) -> ConflictableTransactionResult<T, StoreError> {
    Err(ConflictableTransactionError::Abort(err.into()))
}

fn finish<T>(result: TransactionResult<T, StoreError>) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(err.into()),
    }
}

/// Entries are keyed account || created millis || entry id, so a prefix scan
/// over an account yields its history in time order.
fn entry_key(entry: &LedgerEntry) -> Vec<u8> {
    let millis = entry.created_at().timestamp_millis().max(0) as u64;
    [entry.account_id().as_bytes(), &millis.to_be_bytes(), entry.id().as_bytes()].concat()
}

/// Reference index key. A reference is unique per account; both sides of a
/// transfer share it across two accounts.
fn reference_key(reference: &str, account: &AccountId) -> Vec<u8> {
    [reference.as_bytes(), &[0u8], account.as_bytes()].concat()
}

fn reference_prefix(reference: &str) -> Vec<u8> {
    [reference.as_bytes(), &[0u8]].concat()
}

// ============================================================================
// IN-TRANSACTION HELPERS
// ============================================================================

fn read_account(tree: &TransactionalTree, id: &AccountId) -> ConflictableTransactionResult<Account, StoreError> {
    match tree.get(id.as_bytes())? {
        Some(bytes) => decode(&bytes).map_err(ConflictableTransactionError::Abort),
        None => abort(StoreError::AccountNotFound(*id)),
    }
}

fn write_account(tree: &TransactionalTree, account: &Account) -> ConflictableTransactionResult<(), StoreError> {
    let bytes = encode(account).map_err(ConflictableTransactionError::Abort)?;
    tree.insert(account.id().as_bytes(), bytes)?;
    Ok(())
}

fn read_entry(
    index: &TransactionalTree,
    entries: &TransactionalTree,
    id: &EntryId,
) -> ConflictableTransactionResult<(Vec<u8>, LedgerEntry), StoreError> {
    let key = match index.get(id.as_bytes())? {
        Some(key) => key.to_vec(),
        None => return abort(StoreError::EntryNotFound(id.to_hex())),
    };
    match entries.get(&key)? {
        Some(bytes) => {
            let entry = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
            Ok((key, entry))
        }
        None => abort(StoreError::EntryNotFound(id.to_hex())),
    }
}

fn put_entry(
    entries: &TransactionalTree,
    index: &TransactionalTree,
    references: &TransactionalTree,
    entry: &LedgerEntry,
) -> ConflictableTransactionResult<(), StoreError> {
    if let Some(reference) = entry.reference() {
        let ref_key = reference_key(reference, entry.account_id());
        if references.get(&ref_key)?.is_some() {
            return abort(StoreError::DuplicateReference(reference.to_string()));
        }
        references.insert(ref_key, entry.id().as_bytes())?;
    }

    let key = entry_key(entry);
    let bytes = encode(entry).map_err(ConflictableTransactionError::Abort)?;
    entries.insert(key.clone(), bytes)?;
    index.insert(entry.id().as_bytes(), key)?;
    Ok(())
}

// ============================================================================
// WALLET STORE
// ============================================================================

/// Persistent store for accounts, ledger entries and referral links
///
/// Cloning is cheap; clones share the same database.
#[derive(Clone)]
pub struct WalletStore {
    db: sled::Db,
    accounts: sled::Tree,
    emails: sled::Tree,
    phones: sled::Tree,
    referral_codes: sled::Tree,
    entries: sled::Tree,
    entry_index: sled::Tree,
    references: sled::Tree,
    referrals: sled::Tree,
}

impl WalletStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Self::from_db(db)
    }

    /// Open a throwaway store that lives only in memory
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            accounts: db.open_tree(trees::ACCOUNTS)?,
            emails: db.open_tree(trees::EMAILS)?,
            phones: db.open_tree(trees::PHONES)?,
            referral_codes: db.open_tree(trees::REFERRAL_CODES)?,
            entries: db.open_tree(trees::ENTRIES)?,
            entry_index: db.open_tree(trees::ENTRY_INDEX)?,
            references: db.open_tree(trees::REFERENCES)?,
            referrals: db.open_tree(trees::REFERRALS)?,
            db,
        })
    }

    /// Open an auxiliary tree in the same database
    pub fn open_tree(&self, name: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(name)?)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            account_count: self.accounts.len(),
            entry_count: self.entries.len(),
            referral_count: self.referrals.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Insert a new account and its unique indexes, plus an unpaid referral
    /// link when the account was referred
    pub fn create_account(&self, account: &Account, link: Option<&ReferralLink>) -> Result<(), StoreError> {
        let account_bytes = encode(account)?;
        let link_bytes = link.map(encode).transpose()?;

        let result = (
            &self.accounts,
            &self.emails,
            &self.phones,
            &self.referral_codes,
            &self.referrals,
        )
            .transaction(|(accounts, emails, phones, codes, referrals)| {
                if accounts.get(account.id().as_bytes())?.is_some() {
                    return abort(StoreError::Duplicate {
                        field: "id",
                        value: account.id().to_hex(),
                    });
                }
                if emails.get(account.email().as_bytes())?.is_some() {
                    return abort(StoreError::Duplicate {
                        field: "email",
                        value: account.email().to_string(),
                    });
                }
                if let Some(phone) = account.phone() {
                    if phones.get(phone.as_bytes())?.is_some() {
                        return abort(StoreError::Duplicate {
                            field: "phone",
                            value: phone.to_string(),
                        });
                    }
                }
                if codes.get(account.referral_code().as_bytes())?.is_some() {
                    return abort(StoreError::Duplicate {
                        field: "referral_code",
                        value: account.referral_code().to_string(),
                    });
                }

                accounts.insert(account.id().as_bytes(), account_bytes.clone())?;
                emails.insert(account.email().as_bytes(), account.id().as_bytes())?;
                if let Some(phone) = account.phone() {
                    phones.insert(phone.as_bytes(), account.id().as_bytes())?;
                }
                codes.insert(account.referral_code().as_bytes(), account.id().as_bytes())?;

                if let (Some(link), Some(bytes)) = (link, link_bytes.as_ref()) {
                    let key = link.storage_key();
                    if referrals.get(&key)?.is_none() {
                        referrals.insert(key, bytes.clone())?;
                    }
                }
                Ok(())
            });

        finish(result)
    }

    /// Load an account by ID
    pub fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        match self.accounts.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn lookup(tree: &sled::Tree, key: &str) -> Result<Option<AccountId>, StoreError> {
        match tree.get(key.as_bytes())? {
            Some(bytes) => {
                let id = AccountId::from_slice(&bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Account ID for a normalised phone number
    pub fn account_id_by_phone(&self, phone: &str) -> Result<Option<AccountId>, StoreError> {
        Self::lookup(&self.phones, phone)
    }

    /// Account ID for a normalised email
    pub fn account_id_by_email(&self, email: &str) -> Result<Option<AccountId>, StoreError> {
        Self::lookup(&self.emails, email)
    }

    /// Account ID owning a referral code
    pub fn account_id_by_referral_code(&self, code: &str) -> Result<Option<AccountId>, StoreError> {
        Self::lookup(&self.referral_codes, code)
    }

    // ========================================================================
    // BALANCE MUTATIONS
    // ========================================================================

    /// Move coins between two accounts and write both ledger sides.
    ///
    /// Fails without writing anything if either account is missing, the
    /// sender cannot cover `amount`, or both ids are the same account.
    pub fn transfer_coins(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        amount: u64,
        out_entry: &LedgerEntry,
        in_entry: &LedgerEntry,
    ) -> Result<(Account, Account), StoreError> {
        let result = (&self.accounts, &self.entries, &self.entry_index, &self.references).transaction(
            |(accounts, entries, index, references)| {
                let mut from = read_account(accounts, sender)?;
                let mut to = read_account(accounts, recipient)?;

                if from.coin_balance() < amount {
                    return abort(StoreError::InsufficientFunds {
                        currency: Currency::Coin,
                        available: from.coin_balance(),
                        required: amount,
                    });
                }
                if from.id() == to.id() {
                    return abort(StoreError::SelfTransfer);
                }

                if let Err(e) = from.debit(Currency::Coin, amount) {
                    return abort(e);
                }
                if let Err(e) = to.credit(Currency::Coin, amount) {
                    return abort(e);
                }

                write_account(accounts, &from)?;
                write_account(accounts, &to)?;
                put_entry(entries, index, references, out_entry)?;
                put_entry(entries, index, references, in_entry)?;
                Ok((from, to))
            },
        );

        finish(result)
    }

    /// Credit a balance and record the entry explaining it
    pub fn credit(&self, account_id: &AccountId, entry: &LedgerEntry) -> Result<Account, StoreError> {
        let currency = entry.currency();
        let amount = entry.magnitude();

        let result = (&self.accounts, &self.entries, &self.entry_index, &self.references).transaction(
            |(accounts, entries, index, references)| {
                let mut account = read_account(accounts, account_id)?;
                if let Err(e) = account.credit(currency, amount) {
                    return abort(e);
                }
                write_account(accounts, &account)?;
                put_entry(entries, index, references, entry)?;
                Ok(account)
            },
        );

        finish(result)
    }

    /// Debit cash for a withdrawal and record the (pending) entry
    pub fn debit_withdrawal(&self, account_id: &AccountId, entry: &LedgerEntry) -> Result<Account, StoreError> {
        if entry.kind() != EntryKind::Withdrawal {
            return Err(StoreError::NotAWithdrawal(*entry.id()));
        }
        let amount = entry.magnitude();

        let result = (&self.accounts, &self.entries, &self.entry_index, &self.references).transaction(
            |(accounts, entries, index, references)| {
                let mut account = read_account(accounts, account_id)?;
                if let Err(e) = account.debit(Currency::Cash, amount) {
                    return abort(e);
                }
                write_account(accounts, &account)?;
                put_entry(entries, index, references, entry)?;
                Ok(account)
            },
        );

        finish(result)
    }

    /// Credit quiz earnings and points, bump the quiz counter, and record the
    /// reward entry when there is one
    pub fn record_quiz(
        &self,
        account_id: &AccountId,
        earnings: u64,
        points: u64,
        entry: Option<&LedgerEntry>,
    ) -> Result<Account, StoreError> {
        let result = (&self.accounts, &self.entries, &self.entry_index, &self.references).transaction(
            |(accounts, entries, index, references)| {
                let mut account = read_account(accounts, account_id)?;
                if let Err(e) = account.credit(Currency::Cash, earnings) {
                    return abort(e);
                }
                if let Err(e) = account.add_points(points) {
                    return abort(e);
                }
                account.record_quiz();
                write_account(accounts, &account)?;
                if let Some(entry) = entry {
                    put_entry(entries, index, references, entry)?;
                }
                Ok(account)
            },
        );

        finish(result)
    }

    /// Pay a referral bonus once per pair.
    ///
    /// Aborts with `AlreadyPaid` if the stored link is already paid.
    /// Otherwise credits the referrer, upserts the link as paid, and writes
    /// the bonus entry.
    pub fn pay_referral(
        &self,
        template: &ReferralLink,
        entry: &LedgerEntry,
        now: DateTime<Utc>,
    ) -> Result<(ReferralLink, Account), StoreError> {
        let key = template.storage_key();
        let bonus = entry.magnitude();

        let result = (
            &self.accounts,
            &self.referrals,
            &self.entries,
            &self.entry_index,
            &self.references,
        )
            .transaction(|(accounts, referrals, entries, index, references)| {
                let mut link = match referrals.get(&key)? {
                    Some(bytes) => decode::<ReferralLink>(&bytes).map_err(ConflictableTransactionError::Abort)?,
                    None => template.clone(),
                };
                if let Err(e) = link.mark_paid(bonus, now) {
                    return abort(e);
                }

                let mut referrer = read_account(accounts, template.referrer())?;
                if let Err(e) = referrer.credit(Currency::Cash, bonus) {
                    return abort(e);
                }

                let link_bytes = encode(&link).map_err(ConflictableTransactionError::Abort)?;
                referrals.insert(key.clone(), link_bytes)?;
                write_account(accounts, &referrer)?;
                put_entry(entries, index, references, entry)?;
                Ok((link, referrer))
            });

        finish(result)
    }

    // ========================================================================
    // ENTRY STATUS
    // ========================================================================

    /// Move an entry out of pending
    pub fn set_entry_status(&self, id: &EntryId, next: EntryStatus) -> Result<LedgerEntry, StoreError> {
        let result = (&self.entry_index, &self.entries).transaction(|(index, entries)| {
            let (key, mut entry) = read_entry(index, entries, id)?;
            if let Err(e) = entry.transition(next) {
                return abort(e);
            }
            let bytes = encode(&entry).map_err(ConflictableTransactionError::Abort)?;
            entries.insert(key, bytes)?;
            Ok(entry)
        });

        finish(result)
    }

    /// Mark a pending withdrawal failed and give the cash back
    pub fn fail_withdrawal(&self, id: &EntryId) -> Result<(LedgerEntry, Account), StoreError> {
        let result = (&self.entry_index, &self.entries, &self.accounts).transaction(|(index, entries, accounts)| {
            let (key, mut entry) = read_entry(index, entries, id)?;
            if entry.kind() != EntryKind::Withdrawal {
                return abort(StoreError::NotAWithdrawal(*id));
            }
            if let Err(e) = entry.transition(EntryStatus::Failed) {
                return abort(e);
            }

            let mut account = read_account(accounts, entry.account_id())?;
            if let Err(e) = account.credit(Currency::Cash, entry.magnitude()) {
                return abort(e);
            }

            let bytes = encode(&entry).map_err(ConflictableTransactionError::Abort)?;
            entries.insert(key, bytes)?;
            write_account(accounts, &account)?;
            Ok((entry, account))
        });

        finish(result)
    }

    // ========================================================================
    // LEDGER QUERIES
    // ========================================================================

    /// Load an entry by ID
    pub fn entry(&self, id: &EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let key = match self.entry_index.get(id.as_bytes())? {
            Some(key) => key,
            None => return Ok(None),
        };
        match self.entries.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All entries carrying a reference, one per account
    pub fn entries_by_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut found = Vec::new();
        for result in self.references.scan_prefix(reference_prefix(reference)) {
            let (_, id_bytes) = result?;
            let id = EntryId::from_slice(&id_bytes)?;
            if let Some(entry) = self.entry(&id)? {
                found.push(entry);
            }
        }
        Ok(found)
    }

    /// Every entry for an account, newest first
    pub fn entries_for(&self, account: &AccountId) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut found = Vec::new();
        for result in self.entries.scan_prefix(account.as_bytes()).rev() {
            let (_, bytes) = result?;
            found.push(decode(&bytes)?);
        }
        Ok(found)
    }

    /// One page of an account's history, newest first
    pub fn history(&self, account: &AccountId, query: &HistoryQuery) -> Result<Page<LedgerEntry>, StoreError> {
        let filtered: Vec<LedgerEntry> = self
            .entries_for(account)?
            .into_iter()
            .filter(|e| query.kind.map_or(true, |k| e.kind() == k))
            .collect();
        Ok(Page::from_items(filtered, query))
    }

    // ========================================================================
    // REFERRALS
    // ========================================================================

    /// Load the link for a pair
    pub fn referral_link(&self, referrer: &AccountId, referred: &AccountId) -> Result<Option<ReferralLink>, StoreError> {
        match self.referrals.get(ReferralLink::key(referrer, referred))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every link where `referrer` invited someone
    pub fn referrals_for(&self, referrer: &AccountId) -> Result<Vec<ReferralLink>, StoreError> {
        let mut links = Vec::new();
        for result in self.referrals.scan_prefix(referrer.as_bytes()) {
            let (_, bytes) = result?;
            links.push(decode(&bytes)?);
        }
        Ok(links)
    }
}
